//! Collection assembly.
//!
//! A dataset category lives under `<root>/<category>/` with this layout:
//!
//! ```text
//! grapes/
//! ├── images/   CDY_2015.jpg, CFR_1638.png, ...
//! ├── csv/      CDY_2015.csv, ...   (absolute boxes, see ir::io_box_csv)
//! └── sets/     train.txt, val.txt, test.txt, ...
//! ```
//!
//! [`assemble_split`] turns one split into a [`Collection`]:
//!
//! 1. Stems come from `sets/<split>.txt`, sorted and deduplicated. When the
//!    list is missing or empty, every image stem in `images/` is used.
//! 2. Each stem resolves to `<stem>.jpg` or `<stem>.png`; stems without an
//!    image are left out and counted as not found.
//! 3. Per-image work (header probing, box parsing, clamping) runs in
//!    parallel.
//! 4. Image and annotation ids are then assigned in one sequential pass,
//!    in stem order and box order.
//!
//! The collection is validated before it is returned.

pub mod enrich;
pub mod generate;
pub mod yolo_to_csv;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::GrapesetError;
use crate::ir::geometry::clamp_absolute;
use crate::ir::io_box_csv::read_box_csv;
use crate::ir::io_coco_json::write_collection_json;
use crate::ir::io_image::{find_image_for_stem, image_stems, read_image_dimensions};
use crate::ir::{
    Annotation, BBoxXYWH, Category, Collection, CollectionInfo, IdAllocator, Image, Pixel,
    SequentialIds,
};
use crate::report::{BatchIssue, BatchIssueCode, BatchReport};
use crate::split::{read_split_list, SplitName};
use crate::validation::{validate_collection, ValidateOptions};

pub const DATASET_URL: &str = "https://github.com/thsant/wgisd";
pub const COLLECTION_VERSION: &str = "1.0.0";
pub const COLLECTION_YEAR: u32 = 2025;

/// Paths of one dataset category.
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    root: PathBuf,
    category: String,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            category: category.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn category_root(&self) -> PathBuf {
        self.root.join(&self.category)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.category_root().join("images")
    }

    pub fn csv_dir(&self) -> PathBuf {
        self.category_root().join("csv")
    }

    pub fn sets_dir(&self) -> PathBuf {
        self.category_root().join("sets")
    }

    pub fn split_list(&self, split: SplitName) -> PathBuf {
        self.sets_dir().join(split.list_file_name())
    }

    /// `<category>/images/<file name>`, relative to the dataset root.
    pub fn relative_image_name(&self, image_path: &Path) -> String {
        let name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/images/{}", self.category, name)
    }

    /// Output file name for a split collection.
    pub fn collection_file_name(&self, split: SplitName) -> String {
        format!("{}_instances_{}.json", self.category, split)
    }
}

/// Per-image result of the parallel phase.
#[derive(Debug)]
enum ImageOutcome {
    Found(ImageRecord),
    NotFound(String),
    Failed(GrapesetError),
}

/// An image with its clamped boxes, before ids are assigned.
#[derive(Debug)]
struct ImageRecord {
    file_name: String,
    width: u32,
    height: u32,
    boxes: Vec<BBoxXYWH<Pixel>>,
    degenerate: usize,
}

/// Stems for `split`, sorted and deduplicated.
///
/// Returns `true` alongside the stems when the split list was missing or
/// empty and the image directory was used instead.
pub fn split_stems(
    layout: &DatasetLayout,
    split: SplitName,
) -> Result<(Vec<String>, bool), GrapesetError> {
    let listed: BTreeSet<String> = read_split_list(&layout.split_list(split))?
        .into_iter()
        .collect();

    if listed.is_empty() {
        Ok((image_stems(&layout.images_dir())?, true))
    } else {
        Ok((listed.into_iter().collect(), false))
    }
}

fn load_image(layout: &DatasetLayout, stem: &str) -> ImageOutcome {
    let Some(image_path) = find_image_for_stem(&layout.images_dir(), stem) else {
        return ImageOutcome::NotFound(stem.to_string());
    };

    let (width, height) = match read_image_dimensions(&image_path) {
        Ok(dims) => dims,
        Err(err) => return ImageOutcome::Failed(err),
    };

    let mut boxes = Vec::new();
    let mut degenerate = 0;
    for row in read_box_csv(&layout.csv_dir().join(format!("{stem}.csv"))) {
        let bbox = clamp_absolute(
            BBoxXYWH::new(row.x, row.y, row.width, row.height),
            width,
            height,
        );
        if bbox.is_degenerate() {
            degenerate += 1;
        } else {
            boxes.push(bbox);
        }
    }

    ImageOutcome::Found(ImageRecord {
        file_name: layout.relative_image_name(&image_path),
        width,
        height,
        boxes,
        degenerate,
    })
}

/// Assembles the collection for one split.
pub fn assemble_split(
    layout: &DatasetLayout,
    split: SplitName,
) -> Result<(Collection, BatchReport), GrapesetError> {
    let mut report = BatchReport::new(format!("{} {}", layout.category(), split));

    let (stems, fell_back) = split_stems(layout, split)?;
    if fell_back {
        log::warn!(
            "{} missing or empty; using all images in {}",
            layout.split_list(split).display(),
            layout.images_dir().display()
        );
        report.add(BatchIssue::info(
            BatchIssueCode::SplitListFallback,
            format!("no entries in {}; used every image", layout.split_list(split).display()),
        ));
    }

    let outcomes: Vec<ImageOutcome> = stems
        .par_iter()
        .map(|stem| load_image(layout, stem))
        .collect();

    let mut image_ids = SequentialIds::new();
    let mut annotation_ids = SequentialIds::new();
    let grape = Category::grape();

    let mut collection = Collection {
        info: CollectionInfo {
            description: Some(format!("WGISD {} {} split", layout.category(), split)),
            version: Some(COLLECTION_VERSION.to_string()),
            year: Some(COLLECTION_YEAR),
            url: Some(DATASET_URL.to_string()),
            ..Default::default()
        },
        licenses: Some(Vec::new()),
        ..Default::default()
    };

    for outcome in outcomes {
        match outcome {
            ImageOutcome::Found(record) => {
                let image_id = image_ids.next_id();
                for bbox in record.boxes {
                    collection.annotations.push(Annotation::new(
                        annotation_ids.next_id(),
                        image_id,
                        grape.id,
                        bbox,
                    ));
                }
                collection.images.push(Image::new(
                    image_id,
                    record.file_name,
                    record.width,
                    record.height,
                ));
                report.degenerate_boxes += record.degenerate;
                report.succeeded += 1;
            }
            ImageOutcome::NotFound(stem) => {
                log::warn!("no image found for '{stem}'");
                report.not_found += 1;
                report.add(BatchIssue::warning(
                    BatchIssueCode::ImageNotFound,
                    format!("{stem}: no .jpg or .png in {}", layout.images_dir().display()),
                ));
            }
            ImageOutcome::Failed(err) => {
                log::error!("{err}");
                report.failed += 1;
                report.add(BatchIssue::warning(BatchIssueCode::ItemFailed, err.to_string()));
            }
        }
    }

    collection.categories.push(grape);

    let validation = validate_collection(&collection, &ValidateOptions::default());
    if !validation.is_ok() {
        return Err(GrapesetError::ValidationFailed {
            error_count: validation.error_count(),
            warning_count: validation.warning_count(),
            report: validation,
        });
    }

    Ok((collection, report))
}

/// Assembles and writes `<category>_instances_<split>.json` for each split.
///
/// A split that cannot be assembled or written is logged and counted as
/// failed; the remaining splits are still produced.
pub fn write_split_collections(
    layout: &DatasetLayout,
    splits: &[SplitName],
    out_dir: &Path,
) -> Result<BatchReport, GrapesetError> {
    std::fs::create_dir_all(out_dir)?;
    let mut total = BatchReport::new(format!("coco {}", layout.category()));

    for &split in splits {
        let out_path = out_dir.join(layout.collection_file_name(split));
        let written = assemble_split(layout, split).and_then(|(collection, report)| {
            write_collection_json(&out_path, &collection)?;
            Ok((collection, report))
        });

        match written {
            Ok((collection, report)) => {
                log::info!(
                    "generated {} with {} images and {} annotations",
                    out_path.display(),
                    collection.images.len(),
                    collection.annotations.len()
                );
                total.absorb(report);
            }
            Err(err) => {
                log::error!("{split} split failed: {err}");
                total.failed += 1;
                total.add(BatchIssue::warning(
                    BatchIssueCode::ItemFailed,
                    format!("{split}: {err}"),
                ));
            }
        }
    }

    Ok(total)
}
