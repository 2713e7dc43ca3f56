//! Single-image annotation documents.
//!
//! For every `.jpg` in a directory, writes `<stem>.json`: a collection with
//! one image and the boxes of the neighbouring `<stem>.txt` label file.
//! These documents live outside any split collection, so their ids come
//! from [`RandomizedIds`] instead of a counter.

use std::path::{Path, PathBuf};

use crate::error::GrapesetError;
use crate::ir::geometry::normalized_to_absolute;
use crate::ir::io_coco_json::write_collection_json;
use crate::ir::io_image::{file_stem, list_files_with_extensions, read_image_dimensions};
use crate::ir::io_yolo::read_label_file;
use crate::ir::{
    Annotation, Category, Collection, CollectionInfo, IdAllocator, Image, License, RandomizedIds,
};
use crate::report::{BatchIssue, BatchIssueCode, BatchReport};

/// Size assumed when an image header cannot be read.
pub const FALLBACK_DIMENSIONS: (u32, u32) = (1920, 1080);

const VARIETIES: [(&str, &str); 5] = [
    ("CDY", "Chardonnay"),
    ("CFR", "Cabernet Franc"),
    ("CSV", "Cabernet Sauvignon"),
    ("SVB", "Sauvignon Blanc"),
    ("SYH", "Syrah"),
];

/// Variety name used in the description when the prefix is not recognised.
pub const UNKNOWN_VARIETY: &str = "unknown";

/// Grape cultivar encoded in the file-name prefix, e.g. `CDY_2015.jpg`.
pub fn variety_for_file_name(file_name: &str) -> Option<&'static str> {
    VARIETIES
        .iter()
        .find(|(prefix, _)| file_name.starts_with(prefix))
        .map(|(_, name)| *name)
}

/// What happened to one image.
#[derive(Debug)]
pub struct GeneratedDocument {
    pub path: PathBuf,
    pub annotations: usize,
    pub skipped_lines: usize,
    pub degenerate: usize,
    pub dimensions_estimated: bool,
}

/// Builds the document for one image.
pub fn build_image_document(
    image_path: &Path,
    ids: &mut impl IdAllocator,
) -> Result<(Collection, GeneratedDocument), GrapesetError> {
    let stem = file_stem(image_path).ok_or_else(|| GrapesetError::InvalidArgument(format!(
        "{} has no file stem",
        image_path.display()
    )))?;
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| stem.clone());

    let size = std::fs::metadata(image_path)?.len();

    let (width, height, dimensions_estimated) = match read_image_dimensions(image_path) {
        Ok((w, h)) => (w, h, false),
        Err(err) => {
            log::warn!(
                "{err}; assuming {}x{}",
                FALLBACK_DIMENSIONS.0,
                FALLBACK_DIMENSIONS.1
            );
            (FALLBACK_DIMENSIONS.0, FALLBACK_DIMENSIONS.1, true)
        }
    };

    let variety = variety_for_file_name(&file_name);
    let image_id = ids.next_id();

    let mut image = Image::new(image_id, file_name, width, height);
    image.size = Some(size);
    image.format = Some("JPG".to_string());
    image.url = Some(String::new());
    image.hash = Some(String::new());
    image.status = Some("success".to_string());
    image.variety = variety.map(str::to_string);
    image.dimensions_estimated = dimensions_estimated;

    let labels = read_label_file(&image_path.with_extension("txt"))?;
    let mut annotations = Vec::with_capacity(labels.boxes.len());
    let mut degenerate = 0;
    for label in &labels.boxes {
        let abs = normalized_to_absolute(label, width, height);
        if abs.bbox.is_degenerate() {
            degenerate += 1;
            continue;
        }
        annotations.push(Annotation::new(ids.next_id(), image_id, abs.category_id, abs.bbox));
    }

    let collection = Collection {
        info: CollectionInfo {
            description: Some(format!(
                "Grape detection annotation for {} variety",
                variety.unwrap_or(UNKNOWN_VARIETY)
            )),
            version: Some("1.0".to_string()),
            year: Some(super::COLLECTION_YEAR),
            contributor: Some("Embrapa WGISD Dataset".to_string()),
            source: Some("Field captured grape images".to_string()),
            license: Some(License::with_url(
                "Creative Commons Attribution 4.0 International",
                "https://creativecommons.org/licenses/by/4.0/",
            )),
            ..Default::default()
        },
        images: vec![image],
        categories: vec![Category::with_supercategory(1u64, "GRAPE_CLUSTER", "GRAPE")],
        annotations,
        licenses: None,
    };

    let summary = GeneratedDocument {
        path: PathBuf::new(),
        annotations: collection.annotations.len(),
        skipped_lines: labels.skipped_lines,
        degenerate,
        dimensions_estimated,
    };
    Ok((collection, summary))
}

/// Writes a document for every `.jpg` in `data_dir` into `out_dir`.
pub fn generate_image_documents(data_dir: &Path, out_dir: &Path) -> Result<BatchReport, GrapesetError> {
    let images = list_files_with_extensions(data_dir, &["jpg"])?;
    let mut report = BatchReport::new("image-json");

    if images.is_empty() {
        report.add(BatchIssue::info(
            BatchIssueCode::NoInputs,
            format!("no .jpg files in {}", data_dir.display()),
        ));
        return Ok(report);
    }

    std::fs::create_dir_all(out_dir)?;
    log::info!("generating {} image documents", images.len());

    // One allocator for the whole run keeps ids unique across documents.
    let mut ids = RandomizedIds::new();

    for image_path in &images {
        match write_image_document(image_path, out_dir, &mut ids) {
            Ok(doc) => {
                log::debug!("wrote {}", doc.path.display());
                report.succeeded += 1;
                report.skipped_rows += doc.skipped_lines;
                report.degenerate_boxes += doc.degenerate;
                if doc.dimensions_estimated {
                    report.add(BatchIssue::warning(
                        BatchIssueCode::EstimatedDimensions,
                        format!("{}: size unreadable, used default", image_path.display()),
                    ));
                }
            }
            Err(err) => {
                log::error!("{err}");
                report.failed += 1;
                report.add(BatchIssue::warning(BatchIssueCode::ItemFailed, err.to_string()));
            }
        }
    }

    Ok(report)
}

fn write_image_document(
    image_path: &Path,
    out_dir: &Path,
    ids: &mut RandomizedIds,
) -> Result<GeneratedDocument, GrapesetError> {
    let (collection, mut doc) = build_image_document(image_path, ids)?;
    let stem = file_stem(image_path).unwrap_or_default();
    doc.path = out_dir.join(format!("{stem}.json"));
    write_collection_json(&doc.path, &collection)?;
    Ok(doc)
}
