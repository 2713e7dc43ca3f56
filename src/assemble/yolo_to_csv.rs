//! Normalized label files to absolute box CSV files.
//!
//! For every image in a data directory, `<stem>.txt` is converted into
//! `<csv>/<stem>.csv`. Image size is read from the canonical images
//! directory when the image exists there, otherwise from the copy in the
//! data directory. An image without a label file gets a header-only CSV.

use std::path::Path;

use crate::error::GrapesetError;
use crate::ir::geometry::{normalized_to_absolute, AbsoluteBox};
use crate::ir::io_box_csv::write_box_csv;
use crate::ir::io_image::{file_stem, list_files_with_extensions, read_image_dimensions, IMAGE_EXTENSIONS};
use crate::ir::io_yolo::{read_label_file, LABEL_EXTENSION};
use crate::report::{BatchIssue, BatchIssueCode, BatchReport};

/// Per-file conversion counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CsvConversion {
    pub boxes: usize,
    pub skipped_lines: usize,
    pub degenerate: usize,
}

/// Converts the labels of one image.
pub fn convert_label_file(
    label_path: &Path,
    image_path: &Path,
    csv_path: &Path,
) -> Result<CsvConversion, GrapesetError> {
    let (width, height) = read_image_dimensions(image_path)?;
    let labels = read_label_file(label_path)?;

    let (boxes, degenerate): (Vec<AbsoluteBox>, Vec<AbsoluteBox>) = labels
        .boxes
        .iter()
        .map(|label| normalized_to_absolute(label, width, height))
        .partition(|abs| !abs.bbox.is_degenerate());

    let stats = CsvConversion {
        boxes: boxes.len(),
        skipped_lines: labels.skipped_lines,
        degenerate: degenerate.len(),
    };
    write_box_csv(csv_path, &boxes)?;
    Ok(stats)
}

/// Converts every image's labels in `data_dir`.
pub fn convert_directory(
    data_dir: &Path,
    images_dir: &Path,
    csv_dir: &Path,
) -> Result<BatchReport, GrapesetError> {
    let images = list_files_with_extensions(data_dir, &IMAGE_EXTENSIONS)?;
    let mut report = BatchReport::new("yolo-to-csv");

    if images.is_empty() {
        report.add(BatchIssue::info(
            BatchIssueCode::NoInputs,
            format!("no .jpg/.png files in {}", data_dir.display()),
        ));
        return Ok(report);
    }
    std::fs::create_dir_all(csv_dir)?;

    for image in &images {
        let Some(stem) = file_stem(image) else {
            continue;
        };

        let canonical = image
            .file_name()
            .map(|name| images_dir.join(name))
            .filter(|path| path.is_file());
        let dims_source = canonical.as_deref().unwrap_or(image);

        let label_path = data_dir.join(format!("{stem}.{LABEL_EXTENSION}"));
        let csv_path = csv_dir.join(format!("{stem}.csv"));

        match convert_label_file(&label_path, dims_source, &csv_path) {
            Ok(stats) => {
                report.succeeded += 1;
                report.skipped_rows += stats.skipped_lines;
                report.degenerate_boxes += stats.degenerate;
            }
            Err(err) => {
                log::error!("{err}");
                report.failed += 1;
                report.add(BatchIssue::warning(BatchIssueCode::ItemFailed, err.to_string()));
            }
        }
    }

    log::info!(
        "converted {} label files into {}",
        report.succeeded,
        csv_dir.display()
    );
    Ok(report)
}
