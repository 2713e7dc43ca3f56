//! Berry-count enrichment of single-image documents.
//!
//! Berry annotations are point lists, one berry per non-empty line, stored
//! as `<berries>/<stem>-berries.txt`. The count is attached to
//! `images[0].berry_count` (replacing any previous value) and to
//! `info.berry_count` when that is not set yet.
//!
//! Documents are edited as untyped JSON: every other field, including ones
//! the collection model does not describe, is written back unchanged.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use crate::error::GrapesetError;
use crate::ir::io_coco_json::{read_document_value, write_document_value};
use crate::ir::io_image::{file_stem, list_files_with_extensions};
use crate::report::{BatchIssue, BatchIssueCode, BatchReport};

/// Berry file for a document stem.
pub fn berry_file_name(stem: &str) -> String {
    format!("{stem}-berries.txt")
}

/// Counts berries in a point file. `Ok(None)` if the file does not exist.
pub fn count_berries(path: &Path) -> Result<Option<u64>, GrapesetError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(
            content.lines().filter(|line| !line.trim().is_empty()).count() as u64,
        )),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(GrapesetError::Io(err)),
    }
}

/// Sets `images[0].berry_count` and, if absent, `info.berry_count`.
///
/// A document without images or without an `info` object is left without
/// the corresponding field.
pub fn set_berry_count(document: &mut Value, berry_count: u64) {
    let first_image = document
        .get_mut("images")
        .and_then(Value::as_array_mut)
        .and_then(|images| images.first_mut())
        .and_then(Value::as_object_mut);
    if let Some(image) = first_image {
        image.insert("berry_count".to_string(), Value::from(berry_count));
    }

    if let Some(info) = document.get_mut("info").and_then(Value::as_object_mut) {
        info.entry("berry_count")
            .or_insert_with(|| Value::from(berry_count));
    }
}

/// Attaches `berry_count` to one document on disk.
pub fn apply_berry_count(json_path: &Path, berry_count: u64) -> Result<(), GrapesetError> {
    let mut document = read_document_value(json_path)?;
    set_berry_count(&mut document, berry_count);
    write_document_value(json_path, &document)
}

/// Enriches every `.json` document in `json_dir`.
pub fn add_berry_counts(json_dir: &Path, berries_dir: &Path) -> Result<BatchReport, GrapesetError> {
    let documents = list_files_with_extensions(json_dir, &["json"])?;
    let mut report = BatchReport::new("berries");

    for json_path in &documents {
        let Some(stem) = file_stem(json_path) else {
            continue;
        };
        let berry_path = berries_dir.join(berry_file_name(&stem));

        let outcome = count_berries(&berry_path).and_then(|count| match count {
            Some(count) => apply_berry_count(json_path, count).map(|()| Some(count)),
            None => Ok(None),
        });

        match outcome {
            Ok(Some(count)) => {
                log::debug!("{}: {count} berries", json_path.display());
                report.succeeded += 1;
            }
            Ok(None) => {
                report.not_found += 1;
                report.add(BatchIssue::info(
                    BatchIssueCode::BerryFileNotFound,
                    format!("{}: no {}", stem, berry_path.display()),
                ));
            }
            Err(err) => {
                log::error!("{err}");
                report.failed += 1;
                report.add(BatchIssue::warning(BatchIssueCode::ItemFailed, err.to_string()));
            }
        }
    }

    log::info!(
        "berry counts: {} updated, {} failed, {} without berry file",
        report.succeeded,
        report.failed,
        report.not_found
    );
    Ok(report)
}
