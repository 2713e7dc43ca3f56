//! Reading and writing collection documents.
//!
//! The on-disk layout is the COCO object-detection document:
//!
//! ```json
//! {
//!   "info": { "description": "WGISD grapes train split", "year": 2025 },
//!   "licenses": [],
//!   "images": [{ "id": 1, "width": 2048, "height": 1365, "file_name": "grapes/images/CDY_2015.jpg" }],
//!   "annotations": [{ "id": 1, "image_id": 1, "category_id": 1, "bbox": [x, y, w, h], "area": 1.0, "iscrowd": 0 }],
//!   "categories": [{ "id": 1, "name": "grape", "supercategory": "fruit" }]
//! }
//! ```
//!
//! Output is pretty-printed with two-space indentation.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::model::Collection;
use crate::error::GrapesetError;

/// Reads a collection document from disk.
pub fn read_collection_json(path: &Path) -> Result<Collection, GrapesetError> {
    let file = File::open(path).map_err(GrapesetError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| GrapesetError::CollectionJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a collection document, replacing any existing file.
pub fn write_collection_json(path: &Path, collection: &Collection) -> Result<(), GrapesetError> {
    write_pretty(path, collection)
}

/// Reads a document without mapping it onto [`Collection`].
///
/// Fields the model does not know (`segmentation`, `date_captured`, ...)
/// survive a read-modify-write through [`write_document_value`], and
/// numbers keep their integer or float form.
pub fn read_document_value(path: &Path) -> Result<Value, GrapesetError> {
    let file = File::open(path).map_err(GrapesetError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| GrapesetError::CollectionJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes an untyped document, replacing any existing file.
pub fn write_document_value(path: &Path, document: &Value) -> Result<(), GrapesetError> {
    write_pretty(path, document)
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), GrapesetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path).map_err(GrapesetError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
        GrapesetError::CollectionJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush()?;
    Ok(())
}

/// Parses a collection document from a string.
///
/// Useful for testing without file I/O.
pub fn from_collection_str(json: &str) -> Result<Collection, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses a collection document from bytes.
pub fn from_collection_slice(bytes: &[u8]) -> Result<Collection, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Serializes a collection to a pretty-printed string.
pub fn to_collection_string(collection: &Collection) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(collection)
}
