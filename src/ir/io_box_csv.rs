//! Per-image box CSV reader and writer.
//!
//! Box CSV files hold absolute pixel boxes, one row per box. Hand-edited
//! files in the wild use several spellings for the geometry columns, so the
//! reader resolves headers through an alias table instead of a fixed schema.
//!
//! # Column aliases
//!
//! | field    | accepted headers (priority order) |
//! |----------|-----------------------------------|
//! | `x`      | `x`, `xc`, `x_center`             |
//! | `y`      | `y`, `yc`, `y_center`             |
//! | `width`  | `w`, `width`, `dx`                |
//! | `height` | `h`, `height`, `dy`               |
//!
//! Header matching ignores ASCII case. A row yields a box only when all
//! four fields resolve to finite numbers; other rows are skipped.
//!
//! The writer always emits the canonical `#item,x,y,width,height,label`
//! layout.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use csv::StringRecord;
use serde::Serialize;

use super::geometry::AbsoluteBox;
use crate::error::GrapesetError;

/// A logical geometry field of a box row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxField {
    X,
    Y,
    Width,
    Height,
}

impl BoxField {
    pub const ALL: [BoxField; 4] = [BoxField::X, BoxField::Y, BoxField::Width, BoxField::Height];

    /// Accepted lowercase header names, highest priority first.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            BoxField::X => &["x", "xc", "x_center"],
            BoxField::Y => &["y", "yc", "y_center"],
            BoxField::Width => &["w", "width", "dx"],
            BoxField::Height => &["h", "height", "dy"],
        }
    }
}

/// A box row with its four resolved fields, in file units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TabularBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Maps one file's header row onto the alias table.
#[derive(Clone, Debug)]
pub struct SchemaResolver {
    columns: HashMap<String, usize>,
}

impl SchemaResolver {
    /// Builds a resolver from a header row. When two headers collide after
    /// lowercasing, the leftmost one wins.
    pub fn new(headers: &StringRecord) -> Self {
        let mut columns = HashMap::new();
        for (index, name) in headers.iter().enumerate() {
            columns
                .entry(name.trim().to_ascii_lowercase())
                .or_insert(index);
        }
        Self { columns }
    }

    /// Resolves one field: the first alias whose column holds a non-empty
    /// value parseable as a finite number.
    pub fn resolve_field(&self, record: &StringRecord, field: BoxField) -> Option<f64> {
        field.aliases().iter().find_map(|alias| {
            let index = *self.columns.get(*alias)?;
            let raw = record.get(index)?.trim();
            if raw.is_empty() {
                return None;
            }
            raw.parse::<f64>().ok().filter(|value| value.is_finite())
        })
    }

    /// Resolves all four fields, or `None` if any is missing.
    pub fn resolve(&self, record: &StringRecord) -> Option<TabularBox> {
        Some(TabularBox {
            x: self.resolve_field(record, BoxField::X)?,
            y: self.resolve_field(record, BoxField::Y)?,
            width: self.resolve_field(record, BoxField::Width)?,
            height: self.resolve_field(record, BoxField::Height)?,
        })
    }

    /// True when every field has at least one matching column.
    pub fn covers_all_fields(&self) -> bool {
        BoxField::ALL.iter().all(|field| {
            field
                .aliases()
                .iter()
                .any(|alias| self.columns.contains_key(*alias))
        })
    }
}

/// Reads the boxes of one CSV file.
///
/// A missing or unreadable file yields no boxes: absence of annotations is
/// a valid state for an image.
pub fn read_box_csv(path: &Path) -> Vec<TabularBox> {
    match File::open(path) {
        Ok(file) => boxes_from_reader(file, path),
        Err(err) => {
            if err.kind() != ErrorKind::NotFound {
                log::warn!("cannot read box file {}: {err}", path.display());
            }
            Vec::new()
        }
    }
}

/// Reads boxes from CSV text.
///
/// Useful for testing without file I/O.
pub fn from_box_csv_str(csv_str: &str) -> Vec<TabularBox> {
    boxes_from_reader(csv_str.as_bytes(), Path::new("<string>"))
}

fn boxes_from_reader<R: Read>(reader: R, path: &Path) -> Vec<TabularBox> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let resolver = match csv_reader.headers() {
        Ok(headers) => SchemaResolver::new(headers),
        Err(err) => {
            log::warn!("cannot read header of {}: {err}", path.display());
            return Vec::new();
        }
    };

    if !resolver.covers_all_fields() {
        log::debug!(
            "{} has no recognisable x/y/width/height columns",
            path.display()
        );
    }

    let mut boxes = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                log::debug!("skipping row {} of {}: {err}", row_idx + 1, path.display());
                continue;
            }
        };

        match resolver.resolve(&record) {
            Some(bbox) => boxes.push(bbox),
            None => log::debug!(
                "skipping row {} of {}: incomplete geometry",
                row_idx + 1,
                path.display()
            ),
        }
    }

    boxes
}

/// Fuzz-only entrypoint for CSV parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_box_csv(bytes: &[u8]) -> usize {
    boxes_from_reader(bytes, Path::new("<fuzz>")).len()
}

/// A canonical output row.
#[derive(Debug, Serialize)]
struct BoxRow {
    #[serde(rename = "#item")]
    item: usize,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    label: u64,
}

/// Writes boxes in the canonical layout. An empty slice produces a
/// header-only file.
pub fn write_box_csv(path: &Path, boxes: &[AbsoluteBox]) -> Result<(), GrapesetError> {
    let file = File::create(path).map_err(GrapesetError::Io)?;
    write_rows(BufWriter::new(file), boxes, path)?.flush()?;
    Ok(())
}

/// Writes boxes to a CSV string.
///
/// Useful for testing without file I/O.
pub fn to_box_csv_string(boxes: &[AbsoluteBox]) -> Result<String, GrapesetError> {
    let dummy_path = Path::new("<string>");
    let bytes = write_rows(Vec::new(), boxes, dummy_path)?;
    String::from_utf8(bytes).map_err(|e| GrapesetError::InvalidArgument(e.to_string()))
}

fn write_rows<W: Write>(writer: W, boxes: &[AbsoluteBox], path: &Path) -> Result<W, GrapesetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    // serialize() only emits the header with the first row.
    if boxes.is_empty() {
        csv_writer
            .write_record(["#item", "x", "y", "width", "height", "label"])
            .map_err(|source| GrapesetError::BoxCsvWrite {
                path: path.to_path_buf(),
                source,
            })?;
    }

    for (item, abs) in boxes.iter().enumerate() {
        let row = BoxRow {
            item,
            x: abs.bbox.x,
            y: abs.bbox.y,
            width: abs.bbox.width,
            height: abs.bbox.height,
            label: abs.category_id.as_u64(),
        };
        csv_writer
            .serialize(&row)
            .map_err(|source| GrapesetError::BoxCsvWrite {
                path: path.to_path_buf(),
                source,
            })?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| GrapesetError::Io(e.into_error()))
}
