//! Normalized label file reader (`class_id cx cy w h` per line).
//!
//! Label files sit next to their images as `<stem>.txt`. A missing file
//! means the image has no annotations. Lines that do not parse are skipped
//! and counted rather than failing the file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::geometry::NormalizedBox;
use crate::error::GrapesetError;

pub const LABEL_EXTENSION: &str = "txt";

/// The usable rows of one label file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelFile {
    pub boxes: Vec<NormalizedBox>,
    /// Number of non-empty lines that were rejected.
    pub skipped_lines: usize,
}

/// Reads a label file.
///
/// Returns an empty [`LabelFile`] when `path` does not exist. Other I/O
/// failures (permissions, invalid UTF-8) are returned as errors so the
/// caller can count the item as failed.
pub fn read_label_file(path: &Path) -> Result<LabelFile, GrapesetError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LabelFile::default()),
        Err(err) => return Err(GrapesetError::Io(err)),
    };

    Ok(parse_label_str(&content, path))
}

/// Parses label file content, skipping malformed lines.
pub fn parse_label_str(content: &str, path: &Path) -> LabelFile {
    let mut out = LabelFile::default();

    for (line_idx, line) in content.lines().enumerate() {
        match parse_label_line(line, path, line_idx + 1) {
            Ok(Some(parsed)) => out.boxes.push(parsed),
            Ok(None) => {}
            Err(err) => {
                log::debug!("skipping label row: {err}");
                out.skipped_lines += 1;
            }
        }
    }

    out
}

/// Parses one label line.
///
/// Blank lines yield `Ok(None)`. A valid line starts with a non-negative
/// integral class id followed by four finite numbers. Tokens after the
/// fifth (confidence scores, for instance) are ignored.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<NormalizedBox>, GrapesetError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().take(5).collect();

    if tokens.len() < 5 {
        return Err(GrapesetError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected at least 5 tokens, found {}", tokens.len()),
        });
    }

    let class_id = parse_class_id(tokens[0]).ok_or_else(|| GrapesetError::LabelParse {
        path: file_path.to_path_buf(),
        line: line_num,
        message: format!(
            "invalid class_id '{}'; expected non-negative integer",
            tokens[0]
        ),
    })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(NormalizedBox::new(class_id, cx, cy, w, h)))
}

/// Fuzz-only entrypoint for single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), GrapesetError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

// Some exporters write class ids as floats ("0.0").
fn parse_class_id(raw: &str) -> Option<u64> {
    if let Ok(id) = raw.parse::<u64>() {
        return Some(id);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, GrapesetError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(GrapesetError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {field_name} '{raw}'; expected finite number"),
        }),
    }
}
