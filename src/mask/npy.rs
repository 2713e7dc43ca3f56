//! Reader for NumPy `.npy` arrays and `.npz` archives.
//!
//! Headers and element decoding come from `npyz`. Only what instance masks
//! need is accepted: boolean, integer and float dtypes, C or Fortran order,
//! and 2-D or 3-D shapes. A 2-D array is read as a single-channel mask.
//!
//! In an `.npz` archive the mask is the `arr_0` array or, failing that, the
//! first array in the archive.

use std::io::{self, Read};
use std::path::Path;

use npyz::npz::NpzArchive;
use npyz::{DType, NpyFile, Order, TypeChar};

use super::InstanceMask;
use crate::error::GrapesetError;
use crate::ir::io_image::has_extension;

pub const MASK_EXTENSIONS: [&str; 2] = ["npz", "npy"];

const DEFAULT_ARRAY: &str = "arr_0";

/// Reads an instance mask from an `.npz` or `.npy` file.
pub fn read_instance_mask(path: &Path) -> Result<InstanceMask, GrapesetError> {
    if has_extension(path, &["npz"]) {
        read_npz(path)
    } else if has_extension(path, &["npy"]) {
        let bytes = std::fs::read(path)?;
        parse_npy(&bytes).map_err(|message| format_error(path, message))
    } else {
        Err(format_error(path, "expected a .npz or .npy file"))
    }
}

fn read_npz(path: &Path) -> Result<InstanceMask, GrapesetError> {
    let archive_error = |source: io::Error| GrapesetError::MaskArchive {
        path: path.to_path_buf(),
        source,
    };

    let mut archive = NpzArchive::open(path).map_err(archive_error)?;
    let name = if archive.array_names().any(|name| name == DEFAULT_ARRAY) {
        DEFAULT_ARRAY.to_string()
    } else {
        archive
            .array_names()
            .next()
            .map(str::to_string)
            .ok_or_else(|| format_error(path, "archive contains no .npy member"))?
    };

    let npy = archive
        .by_name(&name)
        .map_err(archive_error)?
        .ok_or_else(|| format_error(path, format!("archive member '{name}.npy' is missing")))?;
    mask_from_npy(npy).map_err(|message| format_error(path, message))
}

fn format_error(path: &Path, message: impl Into<String>) -> GrapesetError {
    GrapesetError::MaskFormat {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Parses an in-memory `.npy` file into a mask.
pub fn parse_npy(bytes: &[u8]) -> Result<InstanceMask, String> {
    let npy = NpyFile::new(bytes).map_err(|err| format!("invalid .npy header: {err}"))?;
    mask_from_npy(npy)
}

fn mask_from_npy<R: Read>(npy: NpyFile<R>) -> Result<InstanceMask, String> {
    let dims = npy
        .shape()
        .iter()
        .map(|&dim| usize::try_from(dim).map_err(|_| format!("dimension {dim} is too large")))
        .collect::<Result<Vec<usize>, String>>()?;
    let (height, width, channels) = match dims.as_slice() {
        [h, w] => (*h, *w, 1),
        [h, w, c] => (*h, *w, *c),
        other => return Err(format!("expected a 2-D or 3-D array, found shape {other:?}")),
    };
    let order = npy.order();

    let foreground = foreground_values(npy)?;

    let values = match order {
        Order::C => foreground,
        // Fortran order: the first axis varies fastest.
        Order::Fortran => {
            let mut hwc = vec![0u8; foreground.len()];
            for c in 0..channels {
                for w in 0..width {
                    for h in 0..height {
                        hwc[(h * width + w) * channels + c] =
                            foreground[h + height * (w + width * c)];
                    }
                }
            }
            hwc
        }
    };

    InstanceMask::from_hwc(height, width, channels, values)
}

/// Decodes every element and maps it to 0 or 1, in storage order.
fn foreground_values<R: Read>(npy: NpyFile<R>) -> Result<Vec<u8>, String> {
    let DType::Plain(type_str) = npy.dtype() else {
        return Err("structured dtypes are not supported".to_string());
    };

    match (type_str.type_char(), type_str.size_field()) {
        (TypeChar::Bool, 1) => flags(npy.into_vec::<bool>(), |v| v),
        (TypeChar::Uint, 1) => flags(npy.into_vec::<u8>(), |v| v != 0),
        (TypeChar::Uint, 2) => flags(npy.into_vec::<u16>(), |v| v != 0),
        (TypeChar::Uint, 4) => flags(npy.into_vec::<u32>(), |v| v != 0),
        (TypeChar::Uint, 8) => flags(npy.into_vec::<u64>(), |v| v != 0),
        (TypeChar::Int, 1) => flags(npy.into_vec::<i8>(), |v| v != 0),
        (TypeChar::Int, 2) => flags(npy.into_vec::<i16>(), |v| v != 0),
        (TypeChar::Int, 4) => flags(npy.into_vec::<i32>(), |v| v != 0),
        (TypeChar::Int, 8) => flags(npy.into_vec::<i64>(), |v| v != 0),
        (TypeChar::Float, 4) => flags(npy.into_vec::<f32>(), |v| v != 0.0),
        (TypeChar::Float, 8) => flags(npy.into_vec::<f64>(), |v| v != 0.0),
        _ => Err(format!("unsupported dtype '{type_str}'")),
    }
}

fn flags<T>(values: io::Result<Vec<T>>, is_set: impl Fn(T) -> bool) -> Result<Vec<u8>, String> {
    let values = values.map_err(|err| format!("array data unreadable: {err}"))?;
    Ok(values.into_iter().map(|v| u8::from(is_set(v))).collect())
}
