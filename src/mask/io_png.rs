//! Grayscale PNG output for reduced masks.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::SegmentationMask;
use crate::error::GrapesetError;

/// Writes `mask` as an 8-bit grayscale PNG with values 0 and 255.
pub fn write_mask_png(path: &Path, mask: &SegmentationMask) -> Result<(), GrapesetError> {
    let encode_error = |source: png::EncodingError| GrapesetError::MaskEncode {
        path: path.to_path_buf(),
        source,
    };

    let (width, height) = match (u32::try_from(mask.width), u32::try_from(mask.height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(GrapesetError::MaskFormat {
                path: path.to_path_buf(),
                message: format!("cannot encode a {}x{} mask", mask.width, mask.height),
            })
        }
    };

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().map_err(encode_error)?;
    writer
        .write_image_data(&mask.to_display())
        .map_err(encode_error)?;
    writer.finish().map_err(encode_error)?;
    Ok(())
}
