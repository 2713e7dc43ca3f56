#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use npyz::WriterBuilder;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// A minimal 24-bit BMP. Dimensions are sniffed from content, so the file
/// may carry a `.jpg` or `.png` name.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&[0; 24]);

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_image(path: &Path, width: u32, height: u32) {
    write_file(path, bmp_bytes(width, height));
}

pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

/// Encodes a C-order `|u1` array as `.npy` bytes.
pub fn npy_bytes(shape: &[u64], data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut writer = npyz::WriteOptions::<u8>::new()
        .default_dtype()
        .shape(shape)
        .writer(&mut bytes)
        .begin_nd()
        .expect("begin npy");
    writer.extend(data.iter().copied()).expect("write npy data");
    writer.finish().expect("finish npy");
    bytes
}

/// Writes a `.npy` file holding one `|u1` HWC array.
pub fn write_npy(path: &Path, shape: &[u64], data: &[u8]) {
    write_file(path, npy_bytes(shape, data));
}

/// Writes an `.npz` archive holding one `|u1` HWC array under `member`.
pub fn write_npz(path: &Path, member: &str, shape: &[u64], data: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let file = fs::File::create(path).expect("create npz");
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file(member, options).expect("start npz member");
    zip.write_all(&npy_bytes(shape, data))
        .expect("write npz member");
    zip.finish().expect("finish npz");
}

/// Decodes a grayscale PNG into `(width, height, pixels)`.
pub fn read_png(path: &Path) -> (u32, u32, Vec<u8>) {
    let decoder = png::Decoder::new(fs::File::open(path).expect("open png"));
    let mut reader = decoder.read_info().expect("png header");
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("png frame");
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}
