//! Instance mask reduction.
//!
//! Segmentation sources store one binary channel per instance in an
//! `(height, width, channels)` array. Most training setups want a single
//! mask per image instead, so this module collapses the channels under a
//! named [`ReducePolicy`]. Instance identity is not preserved.
//!
//! Foreground is any non-zero value. Reduced masks hold 0/1 and are scaled
//! to 0/255 when written as PNG.

pub mod io_png;
pub mod npy;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rayon::prelude::*;

use crate::error::GrapesetError;
use crate::ir::io_image::{file_stem, list_files_with_extensions};
use crate::report::{BatchIssue, BatchIssueCode, BatchReport};

pub use io_png::write_mask_png;
pub use npy::{read_instance_mask, MASK_EXTENSIONS};

/// A multi-channel binary mask, stored height-major then width then channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceMask {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

impl InstanceMask {
    /// Builds a mask from HWC-ordered values. Any non-zero value is stored
    /// as 1.
    pub fn from_hwc(
        height: usize,
        width: usize,
        channels: usize,
        values: Vec<u8>,
    ) -> Result<Self, String> {
        let expected = height
            .checked_mul(width)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| format!("shape ({height}, {width}, {channels}) overflows"))?;
        if values.len() != expected {
            return Err(format!(
                "expected {expected} values for shape ({height}, {width}, {channels}), got {}",
                values.len()
            ));
        }

        let data = values.into_iter().map(|v| u8::from(v != 0)).collect();
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// Builds a mask from per-channel row-major planes.
    pub fn from_channels(height: usize, width: usize, planes: &[Vec<u8>]) -> Result<Self, String> {
        let pixels = height * width;
        if let Some(bad) = planes.iter().position(|plane| plane.len() != pixels) {
            return Err(format!("channel {bad} does not have {pixels} values"));
        }

        let channels = planes.len();
        let mut values = vec![0u8; pixels * channels];
        for (c, plane) in planes.iter().enumerate() {
            for (p, &value) in plane.iter().enumerate() {
                values[p * channels + c] = value;
            }
        }
        Self::from_hwc(height, width, channels, values)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    fn value(&self, pixel: usize, channel: usize) -> u8 {
        self.data[pixel * self.channels + channel]
    }

    /// Number of foreground pixels in `channel`.
    pub fn foreground_count(&self, channel: usize) -> usize {
        (0..self.height * self.width)
            .filter(|&p| self.value(p, channel) != 0)
            .count()
    }

    fn channel_plane(&self, channel: usize) -> Vec<u8> {
        (0..self.height * self.width)
            .map(|p| self.value(p, channel))
            .collect()
    }

    /// Collapses the channels under `policy`.
    ///
    /// Returns `None` for a mask without channels; there is nothing to
    /// choose from under any policy.
    pub fn reduce(&self, policy: ReducePolicy) -> Option<SegmentationMask> {
        if self.channels == 0 {
            return None;
        }

        let data = match policy {
            ReducePolicy::Merge => self
                .data
                .chunks_exact(self.channels)
                .map(|pixel| u8::from(pixel.iter().any(|&v| v != 0)))
                .collect(),
            ReducePolicy::First => self.channel_plane(0),
            ReducePolicy::Max => self.channel_plane(self.largest_channel()),
        };

        Some(SegmentationMask {
            height: self.height,
            width: self.width,
            data,
        })
    }

    // Strictly greater wins, so ties keep the lowest index.
    fn largest_channel(&self) -> usize {
        let mut best = 0;
        let mut best_count = self.foreground_count(0);
        for channel in 1..self.channels {
            let count = self.foreground_count(channel);
            if count > best_count {
                best = channel;
                best_count = count;
            }
        }
        best
    }
}

/// A single-channel 0/1 mask, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentationMask {
    pub height: usize,
    pub width: usize,
    pub data: Vec<u8>,
}

impl SegmentationMask {
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.width + col]
    }

    /// Values scaled to the 8-bit display range (0 or 255).
    pub fn to_display(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| if v != 0 { 255 } else { 0 })
            .collect()
    }
}

/// How to collapse instance channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReducePolicy {
    /// Foreground wherever any channel is foreground.
    #[default]
    Merge,
    /// Channel 0 as is.
    First,
    /// The channel with the most foreground pixels.
    Max,
}

impl ReducePolicy {
    pub const NAMES: [&'static str; 3] = ["merge", "first", "max"];

    pub fn as_str(self) -> &'static str {
        match self {
            ReducePolicy::Merge => "merge",
            ReducePolicy::First => "first",
            ReducePolicy::Max => "max",
        }
    }
}

impl FromStr for ReducePolicy {
    type Err = GrapesetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(ReducePolicy::Merge),
            "first" => Ok(ReducePolicy::First),
            "max" => Ok(ReducePolicy::Max),
            other => Err(GrapesetError::InvalidArgument(format!(
                "unknown mask policy '{other}' (supported: {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for ReducePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads one mask file, reduces it and writes `<out_dir>/<stem>.png`.
pub fn reduce_file(input: &Path, out_dir: &Path, policy: ReducePolicy) -> Result<PathBuf, GrapesetError> {
    let stem = file_stem(input).ok_or_else(|| GrapesetError::MaskFormat {
        path: input.to_path_buf(),
        message: "file name has no stem".to_string(),
    })?;

    let mask = read_instance_mask(input)?;
    let reduced = mask.reduce(policy).ok_or_else(|| GrapesetError::MaskFormat {
        path: input.to_path_buf(),
        message: "mask has no channels".to_string(),
    })?;

    let output = out_dir.join(format!("{stem}.png"));
    write_mask_png(&output, &reduced)?;
    Ok(output)
}

fn is_npz(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("npz"))
}

/// Keeps one input per stem, since every input is written to `<stem>.png`.
///
/// An `.npz` archive wins over an `.npy` file with the same stem. The
/// returned inputs keep their original order; the second list holds the
/// inputs that were set aside.
pub fn dedupe_mask_inputs(inputs: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut chosen: BTreeMap<String, usize> = BTreeMap::new();
    for (index, input) in inputs.iter().enumerate() {
        let Some(stem) = file_stem(input) else {
            continue;
        };
        let replace = match chosen.get(&stem) {
            Some(&kept) => is_npz(input) && !is_npz(&inputs[kept]),
            None => true,
        };
        if replace {
            chosen.insert(stem, index);
        }
    }

    let keep: Vec<bool> = (0..inputs.len())
        .map(|index| {
            file_stem(&inputs[index])
                .map_or(true, |stem| chosen.get(&stem) == Some(&index))
        })
        .collect();

    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (input, keep) in inputs.into_iter().zip(keep) {
        if keep {
            kept.push(input);
        } else {
            dropped.push(input);
        }
    }
    (kept, dropped)
}

/// Reduces every `.npz`/`.npy` file directly inside `input_dir`.
///
/// Files are processed in parallel; a failing file is logged and counted
/// without stopping the others. When an `.npz` and an `.npy` share a stem
/// only the `.npz` is reduced and the other is counted as failed.
pub fn reduce_directory(
    input_dir: &Path,
    out_dir: &Path,
    policy: ReducePolicy,
) -> Result<BatchReport, GrapesetError> {
    let inputs = list_files_with_extensions(input_dir, &MASK_EXTENSIONS)?;
    let mut report = BatchReport::new(format!("masks ({policy})"));

    if inputs.is_empty() {
        log::warn!("no mask files found in {}", input_dir.display());
        report.add(BatchIssue::info(
            BatchIssueCode::NoInputs,
            format!("no .npz/.npy files in {}", input_dir.display()),
        ));
        return Ok(report);
    }

    let (inputs, duplicates) = dedupe_mask_inputs(inputs);
    for duplicate in duplicates {
        log::warn!(
            "skipping {}: another mask with the same stem is reduced instead",
            duplicate.display()
        );
        report.failed += 1;
        report.add(BatchIssue::warning(
            BatchIssueCode::DuplicateStem,
            format!("{}: an .npz with the same stem takes precedence", duplicate.display()),
        ));
    }

    std::fs::create_dir_all(out_dir)?;
    log::info!(
        "reducing {} mask files from {} with policy {policy}",
        inputs.len(),
        input_dir.display()
    );

    let results: Vec<(PathBuf, Result<PathBuf, GrapesetError>)> = inputs
        .into_par_iter()
        .map(|input| {
            let result = reduce_file(&input, out_dir, policy);
            (input, result)
        })
        .collect();

    for (input, result) in results {
        match result {
            Ok(output) => {
                log::debug!("{} -> {}", input.display(), output.display());
                report.succeeded += 1;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn two_instances() -> InstanceMask {
        InstanceMask::from_channels(2, 2, &[vec![1, 0, 0, 0], vec![0, 0, 0, 1]]).expect("mask")
    }

    #[test]
    fn merge_is_logical_or() {
        let reduced = two_instances().reduce(ReducePolicy::Merge).expect("reduce");
        assert_eq!(reduced.data, vec![1, 0, 0, 1]);
        assert_eq!(reduced.get(1, 1), 1);
        assert_eq!(reduced.to_display(), vec![255, 0, 0, 255]);
    }

    #[test]
    fn first_copies_channel_zero() {
        let reduced = two_instances().reduce(ReducePolicy::First).expect("reduce");
        assert_eq!(reduced.data, vec![1, 0, 0, 0]);
    }

    #[test]
    fn max_picks_largest_channel() {
        let mask =
            InstanceMask::from_channels(2, 2, &[vec![1, 0, 0, 0], vec![0, 1, 1, 1]]).expect("mask");
        let reduced = mask.reduce(ReducePolicy::Max).expect("reduce");
        assert_eq!(reduced.data, vec![0, 1, 1, 1]);
    }

    #[test]
    fn max_tie_keeps_lowest_channel() {
        // Both channels have one foreground pixel.
        let reduced = two_instances().reduce(ReducePolicy::Max).expect("reduce");
        assert_eq!(reduced.data, vec![1, 0, 0, 0]);
    }

    #[test]
    fn non_binary_values_count_as_foreground() {
        let mask = InstanceMask::from_hwc(1, 2, 1, vec![0, 7]).expect("mask");
        assert_eq!(mask.foreground_count(0), 1);
        assert_eq!(mask.reduce(ReducePolicy::First).expect("reduce").data, vec![0, 1]);
    }

    #[test]
    fn zero_channel_mask_cannot_be_reduced() {
        let mask = InstanceMask::from_hwc(3, 3, 0, Vec::new()).expect("mask");
        for policy in [ReducePolicy::Merge, ReducePolicy::First, ReducePolicy::Max] {
            assert!(mask.reduce(policy).is_none());
        }
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        assert!(InstanceMask::from_hwc(2, 2, 2, vec![0; 7]).is_err());
        assert!(InstanceMask::from_channels(2, 2, &[vec![0; 4], vec![0; 3]]).is_err());
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!("merge".parse::<ReducePolicy>().unwrap(), ReducePolicy::Merge);
        assert_eq!("first".parse::<ReducePolicy>().unwrap(), ReducePolicy::First);
        assert_eq!("max".parse::<ReducePolicy>().unwrap(), ReducePolicy::Max);

        let err = "union".parse::<ReducePolicy>().unwrap_err();
        assert!(matches!(err, GrapesetError::InvalidArgument(_)));
        assert!(err.to_string().contains("union"));
    }

    #[test]
    fn npz_wins_over_npy_with_the_same_stem() {
        let inputs = vec![
            PathBuf::from("m/A.npy"),
            PathBuf::from("m/A.npz"),
            PathBuf::from("m/B.npy"),
            PathBuf::from("m/C.NPZ"),
            PathBuf::from("m/C.npy"),
        ];
        let (kept, dropped) = dedupe_mask_inputs(inputs);
        assert_eq!(
            kept,
            vec![PathBuf::from("m/A.npz"), PathBuf::from("m/B.npy"), PathBuf::from("m/C.NPZ")]
        );
        assert_eq!(dropped, vec![PathBuf::from("m/A.npy"), PathBuf::from("m/C.npy")]);
    }
}
