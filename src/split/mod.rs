//! Train/validation/test partitioning of the image universe.
//!
//! The dataset ships two declared lists, `train.txt` and `test.txt`. The
//! allocator derives a validation subset from the declared training
//! images and produces five lists:
//!
//! - `test`: the declared test names, sorted and deduplicated
//! - `val`: the first fifth (rounded up) of the training candidates
//! - `train`: the remaining candidates
//! - `all`: every image stem plus every declared name
//! - `train_val`: the sorted union of `train` and `val`
//!
//! Training candidates are the declared training names minus the declared
//! test names, sorted. The result depends only on the inputs.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::GrapesetError;
use crate::ir::io_image::image_stems;

/// A named split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SplitName {
    Train,
    Val,
    Test,
    All,
    TrainVal,
}

impl SplitName {
    pub const ALL_SPLITS: [SplitName; 5] = [
        SplitName::Train,
        SplitName::Val,
        SplitName::Test,
        SplitName::All,
        SplitName::TrainVal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SplitName::Train => "train",
            SplitName::Val => "val",
            SplitName::Test => "test",
            SplitName::All => "all",
            SplitName::TrainVal => "train_val",
        }
    }

    /// File name of the split list (`<split>.txt`).
    pub fn list_file_name(self) -> String {
        format!("{}.txt", self.as_str())
    }
}

impl FromStr for SplitName {
    type Err = GrapesetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(SplitName::Train),
            "val" => Ok(SplitName::Val),
            "test" => Ok(SplitName::Test),
            "all" => Ok(SplitName::All),
            "train_val" => Ok(SplitName::TrainVal),
            other => Err(GrapesetError::UnsupportedSplit(format!(
                "'{other}' (supported: train, val, test, all, train_val)"
            ))),
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a comma-separated split list, rejecting unknown names before any
/// work starts. Duplicates are dropped, first occurrence kept.
pub fn parse_split_names(raw: &[String]) -> Result<Vec<SplitName>, GrapesetError> {
    let mut names = Vec::new();
    for part in raw.iter().flat_map(|s| s.split(',')) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let name: SplitName = part.parse()?;
        if !names.contains(&name) {
            names.push(name);
        }
    }

    if names.is_empty() {
        return Err(GrapesetError::InvalidArgument(
            "at least one split name is required".to_string(),
        ));
    }
    Ok(names)
}

/// The five derived lists, each sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<String>,
    pub val: Vec<String>,
    pub test: Vec<String>,
    pub all: Vec<String>,
    pub train_val: Vec<String>,
}

impl SplitAssignment {
    pub fn get(&self, split: SplitName) -> &[String] {
        match split {
            SplitName::Train => &self.train,
            SplitName::Val => &self.val,
            SplitName::Test => &self.test,
            SplitName::All => &self.all,
            SplitName::TrainVal => &self.train_val,
        }
    }
}

/// Number of validation images taken from `candidates` training candidates.
#[inline]
pub fn validation_size(candidates: usize) -> usize {
    candidates.div_ceil(5)
}

/// Partitions the image universe.
///
/// `universe` is every image stem on disk; it only contributes to `all`.
pub fn allocate_splits<S: AsRef<str>>(
    universe: &[S],
    declared_train: &[S],
    declared_test: &[S],
) -> SplitAssignment {
    let test: BTreeSet<String> = declared_test.iter().map(|s| s.as_ref().to_string()).collect();

    let candidates: Vec<String> = declared_train
        .iter()
        .map(|s| s.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|name| !test.contains(name))
        .collect();

    let val_size = validation_size(candidates.len());
    let val = candidates[..val_size].to_vec();
    let train = candidates[val_size..].to_vec();

    let all: BTreeSet<String> = universe
        .iter()
        .map(|s| s.as_ref().to_string())
        .chain(train.iter().cloned())
        .chain(val.iter().cloned())
        .chain(test.iter().cloned())
        .collect();

    let train_val: BTreeSet<String> = train.iter().chain(val.iter()).cloned().collect();

    SplitAssignment {
        train,
        val,
        test: test.into_iter().collect(),
        all: all.into_iter().collect(),
        train_val: train_val.into_iter().collect(),
    }
}

/// Reads a split list: one name per line, whitespace trimmed, blank lines
/// ignored. A missing file is an empty list.
pub fn read_split_list(path: &Path) -> Result<Vec<String>, GrapesetError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(GrapesetError::Io(err)),
    }
}

/// Writes one sorted name per line.
pub fn write_split_list(path: &Path, names: &[String]) -> Result<(), GrapesetError> {
    let mut sorted: Vec<&String> = names.iter().collect();
    sorted.sort();

    let mut writer = BufWriter::new(fs::File::create(path)?);
    for name in sorted {
        writeln!(writer, "{name}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes all five lists into `out_dir` as `<split>.txt`.
pub fn write_split_lists(
    out_dir: &Path,
    assignment: &SplitAssignment,
) -> Result<Vec<PathBuf>, GrapesetError> {
    fs::create_dir_all(out_dir)?;
    SplitName::ALL_SPLITS
        .iter()
        .map(|split| {
            let path = out_dir.join(split.list_file_name());
            write_split_list(&path, assignment.get(*split))?;
            Ok(path)
        })
        .collect()
}

/// Builds and writes the split lists for one image directory.
pub fn build_split_lists(
    images_dir: &Path,
    train_list: &Path,
    test_list: &Path,
    out_dir: &Path,
) -> Result<SplitAssignment, GrapesetError> {
    let universe = image_stems(images_dir)?;
    let declared_train = read_split_list(train_list)?;
    let declared_test = read_split_list(test_list)?;

    let assignment = allocate_splits(&universe, &declared_train, &declared_test);
    write_split_lists(out_dir, &assignment)?;

    log::info!(
        "wrote splits to {}: {} train, {} val, {} test, {} total",
        out_dir.display(),
        assignment.train.len(),
        assignment.val.len(),
        assignment.test.len(),
        assignment.all.len()
    );
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn five_train_one_test() {
        let train = names(&["A", "B", "C", "D", "E"]);
        let test = names(&["E"]);
        let split = allocate_splits(&[], &train, &test);

        assert_eq!(split.test, names(&["E"]));
        assert_eq!(split.val, names(&["A"]));
        assert_eq!(split.train, names(&["B", "C", "D"]));
        assert_eq!(split.train_val, names(&["A", "B", "C", "D"]));
        assert_eq!(split.all, names(&["A", "B", "C", "D", "E"]));
    }

    #[test]
    fn validation_size_rounds_up() {
        assert_eq!(validation_size(0), 0);
        assert_eq!(validation_size(1), 1);
        assert_eq!(validation_size(5), 1);
        assert_eq!(validation_size(6), 2);
        assert_eq!(validation_size(10), 2);
        assert_eq!(validation_size(11), 3);
    }

    #[test]
    fn candidates_are_sorted_before_slicing() {
        let train = names(&["Z", "M", "A", "C", "B", "Y"]);
        let split = allocate_splits(&[], &train, &[]);
        assert_eq!(split.val, names(&["A", "B"]));
        assert_eq!(split.train, names(&["C", "M", "Y", "Z"]));
    }

    #[test]
    fn all_includes_unlisted_images() {
        let universe = names(&["A", "X"]);
        let split = allocate_splits(&universe, &names(&["A", "B"]), &names(&["T"]));
        assert_eq!(split.all, names(&["A", "B", "T", "X"]));
        assert!(!split.train_val.contains(&"X".to_string()));
    }

    #[test]
    fn empty_inputs_give_empty_splits() {
        let split = allocate_splits::<String>(&[], &[], &[]);
        assert_eq!(split, SplitAssignment::default());
    }

    #[test]
    fn split_names_parse_and_reject() {
        assert_eq!("train_val".parse::<SplitName>().unwrap(), SplitName::TrainVal);
        let err = "validation".parse::<SplitName>().unwrap_err();
        assert!(matches!(err, GrapesetError::UnsupportedSplit(_)));

        let parsed = parse_split_names(&names(&["train,val", "train", " test "])).unwrap();
        assert_eq!(parsed, vec![SplitName::Train, SplitName::Val, SplitName::Test]);
        assert!(parse_split_names(&names(&["train,bogus"])).is_err());
        assert!(parse_split_names(&[]).is_err());
    }

    #[test]
    fn split_list_io() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("train.txt");
        fs::write(&path, "  B \n\nA\n\n").expect("write");
        assert_eq!(read_split_list(&path).unwrap(), names(&["B", "A"]));
        assert!(read_split_list(&temp.path().join("absent.txt")).unwrap().is_empty());

        write_split_list(&path, &names(&["B", "A"])).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "A\nB\n");
    }
}
