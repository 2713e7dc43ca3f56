//! Label map for the interactive labeling tool.
//!
//! The tool reads `labelmap.json`, an array of objects with a keyboard
//! shortcut per class. Index 0 is the background placeholder.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GrapesetError;

pub const LABELMAP_FILE_NAME: &str = "labelmap.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMapEntry {
    pub object_id: u32,
    pub label_id: u32,
    pub keyboard_shortcut: String,
    pub object_name: String,
}

impl LabelMapEntry {
    fn new(id: u32, keyboard_shortcut: &str, object_name: &str) -> Self {
        Self {
            object_id: id,
            label_id: id,
            keyboard_shortcut: keyboard_shortcut.to_string(),
            object_name: object_name.to_string(),
        }
    }
}

/// Background plus the single grape class.
pub fn default_labelmap() -> Vec<LabelMapEntry> {
    vec![
        LabelMapEntry::new(0, "0", "background"),
        LabelMapEntry::new(1, "1", "grape"),
    ]
}

/// Writes `labelmap.json` into `dir` and returns the written path.
pub fn write_labelmap(dir: &Path) -> Result<PathBuf, GrapesetError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(LABELMAP_FILE_NAME);

    let file = File::create(&path).map_err(GrapesetError::Io)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &default_labelmap()).map_err(|source| {
        GrapesetError::LabelMapWrite {
            path: path.clone(),
            source,
        }
    })?;
    writer.flush()?;

    Ok(path)
}
