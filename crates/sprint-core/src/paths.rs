use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SPRINT_DIR: &str = ".sprint";
pub const DATA_DIR: &str = ".sprint/data";
pub const CONFIG_FILE: &str = ".sprint/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn sprint_dir(root: &Path) -> PathBuf {
    root.join(SPRINT_DIR)
}

pub fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Data file for one collection, e.g. `.sprint/data/stories.json`.
pub fn collection_path(root: &Path, file_name: &str) -> PathBuf {
    data_dir(root).join(file_name)
}
