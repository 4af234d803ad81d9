pub mod activity;
pub mod assist;
pub mod config;
pub mod init;
pub mod retro;
pub mod sprint;
pub mod standup;
pub mod stats;
pub mod story;

use sprint_core::{paths, SprintError, Store};
use std::path::Path;

/// File-backed store for an initialized project.
pub fn open_store(root: &Path) -> anyhow::Result<Store> {
    if !paths::sprint_dir(root).is_dir() {
        return Err(SprintError::NotInitialized.into());
    }
    Ok(Store::open(root))
}

/// Turn a non-empty list of validation messages into an error.
pub fn ensure_valid(errors: Vec<String>) -> anyhow::Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SprintError::Validation(errors).into())
    }
}
