//! Saving and loading the text buffer as UTF-8 files.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

/// Timestamped default filename for Save Text, e.g.
/// `auto_typer_text_20260828_141503.txt`.
pub fn default_save_name() -> String {
    Local::now()
        .format("auto_typer_text_%Y%m%d_%H%M%S.txt")
        .to_string()
}

/// Write `text` to `path` as UTF-8, creating parent directories as needed.
pub fn save_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}

/// Read a UTF-8 text file into a string.
pub fn load_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}
