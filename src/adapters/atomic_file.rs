//! Whole-file writes that replace the target only once the content is complete.

use crate::domain::error::StockDataError;
use std::fs::File;
use std::path::Path;
use tempfile::Builder;

/// Run `write` against a temporary file next to `path`, then rename it over
/// `path`. On any failure the target is left untouched.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<(), StockDataError>
where
    F: FnOnce(&mut File) -> Result<(), StockDataError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = Builder::new()
        .prefix(".stockscope-")
        .suffix(".part")
        .tempfile_in(dir)?;

    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
