//! Write-temp-then-rename JSON files.

use std::io::Write;
use std::path::Path;

use growth_core::{Result, SimError};
use serde::Serialize;
use tempfile::NamedTempFile;

/// Write `value` as pretty JSON to `path`.
///
/// The JSON is written to a temporary file in the same directory and renamed
/// over `path`, so readers see either the previous content or the complete
/// new content. Missing parent directories are created.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    what: &str,
) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| SimError::Serialization {
        what: what.to_string(),
        source,
    })?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| SimError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SimError::io(dir, e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|_| tmp.write_all(b"\n"))
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SimError::io(path, e))?;
    tmp.persist(path).map_err(|e| SimError::io(path, e.error))?;
    Ok(())
}
