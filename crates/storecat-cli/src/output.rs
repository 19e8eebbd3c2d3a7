//! CSV output.
//!
//! The file is written in full to a temporary sibling and then renamed over
//! the target, so a reader never observes a half-written catalog.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

/// Writes `headers` followed by one row per record to `path`.
///
/// The header row is always written, including when `records` is empty.
pub(crate) fn write_csv<T: Serialize>(
    path: &Path,
    headers: &[&str],
    records: &[T],
) -> anyhow::Result<()> {
    let tmp = temp_sibling(path);
    if let Err(e) = write_rows(&tmp, headers, records) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e)
            .with_context(|| format!("failed to move output into place at {}", path.display()));
    }
    tracing::debug!(path = %path.display(), rows = records.len(), "csv written");
    Ok(())
}

fn write_rows<T: Serialize>(tmp: &Path, headers: &[&str], records: &[T]) -> anyhow::Result<()> {
    // Headers come from the caller; serde would omit them for an empty run.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp)
        .with_context(|| format!("failed to create {}", tmp.display()))?;
    writer.write_record(headers)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", tmp.display()))?;
    Ok(())
}

/// `dir/name.csv` becomes `dir/.name.csv.tmp`.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| "output".as_ref()));
    name.push(".tmp");
    path.with_file_name(name)
}
