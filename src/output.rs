//! # Output — Certificate Record Files
//!
//! Saves and loads [`CertificateRecord`]s as pretty-printed JSON.
//!
//! Writes are atomic: the JSON goes to a sibling `.tmp` file which is then
//! renamed over the target, so a crash never leaves a half-written record
//! where a consumer expects a complete one.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::certificate::CertificateRecord;

/// Write `record` to `path` atomically.
pub fn save(path: &Path, record: &CertificateRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json.as_bytes())
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

/// Read a record previously written by [`save`] (or any producer of the same shape).
pub fn load(path: &Path) -> Result<CertificateRecord> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let record = serde_json::from_str(&data)
        .with_context(|| format!("parsing certificate record {}", path.display()))?;
    Ok(record)
}
