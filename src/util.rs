use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

/// Opens `path`, annotating any failure with the `kind` of file expected
/// there (e.g. "project" or "template").
pub fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).with_context(|| format!("Opening {} file `{}`", kind, path.display()))
}

