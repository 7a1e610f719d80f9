//! On-disk layout under the configured data directory:
//!
//! ```text
//! {data_dir}/templates/{template_id}{ext}
//! {data_dir}/certificates/{certificate_id}.pdf
//! {data_dir}/certificates/certificates_{job_id}.zip
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create the directory tree if needed.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let storage = Self { root: root.into() };
        fs::create_dir_all(storage.templates_dir())?;
        fs::create_dir_all(storage.certificates_dir())?;
        Ok(storage)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn certificates_dir(&self) -> PathBuf {
        self.root.join("certificates")
    }

    /// `ext` includes the leading dot.
    pub fn template_path(&self, id: &str, ext: &str) -> PathBuf {
        self.templates_dir().join(format!("{id}{ext}"))
    }

    /// Locate the stored file of a template whatever its extension.
    pub fn find_template_file(&self, id: &str) -> io::Result<Option<PathBuf>> {
        let prefix = format!("{id}.");
        for entry in fs::read_dir(self.templates_dir())? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    pub fn certificate_path(&self, id: &str) -> PathBuf {
        self.certificates_dir().join(format!("{id}.pdf"))
    }

    pub fn archive_name(job_id: &str) -> String {
        format!("certificates_{job_id}.zip")
    }

    /// Resolve a client-supplied archive file name. Names that could escape
    /// the certificates directory are rejected.
    pub fn archive_path(&self, name: &str) -> Option<PathBuf> {
        let plain = !name.is_empty()
            && !name.contains(['/', '\\'])
            && !name.contains("..")
            && name.ends_with(".zip");
        plain.then(|| self.certificates_dir().join(name))
    }
}

/// File extension for an uploaded template, taken from the client file name
/// when it is a plain alphanumeric suffix.
pub fn upload_extension(filename: Option<&str>, fallback: &str) -> String {
    filename
        .and_then(|f| Path::new(f).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_else(|| fallback.to_string())
}

/// Write `bytes` to a temporary file next to `path`, then rename it into
/// place, so readers never observe a partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
