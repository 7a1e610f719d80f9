//! Zip packaging of rendered certificates.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// One certificate to pack: the participant name and the stored PDF.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub participant_name: String,
    pub pdf_path: PathBuf,
}

/// Entry names for `participant_names`, one per input, all distinct.
/// Colliding names get a ` (2)`, ` (3)`, ... suffix.
pub fn entry_names<'a>(participant_names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used = HashSet::new();
    participant_names
        .into_iter()
        .map(|name| {
            let stem = format!("{}_certificate", name.replace(['/', '\\'], "_"));
            let mut candidate = format!("{stem}.pdf");
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{stem} ({n}).pdf");
                n += 1;
            }
            candidate
        })
        .collect()
}

/// Build the archive at `path`. The zip is written beside its destination and
/// renamed into place once finished.
pub fn build_archive(path: &Path, entries: &[ArchiveEntry]) -> Result<(), ArchiveError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut zip = ZipWriter::new(NamedTempFile::new_in(dir)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let names = entry_names(entries.iter().map(|e| e.participant_name.as_str()));
    for (entry, name) in entries.iter().zip(names) {
        let bytes = fs::read(&entry.pdf_path)?;
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }

    let tmp = zip.finish()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
