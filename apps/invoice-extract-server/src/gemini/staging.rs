//! Scoped staging of document bytes
//!
//! The upload reads the document from a temporary file. The file lives exactly
//! as long as the [`StagedDocument`] value and is removed on drop, so every
//! exit path of a generation call (including `?` on a remote failure) cleans up.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// A document written to a temporary `.pdf` file
pub struct StagedDocument {
    file: NamedTempFile,
}

impl StagedDocument {
    /// Write `bytes` to a fresh temporary file inside `dir`
    ///
    /// The write runs on the blocking pool; documents can be tens of MiB.
    pub async fn stage_in(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        let dir = dir.to_path_buf();
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || Self::write_in(&dir, &bytes))
            .await
            .map_err(io::Error::other)?
    }

    fn write_in(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("invoice-")
            .suffix(".pdf")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!("Staged {} bytes at {}", bytes.len(), file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the staged bytes back for upload
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }
}
