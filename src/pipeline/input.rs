//! Request workspace: a private temp directory holding the staged upload and
//! every intermediate file of one conversion.
//!
//! The engine needs a file-system path, so the upload is written to disk.
//! Everything lives under one `TempDir`; dropping the [`Workspace`] removes
//! it on every exit path (success, validation failure, engine error, panic).
//! Each request gets its own directory, so concurrent conversions never
//! collide.

use crate::error::Pdf2DocxError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Prefix of every workspace directory.
pub const WORKSPACE_PREFIX: &str = "pdf2docx-";

/// Name of the staged upload inside the workspace.
pub const STAGED_PDF: &str = "input.pdf";

/// A request-scoped temp directory.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> Result<Self, Pdf2DocxError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(r) => builder.tempdir_in(r),
            None => builder.tempdir(),
        }
        .map_err(|source| Pdf2DocxError::TempStorage { source })?;
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write the upload to `input.pdf` and return its path.
    pub async fn stage(&self, bytes: &[u8]) -> Result<PathBuf, Pdf2DocxError> {
        let path = self.file(STAGED_PDF);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| Pdf2DocxError::StagingFailed {
                path: path.clone(),
                source,
            })?;
        debug!("Staged {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Write an intermediate file into the workspace.
    pub async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, Pdf2DocxError> {
        let path = self.file(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| Pdf2DocxError::StagingFailed {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Read an intermediate file back.
    ///
    /// A missing file is reported by the caller's own error (the producer
    /// is the one that failed), so `NotFound` is returned as `Ok(None)`.
    pub async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, Pdf2DocxError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Pdf2DocxError::ArtifactReadFailed {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Remove the workspace now, logging rather than failing on error.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove workspace {}: {}", path.display(), e);
        } else {
            debug!("Removed workspace {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn workspace_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let ws = Workspace::create(Some(root.path())).unwrap();
            ws.stage(b"%PDF-1.4").await.unwrap();
            assert!(ws.file(STAGED_PDF).exists());
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn workspaces_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let a = Workspace::create(Some(root.path())).unwrap();
        let b = Workspace::create(Some(root.path())).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_PREFIX));
        a.close();
        b.close();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn reading_a_missing_file_is_none() {
        let ws = Workspace::create(None).unwrap();
        let missing = ws.file("nope.docx");
        assert!(ws.read(&missing).await.unwrap().is_none());

        let written = ws.write("x.bin", b"abc").await.unwrap();
        assert_eq!(ws.read(&written).await.unwrap().unwrap(), b"abc");
    }

    #[test]
    fn missing_root_is_a_resource_error() {
        let err = Workspace::create(Some(Path::new("/definitely/not/a/real/dir"))).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resource);
    }
}
