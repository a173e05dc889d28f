//! Temporary storage for uploaded workbooks.
//!
//! Every upload gets its own uniquely named file under the upload directory,
//! `upload-<unix millis>-<random><.ext>`. The original extension is kept so
//! the decoder can be picked from it without probing every format.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info, instrument};

use crate::application::{ApplicationResult, IoResultExt};

/// Upload directory manager.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    keep_files: bool,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, keep_files: bool) -> Self {
        Self {
            dir: dir.into(),
            keep_files,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a fresh file, creating the upload directory on demand.
    #[instrument(level = "debug", skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> ApplicationResult<StoredUpload> {
        std::fs::create_dir_all(&self.dir).with_path_context("create upload directory", &self.dir)?;

        let prefix = format!("upload-{}-", Utc::now().timestamp_millis());
        let suffix = extension_of(original_name)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let mut file = Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(&self.dir)
            .with_path_context("create upload file", &self.dir)?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .with_path_context("write upload file", file.path())?;
        debug!("stored upload {} as {}", original_name, file.path().display());

        if self.keep_files {
            let (_, path) = file
                .keep()
                .map_err(|e| e.error)
                .with_path_context("keep upload file", &self.dir)?;
            return Ok(StoredUpload::Kept(path));
        }
        Ok(StoredUpload::Temporary(file))
    }
}

/// An uploaded file on disk.
///
/// Temporary uploads are removed by [`discard`](Self::discard) or, failing
/// that, when dropped.
#[derive(Debug)]
pub enum StoredUpload {
    Temporary(NamedTempFile),
    Kept(PathBuf),
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        match self {
            StoredUpload::Temporary(file) => file.path(),
            StoredUpload::Kept(path) => path,
        }
    }

    /// Remove the file now, reporting a failed delete.
    pub fn discard(self) -> ApplicationResult<()> {
        match self {
            StoredUpload::Temporary(file) => {
                let path = file.path().to_path_buf();
                file.close().with_path_context("remove upload file", &path)?;
                debug!("removed upload {}", path.display());
                Ok(())
            }
            StoredUpload::Kept(path) => {
                info!("keeping upload {}", path.display());
                Ok(())
            }
        }
    }
}

/// Lower-cased extension of an uploaded file name, if it is plain ASCII.
fn extension_of(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("data.xlsx", Some("xlsx"))]
    #[case("DATA.XLS", Some("xls"))]
    #[case("../../etc/passwd", None)]
    #[case("weird.x$s", None)]
    #[case("noext", None)]
    fn test_extension_of(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(extension_of(name).as_deref(), expected);
    }

    #[test]
    fn test_store_then_discard_removes_file() {
        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path().join("uploads"), false);

        let upload = store.store("book.xlsx", b"payload").unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "xlsx");
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");

        upload.discard().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_concurrent_uploads_get_distinct_files() {
        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path(), false);

        let a = store.store("same.xlsx", b"a").unwrap();
        let b = store.store("same.xlsx", b"b").unwrap();

        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_keep_files_leaves_upload_on_disk() {
        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path(), true);

        let upload = store.store("book.ods", b"x").unwrap();
        let path = upload.path().to_path_buf();
        upload.discard().unwrap();

        assert!(path.exists());
    }
}
