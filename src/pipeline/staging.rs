//! Per-run staging area on disk.
//!
//! pdfium renders from a file path and the rendered pages are large (a Letter
//! page at 600 DPI is ~34 MP), so intermediate artefacts are staged on disk
//! rather than held in memory:
//!
//! ```text
//! reraster-XXXXXX/
//! ├── source.pdf
//! ├── output-images/page-0001.png …
//! └── output/
//!     ├── recreated_high_quality.pdf
//!     └── pdf_base64.txt
//! ```
//!
//! The root is a [`TempDir`], so the whole tree is removed when the
//! [`StagingArea`] is dropped, on the error path as much as on success. Each
//! run gets a unique directory name, so two runs in the same working
//! directory never share files.

use crate::error::RerasterError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const IMAGES_DIR: &str = "output-images";
const OUTPUT_DIR: &str = "output";

/// Scoped staging directory. Removed on drop.
#[derive(Debug)]
pub struct StagingArea {
    root: TempDir,
    images: PathBuf,
    output: PathBuf,
}

impl StagingArea {
    /// Create a fresh staging directory under `parent` (or the system temp dir).
    pub fn create(parent: Option<&Path>) -> Result<Self, RerasterError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("reraster-");

        let root = match parent {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| RerasterError::staging(dir, e))?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| {
            let at = parent
                .map(Path::to_path_buf)
                .unwrap_or_else(std::env::temp_dir);
            RerasterError::staging(at, e)
        })?;

        let images = root.path().join(IMAGES_DIR);
        let output = root.path().join(OUTPUT_DIR);
        for dir in [&images, &output] {
            std::fs::create_dir(dir).map_err(|e| RerasterError::staging(dir.as_path(), e))?;
        }

        debug!("Staging area created at {}", root.path().display());
        Ok(Self {
            root,
            images,
            output,
        })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Where the decoded input PDF is written.
    pub fn source_pdf_path(&self) -> PathBuf {
        self.root.path().join("source.pdf")
    }

    /// Directory the rasterizer writes page images into.
    pub fn images_dir(&self) -> &Path {
        &self.images
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    /// Where the rebuilt PDF is persisted.
    pub fn rebuilt_pdf_path(&self) -> PathBuf {
        self.output.join("recreated_high_quality.pdf")
    }

    /// Where the Base64 text of the rebuilt PDF is persisted.
    pub fn base64_path(&self) -> PathBuf {
        self.output.join("pdf_base64.txt")
    }

    /// Remove the staging tree now, reporting failures.
    ///
    /// Dropping the area also removes it, but silently.
    pub fn close(self) -> Result<(), RerasterError> {
        let path = self.root.path().to_path_buf();
        self.root
            .close()
            .map_err(|e| RerasterError::staging(&path, e))?;
        info!("Deleted staging folder: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_created() {
        let parent = tempfile::tempdir().unwrap();
        let staging = StagingArea::create(Some(parent.path())).unwrap();

        assert!(staging.root().starts_with(parent.path()));
        assert!(staging.images_dir().is_dir());
        assert!(staging.output_dir().is_dir());
        assert!(staging.rebuilt_pdf_path().starts_with(staging.output_dir()));
        assert!(staging.base64_path().starts_with(staging.output_dir()));
        assert_eq!(staging.source_pdf_path().parent(), Some(staging.root()));
    }

    #[test]
    fn drop_removes_everything() {
        let parent = tempfile::tempdir().unwrap();
        let root = {
            let staging = StagingArea::create(Some(parent.path())).unwrap();
            std::fs::write(staging.images_dir().join("page-0001.png"), b"x").unwrap();
            std::fs::write(staging.base64_path(), b"QQ==").unwrap();
            staging.root().to_path_buf()
        };
        assert!(!root.exists());
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn close_removes_everything() {
        let parent = tempfile::tempdir().unwrap();
        let staging = StagingArea::create(Some(parent.path())).unwrap();
        let root = staging.root().to_path_buf();
        staging.close().unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn concurrent_areas_do_not_collide() {
        let parent = tempfile::tempdir().unwrap();
        let a = StagingArea::create(Some(parent.path())).unwrap();
        let b = StagingArea::create(Some(parent.path())).unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn missing_parent_is_created() {
        let parent = tempfile::tempdir().unwrap();
        let nested = parent.path().join("a/b");
        let staging = StagingArea::create(Some(&nested)).unwrap();
        assert!(staging.root().starts_with(&nested));
    }
}
