//! PDF rasterisation: render every page to a PNG in the staging area.
//!
//! ## Why a trait?
//!
//! [`Rasterizer`] is the one seam in the pipeline that talks to a native
//! library. The default [`PdfiumRasterizer`] needs a pdfium shared library at
//! runtime; tests and embedders can plug in their own implementation through
//! [`crate::config::ConversionConfigBuilder::rasterizer`].
//!
//! ## Why return the page list?
//!
//! Page order is carried explicitly as [`PageImage::index`]. The staging
//! directory is never listed to rediscover what was rendered: directory
//! enumeration order is filesystem-dependent, and `page-10.png` sorts before
//! `page-2.png` lexically anyway.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is CPU-bound and not async-safe. [`rasterize_pages`] moves the work
//! onto Tokio's blocking pool so the runtime's worker threads never stall.

use crate::error::RerasterError;
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// PDF user space is 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// One rendered page, staged on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 0-based page index in the source document.
    pub index: usize,
    /// Location of the rendered image.
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Renders a PDF file into one image per page.
pub trait Rasterizer: Send + Sync {
    /// Render every page of `pdf_path` at `dpi` into `out_dir`.
    ///
    /// Implementations must return one entry per page, each with its page
    /// index. They should not return an empty list for a document that has
    /// pages; the orchestrator treats an empty list as a failure.
    fn rasterize(
        &self,
        pdf_path: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PageImage>, RerasterError>;
}

/// Canonical file name for a staged page image (1-indexed, zero-padded).
pub fn page_image_path(out_dir: &Path, index: usize) -> PathBuf {
    out_dir.join(format!("page-{:04}.png", index + 1))
}

/// Pixel size of a page edge of `points` length rendered at `dpi`.
pub fn points_to_pixels(points: f32, dpi: u32) -> i32 {
    ((points * dpi as f32 / POINTS_PER_INCH).round() as i32).max(1)
}

// ── pdfium backend ───────────────────────────────────────────────────────

/// Default rasterizer backed by pdfium-render.
#[derive(Clone, Default)]
pub struct PdfiumRasterizer {
    library: Option<PathBuf>,
    password: Option<String>,
}

impl fmt::Debug for PdfiumRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfiumRasterizer")
            .field("library", &self.library)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the pdfium library at `path` instead of searching for one.
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library = Some(path.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Count pages without rendering anything.
    pub fn page_count(&self, pdf_path: &Path) -> Result<usize, RerasterError> {
        let pdfium = bind_pdfium(self.library.as_deref())?;
        let document = open_document(&pdfium, pdf_path, self.password.as_deref())?;
        Ok(document.pages().len() as usize)
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        pdf_path: &Path,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PageImage>, RerasterError> {
        let pdfium = bind_pdfium(self.library.as_deref())?;
        let document = open_document(&pdfium, pdf_path, self.password.as_deref())?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!(
            "PDF loaded: {} pages, rendering at {} DPI",
            total_pages, dpi
        );

        let mut results = Vec::with_capacity(total_pages);

        for idx in 0..total_pages {
            let page = pages
                .get(idx as u16)
                .map_err(|e| RerasterError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

            let render_config = PdfRenderConfig::new()
                .set_target_width(points_to_pixels(page.width().value, dpi))
                .set_target_height(points_to_pixels(page.height().value, dpi));

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                RerasterError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            let path = page_image_path(out_dir, idx);
            image
                .save_with_format(&path, ImageFormat::Png)
                .map_err(|e| RerasterError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("PNG write to {} failed: {}", path.display(), e),
                })?;

            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );

            results.push(PageImage {
                index: idx,
                path,
                width: image.width(),
                height: image.height(),
            });
        }

        Ok(results)
    }
}

/// Bind pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system library.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, RerasterError> {
    let candidate = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match candidate {
        Some(path) => {
            let path = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path).map_err(|e| {
                RerasterError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
            })?
        }
        None => Pdfium::bind_to_system_library()
            .map_err(|e| RerasterError::PdfiumBindingFailed(e.to_string()))?,
    };

    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, RerasterError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                RerasterError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                RerasterError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            RerasterError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

// ── async wrappers ───────────────────────────────────────────────────────

/// Run `rasterizer` on the blocking pool and return pages in page order.
///
/// # Errors
/// Whatever the rasterizer returns, plus [`RerasterError::DuplicatePage`] if
/// two entries share an index.
pub async fn rasterize_pages(
    rasterizer: Arc<dyn Rasterizer>,
    pdf_path: &Path,
    dpi: u32,
    out_dir: &Path,
) -> Result<Vec<PageImage>, RerasterError> {
    let path = pdf_path.to_path_buf();
    let out = out_dir.to_path_buf();

    let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&path, dpi, &out))
        .await
        .map_err(|e| RerasterError::Internal(format!("Render task panicked: {}", e)))??;

    order_pages(pages)
}

/// Count pages of a PDF on disk without rendering.
pub async fn page_count(
    pdf_path: &Path,
    rasterizer: PdfiumRasterizer,
) -> Result<usize, RerasterError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || rasterizer.page_count(&path))
        .await
        .map_err(|e| RerasterError::Internal(format!("Page-count task panicked: {}", e)))?
}

/// Sort by page index and reject duplicate indices.
pub fn order_pages(mut pages: Vec<PageImage>) -> Result<Vec<PageImage>, RerasterError> {
    pages.sort_by_key(|p| p.index);
    if let Some(dup) = pages.windows(2).find(|w| w[0].index == w[1].index) {
        return Err(RerasterError::DuplicatePage {
            page: dup[0].index + 1,
        });
    }
    Ok(pages)
}
