//! Configuration types for the re-rasterisation pipeline.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the behaviour
//! the tool has always had: pages rendered at 600 DPI and embedded as
//! quality-95 JPEG. Both are ordinary fields here rather than constants
//! buried in the recombine stage, so a caller who wants a lossless rebuild
//! can say so explicitly.

use crate::error::RerasterError;
use crate::pipeline::render::Rasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Lowest accepted rendering resolution.
pub const MIN_DPI: u32 = 36;
/// Highest accepted rendering resolution.
///
/// A Letter page at 1200 DPI is already ~135 MP per page.
pub const MAX_DPI: u32 = 1200;
/// Rendering resolution used when none is configured.
pub const DEFAULT_DPI: u32 = 600;
/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Configuration for a single conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_reraster::{ConversionConfig, EmbedCodec};
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .codec(EmbedCodec::Lossless)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each page. Range: 36–1200. Default: 600.
    ///
    /// Pixel size of a page is `points × dpi / 72`, and because every rebuilt
    /// page is sized to its image in pixels, this also scales the page size
    /// of the output document.
    pub dpi: u32,

    /// How page images are compressed inside the rebuilt PDF. Default: JPEG q95.
    pub codec: EmbedCodec,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to a pdfium shared library.
    ///
    /// Falls back to `PDFIUM_LIB_PATH`, then the system library search path.
    pub pdfium_library: Option<PathBuf>,

    /// Parent directory for the per-run staging directory.
    ///
    /// `None` uses the system temp dir. The staging directory itself is
    /// always uniquely named and always removed when the run ends.
    pub staging_dir: Option<PathBuf>,

    /// Pre-constructed rasterizer. Takes precedence over the pdfium default.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            codec: EmbedCodec::default(),
            password: None,
            pdfium_library: None,
            staging_dir: None,
            rasterizer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("codec", &self.codec)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field("staging_dir", &self.staging_dir)
            .field(
                "rasterizer",
                &self.rasterizer.as_ref().map(|_| "<dyn Rasterizer>"),
            )
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn codec(mut self, codec: EmbedCodec) -> Self {
        self.config.codec = codec;
        self
    }

    /// Shorthand for `codec(EmbedCodec::jpeg(quality))`.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.codec = EmbedCodec::jpeg(quality);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(dir.into());
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, RerasterError> {
        let c = &self.config;
        if c.dpi < MIN_DPI || c.dpi > MAX_DPI {
            return Err(RerasterError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if let EmbedCodec::Jpeg { quality } = c.codec {
            if !(1..=100).contains(&quality) {
                return Err(RerasterError::InvalidConfig(format!(
                    "JPEG quality must be 1–100, got {quality}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How each rasterised page is stored inside the rebuilt PDF.
///
/// | Codec | PDF filter | Size | Fidelity |
/// |-------|-----------|------|----------|
/// | `Jpeg { quality: 95 }` | `/DCTDecode` | small | lossy (default) |
/// | `Lossless` | `/FlateDecode` | large | bit-exact RGB |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum EmbedCodec {
    /// Baseline RGB JPEG at the given quality (1–100).
    Jpeg { quality: u8 },
    /// zlib-compressed raw RGB samples.
    Lossless,
}

impl Default for EmbedCodec {
    fn default() -> Self {
        EmbedCodec::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EmbedCodec {
    /// JPEG codec with `quality` clamped to 1–100.
    pub fn jpeg(quality: u8) -> Self {
        EmbedCodec::Jpeg {
            quality: quality.clamp(1, 100),
        }
    }

    /// The PDF stream filter name this codec produces.
    pub fn pdf_filter(&self) -> &'static str {
        match self {
            EmbedCodec::Jpeg { .. } => "DCTDecode",
            EmbedCodec::Lossless => "FlateDecode",
        }
    }
}

impl fmt::Display for EmbedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedCodec::Jpeg { quality } => write!(f, "jpeg (q{quality})"),
            EmbedCodec::Lossless => f.write_str("lossless"),
        }
    }
}
