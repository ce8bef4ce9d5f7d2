//! # pdf-reraster
//!
//! Re-rasterise a Base64-encoded PDF into an image-only PDF, Base64 in and
//! Base64 out.
//!
//! ## Why this crate?
//!
//! Some consumers of PDFs only need to display them and choke on everything
//! else a PDF can carry: odd fonts, broken text layers, forms, scripts,
//! annotations. Flattening every page into a high-resolution image and
//! rebuilding the document around those images yields a PDF that looks the
//! same and contains nothing but pictures.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Base64
//!  │
//!  ├─ 1. Decode     Base64 / data: URI → PDF bytes in a private staging dir
//!  ├─ 2. Rasterise  every page → PNG at 600 DPI via pdfium (spawn_blocking)
//!  ├─ 3. Recombine  PNG → JPEG q95 (or lossless zlib), one page per image,
//!  │                MediaBox = image size in pixels
//!  ├─ 4. Encode     rebuilt PDF → Base64
//!  └─ 5. Cleanup    staging dir removed on success *and* on failure
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_reraster::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = std::fs::read_to_string("document.b64")?;
//!     let config = ConversionConfig::default();
//!     let output = convert(&input, &config).await?;
//!     println!("{}", output.base64);
//!     eprintln!("{} pages, {} bytes", output.stats.page_count, output.stats.output_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-reraster` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-reraster = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime Requirement
//!
//! Rasterisation uses a pdfium shared library loaded at runtime. It is found
//! via [`ConversionConfigBuilder::pdfium_library`], then `PDFIUM_LIB_PATH`,
//! then the system library search path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, EmbedCodec};
pub use convert::{
    convert, convert_pdf_bytes, convert_sync, convert_to_file, decode_input, inspect,
};
pub use error::RerasterError;
pub use output::{ConversionOutput, ConversionStats, DocumentInfo, PageSummary};
pub use pipeline::render::{PageImage, PdfiumRasterizer, Rasterizer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
