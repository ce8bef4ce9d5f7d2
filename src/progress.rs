//! Progress-callback trait for stage and per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages and embeds each page.
//!
//! # Example
//!
//! ```rust
//! use pdf_reraster::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     embedded: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, embedded_bytes: usize) {
//!         self.embedded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} embedded ({} bytes)", page_num, total_pages, embedded_bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { embedded: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Rasterize,
    Recombine,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Decode => "Decoding",
            Stage::Rasterize => "Rasterising",
            Stage::Recombine => "Recombining",
            Stage::Encode => "Encoding",
        };
        f.write_str(s)
    }
}

/// Called by the conversion pipeline as it runs.
///
/// Pages are processed sequentially, but the recombine stage runs on
/// Tokio's blocking pool, so implementations must be `Send + Sync`. All
/// methods have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when the pipeline enters a stage.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once rasterisation is done and the page count is known.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page image is re-encoded.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page has been embedded into the rebuilt PDF.
    ///
    /// `embedded_bytes` is the size of the re-encoded image stream.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, embedded_bytes: usize) {
        let _ = (page_num, total_pages, embedded_bytes);
    }

    /// Called once after the Base64 output has been produced.
    fn on_conversion_complete(&self, total_pages: usize, base64_len: usize) {
        let _ = (total_pages, base64_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
