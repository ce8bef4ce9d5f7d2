//! Result types returned by the conversion entry points.

use crate::config::EmbedCodec;
use serde::Serialize;

/// Everything a successful run produces.
///
/// `pdf` is excluded from JSON output; `base64` carries the same bytes.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Base64 (standard alphabet, padded) of the rebuilt PDF.
    pub base64: String,
    /// Raw bytes of the rebuilt PDF.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    /// One entry per output page, in page order.
    pub pages: Vec<PageSummary>,
    pub stats: ConversionStats,
}

/// Shape of a single rebuilt page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Page width in image pixels (also the MediaBox width).
    pub width: u32,
    /// Page height in image pixels (also the MediaBox height).
    pub height: u32,
    /// Size of the embedded image stream.
    pub embedded_bytes: usize,
}

/// Timing and size statistics for a run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    pub page_count: usize,
    pub dpi: u32,
    pub codec: EmbedCodec,
    /// Decoded input PDF size.
    pub source_bytes: usize,
    /// Rebuilt PDF size.
    pub output_bytes: usize,
    pub base64_len: usize,
    pub render_duration_ms: u64,
    pub recombine_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// What `inspect` learns about a payload without rendering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    /// Decoded payload size.
    pub source_bytes: usize,
    /// Whether the payload starts with a `%PDF` header.
    pub is_pdf: bool,
}
