//! Pipeline stages for Base64-PDF re-rasterisation.
//!
//! Each submodule implements exactly one transformation step and returns
//! `Result<_, RerasterError>`; none of them logs a failure and carries on.
//!
//! ## Data Flow
//!
//! ```text
//! decode ──▶ render ──▶ reencode ──▶ assemble ──▶ encode
//! (base64)   (pdfium)   (jpeg/zlib)  (lopdf)      (base64)
//!            └──────────── staging (TempDir) ────────────┘
//! ```
//!
//! 1. [`decode`]   — Base64 (or `data:` URI) → PDF bytes in staging
//! 2. [`render`]   — rasterise every page to PNG; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`reencode`] — PNG → JPEG or zlib-compressed RGB for embedding
//! 4. [`assemble`] — one page per image, sized to the image in pixels
//! 5. [`encode`]   — rebuilt PDF → Base64 text
//!
//! [`staging`] owns every intermediate file and removes them on drop.

pub mod assemble;
pub mod decode;
pub mod encode;
pub mod reencode;
pub mod render;
pub mod staging;
