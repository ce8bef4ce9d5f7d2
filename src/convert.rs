//! Conversion entry points: the whole pipeline, start to finish.
//!
//! ```text
//! start → staging → decode → rasterize → guard(non-empty) → recombine
//!       → encode → persist → release staging → done
//! ```
//!
//! Every stage returns a `Result` and the first error short-circuits the run.
//! The [`StagingArea`] is owned by the run, so an early return drops it and
//! removes every intermediate file; the success path closes it explicitly so
//! a removal failure is at least logged.

use crate::config::ConversionConfig;
use crate::error::RerasterError;
use crate::output::{ConversionOutput, ConversionStats, DocumentInfo};
use crate::pipeline::render::{self, PdfiumRasterizer, Rasterizer};
use crate::pipeline::staging::StagingArea;
use crate::pipeline::{assemble, decode, encode};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a Base64-encoded PDF into the Base64 of its re-rasterised copy.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`  — Base64 text, optionally a `data:application/pdf;base64,` URI
/// * `config` — Conversion configuration
///
/// # Errors
/// The first failing stage's error. In particular
/// [`RerasterError::NoPagesRendered`] if rasterisation produced nothing.
/// No staging files survive an `Err`.
pub async fn convert(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, RerasterError> {
    let total_start = Instant::now();
    info!(
        "Starting conversion ({} Base64 chars)",
        input.as_ref().len()
    );

    let source = decode_input(input, config)?;

    run_pipeline(source, config, total_start).await
}

/// Run only the decode stage, reporting it to the progress callback.
///
/// Pair with [`convert_pdf_bytes`] when the decoded source is needed as
/// well as the converted result.
pub fn decode_input(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<Vec<u8>, RerasterError> {
    notify_stage(config, Stage::Decode);
    decode::decode_base64(input.as_ref())
}

/// Convert raw PDF bytes, skipping the Base64 decode step.
pub async fn convert_pdf_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, RerasterError> {
    let total_start = Instant::now();
    info!("Starting conversion ({} PDF bytes)", bytes.len());
    run_pipeline(bytes.to_vec(), config, total_start).await
}

/// Convert and write the Base64 result directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, RerasterError> {
    let output = convert(input, config).await?;
    write_atomic(output_path.as_ref(), output.base64.as_bytes()).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, RerasterError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| RerasterError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Decode a Base64 payload and report its page count without rendering.
///
/// Always uses pdfium, even when `config.rasterizer` is set.
pub async fn inspect(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<DocumentInfo, RerasterError> {
    let source = decode::decode_base64(input.as_ref())?;
    let staging = StagingArea::create(config.staging_dir.as_deref())?;
    let source_path = staging.source_pdf_path();
    decode::write_pdf(&source, &source_path)?;

    let page_count = render::page_count(&source_path, pdfium_rasterizer(config)).await?;

    Ok(DocumentInfo {
        page_count,
        source_bytes: source.len(),
        is_pdf: source.starts_with(b"%PDF"),
    })
}

/// Write `bytes` to `path` via a sibling temp file and rename.
///
/// Parent directories are created as needed.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RerasterError> {
    let fail = |source| RerasterError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp_path = tmp_sibling(path);
    tokio::fs::write(&tmp_path, bytes).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_pipeline(
    source: Vec<u8>,
    config: &ConversionConfig,
    total_start: Instant,
) -> Result<ConversionOutput, RerasterError> {
    let staging = StagingArea::create(config.staging_dir.as_deref())?;
    debug!("Staging run in {}", staging.root().display());

    // ── Step 1: Stage the source PDF ─────────────────────────────────────
    let source_path = staging.source_pdf_path();
    decode::write_pdf(&source, &source_path)?;

    // ── Step 2: Rasterise ────────────────────────────────────────────────
    notify_stage(config, Stage::Rasterize);
    let render_start = Instant::now();
    let pages = render::rasterize_pages(
        resolve_rasterizer(config),
        &source_path,
        config.dpi,
        staging.images_dir(),
    )
    .await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    if pages.is_empty() {
        return Err(RerasterError::NoPagesRendered);
    }
    info!(
        "PDF converted to {} images at {} DPI in {}ms",
        pages.len(),
        config.dpi,
        render_duration_ms
    );

    let page_count = pages.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(page_count);
    }

    // ── Step 3: Recombine ────────────────────────────────────────────────
    notify_stage(config, Stage::Recombine);
    let recombine_start = Instant::now();
    let rebuilt_path = staging.rebuilt_pdf_path();
    let codec = config.codec;
    let progress = config.progress_callback.clone();
    let rebuilt = tokio::task::spawn_blocking(move || {
        assemble::recombine(&pages, codec, &rebuilt_path, progress.as_ref())
    })
    .await
    .map_err(|e| RerasterError::Internal(format!("Recombine task panicked: {}", e)))??;
    let recombine_duration_ms = recombine_start.elapsed().as_millis() as u64;

    // ── Step 4: Encode and persist ───────────────────────────────────────
    notify_stage(config, Stage::Encode);
    let base64 = encode::encode_base64(&rebuilt.bytes);
    encode::write_base64(&base64, &staging.base64_path())?;
    debug!("Outputs staged in {}", staging.output_dir().display());

    // ── Step 5: Release staging ──────────────────────────────────────────
    if let Err(e) = staging.close() {
        warn!("Could not remove staging area: {}", e);
    }

    let stats = ConversionStats {
        page_count,
        dpi: config.dpi,
        codec,
        source_bytes: source.len(),
        output_bytes: rebuilt.bytes.len(),
        base64_len: base64.len(),
        render_duration_ms,
        recombine_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {} → {} bytes, {}ms total",
        page_count, stats.source_bytes, stats.output_bytes, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(page_count, base64.len());
    }

    Ok(ConversionOutput {
        base64,
        pdf: rebuilt.bytes,
        pages: rebuilt.pages,
        stats,
    })
}

/// Caller-supplied rasterizer first, pdfium otherwise.
fn resolve_rasterizer(config: &ConversionConfig) -> Arc<dyn Rasterizer> {
    match config.rasterizer {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(pdfium_rasterizer(config)),
    }
}

fn pdfium_rasterizer(config: &ConversionConfig) -> PdfiumRasterizer {
    let mut rasterizer = PdfiumRasterizer::new();
    if let Some(ref lib) = config.pdfium_library {
        rasterizer = rasterizer.with_library(lib);
    }
    if let Some(ref pwd) = config.password {
        rasterizer = rasterizer.with_password(pwd);
    }
    rasterizer
}

fn notify_stage(config: &ConversionConfig, stage: Stage) {
    debug!("Stage: {}", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage(stage);
    }
}

/// `out/result.txt` → `out/.result.txt.tmp`
fn tmp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
