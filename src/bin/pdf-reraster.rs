//! CLI binary for pdf-reraster.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_reraster::convert::write_atomic;
use pdf_reraster::{
    convert, convert_pdf_bytes, decode_input, inspect, ConversionConfig,
    ConversionProgressCallback, EmbedCodec, ProgressCallback, Stage,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while decoding and rasterising, then a page bar while the
/// rebuilt PDF is assembled.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Embedding");
        self.bar.reset_eta();
    }

    fn fail(&self, msg: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), msg);
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        self.bar.set_prefix(stage.to_string());
        let msg = match stage {
            Stage::Decode => "Base64 → PDF",
            Stage::Rasterize => "rendering pages…",
            Stage::Recombine => "building PDF…",
            Stage::Encode => "PDF → Base64",
        };
        self.bar.set_message(msg);
    }

    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendered {total_pages} pages, re-encoding…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, embedded_bytes: usize) {
        let elapsed_ms = self
            .page_started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>7} KiB", embedded_bytes / 1024)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, base64_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages rebuilt  {}",
            green("✔"),
            bold(&total_pages.to_string()),
            dim(&format!("{base64_len} Base64 chars")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion, writes ./pdf_base64.txt
  pdf-reraster document.b64

  # Read Base64 from stdin
  base64 -w0 scan.pdf | pdf-reraster - -o out.b64

  # Keep the rebuilt and the decoded source PDFs too
  pdf-reraster document.b64 --pdf rebuilt.pdf --source original.pdf

  # Smaller output
  pdf-reraster --dpi 200 --quality 80 document.b64

  # Bit-exact page images (large files)
  pdf-reraster --codec lossless document.b64

  # Page count only, no rendering
  pdf-reraster --inspect-only document.b64

  # JSON summary with per-page sizes
  pdf-reraster --json document.b64 > summary.json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH           Path to libpdfium (or its directory)
  PDF_RERASTER_OUTPUT       Default for -o/--output
  PDF_RERASTER_DPI          Default for --dpi
  PDF_RERASTER_CODEC        Default for --codec
  PDF_RERASTER_QUALITY      Default for --quality
  PDF_RERASTER_STAGING_DIR  Default for --staging-dir
  RUST_LOG                  Overrides the log filter

SETUP:
  pdfium is loaded at runtime. Install it system-wide, or point
  PDFIUM_LIB_PATH / --pdfium-lib at a copy from
  https://github.com/bblanchon/pdfium-binaries.
"#;

/// Re-rasterise a Base64-encoded PDF into an image-only PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-reraster",
    version,
    about = "Re-rasterise a Base64-encoded PDF into an image-only PDF",
    long_about = "Decode a Base64 PDF, render every page to an image at high DPI, rebuild a PDF \
with one image per page sized to the image, and write the Base64 of the result. \
Intermediate files live in a private staging directory that is always removed.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File containing Base64 text, or `-` for stdin (the default).
    input: Option<PathBuf>,

    /// Where to write the Base64 of the rebuilt PDF.
    #[arg(short, long, env = "PDF_RERASTER_OUTPUT", default_value = "pdf_base64.txt")]
    output: PathBuf,

    /// Also write the rebuilt PDF here.
    #[arg(long, env = "PDF_RERASTER_PDF")]
    pdf: Option<PathBuf>,

    /// Also write the decoded source PDF here.
    #[arg(long, env = "PDF_RERASTER_SOURCE")]
    source: Option<PathBuf>,

    /// Rendering DPI (36–1200).
    #[arg(long, env = "PDF_RERASTER_DPI", default_value_t = 600,
          value_parser = clap::value_parser!(u32).range(36..=1200))]
    dpi: u32,

    /// How page images are stored in the rebuilt PDF.
    #[arg(long, env = "PDF_RERASTER_CODEC", value_enum, default_value = "jpeg")]
    codec: CodecArg,

    /// JPEG quality (1–100). Ignored with `--codec lossless`.
    #[arg(long, env = "PDF_RERASTER_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_RERASTER_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library (or its directory).
    #[arg(long, env = "PDF_RERASTER_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Parent directory for the per-run staging directory.
    #[arg(long, env = "PDF_RERASTER_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Print the page count only, no conversion.
    #[arg(long, env = "PDF_RERASTER_INSPECT_ONLY")]
    inspect_only: bool,

    /// Print a JSON summary to stdout.
    #[arg(long, env = "PDF_RERASTER_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_RERASTER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_RERASTER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_RERASTER_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CodecArg {
    Jpeg,
    Lossless,
}

impl Cli {
    fn embed_codec(&self) -> EmbedCodec {
        match self.codec {
            CodecArg::Jpeg => EmbedCodec::jpeg(self.quality),
            CodecArg::Lossless => EmbedCodec::Lossless,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar stands in for INFO logs unless -v asks for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let input = read_input(cli.input.as_deref()).await?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let info = inspect(&input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize document info")?
            );
        } else {
            println!("Input:        {}", input_label(cli.input.as_deref()));
            println!("Pages:        {}", info.page_count);
            println!("Size:         {} bytes", info.source_bytes);
            println!("PDF header:   {}", if info.is_pdf { "yes" } else { "no" });
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn ConversionProgressCallback>),
    )?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = match cli.source {
        Some(ref source_path) => {
            let bytes = decode_input(&input, &config).context("Failed to decode input")?;
            write_atomic(source_path, &bytes)
                .await
                .context("Failed to write source PDF")?;
            convert_pdf_bytes(&bytes, &config).await
        }
        None => convert(&input, &config).await,
    };

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if let Some(ref cb) = progress {
                cb.fail("Conversion failed");
            }
            return Err(e).context("Conversion failed");
        }
    };

    write_atomic(&cli.output, output.base64.as_bytes())
        .await
        .context("Failed to write Base64 output")?;
    if let Some(ref pdf_path) = cli.pdf {
        write_atomic(pdf_path, &output.pdf)
            .await
            .context("Failed to write rebuilt PDF")?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} pages  {} DPI  {}  {}ms  →  {}",
            green("✔"),
            stats.page_count,
            stats.dpi,
            stats.codec,
            stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        eprintln!(
            "   {} → {} bytes  {}",
            dim(&stats.source_bytes.to_string()),
            dim(&stats.output_bytes.to_string()),
            dim(&format!(
                "(render {}ms, recombine {}ms)",
                stats.render_duration_ms, stats.recombine_duration_ms
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .codec(cli.embed_codec());

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib);
    }
    if let Some(ref dir) = cli.staging_dir {
        builder = builder.staging_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Read the whole Base64 payload from a file, or stdin for `-`/absent.
async fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(p) = path.filter(|p| *p != Path::new("-")) {
        return tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("Failed to read input from {}", p.display()));
    }

    let read = tokio::task::spawn_blocking(|| {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map(|_| buf)
    });
    let text = read.await.context("stdin reader panicked")?;
    text.context("Failed to read input from stdin")
}

fn input_label(path: Option<&Path>) -> String {
    match path {
        Some(p) if p != Path::new("-") => p.display().to_string(),
        _ => "<stdin>".to_string(),
    }
}
