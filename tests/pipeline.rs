//! Full-pipeline tests that swap pdfium for an in-process rasterizer.
//!
//! The fake writes solid-colour PNGs of preset sizes into the staging
//! directory, so every stage after rasterisation runs for real.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::Document;
use pdf_reraster::pipeline::render::page_image_path;
use pdf_reraster::{
    convert, convert_pdf_bytes, convert_sync, convert_to_file, decode_input, ConversionConfig,
    ConversionProgressCallback, EmbedCodec, PageImage, Rasterizer, RerasterError, Stage,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SOURCE: &[u8] = b"%PDF-1.4\n%fake source, never parsed by the fake rasterizer\n%%EOF\n";

// ── Fakes ────────────────────────────────────────────────────────────────

/// Renders one PNG per `(width, height)` entry.
struct FakeRasterizer {
    pages: Vec<(u32, u32)>,
    /// Return entries last-to-first to prove the pipeline re-orders them.
    reversed: bool,
    /// Write garbage instead of a PNG for this 0-based index.
    corrupt: Option<usize>,
}

impl FakeRasterizer {
    fn new(pages: Vec<(u32, u32)>) -> Self {
        Self {
            pages,
            reversed: false,
            corrupt: None,
        }
    }
}

impl Rasterizer for FakeRasterizer {
    fn rasterize(
        &self,
        pdf_path: &Path,
        _dpi: u32,
        out_dir: &Path,
    ) -> Result<Vec<PageImage>, RerasterError> {
        assert!(
            pdf_path.exists(),
            "source PDF must be staged before rendering"
        );

        let mut out = Vec::new();
        for (index, &(width, height)) in self.pages.iter().enumerate() {
            let path = page_image_path(out_dir, index);
            if self.corrupt == Some(index) {
                std::fs::write(&path, b"not an image").unwrap();
            } else {
                let shade = (index * 40 % 256) as u8;
                DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([shade, 90, 200])))
                    .save_with_format(&path, ImageFormat::Png)
                    .unwrap();
            }
            out.push(PageImage {
                index,
                path,
                width,
                height,
            });
        }
        if self.reversed {
            out.reverse();
        }
        Ok(out)
    }
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl RecordingCallback {
    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ConversionProgressCallback for RecordingCallback {
    fn on_stage(&self, stage: Stage) {
        self.record(format!("stage:{stage}"));
    }
    fn on_conversion_start(&self, total_pages: usize) {
        self.record(format!("start:{total_pages}"));
    }
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        self.record(format!("page:{page_num}/{total_pages}"));
    }
    fn on_page_complete(&self, page_num: usize, _total: usize, embedded_bytes: usize) {
        assert!(embedded_bytes > 0);
        self.record(format!("done:{page_num}"));
    }
    fn on_conversion_complete(&self, total_pages: usize, _base64_len: usize) {
        self.record(format!("complete:{total_pages}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn config_with(rasterizer: FakeRasterizer, staging: &Path) -> ConversionConfig {
    ConversionConfig::builder()
        .rasterizer(Arc::new(rasterizer))
        .staging_dir(staging)
        .build()
        .unwrap()
}

fn source_b64() -> String {
    STANDARD.encode(SOURCE)
}

/// `(width, height)` of every page's MediaBox, in page order.
fn page_sizes(pdf: &[u8]) -> Vec<(i64, i64)> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let mb = doc
                .get_dictionary(id)
                .unwrap()
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|o| o.as_i64().unwrap())
                .collect::<Vec<_>>();
            (mb[2], mb[3])
        })
        .collect()
}

fn assert_empty(dir: &Path) {
    let left: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert!(left.is_empty(), "staging left behind: {left:?}");
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn one_output_page_per_image_sized_to_pixels() {
    let staging = tempfile::tempdir().unwrap();
    let sizes = vec![(60, 80), (80, 60), (33, 33)];
    let config = config_with(FakeRasterizer::new(sizes.clone()), staging.path());

    let output = convert(source_b64(), &config).await.unwrap();

    let decoded = STANDARD.decode(&output.base64).unwrap();
    assert_eq!(decoded, output.pdf);
    assert!(decoded.starts_with(b"%PDF"));

    let expected: Vec<(i64, i64)> = sizes
        .iter()
        .map(|&(w, h)| (i64::from(w), i64::from(h)))
        .collect();
    assert_eq!(page_sizes(&decoded), expected);

    assert_eq!(output.stats.page_count, 3);
    assert_eq!(output.stats.source_bytes, SOURCE.len());
    assert_eq!(output.stats.output_bytes, output.pdf.len());
    assert_eq!(output.stats.base64_len, output.base64.len());
    assert_eq!(output.stats.codec, EmbedCodec::Jpeg { quality: 95 });
}

#[tokio::test]
async fn pages_follow_index_order_not_return_order() {
    let staging = tempfile::tempdir().unwrap();
    // Twelve pages so page-0010.png and page-0002.png both exist.
    let sizes: Vec<(u32, u32)> = (0..12).map(|i| (10 + i, 20)).collect();
    let mut fake = FakeRasterizer::new(sizes.clone());
    fake.reversed = true;
    let config = config_with(fake, staging.path());

    let output = convert(source_b64(), &config).await.unwrap();

    let widths: Vec<i64> = page_sizes(&output.pdf)
        .into_iter()
        .map(|(w, _)| w)
        .collect();
    let expected: Vec<i64> = sizes.iter().map(|&(w, _)| i64::from(w)).collect();
    assert_eq!(widths, expected);
    let nums: Vec<usize> = output.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(nums, (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn no_rendered_pages_is_an_error_and_cleans_up() {
    let staging = tempfile::tempdir().unwrap();
    let config = config_with(FakeRasterizer::new(vec![]), staging.path());

    let err = convert(source_b64(), &config).await.unwrap_err();

    assert!(matches!(err, RerasterError::NoPagesRendered));
    assert_eq!(err.to_string(), "No images were generated from the PDF");
    assert_empty(staging.path());
}

#[tokio::test]
async fn staging_is_removed_after_success() {
    let staging = tempfile::tempdir().unwrap();
    let rasterizer = FakeRasterizer::new(vec![(16, 16), (16, 16)]);
    let config = config_with(rasterizer, staging.path());

    convert(source_b64(), &config).await.unwrap();

    assert_empty(staging.path());
}

#[tokio::test]
async fn staging_is_removed_after_mid_pipeline_failure() {
    let staging = tempfile::tempdir().unwrap();
    let mut fake = FakeRasterizer::new(vec![(16, 16), (16, 16), (16, 16)]);
    fake.corrupt = Some(1);
    let config = config_with(fake, staging.path());

    let err = convert(source_b64(), &config).await.unwrap_err();

    match err {
        RerasterError::ImageDecodeFailed { path, .. } => {
            assert!(path.ends_with("page-0002.png"), "{}", path.display());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_empty(staging.path());
}

#[tokio::test]
async fn same_input_gives_identical_output() {
    let staging = tempfile::tempdir().unwrap();
    let rasterizer = FakeRasterizer::new(vec![(40, 30), (30, 40)]);
    let config = config_with(rasterizer, staging.path());

    let a = convert(source_b64(), &config).await.unwrap();
    let b = convert(source_b64(), &config).await.unwrap();

    assert_eq!(a.base64, b.base64);
}

#[tokio::test]
async fn lossless_codec_embeds_flate_streams() {
    let staging = tempfile::tempdir().unwrap();
    let config = ConversionConfig::builder()
        .rasterizer(Arc::new(FakeRasterizer::new(vec![(8, 8)])))
        .staging_dir(staging.path())
        .codec(EmbedCodec::Lossless)
        .build()
        .unwrap();

    let output = convert_pdf_bytes(SOURCE, &config).await.unwrap();

    let doc = Document::load_mem(&output.pdf).unwrap();
    let has_flate_image = doc.objects.values().any(|obj| {
        obj.as_stream()
            .ok()
            .and_then(|s| s.dict.get(b"Filter").ok())
            .and_then(|f| f.as_name().ok())
            == Some(b"FlateDecode".as_slice())
    });
    assert!(has_flate_image);
    // 8x8 RGB is 192 raw bytes; zlib of a solid fill is far smaller.
    assert!(output.pages[0].embedded_bytes < 192);
}

#[tokio::test]
async fn data_uri_and_wrapped_input_are_accepted() {
    let staging = tempfile::tempdir().unwrap();
    let config = config_with(FakeRasterizer::new(vec![(10, 10)]), staging.path());

    let b64 = source_b64();
    let wrapped: String = b64
        .as_bytes()
        .chunks(16)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    let input = format!("data:application/pdf;base64,{wrapped}\n");

    let output = convert(&input, &config).await.unwrap();
    assert_eq!(output.stats.source_bytes, SOURCE.len());
}

#[tokio::test]
async fn progress_events_arrive_in_pipeline_order() {
    let staging = tempfile::tempdir().unwrap();
    let recorder = Arc::new(RecordingCallback::default());
    let config = ConversionConfig::builder()
        .rasterizer(Arc::new(FakeRasterizer::new(vec![(8, 8), (8, 8)])))
        .staging_dir(staging.path())
        .progress_callback(recorder.clone() as Arc<dyn ConversionProgressCallback>)
        .build()
        .unwrap();

    convert(source_b64(), &config).await.unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "stage:Decoding",
            "stage:Rasterising",
            "start:2",
            "stage:Recombining",
            "page:1/2",
            "done:1",
            "page:2/2",
            "done:2",
            "stage:Encoding",
            "complete:2",
        ]
    );
}

#[tokio::test]
async fn split_decode_reports_the_same_stages_as_convert() {
    let staging = tempfile::tempdir().unwrap();
    let recorder = Arc::new(RecordingCallback::default());
    let config = ConversionConfig::builder()
        .rasterizer(Arc::new(FakeRasterizer::new(vec![(8, 8)])))
        .staging_dir(staging.path())
        .progress_callback(recorder.clone() as Arc<dyn ConversionProgressCallback>)
        .build()
        .unwrap();

    let source = decode_input(source_b64(), &config).unwrap();
    assert_eq!(source, SOURCE);
    convert_pdf_bytes(&source, &config).await.unwrap();

    let stages: Vec<String> = recorder
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with("stage:"))
        .cloned()
        .collect();
    assert_eq!(
        stages,
        vec![
            "stage:Decoding",
            "stage:Rasterising",
            "stage:Recombining",
            "stage:Encoding",
        ]
    );
}

#[tokio::test]
async fn convert_to_file_writes_exact_base64() {
    let staging = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let out_path = out_dir.path().join("results/pdf_base64.txt");
    let config = config_with(FakeRasterizer::new(vec![(12, 12)]), staging.path());

    let stats = convert_to_file(source_b64(), &out_path, &config)
        .await
        .unwrap();

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(written.len(), stats.base64_len);
    assert!(!written.ends_with('\n'));
    let pdf = STANDARD.decode(written).unwrap();
    assert_eq!(page_sizes(&pdf), vec![(12, 12)]);
}

#[test]
fn convert_sync_runs_without_an_outer_runtime() {
    let staging = tempfile::tempdir().unwrap();
    let config = config_with(FakeRasterizer::new(vec![(5, 7)]), staging.path());

    let output = convert_sync(source_b64(), &config).unwrap();
    assert_eq!(page_sizes(&output.pdf), vec![(5, 7)]);
    assert_empty(staging.path());
}

#[tokio::test]
async fn empty_input_is_rejected() {
    let staging = tempfile::tempdir().unwrap();
    let config = config_with(FakeRasterizer::new(vec![(5, 5)]), staging.path());

    let err = convert("   \n", &config).await.unwrap_err();
    assert!(matches!(err, RerasterError::EmptyInput));
}
