//! Recombiner: page images → a new image-only PDF.
//!
//! Each page gets one image XObject and a four-operator content stream
//! (`q w 0 0 h 0 0 cm /Im0 Do Q`) that paints the image over the whole page.
//! The MediaBox is `[0 0 width height]` with width and height taken straight
//! from the image's pixel dimensions, so one pixel maps to one point and
//! pages of different sizes keep their own sizes.
//!
//! The document is built object-by-object with lopdf and serialised to
//! memory; the caller decides where the bytes go.

use crate::config::EmbedCodec;
use crate::error::RerasterError;
use crate::output::PageSummary;
use crate::pipeline::reencode::{self, EmbeddedImage};
use crate::pipeline::render::PageImage;
use crate::progress::ProgressCallback;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;
use tracing::{debug, info};

/// Resource name of the page image inside each page's `/XObject` dictionary.
const IMAGE_RESOURCE: &str = "Im0";

/// Result of the recombine stage.
#[derive(Debug, Clone)]
pub struct RebuiltPdf {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageSummary>,
}

/// Build a PDF with one page per image, in slice order.
pub fn build_pdf(images: &[EmbeddedImage]) -> Result<Vec<u8>, RerasterError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(images.len());

    for img in images {
        let width = i64::from(img.width);
        let height = i64::from(img.height);

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => img.filter,
            },
            img.data.clone(),
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width.into(),
                        0.into(),
                        0.into(),
                        height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| RerasterError::PdfWriteFailed(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_RESOURCE => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RerasterError::PdfWriteFailed(e.to_string()))?;

    debug!("Assembled PDF: {} pages, {} bytes", page_count, bytes.len());
    Ok(bytes)
}

/// Re-encode every staged page, assemble the PDF, and persist it to `out_path`.
///
/// `pages` must already be in page order.
pub fn recombine(
    pages: &[PageImage],
    codec: EmbedCodec,
    out_path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<RebuiltPdf, RerasterError> {
    let total = pages.len();
    let mut embedded = Vec::with_capacity(total);
    let mut summaries = Vec::with_capacity(total);

    for page in pages {
        let page_num = page.index + 1;
        if let Some(cb) = progress {
            cb.on_page_start(page_num, total);
        }

        let img = reencode::reencode_file(&page.path, page_num, codec)?;

        if let Some(cb) = progress {
            cb.on_page_complete(page_num, total, img.data.len());
        }
        summaries.push(PageSummary {
            page_num,
            width: img.width,
            height: img.height,
            embedded_bytes: img.data.len(),
        });
        embedded.push(img);
    }

    let bytes = build_pdf(&embedded)?;

    std::fs::write(out_path, &bytes).map_err(|e| RerasterError::staging(out_path, e))?;
    info!(
        "Images successfully converted back to a PDF: {}",
        out_path.display()
    );

    Ok(RebuiltPdf {
        bytes,
        pages: summaries,
    })
}
