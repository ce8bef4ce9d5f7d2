//! Decoder: Base64 text → PDF bytes on disk.
//!
//! Payloads usually come from a browser frontend, so two liberties are taken
//! with the input: a leading `data:application/pdf;base64,` prefix is
//! stripped, and ASCII whitespace (line-wrapped Base64) is ignored. Padding
//! is optional, and the URL-safe symbols `-` and `_` are read as `+` and `/`,
//! so base64url payloads decode too. Nothing else is forgiven: a stray
//! non-alphabet byte is an [`RerasterError::InvalidBase64`].
//!
//! The decoded bytes are not validated as a PDF. pdfium is the authority on
//! that and reports it during rasterisation.

use crate::error::RerasterError;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use std::path::Path;
use tracing::{debug, info, warn};

/// Standard alphabet, padding accepted but not required.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a Base64 payload (optionally a `data:` URI) into raw bytes.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, RerasterError> {
    let payload = strip_data_uri(input.trim());
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    if compact.is_empty() {
        return Err(RerasterError::EmptyInput);
    }

    let bytes = LENIENT
        .decode(compact.as_bytes())
        .map_err(|e| RerasterError::InvalidBase64 {
            reason: e.to_string(),
        })?;

    if !bytes.starts_with(b"%PDF") {
        warn!(
            "Decoded payload does not start with %PDF (first bytes: {:?})",
            &bytes[..bytes.len().min(4)]
        );
    }
    debug!(
        "Decoded {} Base64 chars → {} bytes",
        compact.len(),
        bytes.len()
    );

    Ok(bytes)
}

/// Write decoded PDF bytes verbatim to `path`, replacing any existing file.
pub fn write_pdf(bytes: &[u8], path: &Path) -> Result<(), RerasterError> {
    std::fs::write(path, bytes).map_err(|e| RerasterError::staging(path, e))?;
    info!("PDF file created from Base64 string at {}", path.display());
    Ok(())
}

/// Strip `data:<mime>;base64,` if present.
fn strip_data_uri(input: &str) -> &str {
    if !input.starts_with("data:") {
        return input;
    }
    match input.find(";base64,") {
        Some(pos) => &input[pos + ";base64,".len()..],
        None => input,
    }
}
