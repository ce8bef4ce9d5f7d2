//! Encoder: rebuilt PDF bytes → Base64 text.
//!
//! Output uses the standard alphabet with padding and no line wrapping, which
//! is what browsers' `atob` and most JSON APIs expect.

use crate::error::RerasterError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::{debug, info};

/// Encode raw PDF bytes as a single-line Base64 string.
pub fn encode_base64(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} Base64 chars", bytes.len(), b64.len());
    b64
}

/// Persist Base64 text as-is (no trailing newline).
pub fn write_base64(text: &str, path: &Path) -> Result<(), RerasterError> {
    std::fs::write(path, text).map_err(|e| RerasterError::staging(path, e))?;
    info!("Base64 string saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_padded_single_line() {
        let b64 = encode_base64(b"%PDF-1.5\n");
        assert_eq!(b64, "JVBERi0xLjUK");
        let b64 = encode_base64(b"%PDF");
        assert_eq!(b64, "JVBERg==");
        assert!(!encode_base64(&[0u8; 4096]).contains('\n'));
    }

    #[test]
    fn decoder_reads_back_what_encoder_wrote() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let b64 = encode_base64(&bytes);
        assert_eq!(crate::pipeline::decode::decode_base64(&b64).unwrap(), bytes);
    }

    #[test]
    fn write_base64_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdf_base64.txt");
        write_base64("JVBERg==", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "JVBERg==");
    }
}
