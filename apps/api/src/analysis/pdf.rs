//! Upload checks and text extraction for PDF CVs.

use tracing::warn;

use crate::errors::AppError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;
pub const MIN_PDF_BYTES: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Checks an uploaded file before any parsing happens.
/// Order matters: each failure has its own client-facing message.
pub fn validate_pdf_upload(content_type: Option<&str>, bytes: &[u8]) -> Result<(), AppError> {
    if !is_pdf_content_type(content_type) {
        return Err(AppError::Validation("Only PDF files are allowed".to_string()));
    }
    if bytes.len() > MAX_PDF_BYTES {
        return Err(AppError::Validation("File too large (max 10MB)".to_string()));
    }
    if bytes.len() < MIN_PDF_BYTES {
        return Err(AppError::Validation("File too small or corrupt".to_string()));
    }
    if !has_pdf_magic(bytes) {
        return Err(AppError::Validation("Invalid PDF file".to_string()));
    }
    Ok(())
}

/// Ignores parameters such as `; charset=binary`.
pub fn is_pdf_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false)
}

pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Extracts the text layer of a PDF. Parsing is CPU-bound, so it runs on the
/// blocking pool. Scanned PDFs without a text layer yield an empty string.
/// The extractor panics on some malformed files; that is reported as an
/// unreadable upload.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            if e.is_panic() {
                warn!("PDF extractor panicked on upload");
                AppError::Validation("Could not read PDF file".to_string())
            } else {
                AppError::Internal(e.into())
            }
        })?
        .map_err(|e| {
            warn!("PDF text extraction failed: {e}");
            AppError::Validation("Could not read PDF file".to_string())
        })?;

    Ok(normalize_whitespace(&text))
}

/// Collapses runs of blank lines and trailing spaces left by the extractor.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_pdf(len: usize) -> Vec<u8> {
        let mut bytes = PDF_MAGIC.to_vec();
        bytes.resize(len, b' ');
        bytes
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(m) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_accepts_plausible_pdf() {
        assert!(validate_pdf_upload(Some("application/pdf"), &fake_pdf(4096)).is_ok());
    }

    #[test]
    fn test_rejects_wrong_content_type() {
        let err = validate_pdf_upload(Some("image/png"), &fake_pdf(4096)).unwrap_err();
        assert_eq!(message(err), "Only PDF files are allowed");
        let err = validate_pdf_upload(None, &fake_pdf(4096)).unwrap_err();
        assert_eq!(message(err), "Only PDF files are allowed");
    }

    #[test]
    fn test_size_bounds() {
        let err = validate_pdf_upload(Some("application/pdf"), &fake_pdf(MAX_PDF_BYTES + 1))
            .unwrap_err();
        assert_eq!(message(err), "File too large (max 10MB)");

        let err = validate_pdf_upload(Some("application/pdf"), &fake_pdf(MIN_PDF_BYTES - 1))
            .unwrap_err();
        assert_eq!(message(err), "File too small or corrupt");
    }

    #[test]
    fn test_rejects_missing_magic_bytes() {
        let bytes = vec![b'x'; 2048];
        let err = validate_pdf_upload(Some("application/pdf"), &bytes).unwrap_err();
        assert_eq!(message(err), "Invalid PDF file");
    }

    #[test]
    fn test_content_type_parameters_ignored() {
        assert!(is_pdf_content_type(Some("Application/PDF; charset=binary")));
        assert!(!is_pdf_content_type(Some("application/pdfx")));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("Sari  \n\n\n  \nRust dev\n"), "Sari\nRust dev");
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_a_validation_error() {
        let err = extract_pdf_text(fake_pdf(2048)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
