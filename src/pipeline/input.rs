//! Input resolution: read a user-supplied transcript file into memory.
//!
//! PDFs are validated up front (existence, permission, size limit, `%PDF`
//! magic bytes) so callers get a meaningful error rather than an opaque
//! pdfium failure.

use crate::error::TranscriptError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// What kind of transcript a path holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Text,
}

/// Decide whether a path is a PDF or already-extracted text.
///
/// A `.pdf` extension is trusted as-is so a broken PDF still reports
/// [`TranscriptError::NotAPdf`]. Anything else is sniffed for the magic
/// bytes.
pub fn classify(path: &Path) -> Result<InputKind, TranscriptError> {
    let has_pdf_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if has_pdf_ext {
        return Ok(InputKind::Pdf);
    }
    let mut file = open(path)?;
    let mut magic = [0u8; 4];
    let is_pdf = file.read_exact(&mut magic).is_ok() && &magic == PDF_MAGIC;
    Ok(if is_pdf { InputKind::Pdf } else { InputKind::Text })
}

/// Read a PDF, checking size and magic bytes.
pub async fn load_pdf(path: &Path, max_bytes: u64) -> Result<Vec<u8>, TranscriptError> {
    let path = path.to_path_buf();
    check_size(&path, max_bytes)?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| read_error(&path, e))?;
    check_magic(&bytes, &path)?;
    debug!("Loaded PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Read a text transcript. Invalid UTF-8 is replaced, not rejected.
pub async fn load_text(path: &Path, max_bytes: u64) -> Result<String, TranscriptError> {
    let path = path.to_path_buf();
    check_size(&path, max_bytes)?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| read_error(&path, e))?;
    debug!("Loaded text transcript: {} ({} bytes)", path.display(), bytes.len());
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reject bytes that do not start with `%PDF`.
pub fn check_magic(bytes: &[u8], path: &Path) -> Result<(), TranscriptError> {
    if bytes.len() >= 4 && &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(TranscriptError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    if bytes.len() < 4 {
        return Err(TranscriptError::DecodingFailure {
            detail: format!("'{}' is only {} bytes long", path.display(), bytes.len()),
        });
    }
    Ok(())
}

fn open(path: &Path) -> Result<std::fs::File, TranscriptError> {
    if !path.exists() {
        return Err(TranscriptError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::File::open(path).map_err(|e| read_error(path, e))
}

fn check_size(path: &Path, max_bytes: u64) -> Result<(), TranscriptError> {
    let size = open(path)?
        .metadata()
        .map_err(|e| read_error(path, e))?
        .len();
    if size > max_bytes {
        return Err(TranscriptError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

fn read_error(path: &Path, e: std::io::Error) -> TranscriptError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => TranscriptError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => TranscriptError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => TranscriptError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_with(suffix: &str, content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(content).unwrap();
        f
    }

    #[test]
    fn classify_by_extension_then_magic() {
        let pdf = temp_with(".pdf", b"not really");
        assert_eq!(classify(pdf.path()).unwrap(), InputKind::Pdf);

        let sniffed = temp_with(".bin", b"%PDF-1.7\n");
        assert_eq!(classify(sniffed.path()).unwrap(), InputKind::Pdf);

        let text = temp_with(".txt", b"INE002 - PROGRAMACION");
        assert_eq!(classify(text.path()).unwrap(), InputKind::Text);
    }

    #[test]
    fn missing_file() {
        let err = classify(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, TranscriptError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn pdf_magic_is_checked() {
        let fake = temp_with(".pdf", b"GIF89a....");
        let err = load_pdf(fake.path(), 1024).await.unwrap_err();
        match err {
            TranscriptError::NotAPdf { magic, .. } => assert_eq!(&magic, b"GIF8"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn size_limit_is_enforced() {
        let big = temp_with(".pdf", &[b'%'; 64]);
        let err = load_pdf(big.path(), 16).await.unwrap_err();
        assert!(matches!(err, TranscriptError::FileTooLarge { size: 64, limit: 16, .. }));
    }

    #[tokio::test]
    async fn text_is_read_lossily() {
        let f = temp_with(".txt", b"PERIODO ACAD\xC9MICO 2023-1");
        let text = load_text(f.path(), 1024).await.unwrap();
        assert!(text.starts_with("PERIODO ACAD"));
        assert!(text.ends_with("2023-1"));
    }
}
