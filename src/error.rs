//! Error types for the transcript-average library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TranscriptError`]: **Fatal**: the run cannot produce a result at all
//!   (unreadable file, PDF that pdfium cannot decode, blank text, a
//!   recomputation request with the wrong shape). Returned as
//!   `Err(TranscriptError)` from the top-level entry points.
//!
//! * [`DraftRejection`]: **Non-fatal**: one candidate course found on one
//!   line failed validation (grade or credits out of range, title too short).
//!   The draft is dropped and the scan continues; rejections are collected in
//!   [`crate::output::ExtractionDiagnostics`] for inspection.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the transcript-average library.
#[derive(Debug, Error)]
pub enum TranscriptError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Transcript file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The file is larger than the configured upload limit.
    #[error("File '{path}' is {size} bytes, above the {limit}-byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    // ── Decoding errors ───────────────────────────────────────────────────
    /// pdfium could not turn the document into text.
    #[error("Could not extract text from the PDF: {detail}")]
    DecodingFailure { detail: String },

    /// PDF requires a password but none (or a wrong one) was provided.
    #[error("The PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Text was extracted but contains nothing but whitespace.
    #[error("The document contains no text. Is it a scanned image?")]
    EmptyDocument,

    /// The whole pipeline (including the backup pass) found zero courses.
    #[error(
        "No courses could be extracted from {text_length} characters of text.\n\
Text sample: {text_sample:?}"
    )]
    NoExtractableCourses {
        text_length: usize,
        text_sample: String,
    },

    // ── Recomputation errors ──────────────────────────────────────────────
    /// A caller-supplied course list failed shape or range validation.
    #[error("Invalid course input: {detail}")]
    InvalidCourseInput { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, or set\n\
PDFIUM_LIB_PATH=/path/to/dir/containing/libpdfium to use an existing copy.\n\
Plain-text transcripts (.txt) do not need pdfium at all."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TranscriptError {
    /// True for failures of the PDF-to-text step itself.
    pub fn is_decoding_failure(&self) -> bool {
        matches!(
            self,
            TranscriptError::DecodingFailure { .. } | TranscriptError::PasswordRequired
        )
    }
}

/// A non-fatal rejection of one candidate course.
///
/// Stored in [`crate::output::ExtractionDiagnostics`]; the scan continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum DraftRejection {
    /// The cleaned title is too short to be a real course name.
    #[error("Line {line}: {code}: title {title:?} is too short")]
    TitleTooShort {
        line: usize,
        code: String,
        title: String,
    },

    /// Grade outside the 0–20 scale.
    #[error("Line {line}: {code}: grade {grade} is outside 0-20")]
    GradeOutOfRange { line: usize, code: String, grade: u32 },

    /// Credits outside 1–8.
    #[error("Line {line}: {code}: credits {credits} is outside 1-8")]
    CreditsOutOfRange {
        line: usize,
        code: String,
        credits: u32,
    },
}

impl DraftRejection {
    /// Course code of the rejected draft.
    pub fn code(&self) -> &str {
        match self {
            DraftRejection::TitleTooShort { code, .. }
            | DraftRejection::GradeOutOfRange { code, .. }
            | DraftRejection::CreditsOutOfRange { code, .. } => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_courses_display_includes_sample() {
        let e = TranscriptError::NoExtractableCourses {
            text_length: 1234,
            text_sample: "UNIVERSIDAD NACIONAL".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("1234"), "got: {msg}");
        assert!(msg.contains("UNIVERSIDAD NACIONAL"), "got: {msg}");
    }

    #[test]
    fn file_too_large_display() {
        let e = TranscriptError::FileTooLarge {
            path: PathBuf::from("big.pdf"),
            size: 20,
            limit: 10,
        };
        assert!(e.to_string().contains("big.pdf"));
        assert!(e.to_string().contains("10-byte"));
    }

    #[test]
    fn decoding_failures_are_grouped() {
        assert!(TranscriptError::PasswordRequired.is_decoding_failure());
        assert!(TranscriptError::DecodingFailure {
            detail: "x".into()
        }
        .is_decoding_failure());
        assert!(!TranscriptError::EmptyDocument.is_decoding_failure());
    }

    #[test]
    fn rejection_display_and_code() {
        let r = DraftRejection::GradeOutOfRange {
            line: 12,
            code: "INE003".into(),
            grade: 25,
        };
        assert_eq!(r.code(), "INE003");
        assert!(r.to_string().contains("Line 12"));
        assert!(r.to_string().contains("25"));
    }

    #[test]
    fn rejection_serialises_with_reason_tag() {
        let r = DraftRejection::CreditsOutOfRange {
            line: 3,
            code: "INO204".into(),
            credits: 9,
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"reason\":\"creditsOutOfRange\""), "got: {json}");
    }
}
