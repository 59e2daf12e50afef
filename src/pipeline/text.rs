//! PDF-to-text via pdfium.
//!
//! pdfium keeps thread-local state and blocks, so every call runs on the
//! blocking pool through `tokio::task::spawn_blocking`.
//!
//! The library is located through `PDFIUM_LIB_PATH` (a directory holding the
//! platform's pdfium shared library) and otherwise through the system loader.

use crate::error::TranscriptError;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Environment variable naming the directory that holds libpdfium.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

fn bind_pdfium() -> Result<Pdfium, TranscriptError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            debug!("Binding pdfium from {dir}");
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| TranscriptError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Extract the text layer of every page, pages joined with `\n`.
///
/// Runs inside `spawn_blocking` since pdfium calls are blocking.
pub async fn pdf_to_text(bytes: Vec<u8>, password: Option<String>) -> Result<String, TranscriptError> {
    tokio::task::spawn_blocking(move || pdf_to_text_blocking(&bytes, password.as_deref()))
        .await
        .map_err(|e| TranscriptError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Blocking implementation of text extraction.
fn pdf_to_text_blocking(bytes: &[u8], password: Option<&str>) -> Result<String, TranscriptError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            TranscriptError::PasswordRequired
        } else {
            TranscriptError::DecodingFailure { detail: err_str }
        }
    })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut page_texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| TranscriptError::DecodingFailure {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?
            .all();
        debug!("Page {} → {} chars", idx + 1, text.chars().count());
        page_texts.push(text);
    }

    Ok(page_texts.join("\n"))
}
