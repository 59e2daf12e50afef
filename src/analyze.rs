//! Top-level entry points: text or PDF in, courses and averages out.
//!
//! Text-only entry points ([`extract_courses`], [`analyze_text`],
//! [`recalculate`]) are synchronous and never touch pdfium. PDF entry points
//! are async because text extraction runs on the blocking pool.

use crate::config::ExtractionConfig;
use crate::error::TranscriptError;
use crate::output::{AggregateResult, ExtractionDiagnostics, TranscriptReport};
use crate::pipeline::average::compute_weighted_average;
use crate::pipeline::summary::declared_approved_credits;
use crate::pipeline::{extract, input, text};
use crate::record::{CourseRecord, Term};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract courses from transcript text with the default configuration.
///
/// # Errors
/// [`TranscriptError::EmptyDocument`] for blank text and
/// [`TranscriptError::NoExtractableCourses`] when nothing is found; never an
/// empty list.
pub fn extract_courses(text: &str) -> Result<Vec<CourseRecord>, TranscriptError> {
    extract_courses_with(text, &ExtractionConfig::default())
}

/// [`extract_courses`] with an explicit configuration.
pub fn extract_courses_with(
    text: &str,
    config: &ExtractionConfig,
) -> Result<Vec<CourseRecord>, TranscriptError> {
    Ok(extract::run(text, config)?.courses)
}

/// Extract, average and summarise transcript text.
pub fn analyze_text(text: &str, config: &ExtractionConfig) -> Result<TranscriptReport, TranscriptError> {
    build_report(text, config, Instant::now())
}

/// Analyse a transcript PDF.
///
/// # Errors
/// Input errors (missing file, not a PDF, too large), decoding errors from
/// pdfium, then the extraction errors of [`analyze_text`].
pub async fn analyze_pdf(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<TranscriptReport, TranscriptError> {
    let start = Instant::now();
    let path = path.as_ref();
    info!("Starting analysis: {}", path.display());

    // ── Step 1: Read and validate the file ───────────────────────────────
    let bytes = input::load_pdf(path, config.max_file_bytes).await?;

    // ── Step 2: Extract the text layer ───────────────────────────────────
    let text = text::pdf_to_text(bytes, config.password.clone()).await?;
    debug!("Extracted {} chars of text", text.chars().count());

    // ── Step 3: Extract courses and compute ──────────────────────────────
    build_report(&text, config, start)
}

/// Analyse PDF bytes already in memory, such as an upload body.
pub async fn analyze_pdf_bytes(
    bytes: Vec<u8>,
    config: &ExtractionConfig,
) -> Result<TranscriptReport, TranscriptError> {
    let start = Instant::now();
    let size = bytes.len() as u64;
    if size > config.max_file_bytes {
        return Err(TranscriptError::FileTooLarge {
            path: "<memory>".into(),
            size,
            limit: config.max_file_bytes,
        });
    }
    input::check_magic(&bytes, Path::new("<memory>"))?;
    let text = text::pdf_to_text(bytes, config.password.clone()).await?;
    build_report(&text, config, start)
}

/// Synchronous wrapper around [`analyze_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_pdf_sync(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<TranscriptReport, TranscriptError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TranscriptError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_pdf(path, config))
}

/// Text layer of a transcript PDF, as the extractor will see it.
pub async fn extract_text(path: impl AsRef<Path>, config: &ExtractionConfig) -> Result<String, TranscriptError> {
    let bytes = input::load_pdf(path.as_ref(), config.max_file_bytes).await?;
    text::pdf_to_text(bytes, config.password.clone()).await
}

/// Write a report as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_report(report: &TranscriptReport, output_path: impl AsRef<Path>) -> Result<(), TranscriptError> {
    let path = output_path.as_ref();
    let write_err = |e: std::io::Error| TranscriptError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let json = serde_json::to_vec_pretty(report)
        .map_err(|e| TranscriptError::Internal(format!("Failed to serialise report: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    debug!("Report written to {}", path.display());
    Ok(())
}

// ── Recalculation ────────────────────────────────────────────────────────

/// A course list sent back for recomputation, typically after edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub courses: Vec<CourseRecord>,

    /// Keep courses up to and including this term. Empty means no cutoff.
    #[serde(default, alias = "selectedPeriod")]
    pub cutoff_term: Option<Term>,
}

impl CalculationRequest {
    pub fn new(courses: Vec<CourseRecord>) -> Self {
        Self {
            courses,
            cutoff_term: None,
        }
    }

    pub fn with_cutoff(mut self, term: impl Into<String>) -> Self {
        self.cutoff_term = Some(Term::new(term));
        self
    }

    /// The cutoff, with an empty label read as none.
    pub fn cutoff(&self) -> Option<&Term> {
        self.cutoff_term.as_ref().filter(|t| !t.is_empty())
    }
}

/// Recompute the average over a caller-supplied course list.
///
/// Excluded records are dropped first. Every remaining record must be in
/// range; a single bad record fails the whole request.
pub fn recalculate(request: &CalculationRequest) -> Result<AggregateResult, TranscriptError> {
    let mut included = Vec::with_capacity(request.courses.len());
    for course in &request.courses {
        if course.excluded_from_calculation {
            continue;
        }
        course.validate()?;
        included.push(course.clone());
    }
    let skipped = request.courses.len() - included.len();
    if skipped > 0 {
        debug!("{skipped} courses excluded from the calculation");
    }
    let cutoff = request.cutoff();
    if let Some(term) = cutoff.filter(|t| !t.is_well_formed()) {
        warn!("Cutoff term {term} is not in YYYY-S form; comparing as text");
    }
    Ok(compute_weighted_average(&included, cutoff))
}

/// Parse a JSON [`CalculationRequest`] and recompute.
pub fn recalculate_json(body: &str) -> Result<AggregateResult, TranscriptError> {
    let request: CalculationRequest =
        serde_json::from_str(body).map_err(|e| TranscriptError::InvalidCourseInput {
            detail: e.to_string(),
        })?;
    recalculate(&request)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn build_report(
    text: &str,
    config: &ExtractionConfig,
    start: Instant,
) -> Result<TranscriptReport, TranscriptError> {
    let extraction = extract::run(text, config)?;
    let calculation = compute_weighted_average(&extraction.courses, None);
    let terms: Vec<Term> = extraction
        .courses
        .iter()
        .filter(|c| !c.term.is_empty())
        .map(|c| c.term.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let declared = declared_approved_credits(text);

    let diagnostics = ExtractionDiagnostics {
        text_length: extraction.text_length,
        line_count: extraction.line_count,
        terms_found: terms.len(),
        backup_used: extraction.backup_used,
        terms_inferred: extraction.terms_inferred,
        rejected_drafts: extraction.rejected,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Analysis complete: {} courses, {} terms, average {:.3} over {} credits, {}ms",
        extraction.courses.len(),
        terms.len(),
        calculation.weighted_average,
        calculation.total_credits,
        diagnostics.duration_ms
    );

    let report = TranscriptReport {
        program: config.program,
        courses: extraction.courses,
        terms,
        calculation,
        declared_approved_credits: declared,
        diagnostics,
    };
    if let Some((declared, computed)) = report.declared_mismatch() {
        warn!("Transcript declares {declared} approved credits, computed {computed}");
    }
    Ok(report)
}
