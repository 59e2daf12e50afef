//! # transcript-average
//!
//! Read a UNMSM academic transcript (*Récord Académico*) and compute the
//! credit-weighted grade average.
//!
//! ## Why this crate?
//!
//! The transcript PDF has a text layer, but its table cells come out fused:
//! `12022OINE002 - PROGRAMACIÓN Y COMPUTACIÓN142.01P` holds a cycle, a year,
//! a course type, a code, a title, a grade, credits and an outcome with no
//! separators. This crate recovers course records from such lines with an
//! ordered cascade of patterns, handles the rows known to render badly, and
//! averages the result with a deterministic deduplication rule.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / text
//!  │
//!  ├─ 1. Input    validate the file (size, %PDF magic)
//!  ├─ 2. Text     pdfium text layer, pages joined (spawn_blocking)
//!  ├─ 3. Scan     term headers + pattern cascade + special cases
//!  ├─ 4. Backup   looser patterns when too few courses were found
//!  ├─ 5. Infer    assign terms by position when none were read
//!  └─ 6. Average  cutoff, dedup, Σ(grade × credits) / Σ credits
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use transcript_average::{analyze_pdf, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let report = analyze_pdf("record.pdf", &config).await?;
//!     println!("{:.3}", report.calculation.weighted_average);
//!     eprintln!("{} courses over {} credits",
//!         report.calculation.courses.len(),
//!         report.calculation.total_credits);
//!     Ok(())
//! }
//! ```
//!
//! Text that was already extracted needs no runtime:
//!
//! ```rust
//! use transcript_average::{compute_weighted_average, extract_courses};
//!
//! let text = "PERIODO ACADÉMICO 2022-1\n\
//!             12022OINE002 - PROGRAMACIÓN Y COMPUTACIÓN142.01P";
//! let courses = extract_courses(text).unwrap();
//! let result = compute_weighted_average(&courses, None);
//! assert_eq!(result.weighted_average, 14.0);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `transcript-avg` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! transcript-average = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! PDF input needs the pdfium shared library at runtime. Set
//! `PDFIUM_LIB_PATH` to the directory holding it, or install it where the
//! system loader finds it. Text input never loads pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod program;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze_pdf, analyze_pdf_bytes, analyze_pdf_sync, analyze_text, extract_courses,
    extract_courses_with, extract_text, recalculate, recalculate_json, write_report,
    CalculationRequest,
};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, Program, DEFAULT_TERM};
pub use error::{DraftRejection, TranscriptError};
pub use output::{AggregateResult, CourseStats, ExtractionDiagnostics, TranscriptReport};
pub use pipeline::average::compute_weighted_average;
pub use program::ProgramProfile;
pub use record::{CourseRecord, CourseType, ExtractionMethod, Term, MAX_CREDITS, MAX_GRADE, PASSING_GRADE};
