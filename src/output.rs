//! Result types returned by the calculator and the analysis entry points.
//!
//! Everything here serialises to camelCase JSON, the shape web clients of
//! the calculator already consume.

use crate::config::Program;
use crate::error::DraftRejection;
use crate::record::{CourseRecord, CourseType, Term};
use serde::{Deserialize, Serialize};

/// Course counts per [`CourseType`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub mandatory: usize,
    pub elective: usize,
    pub supplementary: usize,
    pub total: usize,
}

impl CourseStats {
    pub fn record(&mut self, course_type: CourseType) {
        match course_type {
            CourseType::Mandatory => self.mandatory += 1,
            CourseType::Elective => self.elective += 1,
            CourseType::Supplementary => self.supplementary += 1,
        }
        self.total += 1;
    }
}

/// Output of the weighted-average calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Deduplicated courses the sums were taken over, sorted by (term, code).
    pub courses: Vec<CourseRecord>,

    /// Σ credits over every course.
    pub total_credits: u32,

    /// Σ grade × credits over every course, approved or not.
    pub total_weighted_points: u32,

    /// `total_weighted_points / total_credits`, rounded to 3 decimals; 0 when
    /// there are no credits.
    pub weighted_average: f64,

    /// Σ credits over approved courses. Informational only.
    pub approved_credits: u32,

    /// Divisor actually used for the average.
    pub credits_for_average: u32,

    pub course_stats: CourseStats,
    pub approved_stats: CourseStats,

    /// Courses not found by the primary cascade.
    pub non_primary_extractions: usize,
}

/// Counters describing one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionDiagnostics {
    /// Characters of prepared text.
    pub text_length: usize,
    pub line_count: usize,
    /// Distinct terms among the extracted courses.
    pub terms_found: usize,
    /// The backup pass ran.
    pub backup_used: bool,
    /// Terms were assigned by position.
    pub terms_inferred: bool,
    /// Drafts dropped by range validation.
    pub rejected_drafts: Vec<DraftRejection>,
    /// Wall-clock time, including PDF decoding when there was one.
    pub duration_ms: u64,
}

/// Everything learned from one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptReport {
    pub program: Program,

    /// Extracted courses in scan order, duplicates included. This is the
    /// list a client edits and sends back for recalculation.
    pub courses: Vec<CourseRecord>,

    /// Unique terms, sorted.
    pub terms: Vec<Term>,

    /// Average over every course, without cutoff.
    pub calculation: AggregateResult,

    /// Approved-credit total printed in the transcript's own summary, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_approved_credits: Option<f64>,

    pub diagnostics: ExtractionDiagnostics,
}

impl TranscriptReport {
    /// The declared total disagrees with the computed approved credits.
    pub fn declared_mismatch(&self) -> Option<(f64, u32)> {
        let declared = self.declared_approved_credits?;
        let computed = self.calculation.approved_credits;
        ((declared - f64::from(computed)).abs() > f64::EPSILON).then_some((declared, computed))
    }
}
