//! Course records and the small value types around them.
//!
//! A [`CourseRecord`] is created fresh on every extraction run. After that it
//! is only changed by the merge step (which picks a winner between two
//! observations of the same course) and by callers editing grades or toggling
//! exclusion between two calculator runs.
//!
//! The JSON shape is camelCase. Deserialisation also accepts the field names
//! older web clients send (`name`, `note`, `period`, `type`,
//! `excludeFromCalculation`). Unknown `type` or `extractionMethod` labels
//! read as the default variant.

use crate::error::TranscriptError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{value, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Lowest passing grade on the 0–20 scale.
pub const PASSING_GRADE: u8 = 11;
/// Highest grade on the 0–20 scale.
pub const MAX_GRADE: u8 = 20;
/// Highest credit weight a single course can carry.
pub const MAX_CREDITS: u8 = 8;

static RE_TERM_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-[0-2]$").unwrap());

// ── Term ─────────────────────────────────────────────────────────────────

/// An academic term label in `YYYY-S` form.
///
/// Ordering is plain string ordering. That is only sound because every year
/// has at most three single-digit semesters (0, 1, 2).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(String);

impl Term {
    /// Wrap a label without checking its shape.
    pub fn new(label: impl Into<String>) -> Self {
        Term(label.into())
    }

    /// Parse a label, accepting only the `YYYY-S` shape.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        RE_TERM_LABEL.is_match(label).then(|| Term(label.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_well_formed(&self) -> bool {
        RE_TERM_LABEL.is_match(&self.0)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::new(s)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Curriculum category of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CourseType {
    /// Required course ("obligatorio"). Default.
    #[default]
    #[serde(alias = "O")]
    Mandatory,
    /// Elective ("electivo").
    #[serde(alias = "E")]
    Elective,
    /// Supplementary ("adicional").
    #[serde(alias = "A")]
    Supplementary,
}

/// Which stage of the pipeline produced a record. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionMethod {
    /// Strict or spaced pattern of the cascade.
    #[default]
    #[serde(alias = "standard")]
    Primary,
    /// Permissive cascade pattern.
    Flexible,
    /// Special-case resolver.
    #[serde(alias = "redaccion_specific")]
    Special,
    /// Whole-document backup pass.
    Backup,
    /// Registry default added because the course was mentioned but never resolved.
    Emergency,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Primary => "primary",
            ExtractionMethod::Flexible => "flexible",
            ExtractionMethod::Special => "special",
            ExtractionMethod::Backup => "backup",
            ExtractionMethod::Emergency => "emergency",
        }
    }
}

/// Enum label that falls back to the default when null or unrecognised.
fn label_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let Some(label) = Option::<String>::deserialize(deserializer)? else {
        return Ok(T::default());
    };
    let parsed: Result<T, value::Error> = T::deserialize(label.into_deserializer());
    Ok(parsed.unwrap_or_default())
}

// ── CourseRecord ─────────────────────────────────────────────────────────

/// One completed course as read from the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    /// Institutional course code, e.g. `INE002` or `202SW0305`.
    pub code: String,

    /// Course name, whitespace-normalised, diacritics preserved.
    #[serde(alias = "name")]
    pub title: String,

    /// Grade on the 0–20 scale.
    #[serde(alias = "note")]
    pub grade: u8,

    /// Credit weight, 1–8.
    pub credits: u8,

    /// Term the course was taken in.
    #[serde(alias = "period")]
    pub term: Term,

    #[serde(default, alias = "type", deserialize_with = "label_or_default")]
    pub course_type: CourseType,

    /// `grade >= 11`. Recomputed by the calculator, never trusted from input.
    #[serde(default)]
    pub approved: bool,

    /// Set once a person overrides the extracted grade; wins every merge.
    pub edited_by_user: bool,

    /// Soft delete: the record stays visible but is left out of the sums.
    #[serde(alias = "excludeFromCalculation")]
    pub excluded_from_calculation: bool,

    #[serde(default, deserialize_with = "label_or_default")]
    pub extraction_method: ExtractionMethod,

    /// The term was guessed by period inference, not read from the text.
    #[serde(default, rename = "inferredPeriod")]
    pub inferred_term: bool,

    /// 1-based line of the transcript text the record was anchored on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

impl CourseRecord {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        grade: u8,
        credits: u8,
        term: Term,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            grade,
            credits,
            term,
            course_type: CourseType::Mandatory,
            approved: grade >= PASSING_GRADE,
            edited_by_user: false,
            excluded_from_calculation: false,
            extraction_method: ExtractionMethod::Primary,
            inferred_term: false,
            line_number: None,
        }
    }

    pub fn with_type(mut self, course_type: CourseType) -> Self {
        self.course_type = course_type;
        self
    }

    pub fn with_method(mut self, method: ExtractionMethod) -> Self {
        self.extraction_method = method;
        self
    }

    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn is_approved(&self) -> bool {
        self.grade >= PASSING_GRADE
    }

    /// Recompute the derived `approved` flag from the grade.
    pub fn refresh_approval(&mut self) {
        self.approved = self.is_approved();
    }

    /// Override the grade by hand. Marks the record as user-edited.
    pub fn edit_grade(&mut self, grade: u8) -> Result<(), TranscriptError> {
        if grade > MAX_GRADE {
            return Err(TranscriptError::InvalidCourseInput {
                detail: format!("{}: grade {} is outside 0-{}", self.code, grade, MAX_GRADE),
            });
        }
        self.grade = grade;
        self.edited_by_user = true;
        self.refresh_approval();
        Ok(())
    }

    /// Check the record against the grade and credit ranges.
    pub fn validate(&self) -> Result<(), TranscriptError> {
        if self.code.trim().is_empty() {
            return Err(TranscriptError::InvalidCourseInput {
                detail: format!("course {:?} has an empty code", self.title),
            });
        }
        if self.grade > MAX_GRADE {
            return Err(TranscriptError::InvalidCourseInput {
                detail: format!("{}: grade {} is outside 0-{}", self.code, self.grade, MAX_GRADE),
            });
        }
        if self.credits == 0 || self.credits > MAX_CREDITS {
            return Err(TranscriptError::InvalidCourseInput {
                detail: format!(
                    "{}: credits {} is outside 1-{}",
                    self.code, self.credits, MAX_CREDITS
                ),
            });
        }
        Ok(())
    }
}
