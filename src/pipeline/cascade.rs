//! Pattern-cascade extractor: one candidate line in, course drafts out.
//!
//! A course row renders as `CODE - TITLE<grade><credit>.<decimals><status>`
//! with no separator between title, grade and credit digit. Every cascade
//! pattern ends in `(\d{1,2})(\d)` before the decimal point. Because the
//! title class excludes digits, the digit run starts right after the title,
//! and the second group must take exactly one digit: `52.01P` reads as
//! grade 5 / credits 2, `153.06P` as grade 15 / credits 3.
//!
//! ## Stages
//!
//! | # | Name | Tail | Method |
//! |---|------|------|--------|
//! | 1 | strict | `(\d{1,2})(\d)\.\d{2}[PAE]` | primary |
//! | 2 | spaced | `(\d{1,2})(\d)\s*[PAE]` | primary |
//! | 3 | flexible | strict tail, bounded 5–50 char title, tighter codes | flexible |
//!
//! The first stage with any regex match wins, even if every one of its drafts
//! later fails validation.

use crate::config::Program;
use crate::error::DraftRejection;
use crate::program::ProgramProfile;
use crate::record::{CourseRecord, CourseType, ExtractionMethod, Term, MAX_CREDITS, MAX_GRADE};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Characters a rendered course title may contain.
pub const TITLE_CLASS: &str = r"[A-ZÀ-ÿ\s,\.&\(\)ÇÁÉÍÓÚÑ]";

/// Separators that mark a course row.
const SEPARATORS: &[&str] = &[" - ", "P - ", "A - ", "E - "];

/// Candidate lines must be longer than this (in characters).
const MIN_CANDIDATE_CHARS: usize = 20;

static RE_TITLE_JUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s,\.&\(\)ÀÁÈÉÌÍÒÓÙÚÑáéíóúñÇ]").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_ELECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}E").unwrap());
static RE_SUPPLEMENTARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}A").unwrap());

/// One pattern of the cascade.
#[derive(Debug)]
pub struct Stage {
    pub name: &'static str,
    pub method: ExtractionMethod,
    regex: Regex,
}

/// Raw capture of one stage match, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub code: String,
    pub title: String,
    pub grade: u32,
    pub credits: u32,
}

impl Stage {
    fn new(name: &'static str, method: ExtractionMethod, pattern: String) -> Self {
        let regex = Regex::new(&pattern)
            .unwrap_or_else(|e| panic!("Invalid cascade pattern '{name}': {e}"));
        Self { name, method, regex }
    }

    /// Every match of this stage on the line.
    pub fn apply(&self, line: &str) -> Vec<RawMatch> {
        self.regex
            .captures_iter(line)
            .filter_map(|caps| {
                Some(RawMatch {
                    code: caps.get(1)?.as_str().trim().to_string(),
                    title: caps.get(2)?.as_str().to_string(),
                    grade: caps.get(3)?.as_str().parse().ok()?,
                    credits: caps.get(4)?.as_str().parse().ok()?,
                })
            })
            .collect()
    }
}

/// Ordered list of stages for one program.
#[derive(Debug)]
pub struct Cascade {
    stages: Vec<Stage>,
}

impl Cascade {
    pub fn compile(profile: &ProgramProfile) -> Self {
        let code = profile.code_pattern;
        let flex = profile.flexible_code_pattern;
        let title = TITLE_CLASS;
        Self {
            stages: vec![
                Stage::new(
                    "strict",
                    ExtractionMethod::Primary,
                    format!(r"({code})\s*[-–]\s*({title}+?)(\d{{1,2}})(\d)\.\d{{2}}[PAE]"),
                ),
                Stage::new(
                    "spaced",
                    ExtractionMethod::Primary,
                    format!(r"({code})\s*[-–]\s*({title}+?)(\d{{1,2}})(\d)\s*[PAE]"),
                ),
                Stage::new(
                    "flexible",
                    ExtractionMethod::Flexible,
                    format!(r"({flex})\s*[-–]\s*({title}{{5,50}}?)(\d{{1,2}})(\d)\.\d{{2}}[PAE]"),
                ),
            ],
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// First stage with at least one match, with its matches.
    pub fn first_match(&self, line: &str) -> Option<(&Stage, Vec<RawMatch>)> {
        self.stages.iter().find_map(|stage| {
            let matches = stage.apply(line);
            (!matches.is_empty()).then_some((stage, matches))
        })
    }
}

static SOFTWARE_CASCADE: Lazy<Cascade> =
    Lazy::new(|| Cascade::compile(Program::Software.profile()));
static SYSTEMS_CASCADE: Lazy<Cascade> = Lazy::new(|| Cascade::compile(Program::Systems.profile()));

/// Compiled cascade for a program.
pub fn cascade_for(program: Program) -> &'static Cascade {
    match program {
        Program::Software => &SOFTWARE_CASCADE,
        Program::Systems => &SYSTEMS_CASCADE,
    }
}

// ── Line-level helpers ───────────────────────────────────────────────────

/// A trimmed line worth running through the cascade.
pub fn is_candidate(line: &str, profile: &ProgramProfile) -> bool {
    profile.candidate_markers.iter().any(|m| line.contains(m))
        && SEPARATORS.iter().any(|s| line.contains(s))
        && line.chars().count() > MIN_CANDIDATE_CHARS
}

/// Course type from a 4-digit marker followed by a status letter.
pub fn course_type_of(line: &str) -> CourseType {
    if RE_ELECTIVE.is_match(line) {
        CourseType::Elective
    } else if RE_SUPPLEMENTARY.is_match(line) {
        CourseType::Supplementary
    } else {
        CourseType::Mandatory
    }
}

/// Replace characters outside the title allow-list, collapse spaces, trim.
pub fn clean_title(raw: &str) -> String {
    let replaced = RE_TITLE_JUNK.replace_all(raw.trim(), " ");
    RE_SPACES.replace_all(&replaced, " ").trim().to_string()
}

/// Validate a cleaned draft. Shared with the backup pass.
pub fn validate_draft(
    code: &str,
    title: &str,
    grade: u32,
    credits: u32,
    line: usize,
) -> Result<(u8, u8), DraftRejection> {
    if title.chars().count() <= 3 {
        return Err(DraftRejection::TitleTooShort {
            line,
            code: code.to_string(),
            title: title.to_string(),
        });
    }
    if grade > MAX_GRADE as u32 {
        return Err(DraftRejection::GradeOutOfRange {
            line,
            code: code.to_string(),
            grade,
        });
    }
    if credits == 0 || credits > MAX_CREDITS as u32 {
        return Err(DraftRejection::CreditsOutOfRange {
            line,
            code: code.to_string(),
            credits,
        });
    }
    Ok((grade as u8, credits as u8))
}

/// Drafts and rejections from one candidate line.
#[derive(Debug, Default)]
pub struct LineOutcome {
    pub courses: Vec<CourseRecord>,
    pub rejected: Vec<DraftRejection>,
    /// Name of the stage that matched, if any.
    pub stage: Option<&'static str>,
}

/// Run the cascade over one candidate line.
pub fn extract_line(cascade: &Cascade, line: &str, line_number: usize, term: &Term) -> LineOutcome {
    let mut outcome = LineOutcome::default();
    let Some((stage, matches)) = cascade.first_match(line) else {
        return outcome;
    };
    outcome.stage = Some(stage.name);
    let course_type = course_type_of(line);

    for raw in matches {
        let title = clean_title(&raw.title);
        if raw.code.is_empty() {
            continue;
        }
        match validate_draft(&raw.code, &title, raw.grade, raw.credits, line_number) {
            Ok((grade, credits)) => {
                debug!(
                    "[{}] {} {:?} grade={} credits={} term={}",
                    stage.name, raw.code, title, grade, credits, term
                );
                outcome.courses.push(
                    CourseRecord::new(raw.code, title, grade, credits, term.clone())
                        .with_type(course_type)
                        .with_method(stage.method)
                        .at_line(line_number),
                );
            }
            Err(rejection) => {
                debug!("Draft rejected: {rejection}");
                outcome.rejected.push(rejection);
            }
        }
    }
    outcome
}
