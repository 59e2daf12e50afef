//! Backup extractor: a looser whole-document pass for transcripts where the
//! cascade found too few courses.
//!
//! The backup pass never overrides a primary finding. Its records are only
//! merged for codes not already present (see [`merge_missing`]).

use crate::config::Program;
use crate::error::DraftRejection;
use crate::pipeline::cascade::{clean_title, validate_draft, TITLE_CLASS};
use crate::pipeline::special::{registry_for, CompiledCase};
use crate::program::ProgramProfile;
use crate::record::{CourseRecord, CourseType, ExtractionMethod, Term};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Backup titles are cut to this many characters.
const MAX_TITLE_CHARS: usize = 50;

static RE_TERM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4}-[0-2])").unwrap());
static RE_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-ZÀ-ÿ\s]+)(\d{1,2})(\d)\.\d{2}[PAE]").unwrap());
static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}").unwrap());

/// Code and code-plus-title patterns of one program.
struct BackupPatterns {
    code: Regex,
    titled: Regex,
}

impl BackupPatterns {
    fn compile(profile: &ProgramProfile) -> Self {
        let flex = profile.flexible_code_pattern;
        Self {
            code: Regex::new(&format!("({flex})")).unwrap_or_else(|e| panic!("Invalid backup code pattern: {e}")),
            titled: Regex::new(&format!(r"({flex})\s*[-–]\s*({TITLE_CLASS}+)"))
                .unwrap_or_else(|e| panic!("Invalid backup title pattern: {e}")),
        }
    }
}

static SOFTWARE_PATTERNS: Lazy<BackupPatterns> =
    Lazy::new(|| BackupPatterns::compile(Program::Software.profile()));
static SYSTEMS_PATTERNS: Lazy<BackupPatterns> =
    Lazy::new(|| BackupPatterns::compile(Program::Systems.profile()));

fn patterns_for(program: Program) -> &'static BackupPatterns {
    match program {
        Program::Software => &SOFTWARE_PATTERNS,
        Program::Systems => &SYSTEMS_PATTERNS,
    }
}

/// Records and rejections of one backup pass.
#[derive(Debug, Default)]
pub struct BackupOutcome {
    pub courses: Vec<CourseRecord>,
    pub rejected: Vec<DraftRejection>,
}

/// Re-scan every line for anything that looks like a course.
///
/// Keeps its own term: any `YYYY-S` token on any line becomes current.
pub fn backup_pass(lines: &[&str], profile: &ProgramProfile, default_term: &Term) -> BackupOutcome {
    let patterns = patterns_for(profile.program);
    let mut outcome = BackupOutcome::default();
    let mut term = default_term.clone();

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = RE_TERM.captures(line) {
            term = Term::new(&caps[1]);
        }
        let Some(code) = patterns.code.captures(line).map(|c| c[1].to_string()) else {
            continue;
        };

        let title = patterns
            .titled
            .captures_iter(line)
            .find(|caps| caps[1] == code)
            .map(|caps| clean_title(&caps[2]))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| profile.placeholder_title.to_string());
        let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
        let title = title.trim_end().to_string();

        let (grade, mut credits) = read_numbers(line);
        if credits == 0 {
            credits = profile.default_credits(&code).map(u32::from).unwrap_or(0);
        }

        match validate_draft(&code, &title, grade, credits, idx + 1) {
            Ok((grade, credits)) => {
                debug!("[backup] {code} {title:?} grade={grade} credits={credits} term={term}");
                outcome.courses.push(
                    CourseRecord::new(code, title, grade, credits, term.clone())
                        .with_type(CourseType::Mandatory)
                        .with_method(ExtractionMethod::Backup)
                        .at_line(idx + 1),
                );
            }
            Err(rejection) => {
                debug!("Backup draft rejected: {rejection}");
                outcome.rejected.push(rejection);
            }
        }
    }
    outcome
}

/// Grade and credits from a line: the fused tail when present, else the
/// first plausible small numbers.
fn read_numbers(line: &str) -> (u32, u32) {
    if let Some(caps) = RE_TAIL.captures(line) {
        let grade = caps[2].parse().unwrap_or(0);
        let credits = caps[3].parse().unwrap_or(0);
        return (grade, credits);
    }
    let (mut grade, mut credits) = (0u32, 0u32);
    for m in RE_NUMBER.find_iter(line) {
        let Ok(n) = m.as_str().parse::<u32>() else {
            continue;
        };
        if n <= 20 && grade == 0 {
            grade = n;
        }
        if (1..=8).contains(&n) && credits == 0 && grade > 0 {
            credits = n;
        }
    }
    (grade, credits)
}

/// Append records whose code is not present yet. Returns how many were added.
pub fn merge_missing(courses: &mut Vec<CourseRecord>, extra: Vec<CourseRecord>) -> usize {
    let mut present: HashSet<String> = courses.iter().map(|c| c.code.clone()).collect();
    let before = courses.len();
    for record in extra {
        if present.insert(record.code.clone()) {
            courses.push(record);
        }
    }
    courses.len() - before
}

/// Whole-document search for registry courses that have a rescan recipe
/// and are still missing.
///
/// Title patterns anchor first. When they find nothing at all, any line
/// with two or more recipe keywords anchors instead. An anchor resolves
/// like the line scan does, registry default included. Programs with
/// emergency rescan then add the emergency record for a code that is
/// mentioned but still unresolved.
pub fn rescan_missing(lines: &[&str], profile: &ProgramProfile, courses: &[CourseRecord]) -> Vec<CourseRecord> {
    let present: HashSet<&str> = courses.iter().map(|c| c.code.as_str()).collect();
    let missing: Vec<_> = registry_for(profile.program)
        .iter()
        .filter(|c| c.case.rescan.is_some() && !present.contains(c.case.code))
        .collect();
    if missing.is_empty() {
        return Vec::new();
    }

    let mut found: Vec<CourseRecord> = Vec::new();
    let is_found = |found: &[CourseRecord], code: &str| found.iter().any(|c| c.code == code);

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        for case in &missing {
            if is_found(&found, case.case.code) || !case.rescan_matches(line) {
                continue;
            }
            info!("Rescan found {} near line {}", case.case.code, idx + 1);
            if let Some(record) = rescan_resolve(case, lines, idx) {
                found.push(record);
            }
        }
    }

    if found.is_empty() {
        for (idx, raw) in lines.iter().enumerate() {
            let line = raw.trim();
            for case in &missing {
                if is_found(&found, case.case.code) || case.keyword_hits(line) < 2 {
                    continue;
                }
                warn!("Aggressive rescan anchoring {} on line {}", case.case.code, idx + 1);
                if let Some(record) = rescan_resolve(case, lines, idx) {
                    found.push(record);
                }
            }
        }
    }

    if profile.emergency_rescan {
        for case in &missing {
            let Some(emergency) = case.case.rescan.and_then(|r| r.emergency) else {
                continue;
            };
            if is_found(&found, case.case.code) {
                continue;
            }
            let Some(line_idx) = lines.iter().position(|l| l.contains(case.case.code)) else {
                continue;
            };
            warn!(
                "{} is mentioned but unresolved; adding default grade {}",
                case.case.code, emergency.grade
            );
            found.push(
                CourseRecord::new(
                    case.case.code,
                    case.case.title,
                    emergency.grade,
                    case.case.credits,
                    Term::new(emergency.term),
                )
                .with_type(case.case.course_type)
                .with_method(ExtractionMethod::Emergency)
                .at_line(line_idx + 1),
            );
        }
    }
    found
}

/// Resolve a rescan anchor at the course's fallback term.
fn rescan_resolve(case: &CompiledCase, lines: &[&str], idx: usize) -> Option<CourseRecord> {
    let record = case.resolve(lines, idx, Term::new(case.case.fallback_term));
    if record.is_none() {
        debug!("{}: nothing readable near line {}", case.case.code, idx + 1);
    }
    record
}
