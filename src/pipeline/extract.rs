//! The extraction run: line scan, backup phase, period inference.
//!
//! ```text
//! text ──▶ prepare ──▶ line scan ──────────────▶ backup? ──▶ infer? ──▶ courses
//!                      │ tracker.observe          (< threshold)
//!                      │ cascade (candidates)
//!                      └ special cases (absent codes)
//! ```
//!
//! Every piece of mutable state (tracker, course list, rejections) is local
//! to one call of [`run`]. Compiled patterns are shared read-only.

use crate::config::ExtractionConfig;
use crate::error::{DraftRejection, TranscriptError};
use crate::pipeline::backup::{backup_pass, merge_missing, rescan_missing};
use crate::pipeline::cascade::{cascade_for, extract_line, is_candidate};
use crate::pipeline::normalize::{prepare_text, split_lines};
use crate::pipeline::period::{infer_terms, needs_inference, LineClass, TermTracker};
use crate::pipeline::special::registry_for;
use crate::record::{CourseRecord, Term};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Characters of text included in a [`TranscriptError::NoExtractableCourses`].
const SAMPLE_CHARS: usize = 300;

/// Raw result of one extraction run, before deduplication.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub courses: Vec<CourseRecord>,
    pub rejected: Vec<DraftRejection>,
    pub backup_used: bool,
    pub terms_inferred: bool,
    pub line_count: usize,
    /// Characters of prepared text.
    pub text_length: usize,
}

/// Extract course records from transcript text.
///
/// # Errors
/// - [`TranscriptError::EmptyDocument`] when the text is blank.
/// - [`TranscriptError::NoExtractableCourses`] when nothing survives every pass.
pub fn run(text: &str, config: &ExtractionConfig) -> Result<Extraction, TranscriptError> {
    let prepared = prepare_text(text);
    if prepared.trim().is_empty() {
        return Err(TranscriptError::EmptyDocument);
    }
    let lines = split_lines(&prepared);
    let profile = config.program.profile();
    let cascade = cascade_for(config.program);
    let registry = registry_for(config.program);

    let mut out = Extraction {
        line_count: lines.len(),
        text_length: prepared.chars().count(),
        ..Extraction::default()
    };
    info!(
        "Scanning {} lines ({} chars) as {}",
        out.line_count, out.text_length, config.program
    );

    // ── Line scan ────────────────────────────────────────────────────────
    let mut tracker = TermTracker::new();
    let mut present: HashSet<String> = HashSet::new();

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() || tracker.observe(line) == LineClass::Header {
            continue;
        }

        if is_candidate(line, profile) {
            let term = tracker.current_or(config.default_term.as_str());
            let outcome = extract_line(cascade, line, idx + 1, &term);
            for course in outcome.courses {
                present.insert(course.code.clone());
                out.courses.push(course);
            }
            out.rejected.extend(outcome.rejected);
        }

        for case in registry {
            if present.contains(case.case.code) || !case.case.is_triggered_by(line) {
                continue;
            }
            let term = tracker
                .current()
                .cloned()
                .unwrap_or_else(|| Term::new(case.case.fallback_term));
            if let Some(record) = case.resolve(&lines, idx, term) {
                debug!("Special case {} resolved on line {}", record.code, idx + 1);
                present.insert(record.code.clone());
                out.courses.push(record);
            }
        }
    }
    info!(
        "Line scan found {} courses ({} drafts rejected)",
        out.courses.len(),
        out.rejected.len()
    );

    // ── Backup phase ─────────────────────────────────────────────────────
    if out.courses.len() < config.backup_threshold {
        if config.enable_backup {
            warn!(
                "Only {} courses found (threshold {}), running backup pass",
                out.courses.len(),
                config.backup_threshold
            );
            out.backup_used = true;
            let backup = backup_pass(&lines, profile, &config.default_term);
            out.rejected.extend(backup.rejected);
            let added = merge_missing(&mut out.courses, backup.courses);
            let rescued = rescan_missing(&lines, profile, &out.courses);
            let rescued = merge_missing(&mut out.courses, rescued);
            info!("Backup pass added {added} courses, rescan {rescued}");
        } else {
            debug!("Backup pass disabled");
        }
    }

    // ── Period inference ─────────────────────────────────────────────────
    if config.infer_missing_terms && needs_inference(&out.courses, &config.default_term) {
        infer_terms(&mut out.courses, config.effective_chunk_size());
        out.terms_inferred = true;
    }

    if out.courses.is_empty() {
        return Err(TranscriptError::NoExtractableCourses {
            text_length: out.text_length,
            text_sample: prepared.chars().take(SAMPLE_CHARS).collect(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Program;
    use crate::record::ExtractionMethod;

    fn config() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    #[test]
    fn blank_text_is_empty_document() {
        assert!(matches!(run("", &config()), Err(TranscriptError::EmptyDocument)));
        assert!(matches!(run(" \r\n\t \u{200B}", &config()), Err(TranscriptError::EmptyDocument)));
    }

    #[test]
    fn text_without_courses() {
        let err = run("Universidad Nacional Mayor de San Marcos\nConstancia", &config()).unwrap_err();
        match err {
            TranscriptError::NoExtractableCourses { text_length, text_sample } => {
                assert!(text_length > 0);
                assert!(text_sample.starts_with("Universidad"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_terms_flow_into_courses() {
        let text = "\
PERIODO ACADÉMICO 2022-1
12022OINE002 - PROGRAMACIÓN Y COMPUTACIÓN142.01P
PERIODO ACADÉMICO 2022-2
12022OINE006 - MATEMÁTICA BÁSICA PARA INGENIERÍA124.00P";
        let out = run(text, &config()).unwrap();
        let ine002 = out.courses.iter().find(|c| c.code == "INE002").unwrap();
        let ine006 = out.courses.iter().find(|c| c.code == "INE006").unwrap();
        assert_eq!(ine002.term.as_str(), "2022-1");
        assert_eq!(ine006.term.as_str(), "2022-2");
        assert_eq!(ine002.line_number, Some(2));
        assert!(!out.terms_inferred);
    }

    #[test]
    fn special_case_uses_fallback_term_without_tracker() {
        let config = ExtractionConfig::builder().enable_backup(false).build().unwrap();
        let text = "INO101 - REDACCIÓN Y TÉCNICAS DE COMUNICACIÓN EFECTIVA I\n173.06P";
        let out = run(text, &config).unwrap();
        assert_eq!(out.courses.len(), 1);
        let c = &out.courses[0];
        assert_eq!(c.code, "INO101");
        assert_eq!(c.grade, 17);
        assert_eq!(c.extraction_method, ExtractionMethod::Special);
        // Every course carries the default term, so positions decide.
        assert!(out.terms_inferred);
        assert_eq!(c.term.as_str(), "2023-1");
    }

    #[test]
    fn backup_only_below_threshold() {
        let text = "PERIODO ACADÉMICO 2022-1\nINE002 - PROGRAMACIÓN Y COMPUTACIÓN142.01P";
        let out = run(text, &config()).unwrap();
        assert!(out.backup_used);
        assert_eq!(out.courses.len(), 1, "backup adds nothing already present");

        let config = ExtractionConfig::builder().backup_threshold(1).build().unwrap();
        assert!(!run(text, &config).unwrap().backup_used);
    }

    #[test]
    fn inference_can_be_disabled() {
        let text = "INE002 - PROGRAMACIÓN Y COMPUTACIÓN142.01P\nINE006 - MATEMÁTICA BÁSICA124.00P";
        let config = ExtractionConfig::builder()
            .infer_missing_terms(false)
            .build()
            .unwrap();
        let out = run(text, &config).unwrap();
        assert!(!out.terms_inferred);
        assert!(out.courses.iter().all(|c| c.term.as_str() == "2023-1"));
    }

    #[test]
    fn systems_program_reads_its_codes() {
        let config = ExtractionConfig::builder().program(Program::Systems).build().unwrap();
        let text = "PERIODO ACADÉMICO 2024-1\n12024O20118051 - BASE DE DATOS AVANZADA134.00P";
        let out = run(text, &config).unwrap();
        let c = out.courses.iter().find(|c| c.code == "20118051").unwrap();
        assert_eq!((c.grade, c.credits), (13, 4));
        assert_eq!(c.term.as_str(), "2024-1");
    }
}
