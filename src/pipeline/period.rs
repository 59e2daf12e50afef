//! Line classification, term tracking and period inference.
//!
//! The tracker is a plain value owned by one extraction run and threaded
//! through the line loop; nothing about the current term lives outside it.

use crate::record::{CourseRecord, Term};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Phrases that open a term section in the transcript.
pub const HEADER_PHRASES: &[&str] = &["PERIODO ACADÉMICO", "Periodo Académico", "PERÍODO ACADÉMICO"];

/// Labels handed out, in order, when terms have to be inferred.
pub const INFERENCE_ROTATION: &[&str] = &["2023-1", "2023-2", "2024-1", "2024-2", "2025-0", "2025-1"];

// Digits and word boundaries are ASCII-only throughout.
static RE_TERM: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]{4}-[0-2])").unwrap());
static RE_BARE_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)([0-9]{4}-[0-2])(?-u:\b)").unwrap());
static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]{4})").unwrap());
static RE_SEMESTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[^0-9])([0-2])(?:[^0-9]|$)").unwrap());

/// What the tracker made of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// A term header. Not scanned for courses.
    Header,
    /// Anything else.
    Content,
}

pub fn is_term_header(line: &str) -> bool {
    HEADER_PHRASES.iter().any(|p| line.contains(p))
}

/// Term written on a header line: a literal `YYYY-S`, else a year token plus
/// a lone semester digit elsewhere on the line.
pub fn header_term(line: &str) -> Option<Term> {
    if let Some(caps) = RE_TERM.captures(line) {
        return Some(Term::new(&caps[1]));
    }
    let year = RE_YEAR.captures(line)?;
    let year = year.get(1)?;
    let rest = format!("{} {}", &line[..year.start()], &line[year.end()..]);
    let semester = RE_SEMESTER.captures(&rest)?;
    Some(Term::new(format!("{}-{}", year.as_str(), &semester[1])))
}

/// Running "current term" of one scan.
#[derive(Debug, Default, Clone)]
pub struct TermTracker {
    current: Option<Term>,
}

impl TermTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a trimmed line, updating the current term as needed.
    pub fn observe(&mut self, line: &str) -> LineClass {
        if is_term_header(line) {
            match header_term(line) {
                Some(term) => {
                    debug!("Term header: {term}");
                    self.current = Some(term);
                }
                None => debug!("Term header without a readable term: {line:?}"),
            }
            return LineClass::Header;
        }
        if self.current.is_none() {
            if let Some(caps) = RE_BARE_TERM.captures(line) {
                let term = Term::new(&caps[1]);
                debug!("Term seeded from bare token: {term}");
                self.current = Some(term);
            }
        }
        LineClass::Content
    }

    pub fn current(&self) -> Option<&Term> {
        self.current.as_ref()
    }

    /// Current term, or `fallback` when none has been seen.
    pub fn current_or(&self, fallback: &str) -> Term {
        self.current.clone().unwrap_or_else(|| Term::new(fallback))
    }
}

// ── Period inference ─────────────────────────────────────────────────────

/// True when no course carries a term other than the default.
pub fn needs_inference(courses: &[CourseRecord], default_term: &Term) -> bool {
    !courses.is_empty()
        && courses
            .iter()
            .all(|c| c.term.is_empty() || &c.term == default_term)
}

/// Re-label terms by position: chunks of `chunk_size` courses per term,
/// following [`INFERENCE_ROTATION`] and staying on its last label.
pub fn infer_terms(courses: &mut [CourseRecord], chunk_size: usize) {
    let chunk_size = chunk_size.max(1);
    let last = INFERENCE_ROTATION.len() - 1;
    warn!(
        "No term markers found; inferring terms for {} courses ({} per term)",
        courses.len(),
        chunk_size
    );
    for (i, course) in courses.iter_mut().enumerate() {
        let label = INFERENCE_ROTATION[(i / chunk_size).min(last)];
        course.term = Term::new(label);
        course.inferred_term = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_with_literal_term() {
        assert_eq!(
            header_term("PERIODO ACADÉMICO: 2024-2"),
            Some(Term::from("2024-2"))
        );
    }

    #[test]
    fn header_with_split_year_and_semester() {
        assert_eq!(
            header_term("PERÍODO ACADÉMICO 2023 SEMESTRE 2"),
            Some(Term::from("2023-2"))
        );
        assert_eq!(
            header_term("Periodo Académico 1 del 2024"),
            Some(Term::from("2024-1"))
        );
        assert_eq!(header_term("PERIODO ACADÉMICO"), None);
    }

    #[test]
    fn tracker_updates_on_headers_only() {
        let mut t = TermTracker::new();
        assert_eq!(t.observe("PERIODO ACADÉMICO 2022-1"), LineClass::Header);
        assert_eq!(t.current(), Some(&Term::from("2022-1")));
        // A bare token no longer overrides once a term is known.
        assert_eq!(t.observe("Impreso el 2025-1"), LineClass::Content);
        assert_eq!(t.current(), Some(&Term::from("2022-1")));
        t.observe("PERIODO ACADÉMICO 2022-2");
        assert_eq!(t.current_or("2023-1"), Term::from("2022-2"));
    }

    #[test]
    fn tracker_seeds_from_bare_token() {
        let mut t = TermTracker::new();
        assert_eq!(t.current_or("2023-1"), Term::from("2023-1"));
        t.observe("Matrícula 2021-2 regular");
        assert_eq!(t.current(), Some(&Term::from("2021-2")));
    }

    #[test]
    fn bare_token_must_stand_alone() {
        let mut t = TermTracker::new();
        t.observe("código 120231");
        t.observe("x2023-1y");
        assert!(t.current().is_none());
    }

    #[test]
    fn bare_token_needs_ascii_digits() {
        let mut t = TermTracker::new();
        t.observe("Matrícula ٢٠٢٣-1 regular");
        assert!(t.current().is_none());
        t.observe("Matrícula 2023-1 regular");
        assert_eq!(t.current(), Some(&Term::from("2023-1")));
    }

    fn course(i: usize, term: &str) -> CourseRecord {
        CourseRecord::new(format!("INE{i:03}"), "CURSO DE PRUEBA", 12, 3, Term::from(term))
    }

    #[test]
    fn inference_only_when_all_default() {
        let default = Term::from("2023-1");
        let all_default: Vec<_> = (0..3).map(|i| course(i, "2023-1")).collect();
        assert!(needs_inference(&all_default, &default));

        let mut mixed = all_default.clone();
        mixed[1].term = Term::from("2024-1");
        assert!(!needs_inference(&mixed, &default));
        assert!(!needs_inference(&[], &default));
    }

    #[test]
    fn inference_rotates_and_sticks() {
        let mut courses: Vec<_> = (0..20).map(|i| course(i, "2023-1")).collect();
        infer_terms(&mut courses, 3);
        assert_eq!(courses[0].term.as_str(), "2023-1");
        assert_eq!(courses[3].term.as_str(), "2023-2");
        assert_eq!(courses[12].term.as_str(), "2025-0");
        assert_eq!(courses[15].term.as_str(), "2025-1");
        assert_eq!(courses[19].term.as_str(), "2025-1");
        assert!(courses.iter().all(|c| c.inferred_term));
    }
}
