//! Special-case resolver for courses whose PDF rendering is known to break.
//!
//! Some courses come out of the PDF-to-text step split over several lines:
//! the title on one line, the fused grade/credit tail on the next, sometimes
//! with unrelated text in between. The generic cascade cannot see them.
//!
//! Each such course is one [`SpecialCase`] entry: a trigger deciding which
//! lines mention it, a fixed credit weight, and a ranked list of
//! [`Strategy`] values tried in order until one yields a grade in range. A
//! per-course default grade is the last resort. The entries themselves live
//! in [`crate::pipeline::registry`]; this module only interprets them.
//!
//! Patterns are compiled once per program and shared read-only.

use crate::config::Program;
use crate::record::{CourseRecord, CourseType, ExtractionMethod, Term, MAX_GRADE};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

// ── Registry data types ──────────────────────────────────────────────────

/// One conjunction of keyword checks on a line.
#[derive(Debug, Clone, Copy)]
pub struct Clause {
    /// Every keyword must appear.
    pub all: &'static [&'static str],
    /// No keyword may appear.
    pub none: &'static [&'static str],
}

impl Clause {
    pub const fn all(keywords: &'static [&'static str]) -> Self {
        Clause { all: keywords, none: &[] }
    }

    pub const fn all_but(keywords: &'static [&'static str], none: &'static [&'static str]) -> Self {
        Clause { all: keywords, none }
    }

    fn matches(&self, line: &str) -> bool {
        self.all.iter().all(|k| line.contains(k)) && !self.none.iter().any(|k| line.contains(k))
    }
}

/// Lines around the anchor line a strategy looks at.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub before: usize,
    pub after: usize,
}

impl Window {
    pub const fn around(before: usize, after: usize) -> Self {
        Window { before, after }
    }

    /// Line indices covered when anchored at `anchor`, clamped to `len`.
    pub fn span(&self, anchor: usize, len: usize) -> std::ops::Range<usize> {
        let start = anchor.saturating_sub(self.before);
        let end = (anchor + self.after + 1).min(len);
        start..end.max(start)
    }
}

/// How a strategy looks for the grade. Capture group 1 is always the grade.
#[derive(Debug, Clone, Copy)]
pub enum Scan {
    /// First match over the space-joined window.
    First(&'static str),
    /// Every match over the space-joined window, in order.
    Each(&'static str),
    /// Per line of the window: when the line mentions one of `keywords`
    /// (every line when empty), the first match on the line `offset` below it.
    /// The course's own code is blanked out of the scanned line first.
    Lines {
        keywords: &'static [&'static str],
        offset: usize,
        pattern: &'static str,
    },
}

impl Scan {
    fn pattern(&self) -> &'static str {
        match self {
            Scan::First(p) | Scan::Each(p) => p,
            Scan::Lines { pattern, .. } => pattern,
        }
    }
}

/// One ranked attempt at reading a grade.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub window: Window,
    pub scan: Scan,
    /// Accepted grades, inclusive.
    pub min: u8,
    pub max: u8,
    /// Values rejected even inside the range (usually the credit digit).
    pub exclude: &'static [u8],
}

impl Strategy {
    pub const fn new(window: Window, scan: Scan) -> Self {
        Strategy { window, scan, min: 0, max: MAX_GRADE, exclude: &[] }
    }

    pub const fn range(mut self, min: u8, max: u8) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub const fn excluding(mut self, values: &'static [u8]) -> Self {
        self.exclude = values;
        self
    }

    fn accepts(&self, grade: u8) -> bool {
        let range: RangeInclusive<u8> = self.min..=self.max.min(MAX_GRADE);
        range.contains(&grade) && !self.exclude.contains(&grade)
    }
}

/// Backup-phase search for a course the primary pass never resolved.
#[derive(Debug, Clone, Copy)]
pub struct Rescan {
    /// Title/code patterns; a line matching any of them anchors the resolver.
    pub patterns: &'static [&'static str],
    /// Keywords for the aggressive pass; a line with two or more anchors.
    pub keywords: &'static [&'static str],
    /// Registry default added when the code is mentioned but never resolved.
    pub emergency: Option<Emergency>,
}

#[derive(Debug, Clone, Copy)]
pub struct Emergency {
    pub grade: u8,
    pub term: &'static str,
}

/// A course with a hand-written recovery recipe.
#[derive(Debug)]
pub struct SpecialCase {
    pub code: &'static str,
    pub title: &'static str,
    pub credits: u8,
    pub course_type: CourseType,
    /// The line mentions the course if any clause matches.
    pub trigger: &'static [Clause],
    /// Term used when the tracker has not seen one yet.
    pub fallback_term: &'static str,
    pub strategies: &'static [Strategy],
    /// Last-resort grade. Unvalidated guesses carried as data.
    pub default_grade: Option<u8>,
    pub rescan: Option<Rescan>,
}

impl SpecialCase {
    pub fn is_triggered_by(&self, line: &str) -> bool {
        self.trigger.iter().any(|c| c.matches(line))
    }
}

// ── Compiled registry ────────────────────────────────────────────────────

/// A strategy with its pattern compiled and its keywords resolved.
struct CompiledStrategy {
    spec: Strategy,
    re: Regex,
    keywords: Vec<String>,
}

/// A registry entry with its strategy patterns compiled.
pub struct CompiledCase {
    pub case: &'static SpecialCase,
    strategies: Vec<CompiledStrategy>,
    rescan_patterns: Vec<Regex>,
    keyword_patterns: Vec<Regex>,
}

fn compile(pattern: &str, code: &str) -> Regex {
    let source = pattern.replace("{code}", &regex::escape(code));
    Regex::new(&source).unwrap_or_else(|e| panic!("Invalid registry pattern for {code}: {e}"))
}

impl CompiledCase {
    fn new(case: &'static SpecialCase) -> Self {
        let strategies = case
            .strategies
            .iter()
            .map(|s| CompiledStrategy {
                spec: *s,
                re: compile(s.scan.pattern(), case.code),
                keywords: match s.scan {
                    Scan::Lines { keywords, .. } => keywords
                        .iter()
                        .map(|k| k.replace("{code}", case.code))
                        .collect(),
                    _ => Vec::new(),
                },
            })
            .collect();
        let (rescan_patterns, keyword_patterns) = match &case.rescan {
            Some(r) => (
                r.patterns.iter().map(|p| compile(p, case.code)).collect(),
                r.keywords.iter().map(|p| compile(p, case.code)).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            case,
            strategies,
            rescan_patterns,
            keyword_patterns,
        }
    }

    /// The line matches one of this case's rescan patterns.
    pub fn rescan_matches(&self, line: &str) -> bool {
        self.rescan_patterns.iter().any(|re| re.is_match(line))
    }

    /// Number of distinct aggressive-pass keywords on the line.
    pub fn keyword_hits(&self, line: &str) -> usize {
        self.keyword_patterns.iter().filter(|re| re.is_match(line)).count()
    }

    /// Grade read by the first strategy that accepts one, with its rank.
    pub fn read_grade(&self, lines: &[&str], anchor: usize) -> Option<(u8, usize)> {
        self.strategies.iter().enumerate().find_map(|(rank, strategy)| {
            scan_grade(strategy, self.case.code, lines, anchor).map(|grade| (grade, rank + 1))
        })
    }

    /// Try every strategy around `anchor`, then the default grade.
    ///
    /// Returns `None` only when no strategy matched and the case has no
    /// usable default. A returned grade is always within 0–20.
    pub fn resolve(&self, lines: &[&str], anchor: usize, term: Term) -> Option<CourseRecord> {
        let code = self.case.code;
        let grade = match self.read_grade(lines, anchor) {
            Some((grade, rank)) => {
                debug!("{code}: grade {grade} from strategy #{rank}");
                grade
            }
            None => match self.case.default_grade.filter(|g| *g <= MAX_GRADE) {
                Some(grade) => {
                    warn!("{code}: no strategy matched near line {}, using default grade {grade}", anchor + 1);
                    grade
                }
                None => return None,
            },
        };

        Some(
            CourseRecord::new(code, self.case.title, grade, self.case.credits, term)
                .with_type(self.case.course_type)
                .with_method(ExtractionMethod::Special)
                .at_line(anchor + 1),
        )
    }
}

fn grade_of(caps: &regex::Captures<'_>) -> Option<u8> {
    caps.get(1)?.as_str().parse().ok()
}

fn scan_grade(compiled: &CompiledStrategy, code: &str, lines: &[&str], anchor: usize) -> Option<u8> {
    let CompiledStrategy { spec, re, keywords } = compiled;
    let span = spec.window.span(anchor, lines.len());
    match spec.scan {
        Scan::First(_) => {
            let context = joined(&lines[span]);
            re.captures(&context)
                .and_then(|caps| grade_of(&caps))
                .filter(|g| spec.accepts(*g))
        }
        Scan::Each(_) => {
            let context = joined(&lines[span]);
            re.captures_iter(&context)
                .filter_map(|caps| grade_of(&caps))
                .find(|g| spec.accepts(*g))
        }
        Scan::Lines { offset, .. } => span
            .filter(|&i| keywords.is_empty() || keywords.iter().any(|k| lines[i].contains(k.as_str())))
            .filter_map(|i| lines.get(i + offset))
            .find_map(|target| {
                let target = target.replace(code, " ");
                re.captures(&target)
                    .and_then(|caps| grade_of(&caps))
                    .filter(|g| spec.accepts(*g))
            }),
    }
}

fn joined(lines: &[&str]) -> String {
    let mut context = lines.join(" ");
    context.push(' ');
    context
}

static SOFTWARE_REGISTRY: Lazy<Vec<CompiledCase>> =
    Lazy::new(|| Program::Software.profile().special_cases.iter().map(CompiledCase::new).collect());
static SYSTEMS_REGISTRY: Lazy<Vec<CompiledCase>> =
    Lazy::new(|| Program::Systems.profile().special_cases.iter().map(CompiledCase::new).collect());

/// Compiled registry for a program.
pub fn registry_for(program: Program) -> &'static [CompiledCase] {
    match program {
        Program::Software => SOFTWARE_REGISTRY.as_slice(),
        Program::Systems => SYSTEMS_REGISTRY.as_slice(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(program: Program, code: &str) -> &'static CompiledCase {
        registry_for(program)
            .iter()
            .find(|c| c.case.code == code)
            .unwrap()
    }

    #[test]
    fn all_registry_patterns_compile() {
        assert!(!registry_for(Program::Software).is_empty());
        assert!(!registry_for(Program::Systems).is_empty());
    }

    #[test]
    fn window_span_is_clamped() {
        let w = Window::around(8, 8);
        assert_eq!(w.span(2, 5), 0..5);
        assert_eq!(w.span(20, 30), 12..29);
        assert_eq!(Window::around(0, 0).span(3, 10), 3..4);
    }

    #[test]
    fn clause_matching() {
        let c = Clause::all_but(&["REDACCI"], &["II"]);
        assert!(c.matches("REDACCIÓN Y TÉCNICAS DE COMUNICACIÓN EFECTIVA I"));
        assert!(!c.matches("REDACCIÓN Y TÉCNICAS DE COMUNICACIÓN EFECTIVA II"));
    }

    #[test]
    fn redaccion_split_over_two_lines() {
        let lines = [
            "INO101 - REDACCIÓN Y TÉCNICAS DE COMUNICACIÓN EFECTIVA I",
            "173.06P",
        ];
        let c = case(Program::Software, "INO101");
        let record = c.resolve(&lines, 0, Term::from("2022-1")).unwrap();
        assert_eq!(record.grade, 17);
        assert_eq!(record.credits, 3);
        assert_eq!(record.term.as_str(), "2022-1");
        assert_eq!(record.extraction_method, ExtractionMethod::Special);
        assert_eq!(record.line_number, Some(1));
    }

    #[test]
    fn redaccion_falls_back_to_default() {
        let lines = ["REDACCIÓN Y TÉCNICAS DE COMUNICACIÓN EFECTIVA II"];
        let c = case(Program::Software, "INO201");
        let record = c.resolve(&lines, 0, Term::from("2023-2")).unwrap();
        assert_eq!(record.grade, 16);
        assert_eq!(record.title, "REDACCIÓN Y TÉCNICAS DE COMUNICACIÓN EFECTIVA II");
    }

    #[test]
    fn emprendimiento_reads_its_own_line() {
        let lines = ["2024E202SW0E02 - EMPRENDIMIENTO E INNOVACIÓN 142.00E"];
        let c = case(Program::Software, "202SW0E02");
        let record = c.resolve(&lines, 0, Term::from("2024-2")).unwrap();
        assert_eq!(record.grade, 14);
        assert_eq!(record.credits, 2);
        assert_eq!(record.course_type, CourseType::Elective);
    }

    #[test]
    fn introduccion_rejects_the_credit_digit() {
        // Nothing but the credit digit is readable: the scan must not take it.
        let lines = ["202SW0305 - INTRODUCCIÓN AL DESARROLLO DE SOFTWARE 3"];
        let c = case(Program::Software, "202SW0305");
        let record = c.resolve(&lines, 0, Term::from("2024-2")).unwrap();
        assert_eq!(record.grade, 0, "default flags the course for manual review");
    }

    #[test]
    fn algoritmica_reads_the_next_line() {
        let lines = [
            "20118041 - ALGORÍTMICA Y PROGRAMACIÓN ORIENTADA A OBJETOS",
            "164.00P",
        ];
        let c = case(Program::Systems, "20118041");
        let record = c.resolve(&lines, 0, Term::from("2025-1")).unwrap();
        assert_eq!(record.grade, 16);
        assert_eq!(record.credits, 4);
    }

    #[test]
    fn line_scan_ignores_the_code_digits() {
        // "10" inside INO101 is not a grade.
        let lines = ["Convalidación INO101"];
        let c = case(Program::Systems, "INO101");
        assert_eq!(c.read_grade(&lines, 0), None);
        assert_eq!(c.resolve(&lines, 0, Term::from("2023-1")).unwrap().grade, 15);
    }

    #[test]
    fn line_scan_reads_only_the_first_number() {
        // "05" is out of range, and "17" after it is not considered.
        let lines = ["Convalidación INO101 05 17"];
        let c = case(Program::Systems, "INO101");
        assert_eq!(c.read_grade(&lines, 0), None);
        assert_eq!(c.resolve(&lines, 0, Term::from("2023-1")).unwrap().grade, 15);

        let lines = ["Convalidación INO101 17 05"];
        assert_eq!(c.read_grade(&lines, 0).map(|(g, _)| g), Some(17));
    }

    #[test]
    fn standalone_numbers_use_ascii_boundaries() {
        let c = case(Program::Software, "202SW0305");
        let lines = ["202SW0305 - INTRODUCCIÓN", "PROMEDIO É15"];
        assert_eq!(c.read_grade(&lines, 0), Some((15, 8)));

        let lines = ["202SW0305 - INTRODUCCIÓN", "PROMEDIO ١٥"];
        let record = c.resolve(&lines, 0, Term::from("2024-2")).unwrap();
        assert_eq!(record.grade, 0);
    }

    #[test]
    fn calculo_ignores_credit_digit() {
        let lines = ["INO204 - CÁLCULO I 134.00P"];
        let c = case(Program::Systems, "INO204");
        let record = c.resolve(&lines, 0, Term::from("2023-1")).unwrap();
        assert_eq!(record.grade, 13);
    }

    #[test]
    fn triggers() {
        let sw = case(Program::Software, "INO201");
        assert!(sw.case.is_triggered_by("INO201 - REDACCIÓN"));
        assert!(sw.case.is_triggered_by("REDACCIÓN ... EFECTIVA II"));
        assert!(!sw.case.is_triggered_by("REDACCIÓN ... EFECTIVA I"));

        let arq = case(Program::Software, "202SW0502");
        assert!(arq.case.is_triggered_by("202SW0502 - ARQUITECTURA DE COMPUTADORAS"));
        assert!(!arq.case.is_triggered_by("202SW0502"));
    }

    #[test]
    fn rescan_patterns() {
        let c = case(Program::Software, "INO101");
        assert!(c.rescan_matches("redacción y técnicas de comunicación efectiva i"));
        assert_eq!(c.keyword_hits("TECNICAS DE COMUNICACION"), 2);
        assert_eq!(c.keyword_hits("MATEMÁTICA BÁSICA"), 0);
        assert!(case(Program::Software, "202SW0305").keyword_hits("anything") == 0);
    }
}
