//! Known courses whose transcript rendering fragments, per program.
//!
//! Read-only configuration data interpreted by [`crate::pipeline::special`].
//! `{code}` inside a pattern is replaced by the entry's own code when the
//! registry is compiled. Default grades are fallback constants for when no
//! strategy reads a grade; they are not derived from anything.

use crate::pipeline::special::{Clause, Emergency, Scan, Rescan, SpecialCase, Strategy, Window};
use crate::record::CourseType;

// ── Shared strategy lists ────────────────────────────────────────────────

const WIDE: Window = Window::around(8, 8);
const NEAR: Window = Window::around(2, 5);
const LOCAL: Window = Window::around(1, 2);
const SAME_LINE: Window = Window::around(0, 0);

/// Writing-course family: credit digit 3, grade usually split onto the next
/// line or interleaved with enrolment numbers.
const WRITING: &[Strategy] = &[
    // (a) code-anchored
    Strategy::new(WIDE, Scan::First(r"(?i){code}.*?(\d{1,2})\d?\.?\d*[PAE]")).range(6, 20),
    Strategy::new(WIDE, Scan::First(r"(?i){code}.*?(\d{1,2})\s*3")).range(6, 20),
    Strategy::new(WIDE, Scan::First(r"(?i){code}[\s\S]*?(\d{1,2})\s*3[\s\S]*?[PAE]")).range(6, 20),
    Strategy::new(WIDE, Scan::First(r"(?i){code}[\s\S]*?(\d{2})\d\.\d{2}[PAE]")).range(6, 20),
    // (b) title-keyword-anchored
    Strategy::new(WIDE, Scan::First(r"(?i)REDACCI[ÓO]N.*?(\d{1,2})\d?\.\d*[PAE]")).range(6, 20),
    Strategy::new(WIDE, Scan::First(r"(?i)REDACCI[ÓO]N.*?(\d{1,2})\s*3")).range(6, 20),
    Strategy::new(WIDE, Scan::First(r"(?i)T[ÉE]CNICAS.*?(\d{1,2})\d?\.\d*[PAE]")).range(6, 20),
    Strategy::new(WIDE, Scan::First(r"(?i)T[ÉE]CNICAS.*?(\d{1,2})\s*3")).range(6, 20),
    Strategy::new(WIDE, Scan::First(r"(?i)COMUNICACI[ÓO]N.*?(\d{1,2})\d?\.\d*[PAE]")).range(6, 20),
    Strategy::new(WIDE, Scan::First(r"(?i)(\d{2})3\.\d{2}[PAE]")).range(6, 20),
    // (c) bare grade followed by the credit digit
    Strategy::new(WIDE, Scan::Each(r"(\d{1,2})3\.\d{2}[PAE]")).range(6, 20).excluding(&[3]),
    Strategy::new(WIDE, Scan::Each(r"(?i)(\d{1,2})\s*3\s*[PAE]")).range(6, 20).excluding(&[3]),
    Strategy::new(WIDE, Scan::Each(r"(?i)(\d{1,2})\d\.\d{2}[PAE]")).range(6, 20).excluding(&[3]),
    Strategy::new(WIDE, Scan::Each(r"(?i)(\d{2})\d\.\d{2}[PAE]")).range(6, 20).excluding(&[3]),
    // (d) any passing two-digit number on a line naming the course
    Strategy::new(
        WIDE,
        Scan::Lines {
            keywords: &["{code}", "REDACCI", "TÉCNICAS"],
            offset: 0,
            pattern: r"(\d{2})",
        },
    )
    .range(10, 20),
    Strategy::new(
        NEAR,
        Scan::Lines {
            keywords: &[],
            offset: 0,
            pattern: r"(\d{2})\d\.\d{2}[PAE]",
        },
    )
    .range(10, 20),
];

const WRITING_PATTERNS_I: &[&str] = &[
    r"(?i){code}",
    r"(?i)REDACCI[ÓO]N.*?T[ÉE]CNICAS.*?COMUNICACI[ÓO]N.*?EFECTIVA.*?I",
    r"(?i)T[ÉE]CNICAS.*?COMUNICACI[ÓO]N.*?EFECTIVA.*?I",
    r"(?i)REDACCI[ÓO]N.*?I\b",
];

const WRITING_PATTERNS_II: &[&str] = &[
    r"(?i){code}",
    r"(?i)REDACCI[ÓO]N.*?T[ÉE]CNICAS.*?COMUNICACI[ÓO]N.*?EFECTIVA.*?II",
    r"(?i)T[ÉE]CNICAS.*?COMUNICACI[ÓO]N.*?EFECTIVA.*?II",
    r"(?i)REDACCI[ÓO]N.*?II",
];

const WRITING_KEYWORDS: &[&str] = &[
    r"(?i)REDACCI",
    r"(?i)T[ÉE]CNICAS",
    r"(?i)COMUNICACI[ÓO]N",
    r"(?i)EFECTIVA",
];

const WRITING_I_TITLE: &str = "REDACCIÓN Y TÉCNICAS DE COMUNICACIÓN EFECTIVA I";
const WRITING_II_TITLE: &str = "REDACCIÓN Y TÉCNICAS DE COMUNICACIÓN EFECTIVA II";

// ── Software Engineering ─────────────────────────────────────────────────

pub const SOFTWARE_CASES: &[SpecialCase] = &[
    SpecialCase {
        code: "INO101",
        title: WRITING_I_TITLE,
        credits: 3,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["INO101"]), Clause::all(&["REDACCI"])],
        fallback_term: "2023-1",
        strategies: WRITING,
        default_grade: Some(15),
        rescan: Some(Rescan {
            patterns: WRITING_PATTERNS_I,
            keywords: WRITING_KEYWORDS,
            emergency: None,
        }),
    },
    SpecialCase {
        code: "INO201",
        title: WRITING_II_TITLE,
        credits: 3,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["INO201"]), Clause::all(&["REDACCI", "II"])],
        fallback_term: "2023-2",
        strategies: WRITING,
        default_grade: Some(16),
        rescan: Some(Rescan {
            patterns: WRITING_PATTERNS_II,
            keywords: WRITING_KEYWORDS,
            emergency: None,
        }),
    },
    SpecialCase {
        code: "202SW0E02",
        title: "EMPRENDIMIENTO E INNOVACIÓN",
        credits: 2,
        course_type: CourseType::Elective,
        trigger: &[Clause::all(&["202SW0E02", "EMPRENDIMIENTO"])],
        fallback_term: "2024-2",
        strategies: &[
            Strategy::new(SAME_LINE, Scan::First(r"EMPRENDIMIENTO.*?(\d{1,2})\d\.\d{2}[PAE]")),
            Strategy::new(SAME_LINE, Scan::First(r"(\d{1,2})\d\.\d{2}[PAE].*EMPRENDIMIENTO")),
            Strategy::new(SAME_LINE, Scan::First(r"(\d{1,2})[\s\d]*[PAE]")),
        ],
        default_grade: Some(12),
        rescan: None,
    },
    SpecialCase {
        code: "202SW0305",
        title: "INTRODUCCIÓN AL DESARROLLO DE SOFTWARE",
        credits: 3,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["202SW0305", "INTRODUCCIÓN"])],
        fallback_term: "2024-2",
        strategies: &[
            Strategy::new(LOCAL, Scan::First(r"INTRODUCCIÓN.*?(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE]")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"{code}.*?(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE]")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE].*?INTRODUCCIÓN")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"(\d{1,2})\d\.?\d*[PAE].*?INTRODUCCIÓN")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"DESARROLLO.*?(\d{1,2})[\d\s]*3")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"SOFTWARE.*?(\d{1,2})[\d\s]*3")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"(\d{1,2})[\s\d]*[PAE]")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::Each(r"(?-u:\b)([0-9]{1,2})(?-u:\b)")).range(6, 20).excluding(&[3]),
        ],
        // 0 flags the course for manual review.
        default_grade: Some(0),
        rescan: None,
    },
    SpecialCase {
        code: "202SW0502",
        title: "ARQUITECTURA DE COMPUTADORAS",
        credits: 3,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["202SW0502", "ARQUITECTURA"])],
        fallback_term: "2025-1",
        strategies: &[
            Strategy::new(LOCAL, Scan::First(r"ARQUITECTURA.*?(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE]")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"{code}.*?(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE]")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE].*?ARQUITECTURA")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"(\d{1,2})\d\.?\d*[PAE].*?ARQUITECTURA")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"COMPUTADORAS.*?(\d{1,2})[\d\s]*3")).excluding(&[1, 3]),
            Strategy::new(LOCAL, Scan::First(r"(\d{1,2})[\s\d]*[PAE]")).excluding(&[1, 3]),
        ],
        default_grade: Some(12),
        rescan: None,
    },
    SpecialCase {
        code: "202SW0505",
        title: "ECONOMÍA PARA LA GESTIÓN",
        credits: 3,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["202SW0505", "ECONOMÍA"])],
        fallback_term: "2025-1",
        strategies: &[
            Strategy::new(LOCAL, Scan::First(r"(?:ECONOMÍA|{code}|GESTIÓN).*?(15)")),
            Strategy::new(LOCAL, Scan::First(r"ECONOMÍA.*?(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE]")).excluding(&[0, 3]),
            Strategy::new(LOCAL, Scan::First(r"{code}.*?(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE]")).excluding(&[0, 3]),
            Strategy::new(LOCAL, Scan::First(r"GESTIÓN.*?(\d{1,2})[\d\s]*3[\d\s]*\.?\d*[PAE]")).excluding(&[0, 3]),
            Strategy::new(LOCAL, Scan::First(r"{code}.*?ECONOMÍA.*?(\d{1,2})")).excluding(&[0, 3]),
            Strategy::new(LOCAL, Scan::First(r"ECONOMÍA.*?GESTIÓN.*?(\d{1,2})")).excluding(&[0, 3]),
        ],
        default_grade: Some(15),
        rescan: None,
    },
];

// ── Systems Engineering ──────────────────────────────────────────────────

/// Four-credit courses: the grade sits right before the credit digit 4.
/// `keyword_pattern` anchors on the title.
const fn four_credit(keyword_pattern: &'static str) -> [Strategy; 4] {
    [
        Strategy::new(LOCAL, Scan::First(r"(\d{1,2})[\d\s]*4[\d\s]*\.?\d*[PAE]")).excluding(&[1, 4]),
        Strategy::new(LOCAL, Scan::First(r"{code}.*?(\d{1,2})[\d\s]*4")).excluding(&[1, 4]),
        Strategy::new(LOCAL, Scan::First(keyword_pattern)).excluding(&[1, 4]),
        Strategy::new(LOCAL, Scan::First(r"(\d{1,2})[\s\d]*[PAE]")).excluding(&[1, 4]),
    ]
}

pub const SYSTEMS_CASES: &[SpecialCase] = &[
    SpecialCase {
        code: "INO101",
        title: WRITING_I_TITLE,
        credits: 3,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["INO101"]), Clause::all_but(&["REDACCI"], &["II"])],
        fallback_term: "2023-1",
        strategies: WRITING,
        default_grade: Some(15),
        rescan: Some(Rescan {
            patterns: WRITING_PATTERNS_I,
            keywords: WRITING_KEYWORDS,
            emergency: Some(Emergency { grade: 15, term: "2022-1" }),
        }),
    },
    SpecialCase {
        code: "INO201",
        title: WRITING_II_TITLE,
        credits: 3,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["INO201"]), Clause::all(&["REDACCI", "II"])],
        fallback_term: "2023-2",
        strategies: WRITING,
        default_grade: Some(16),
        rescan: Some(Rescan {
            patterns: WRITING_PATTERNS_II,
            keywords: WRITING_KEYWORDS,
            emergency: Some(Emergency { grade: 16, term: "2022-2" }),
        }),
    },
    SpecialCase {
        code: "20118041",
        title: "ALGORÍTMICA Y PROGRAMACIÓN ORIENTADA A OBJETOS",
        credits: 4,
        course_type: CourseType::Mandatory,
        trigger: &[
            Clause::all(&["20118041"]),
            Clause::all(&["ALGORÍTMICA", "PROGRAMACIÓN", "ORIENTADA"]),
        ],
        fallback_term: "2025-1",
        strategies: &[
            Strategy::new(
                Window::around(2, 3),
                Scan::Lines {
                    keywords: &["{code}"],
                    offset: 1,
                    pattern: r"(\d{2})4\.\d{2}[PAE]",
                },
            ),
            Strategy::new(Window::around(3, 4), Scan::First(r"{code}.*?(\d{2})4\.\d{2}[PAE]")),
            Strategy::new(Window::around(3, 4), Scan::First(r"ALGORÍTMICA.*?(\d{2})4\.\d{2}[PAE]")),
            Strategy::new(
                Window::around(3, 4),
                Scan::First(r"PROGRAMACIÓN ORIENTADA.*?(\d{2})4\.\d{2}[PAE]"),
            ),
            Strategy::new(
                NEAR,
                Scan::Lines {
                    keywords: &[],
                    offset: 0,
                    pattern: r"(\d{2})4\.\d{2}[PAE]",
                },
            )
            .range(10, 20),
        ],
        default_grade: Some(15),
        rescan: None,
    },
    SpecialCase {
        code: "INO204",
        title: "CÁLCULO I",
        credits: 4,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["INO204", "CÁLCULO"])],
        fallback_term: "2023-1",
        strategies: &four_credit(r"CÁLCULO.*?(\d{1,2})[\d\s]*4"),
        default_grade: Some(12),
        rescan: None,
    },
    SpecialCase {
        code: "20118031",
        title: "PROGRAMACIÓN Y FUNDAMENTOS DE ALGORÍTMICA",
        credits: 4,
        course_type: CourseType::Mandatory,
        trigger: &[
            Clause::all(&["20118031", "PROGRAMACIÓN"]),
            Clause::all(&["20118031", "ALGORÍTMICA"]),
        ],
        fallback_term: "2023-1",
        strategies: &four_credit(r"PROGRAMACIÓN.*?(\d{1,2})[\d\s]*4"),
        default_grade: Some(14),
        rescan: None,
    },
    SpecialCase {
        code: "20118051",
        title: "BASE DE DATOS",
        credits: 4,
        course_type: CourseType::Mandatory,
        trigger: &[Clause::all(&["20118051", "BASE"])],
        fallback_term: "2024-1",
        strategies: &four_credit(r"BASE.*?(\d{1,2})[\d\s]*4"),
        default_grade: Some(13),
        rescan: None,
    },
];
