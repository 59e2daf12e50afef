//! Per-program vocabulary: course-code prefixes, backup credit defaults and
//! the special-case registry.
//!
//! Profiles are static, read-only data. Every compiled artefact derived from
//! them (cascade regexes, registry patterns) is built once and shared by all
//! extraction runs.

use crate::config::Program;
use crate::pipeline::registry;
use crate::pipeline::special::SpecialCase;

/// Credits assumed by the backup pass when a line shows no credit digit.
#[derive(Debug, Clone, Copy)]
pub struct CreditDefault {
    /// Code prefix (or a full code) the default applies to.
    pub prefix: &'static str,
    pub credits: u8,
}

/// Static description of one degree program.
#[derive(Debug)]
pub struct ProgramProfile {
    pub program: Program,
    pub label: &'static str,
    /// Substrings that make a line worth feeding to the cascade.
    pub candidate_markers: &'static [&'static str],
    /// Course-code alternation used by the strict and spaced cascade stages.
    pub code_pattern: &'static str,
    /// Tighter code alternation used by the flexible stage and the backup pass.
    pub flexible_code_pattern: &'static str,
    /// Ordered: the first matching prefix wins, so full codes come first.
    pub credit_defaults: &'static [CreditDefault],
    /// Title given to backup records whose name could not be read.
    pub placeholder_title: &'static str,
    /// Courses per term when terms have to be inferred.
    pub inference_chunk_size: usize,
    pub special_cases: &'static [SpecialCase],
    /// Add registry defaults for rescannable courses that are mentioned but unresolved.
    pub emergency_rescan: bool,
}

impl ProgramProfile {
    /// Backup credit default for a course code.
    pub fn default_credits(&self, code: &str) -> Option<u8> {
        self.credit_defaults
            .iter()
            .find(|d| code.starts_with(d.prefix))
            .map(|d| d.credits)
    }
}

pub static SOFTWARE: ProgramProfile = ProgramProfile {
    program: Program::Software,
    label: "software",
    candidate_markers: &["INO", "202SW", "INE"],
    code_pattern: r"(?:INE|INO|202SW)\d{2,4}",
    flexible_code_pattern: r"INE\d{3}|INO\d{3}|202SW\d{4}",
    credit_defaults: &[
        CreditDefault { prefix: "INE", credits: 2 },
        CreditDefault { prefix: "INO", credits: 3 },
        CreditDefault { prefix: "202SW", credits: 3 },
    ],
    placeholder_title: "NOMBRE NO DISPONIBLE",
    inference_chunk_size: 8,
    special_cases: registry::SOFTWARE_CASES,
    emergency_rescan: false,
};

pub static SYSTEMS: ProgramProfile = ProgramProfile {
    program: Program::Systems,
    label: "systems",
    candidate_markers: &["INO", "INE", "20118"],
    code_pattern: r"(?:INE|INO)\d{2,4}|20118\d{3,6}",
    flexible_code_pattern: r"INE\d{3}|INO\d{3}|20118\d{3,6}",
    credit_defaults: &[
        CreditDefault { prefix: "INO204", credits: 4 },
        CreditDefault { prefix: "INE", credits: 2 },
        CreditDefault { prefix: "INO", credits: 3 },
        CreditDefault { prefix: "20118", credits: 4 },
    ],
    placeholder_title: "CURSO DE SISTEMAS",
    inference_chunk_size: 7,
    special_cases: registry::SYSTEMS_CASES,
    emergency_rescan: true,
};

impl Program {
    pub fn profile(&self) -> &'static ProgramProfile {
        match self {
            Program::Software => &SOFTWARE,
            Program::Systems => &SYSTEMS,
        }
    }
}
