//! Configuration types for transcript extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The config is plain data: it can be
//! cloned into a blocking task, logged, or shared between concurrent runs.

use crate::error::TranscriptError;
use crate::record::Term;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Term assigned to courses found before any term marker.
pub const DEFAULT_TERM: &str = "2023-1";

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use transcript_average::{ExtractionConfig, Program};
///
/// let config = ExtractionConfig::builder()
///     .program(Program::Systems)
///     .backup_threshold(12)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Degree program whose course-code vocabulary the transcript uses. Default: Software.
    pub program: Program,

    /// Run the backup pass when the primary pass finds fewer courses than this. Default: 10.
    pub backup_threshold: usize,

    /// Allow the backup pass at all. Default: true.
    pub enable_backup: bool,

    /// Term given to courses seen before any term marker. Default: `2023-1`.
    ///
    /// Also the sentinel for period inference: when every course ends up with
    /// this term, terms are re-assigned by position.
    pub default_term: Term,

    /// Re-label terms by position when none were found in the text. Default: true.
    pub infer_missing_terms: bool,

    /// Courses per inferred term. `None` uses the program's own value (8 or 7).
    pub inference_chunk_size: Option<usize>,

    /// PDF user password for encrypted documents.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Largest PDF accepted, in bytes. Default: 10 MiB.
    pub max_file_bytes: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            program: Program::default(),
            backup_threshold: 10,
            enable_backup: true,
            default_term: Term::new(DEFAULT_TERM),
            infer_missing_terms: true,
            inference_chunk_size: None,
            password: None,
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("program", &self.program)
            .field("backup_threshold", &self.backup_threshold)
            .field("enable_backup", &self.enable_backup)
            .field("default_term", &self.default_term)
            .field("infer_missing_terms", &self.infer_missing_terms)
            .field("inference_chunk_size", &self.inference_chunk_size)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_file_bytes", &self.max_file_bytes)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Chunk size actually used by period inference.
    pub fn effective_chunk_size(&self) -> usize {
        self.inference_chunk_size
            .unwrap_or_else(|| self.program.profile().inference_chunk_size)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn program(mut self, program: Program) -> Self {
        self.config.program = program;
        self
    }

    pub fn backup_threshold(mut self, n: usize) -> Self {
        self.config.backup_threshold = n;
        self
    }

    pub fn enable_backup(mut self, v: bool) -> Self {
        self.config.enable_backup = v;
        self
    }

    pub fn default_term(mut self, term: impl Into<String>) -> Self {
        self.config.default_term = Term::new(term.into().trim());
        self
    }

    pub fn infer_missing_terms(mut self, v: bool) -> Self {
        self.config.infer_missing_terms = v;
        self
    }

    pub fn inference_chunk_size(mut self, n: usize) -> Self {
        self.config.inference_chunk_size = Some(n.max(1));
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn max_file_bytes(mut self, n: u64) -> Self {
        self.config.max_file_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, TranscriptError> {
        let c = &self.config;
        if !c.default_term.is_well_formed() {
            return Err(TranscriptError::InvalidConfig(format!(
                "default term must look like YYYY-S with S in 0-2, got {:?}",
                c.default_term.as_str()
            )));
        }
        if c.max_file_bytes == 0 {
            return Err(TranscriptError::InvalidConfig(
                "max file size must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Degree program a transcript belongs to.
///
/// The two programs share the transcript layout but use different course-code
/// prefixes and a different set of courses whose rendering is known to break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    /// Software Engineering (`INE`, `INO`, `202SW` codes). (default)
    #[default]
    Software,
    /// Systems Engineering (`INE`, `INO`, `20118` codes).
    Systems,
}

impl FromStr for Program {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "software" | "sw" => Ok(Program::Software),
            "systems" | "sistemas" | "sys" => Ok(Program::Systems),
            other => Err(TranscriptError::InvalidConfig(format!(
                "unknown program {other:?} (expected software or systems)"
            ))),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert_eq!(c.program, Program::Software);
        assert_eq!(c.backup_threshold, 10);
        assert_eq!(c.default_term.as_str(), "2023-1");
        assert_eq!(c.effective_chunk_size(), 8);
    }

    #[test]
    fn systems_uses_its_own_chunk_size() {
        let c = ExtractionConfig::builder()
            .program(Program::Systems)
            .build()
            .unwrap();
        assert_eq!(c.effective_chunk_size(), 7);
    }

    #[test]
    fn chunk_size_is_clamped() {
        let c = ExtractionConfig::builder()
            .inference_chunk_size(0)
            .build()
            .unwrap();
        assert_eq!(c.effective_chunk_size(), 1);
    }

    #[test]
    fn bad_default_term_is_rejected() {
        let err = ExtractionConfig::builder()
            .default_term("2023-5")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("YYYY-S"), "got: {err}");
    }

    #[test]
    fn program_from_str() {
        assert_eq!("Sistemas".parse::<Program>().unwrap(), Program::Systems);
        assert_eq!("software".parse::<Program>().unwrap(), Program::Software);
        assert!("medicine".parse::<Program>().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ExtractionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
