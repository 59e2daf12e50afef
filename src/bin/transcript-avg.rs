//! CLI binary for transcript-average.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use transcript_average::pipeline::input::{self, InputKind};
use transcript_average::{
    analyze_pdf, analyze_text, extract_text, recalculate, write_report, AggregateResult,
    CalculationRequest, CourseRecord, ExtractionConfig, Program, Term, TranscriptReport,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Average of a transcript PDF
  transcript-avg record.pdf

  # Systems Engineering transcript, courses up to 2024-1 only
  transcript-avg --program systems --cutoff 2024-1 record.pdf

  # Already-extracted text from stdin
  pdftotext -layout record.pdf - | transcript-avg -

  # Leave a course out and correct a misread grade
  transcript-avg --exclude INO101 --grade INE002=15 record.pdf

  # Full JSON report to a file
  transcript-avg --json record.pdf -o report.json

  # Recompute an edited course list (JSON body with "courses" and "cutoffTerm")
  transcript-avg --recalculate edited.json

  # See the text the extractor works on
  transcript-avg --dump-text record.pdf

FORMULA:
  average = Σ(grade × credits) / Σ credits over every course, approved or
  not, after keeping one record per course (user edits first, then the
  highest grade). Rounded to 3 decimals.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Directory holding libpdfium (else the system loader)
  TRANSCRIPT_PROGRAM      Default for --program
  TRANSCRIPT_CUTOFF       Default for --cutoff
  TRANSCRIPT_PASSWORD     Default for --password
  RUST_LOG                Overrides the log filter (e.g. transcript_average=debug)
"#;

/// Compute the credit-weighted grade average of a UNMSM transcript.
#[derive(Parser, Debug)]
#[command(
    name = "transcript-avg",
    version,
    about = "Compute the credit-weighted grade average of a UNMSM transcript",
    long_about = "Read a UNMSM academic transcript (PDF or extracted text), recover its course \
records and compute the credit-weighted average on the 0-20 scale. Supports the Software and \
Systems Engineering programs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Transcript PDF, text file, or `-` for stdin.
    input: String,

    /// Write the JSON result to this file instead of stdout.
    #[arg(short, long, env = "TRANSCRIPT_OUTPUT")]
    output: Option<PathBuf>,

    /// Degree program the transcript belongs to.
    #[arg(long, env = "TRANSCRIPT_PROGRAM", value_enum, default_value = "software")]
    program: ProgramArg,

    /// Only count courses up to and including this term (e.g. 2024-1).
    #[arg(long, env = "TRANSCRIPT_CUTOFF")]
    cutoff: Option<String>,

    /// Leave a course out of the calculation. Repeatable.
    #[arg(long, value_name = "CODE")]
    exclude: Vec<String>,

    /// Override a grade, e.g. `INE002=15`. Repeatable.
    #[arg(long, value_name = "CODE=N", value_parser = parse_grade_edit)]
    grade: Vec<(String, u8)>,

    /// INPUT is a calculation request (JSON course list) to recompute.
    #[arg(long)]
    recalculate: bool,

    /// Output structured JSON instead of a table.
    #[arg(long, env = "TRANSCRIPT_JSON")]
    json: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "TRANSCRIPT_PASSWORD")]
    password: Option<String>,

    /// Print the extracted text and exit.
    #[arg(long)]
    dump_text: bool,

    /// Never run the backup pass.
    #[arg(long, env = "TRANSCRIPT_NO_BACKUP")]
    no_backup: bool,

    /// Keep the default term instead of assigning terms by position.
    #[arg(long, env = "TRANSCRIPT_NO_INFER")]
    no_infer: bool,

    /// Run the backup pass below this many courses.
    #[arg(long, env = "TRANSCRIPT_BACKUP_THRESHOLD", default_value_t = 10)]
    backup_threshold: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TRANSCRIPT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TRANSCRIPT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ProgramArg {
    Software,
    Systems,
}

impl From<ProgramArg> for Program {
    fn from(v: ProgramArg) -> Self {
        match v {
            ProgramArg::Software => Program::Software,
            ProgramArg::Systems => Program::Systems,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Recalculate mode ─────────────────────────────────────────────────
    if cli.recalculate {
        let body = read_input_text(&cli.input, &config).await?;
        let mut request: CalculationRequest =
            serde_json::from_str(&body).context("Invalid calculation request")?;
        apply_edits(&mut request.courses, &cli)?;
        if let Some(ref cutoff) = cli.cutoff {
            request.cutoff_term = Some(Term::new(cutoff.as_str()));
        }
        let result = recalculate(&request).context("Recalculation failed")?;
        return emit_calculation(&cli, &result).await;
    }

    // ── Dump-text mode ───────────────────────────────────────────────────
    if cli.dump_text {
        let text = if is_pdf(&cli.input)? {
            extract_text(&cli.input, &config)
                .await
                .context("Failed to extract text")?
        } else {
            read_input_text(&cli.input, &config).await?
        };
        write_text(&mut io::stdout().lock(), &text).context("Failed to write to stdout")?;
        return Ok(());
    }

    // ── Run analysis ─────────────────────────────────────────────────────
    let mut report = if is_pdf(&cli.input)? {
        analyze_pdf(&cli.input, &config)
            .await
            .context("Analysis failed")?
    } else {
        let text = read_input_text(&cli.input, &config).await?;
        analyze_text(&text, &config).context("Analysis failed")?
    };

    let edited = !cli.exclude.is_empty() || !cli.grade.is_empty();
    if edited || cli.cutoff.is_some() {
        apply_edits(&mut report.courses, &cli)?;
        let mut request = CalculationRequest::new(report.courses.clone());
        if let Some(ref cutoff) = cli.cutoff {
            request = request.with_cutoff(cutoff.as_str());
        }
        report.calculation = recalculate(&request).context("Recalculation failed")?;
    }

    // ── Output ───────────────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        write_report(&report, output_path)
            .await
            .context("Failed to write report")?;
        if !cli.quiet {
            print_summary(&report.calculation);
            eprintln!("{}  →  {}", green("✔"), bold(&output_path.display().to_string()));
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else {
        print_table(&report.calculation);
        if !cli.quiet {
            print_summary(&report.calculation);
            print_diagnostics(&report);
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .program(cli.program.into())
        .backup_threshold(cli.backup_threshold)
        .enable_backup(!cli.no_backup)
        .infer_missing_terms(!cli.no_infer);
    if let Some(ref password) = cli.password {
        builder = builder.password(password.as_str());
    }
    builder.build().context("Invalid configuration")
}

/// Parse `--grade CODE=N`.
fn parse_grade_edit(s: &str) -> Result<(String, u8)> {
    let Some((code, grade)) = s.split_once('=') else {
        bail!("expected CODE=N, got '{s}'");
    };
    let code = code.trim();
    if code.is_empty() {
        bail!("missing course code in '{s}'");
    }
    let grade: u8 = grade
        .trim()
        .parse()
        .with_context(|| format!("invalid grade in '{s}'"))?;
    if grade > transcript_average::MAX_GRADE {
        bail!("grade {grade} is outside 0-20");
    }
    Ok((code.to_string(), grade))
}

/// Apply `--exclude` and `--grade` to a course list.
fn apply_edits(courses: &mut [CourseRecord], cli: &Cli) -> Result<()> {
    for code in &cli.exclude {
        let mut hits = 0;
        for course in courses.iter_mut().filter(|c| c.code.eq_ignore_ascii_case(code)) {
            course.excluded_from_calculation = true;
            hits += 1;
        }
        if hits == 0 {
            eprintln!("{} --exclude {code}: no such course", cyan("⚠"));
        }
    }
    for (code, grade) in &cli.grade {
        let mut hits = 0;
        for course in courses.iter_mut().filter(|c| c.code.eq_ignore_ascii_case(code)) {
            course
                .edit_grade(*grade)
                .with_context(|| format!("Cannot set grade of {code}"))?;
            hits += 1;
        }
        if hits == 0 {
            bail!("--grade {code}={grade}: no such course in the transcript");
        }
    }
    Ok(())
}

fn is_pdf(source: &str) -> Result<bool> {
    if source == "-" {
        return Ok(false);
    }
    let kind = input::classify(Path::new(source))
        .with_context(|| format!("Cannot open '{source}'"))?;
    Ok(kind == InputKind::Pdf)
}

async fn read_input_text(source: &str, config: &ExtractionConfig) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    input::load_text(Path::new(source), config.max_file_bytes)
        .await
        .with_context(|| format!("Failed to read '{source}'"))
}

/// Write `text` and end it with a newline.
fn write_text(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}

async fn emit_calculation(cli: &Cli, result: &AggregateResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialise result")?;
    if let Some(ref output_path) = cli.output {
        tokio::fs::write(output_path, json.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        if !cli.quiet {
            print_summary(result);
        }
    } else if cli.json {
        println!("{json}");
    } else {
        print_table(result);
        if !cli.quiet {
            print_summary(result);
        }
    }
    Ok(())
}

fn print_table(result: &AggregateResult) {
    for c in &result.courses {
        let title: String = c.title.chars().take(48).collect();
        let grade = format!("{:>2}", c.grade);
        let grade = if c.approved { green(&grade) } else { red(&grade) };
        let mark = if c.edited_by_user { cyan("*") } else { " ".to_string() };
        println!(
            "{:<7} {:<10} {:<48} {}{} {}",
            c.term.as_str(),
            c.code,
            title,
            grade,
            mark,
            dim(&format!("{} cr", c.credits)),
        );
    }
}

fn print_summary(result: &AggregateResult) {
    eprintln!(
        "{} Weighted average {}  over {} credits  ({} courses, {} credits approved)",
        green("✔"),
        bold(&format!("{:.3}", result.weighted_average)),
        result.total_credits,
        result.course_stats.total,
        result.approved_credits,
    );
    if result.non_primary_extractions > 0 {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} courses recovered by fallback extraction; check them",
                result.non_primary_extractions
            ))
        );
    }
}

fn print_diagnostics(report: &TranscriptReport) {
    let d = &report.diagnostics;
    eprintln!(
        "   {}",
        dim(&format!(
            "{} lines, {} terms, {}ms",
            d.line_count, d.terms_found, d.duration_ms
        ))
    );
    if d.backup_used {
        eprintln!("{} Few courses matched directly; backup pass was used", cyan("⚠"));
    }
    if d.terms_inferred {
        eprintln!("{} No terms found in the text; terms were assigned by position", cyan("⚠"));
    }
    if let Some((declared, computed)) = report.declared_mismatch() {
        eprintln!(
            "{} Transcript declares {declared} approved credits, computed {computed}",
            cyan("⚠")
        );
    }
}
