//! Approved-credit total printed in the transcript's summary block.
//!
//! Used as a cross-check against the computed approved credits. Never feeds
//! the average.

use crate::pipeline::normalize::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Largest total accepted as plausible.
const MAX_DECLARED: f64 = 300.0;

const PATTERNS: &[&str] = &[
    r"(?i)Créditos?\s*Aprobados?\s*:?\s*(\d+(?:\.\d+)?)",
    r"(?i)Creditaje\s*Aprobado\s*:?\s*(\d+(?:\.\d+)?)",
    r"(?i)Total\s*de?\s*Créditos?\s*Aprobados?\s*:?\s*(\d+(?:\.\d+)?)",
    r"(?i)Créditos?\s*Válidos?\s*:?\s*(\d+(?:\.\d+)?)",
    r"(?i)(\d+(?:\.\d+)?)\s*Créditos?\s*Aprobados?",
    r"(?i)(\d+(?:\.\d+)?)\s*Creditaje\s*Aprobado",
    r"(?i)Aprobados?\s*:?\s*(\d+(?:\.\d+)?)\s*Créditos?",
    r"(?i)Acumulados?\s*:?\s*(\d+(?:\.\d+)?)\s*Créditos?",
    r"(?i)Total\s*Acumulado\s*:?\s*(\d+(?:\.\d+)?)",
    r"(?i)Créditos?\s*Cursados?\s*y?\s*Aprobados?\s*:?\s*(\d+(?:\.\d+)?)",
    r"(?i)Créditos?\s*[-–]\s*Aprobados?\s*:?\s*(\d+(?:\.\d+)?)",
    r"(?i)Aprobados?\s*[-–]\s*(\d+(?:\.\d+)?)\s*Créditos?",
    r"(?i)(?:Resumen|Total|Consolidado).*?Créditos?.*?(\d+(?:\.\d+)?)",
    r"(?i)(?:Créditos?|Creditaje).*?(?:Total|Acumulado).*?(\d+(?:\.\d+)?)",
];

static SUMMARY_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| PATTERNS.iter().map(|p| Regex::new(p).unwrap()).collect());

#[derive(Debug)]
struct Candidate {
    value: f64,
    preferred: bool,
}

/// Declared approved credits, if the text states them.
///
/// Every plausible match is a candidate. One whose matched text mentions
/// "total" or "aprobado" beats one that does not; otherwise the larger value
/// wins, later candidates winning ties.
pub fn declared_approved_credits(text: &str) -> Option<f64> {
    let text = collapse_whitespace(text);
    let mut best: Option<Candidate> = None;

    for re in SUMMARY_PATTERNS.iter() {
        for caps in re.captures_iter(&text) {
            let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
                continue;
            };
            if !(value > 0.0 && value <= MAX_DECLARED) {
                continue;
            }
            let matched = caps[0].to_lowercase();
            let current = Candidate {
                value,
                preferred: matched.contains("total") || matched.contains("aprobado"),
            };
            debug!("Declared credit candidate {} from {:?}", value, &caps[0]);
            best = Some(match best {
                None => current,
                Some(held) => match (current.preferred, held.preferred) {
                    (true, false) => current,
                    (false, true) => held,
                    _ if current.value >= held.value => current,
                    _ => held,
                },
            });
        }
    }
    best.map(|c| c.value)
}
