//! Cutoff filtering and deduplication.
//!
//! Two records are the same course when they share a code or a normalised
//! title. A challenger replaces what it collides with only when it beats
//! every colliding record: a user edit beats an extracted value, otherwise
//! the strictly higher grade wins. Ties keep the earlier record.

use crate::pipeline::normalize::collapse_whitespace;
use crate::record::{CourseRecord, Term};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Title key used for duplicate detection: accents stripped, lowercased,
/// punctuation dropped, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let folded: String = title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    collapse_whitespace(&folded)
}

/// Keep records whose term is not after `cutoff`. `None` keeps everything.
pub fn filter_by_cutoff(courses: &[CourseRecord], cutoff: Option<&Term>) -> Vec<CourseRecord> {
    match cutoff {
        Some(cutoff) => courses.iter().filter(|c| &c.term <= cutoff).cloned().collect(),
        None => courses.to_vec(),
    }
}

fn beats(challenger: &CourseRecord, held: &CourseRecord) -> bool {
    match (challenger.edited_by_user, held.edited_by_user) {
        (true, false) => true,
        (false, true) => false,
        _ => challenger.grade > held.grade,
    }
}

/// Collapse duplicates and sort by (term, code).
pub fn merge(courses: Vec<CourseRecord>) -> Vec<CourseRecord> {
    let mut slots: Vec<Option<CourseRecord>> = Vec::with_capacity(courses.len());
    let mut by_code: HashMap<String, usize> = HashMap::new();
    let mut by_title: HashMap<String, usize> = HashMap::new();

    for record in courses {
        let title_key = normalize_title(&record.title);
        let hits: BTreeSet<usize> = by_code
            .get(&record.code)
            .into_iter()
            .chain((!title_key.is_empty()).then(|| by_title.get(&title_key)).flatten())
            .copied()
            .filter(|&i| slots[i].is_some())
            .collect();

        let slot = match hits.first() {
            None => {
                slots.push(None);
                slots.len() - 1
            }
            Some(&first) => {
                let wins = hits
                    .iter()
                    .filter_map(|&i| slots[i].as_ref())
                    .all(|held| beats(&record, held));
                if !wins {
                    debug!("Duplicate {} ({}) discarded", record.code, record.grade);
                    continue;
                }
                for &i in &hits {
                    let Some(old) = slots[i].take() else { continue };
                    debug!("{} ({}) replaced by {} ({})", old.code, old.grade, record.code, record.grade);
                    if by_code.get(&old.code) == Some(&i) {
                        by_code.remove(&old.code);
                    }
                    let old_key = normalize_title(&old.title);
                    if by_title.get(&old_key) == Some(&i) {
                        by_title.remove(&old_key);
                    }
                }
                first
            }
        };

        by_code.insert(record.code.clone(), slot);
        if !title_key.is_empty() {
            by_title.insert(title_key, slot);
        }
        slots[slot] = Some(record);
    }

    let mut merged: Vec<CourseRecord> = slots.into_iter().flatten().collect();
    merged.sort_by(|a, b| a.term.cmp(&b.term).then_with(|| a.code.cmp(&b.code)));
    merged
}
