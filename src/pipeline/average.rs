//! Weighted-average calculator.
//!
//! Pure function of the course list and the cutoff. The divisor is the total
//! credit count of every unique course, failed ones included.

use crate::output::{AggregateResult, CourseStats};
use crate::pipeline::dedup::{filter_by_cutoff, merge};
use crate::record::{CourseRecord, ExtractionMethod, Term};
use tracing::debug;

/// Round to 3 decimal places, half away from zero.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Filter by cutoff, deduplicate, then sum.
///
/// Records flagged `excluded_from_calculation` must already be gone; the
/// calculator does not look at the flag.
pub fn compute_weighted_average(courses: &[CourseRecord], cutoff: Option<&Term>) -> AggregateResult {
    let mut unique = merge(filter_by_cutoff(courses, cutoff));

    let mut total_credits = 0u32;
    let mut total_weighted_points = 0u32;
    let mut approved_credits = 0u32;
    let mut course_stats = CourseStats::default();
    let mut approved_stats = CourseStats::default();
    let mut non_primary_extractions = 0usize;

    for course in &mut unique {
        course.refresh_approval();
        let credits = u32::from(course.credits);
        total_credits += credits;
        total_weighted_points += u32::from(course.grade) * credits;
        course_stats.record(course.course_type);
        if course.approved {
            approved_credits += credits;
            approved_stats.record(course.course_type);
        }
        if course.extraction_method != ExtractionMethod::Primary {
            non_primary_extractions += 1;
        }
    }

    let weighted_average = if total_credits == 0 {
        0.0
    } else {
        round3(f64::from(total_weighted_points) / f64::from(total_credits))
    };
    debug!(
        "Average over {} courses: {}/{} = {}",
        unique.len(),
        total_weighted_points,
        total_credits,
        weighted_average
    );

    AggregateResult {
        courses: unique,
        total_credits,
        total_weighted_points,
        weighted_average,
        approved_credits,
        credits_for_average: total_credits,
        course_stats,
        approved_stats,
        non_primary_extractions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CourseType;

    fn rec(code: &str, title: &str, grade: u8, credits: u8, term: &str) -> CourseRecord {
        CourseRecord::new(code, title, grade, credits, Term::from(term))
    }

    #[test]
    fn two_course_formula() {
        let courses = vec![
            rec("INE002", "PROGRAMACIÓN", 15, 3, "2023-1"),
            rec("INE006", "MATEMÁTICA", 9, 4, "2023-1"),
        ];
        let r = compute_weighted_average(&courses, None);
        assert_eq!(r.total_weighted_points, 81);
        assert_eq!(r.total_credits, 7);
        assert_eq!(r.credits_for_average, 7);
        assert_eq!(r.weighted_average, 11.571);
        assert_eq!(r.approved_credits, 3);
        assert_eq!(r.course_stats.total, 2);
        assert_eq!(r.approved_stats.total, 1);
    }

    #[test]
    fn no_credits_means_zero() {
        let r = compute_weighted_average(&[], None);
        assert_eq!(r.weighted_average, 0.0);
        assert!(r.courses.is_empty());
    }

    #[test]
    fn idempotent() {
        let courses = vec![
            rec("INE002", "PROGRAMACIÓN", 17, 2, "2022-1"),
            rec("INE002", "PROGRAMACIÓN", 12, 2, "2022-2"),
            rec("INO204", "CÁLCULO I", 13, 4, "2024-2"),
        ];
        let cutoff = Term::from("2023-2");
        let a = compute_weighted_average(&courses, Some(&cutoff));
        let b = compute_weighted_average(&courses, Some(&cutoff));
        assert_eq!(a, b);
        assert_eq!(a.weighted_average.to_bits(), b.weighted_average.to_bits());
        assert_eq!(a.courses.len(), 1);
    }

    #[test]
    fn cutoff_boundaries() {
        let courses = vec![rec("INO204", "CÁLCULO I", 13, 4, "2024-2")];
        assert_eq!(compute_weighted_average(&courses, Some(&Term::from("2023-2"))).total_credits, 0);
        assert_eq!(compute_weighted_average(&courses, Some(&Term::from("2024-2"))).total_credits, 4);
        assert_eq!(compute_weighted_average(&courses, None).total_credits, 4);
    }

    #[test]
    fn stats_by_type_and_method() {
        let mut stale = rec("202SW0E02", "EMPRENDIMIENTO", 14, 2, "2024-2")
            .with_type(CourseType::Elective)
            .with_method(ExtractionMethod::Special);
        stale.approved = false;
        let courses = vec![
            stale,
            rec("INE002", "PROGRAMACIÓN", 8, 2, "2022-1"),
            rec("INE010", "INGLÉS", 11, 2, "2022-1")
                .with_type(CourseType::Supplementary)
                .with_method(ExtractionMethod::Backup),
        ];
        let r = compute_weighted_average(&courses, None);
        assert_eq!(r.course_stats, CourseStats { mandatory: 1, elective: 1, supplementary: 1, total: 3 });
        assert_eq!(r.approved_stats, CourseStats { mandatory: 0, elective: 1, supplementary: 1, total: 2 });
        assert_eq!(r.non_primary_extractions, 2);
        assert!(r.courses.iter().find(|c| c.code == "202SW0E02").unwrap().approved);
    }
}
