//! Attendance arithmetic over `(total, attended)` pairs.
//!
//! All functions are total: a zero total never divides and the recovery and
//! skip formulas are evaluated in `i128`, so any pair of `i64` counters is
//! accepted. The threshold is held as an integer percentage so those formulas
//! stay exact.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Minimum attendance ratio, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(u8);

impl Threshold {
    pub const DEFAULT: Threshold = Threshold(75);

    pub fn new(percent: i64) -> Result<Self, ValidationError> {
        if !(1..=99).contains(&percent) {
            return Err(ValidationError::InvalidThreshold(percent));
        }
        Ok(Threshold(percent as u8))
    }

    pub fn percent(self) -> i64 {
        i64::from(self.0)
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::DEFAULT
    }
}

/// Attendance percentage rounded to two decimals, 0 for an empty course.
pub fn percentage(total: i64, attended: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = 100.0 * attended as f64 / total as f64;
    (raw * 100.0).round() / 100.0
}

pub fn is_below_threshold(total: i64, attended: i64, threshold: Threshold) -> bool {
    percentage(total, attended) < threshold.percent() as f64
}

/// Fewest consecutive attended lectures that lift the ratio to the threshold.
///
/// Solves `(attended + x) / (total + x) >= t` for the smallest integer `x`.
/// An empty course always needs one lecture to get started.
pub fn lectures_needed(total: i64, attended: i64, threshold: Threshold) -> i64 {
    if !is_below_threshold(total, attended, threshold) {
        return 0;
    }
    if total <= 0 {
        return 1;
    }
    let p = i128::from(threshold.percent());
    let deficit = p * i128::from(total) - 100 * i128::from(attended);
    if deficit <= 0 {
        return 0;
    }
    saturate(div_ceil(deficit, 100 - p))
}

/// Most lectures that can be missed while staying at or above the threshold.
///
/// Solves `attended / (total + x) >= t` for the largest integer `x`.
pub fn lectures_skippable(total: i64, attended: i64, threshold: Threshold) -> i64 {
    if total <= 0 {
        return 0;
    }
    let p = i128::from(threshold.percent());
    let surplus = 100 * i128::from(attended) - p * i128::from(total);
    if surplus <= 0 {
        return 0;
    }
    saturate(surplus / p)
}

fn div_ceil(numerator: i128, denominator: i128) -> i128 {
    (numerator + denominator - 1) / denominator
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Every derived figure for one course, as the API reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub attendance_percentage: f64,
    pub is_below_threshold: bool,
    pub lectures_needed: i64,
    pub lectures_skippable: i64,
}

impl AttendanceStats {
    pub fn compute(total: i64, attended: i64, threshold: Threshold) -> Self {
        Self {
            attendance_percentage: percentage(total, attended),
            is_below_threshold: is_below_threshold(total, attended, threshold),
            lectures_needed: lectures_needed(total, attended, threshold),
            lectures_skippable: lectures_skippable(total, attended, threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Threshold = Threshold::DEFAULT;

    /// Exact ratio check, free of the two-decimal rounding.
    fn meets(total: i64, attended: i64) -> bool {
        total > 0 && 100 * attended >= T.percent() * total
    }

    #[test]
    fn percentage_of_empty_course_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert!(is_below_threshold(0, 0, T));
        assert_eq!(lectures_needed(0, 0, T), 1);
        assert_eq!(lectures_skippable(0, 0, T), 0);
    }

    #[test]
    fn below_threshold_scenario() {
        assert_eq!(percentage(28, 20), 71.43);
        assert!(is_below_threshold(28, 20, T));
        // 24/32 is exactly 75%, 23/31 is not
        assert_eq!(lectures_needed(28, 20, T), 4);
        assert!(meets(32, 24));
        assert!(!meets(31, 23));
    }

    #[test]
    fn skippable_scenario() {
        assert_eq!(percentage(30, 28), 93.33);
        assert_eq!(lectures_skippable(30, 28, T), 7);
        assert_eq!(lectures_needed(30, 28, T), 0);
    }

    #[test]
    fn exactly_at_threshold() {
        assert!(!is_below_threshold(4, 3, T));
        assert_eq!(lectures_needed(4, 3, T), 0);
        assert_eq!(lectures_skippable(4, 3, T), 0);
    }

    #[test]
    fn percentage_stays_in_range() {
        for total in 0..=60 {
            for attended in 0..=total {
                let pct = percentage(total, attended);
                assert!((0.0..=100.0).contains(&pct), "{attended}/{total} -> {pct}");
            }
        }
    }

    #[test]
    fn needed_is_the_minimal_recovery() {
        for total in 1..=80 {
            for attended in 0..=total {
                let needed = lectures_needed(total, attended, T);
                assert!(
                    percentage(total + needed, attended + needed) >= 75.0,
                    "{attended}/{total} needed {needed}"
                );
                if needed > 0 {
                    assert!(!meets(total + needed - 1, attended + needed - 1));
                }
            }
        }
    }

    #[test]
    fn skippable_is_the_maximal_buffer() {
        for total in 1..=80 {
            for attended in 0..=total {
                let skip = lectures_skippable(total, attended, T);
                if meets(total, attended) {
                    assert!(percentage(total + skip, attended) >= 75.0);
                    assert!(!meets(total + skip + 1, attended), "{attended}/{total} skip {skip}");
                } else {
                    assert_eq!(skip, 0);
                }
            }
        }
    }

    #[test]
    fn other_thresholds_use_the_same_formulas() {
        let sixty = Threshold::new(60).unwrap();
        // (5 + x) / (10 + x) >= 0.6 -> x >= 2.5
        assert_eq!(lectures_needed(10, 5, sixty), 3);
        // 9 / (10 + x) >= 0.6 -> x <= 5
        assert_eq!(lectures_skippable(10, 9, sixty), 5);
        assert!(Threshold::new(0).is_err());
        assert!(Threshold::new(100).is_err());
    }

    #[test]
    fn rounding_decides_the_threshold() {
        // 3752/5003 is 74.995..%, shown and compared as 75.00
        assert_eq!(percentage(5003, 3752), 75.0);
        assert!(!is_below_threshold(5003, 3752, T));
        assert_eq!(lectures_needed(5003, 3752, T), 0);
        assert_eq!(lectures_skippable(5003, 3752, T), 0);
        // one lecture lower is flagged
        assert!(is_below_threshold(5003, 3751, T));
        assert_eq!(lectures_needed(5003, 3751, T), 5);
    }

    #[test]
    fn huge_counters_do_not_overflow() {
        let big = 100_000_000_000_000_000;
        let stats = AttendanceStats::compute(big, big, T);
        assert_eq!(stats.attendance_percentage, 100.0);
        assert!(!stats.is_below_threshold);
        assert_eq!(stats.lectures_needed, 0);
        // 25% of 1e17 over 0.75
        assert_eq!(stats.lectures_skippable, 33_333_333_333_333_333);

        let stats = AttendanceStats::compute(i64::MAX, 0, T);
        assert!(stats.is_below_threshold);
        assert_eq!(stats.lectures_needed, i64::MAX);
        assert_eq!(stats.lectures_skippable, 0);

        assert_eq!(lectures_skippable(i64::MAX, i64::MAX, Threshold::new(1).unwrap()), i64::MAX);
    }

    #[test]
    fn stats_bundle_matches_functions() {
        let stats = AttendanceStats::compute(28, 20, T);
        assert_eq!(stats.attendance_percentage, 71.43);
        assert!(stats.is_below_threshold);
        assert_eq!(stats.lectures_needed, 4);
        assert_eq!(stats.lectures_skippable, 0);
    }
}
