//! Counter transitions applied by the attendance endpoints.

use crate::models::AttendanceAction;

/// Lecture counters of a course. `attended <= total` holds before and after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub total: i64,
    pub attended: i64,
}

impl Counters {
    pub fn new(total: i64, attended: i64) -> Self {
        Self { total, attended }
    }

    /// Quick-toggle actions. Decrement and remove are no-ops at zero, increments
    /// saturate at `i64::MAX`.
    pub fn apply(self, action: AttendanceAction) -> Self {
        let Counters { mut total, mut attended } = self;
        match action {
            AttendanceAction::Increment => {
                total = total.saturating_add(1);
                attended = attended.saturating_add(1).min(total);
            }
            AttendanceAction::Decrement => {
                if attended > 0 {
                    attended -= 1;
                }
            }
            AttendanceAction::AddTotal => total = total.saturating_add(1),
            AttendanceAction::RemoveTotal => {
                if total > 0 {
                    total -= 1;
                    attended = attended.min(total);
                }
            }
        }
        Self { total, attended }
    }

    /// Records a dated lecture. A new date counts as a held lecture; re-marking
    /// an existing date only moves the attended count.
    pub fn mark(self, previous: Option<bool>, attended_now: bool) -> Self {
        let Counters { mut total, mut attended } = self;
        match previous {
            None => {
                total = total.saturating_add(1);
                if attended_now {
                    attended = attended.saturating_add(1).min(total);
                }
            }
            Some(was) if was != attended_now => {
                if attended_now {
                    attended = attended.saturating_add(1).min(total);
                } else {
                    attended = (attended - 1).max(0);
                }
            }
            Some(_) => {}
        }
        Self { total, attended }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_counts_a_held_and_attended_lecture() {
        assert_eq!(Counters::new(3, 2).apply(AttendanceAction::Increment), Counters::new(4, 3));
    }

    #[test]
    fn decrement_stops_at_zero() {
        assert_eq!(Counters::new(3, 1).apply(AttendanceAction::Decrement), Counters::new(3, 0));
        assert_eq!(Counters::new(3, 0).apply(AttendanceAction::Decrement), Counters::new(3, 0));
    }

    #[test]
    fn removing_total_clamps_attended() {
        assert_eq!(Counters::new(3, 3).apply(AttendanceAction::RemoveTotal), Counters::new(2, 2));
        assert_eq!(Counters::new(0, 0).apply(AttendanceAction::RemoveTotal), Counters::new(0, 0));
        assert_eq!(Counters::new(3, 1).apply(AttendanceAction::AddTotal), Counters::new(4, 1));
    }

    #[test]
    fn marking_new_dates_grows_total() {
        assert_eq!(Counters::new(3, 2).mark(None, true), Counters::new(4, 3));
        assert_eq!(Counters::new(3, 2).mark(None, false), Counters::new(4, 2));
    }

    #[test]
    fn re_marking_only_flips_attended() {
        assert_eq!(Counters::new(4, 3).mark(Some(true), false), Counters::new(4, 2));
        assert_eq!(Counters::new(4, 2).mark(Some(false), true), Counters::new(4, 3));
        assert_eq!(Counters::new(4, 3).mark(Some(true), true), Counters::new(4, 3));
    }

    #[test]
    fn counters_saturate_at_the_top() {
        let full = Counters::new(i64::MAX, i64::MAX);
        assert_eq!(full.apply(AttendanceAction::Increment), full);
        assert_eq!(full.apply(AttendanceAction::AddTotal), full);
        assert_eq!(full.mark(None, true), full);
        assert_eq!(
            Counters::new(i64::MAX, 5).mark(None, true),
            Counters::new(i64::MAX, 6)
        );
    }
}
