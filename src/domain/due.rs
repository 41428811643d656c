//! Pure due-state arithmetic for regulation entries.
//!
//! A [`DueCycle`] captures the interval between one `last_done_km` baseline
//! and its `next_due_km` target. All values are signed kilometre counts; no
//! rounding is applied anywhere.

use serde::{Deserialize, Serialize};

/// The due-tracking window for one entry at one baseline.
///
/// `notify_before_km >= every_km` is permitted: the notify window then opens
/// at or before the previous service point. The engine imposes no lower bound
/// on the relationship between the two thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueCycle {
    /// Odometer reading when the item was last serviced.
    pub last_done_km: i64,
    /// Service interval in kilometres (strictly positive once validated).
    pub every_km: i64,
    /// Width of the notify window before the due point.
    pub notify_before_km: i64,
}

impl DueCycle {
    /// Odometer reading at which the item falls due.
    pub const fn next_due_km(&self) -> i64 {
        self.last_done_km + self.every_km
    }

    /// Whether the item is due at the given odometer reading.
    pub const fn is_due(&self, current_km: i64) -> bool {
        current_km >= self.next_due_km()
    }

    /// Whether the reading falls inside the notify window:
    /// `next_due_km - notify_before_km <= current_km < next_due_km`.
    pub const fn in_notify_window(&self, current_km: i64) -> bool {
        let next_due = self.next_due_km();
        next_due - self.notify_before_km <= current_km && current_km < next_due
    }

    /// Signed distance to the due point; negative once overdue.
    pub const fn km_remaining(&self, current_km: i64) -> i64 {
        self.next_due_km() - current_km
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const BASIC: DueCycle = DueCycle {
        last_done_km: 0,
        every_km: 10_000,
        notify_before_km: 500,
    };

    #[rstest]
    fn next_due_is_baseline_plus_interval() {
        assert_eq!(BASIC.next_due_km(), 10_000);

        let later = DueCycle {
            last_done_km: 10_050,
            ..BASIC
        };
        assert_eq!(later.next_due_km(), 20_050);
    }

    #[rstest]
    #[case(9_499, false)]
    #[case(9_500, true)]
    #[case(9_600, true)]
    #[case(9_999, true)]
    #[case(10_000, false)]
    #[case(10_500, false)]
    fn notify_window_is_half_open(#[case] current_km: i64, #[case] expected: bool) {
        assert_eq!(BASIC.in_notify_window(current_km), expected);
    }

    #[rstest]
    #[case(9_999, false)]
    #[case(10_000, true)]
    #[case(10_001, true)]
    fn due_at_or_past_target(#[case] current_km: i64, #[case] expected: bool) {
        assert_eq!(BASIC.is_due(current_km), expected);
    }

    #[rstest]
    #[case(9_600, 400)]
    #[case(10_000, 0)]
    #[case(10_250, -250)]
    fn remaining_goes_negative_once_overdue(#[case] current_km: i64, #[case] expected: i64) {
        assert_eq!(BASIC.km_remaining(current_km), expected);
    }

    #[rstest]
    fn oversized_notify_window_reaches_back_past_the_baseline() {
        let cycle = DueCycle {
            last_done_km: 20_000,
            every_km: 5_000,
            notify_before_km: 8_000,
        };
        // Window opens at 17_000, before the 20_000 baseline.
        assert!(cycle.in_notify_window(18_000));
        assert!(cycle.in_notify_window(17_000));
        assert!(!cycle.in_notify_window(25_000));
    }
}
