use chrono::NaiveTime;

use crate::model::attendance::AttendanceStatus;

/// Time and duration cutoffs for status derivation. Kept in one place so
/// tests can construct their own and nothing branches on inline literals.
#[derive(Debug, Clone, Copy)]
pub struct StatusRules {
    /// Checking in strictly after this is LATE.
    pub late_after: NaiveTime,
    /// Checking in strictly after this is HALF_DAY.
    pub half_day_after: NaiveTime,
    /// Checkout below this duration is rejected.
    pub min_hours: f64,
    /// Worked duration below this re-derives to HALF_DAY at checkout.
    pub full_day_hours: f64,
}

impl Default for StatusRules {
    fn default() -> Self {
        Self {
            late_after: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            half_day_after: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            min_hours: 1.0,
            full_day_hours: 4.0,
        }
    }
}

impl StatusRules {
    /// Status at marking time. An explicitly asserted WFH/LEAVE/HOLIDAY/ABSENT
    /// overrides any time-based inference; a requested PRESENT/LATE/HALF_DAY
    /// is ignored and re-derived from the check-in time.
    pub fn evaluate(
        &self,
        requested: Option<AttendanceStatus>,
        check_in: Option<NaiveTime>,
    ) -> AttendanceStatus {
        if let Some(status) = requested {
            match status {
                AttendanceStatus::WorkFromHome
                | AttendanceStatus::Leave
                | AttendanceStatus::Holiday
                | AttendanceStatus::Absent => return status,
                AttendanceStatus::Present
                | AttendanceStatus::Late
                | AttendanceStatus::HalfDay => {}
            }
        }

        let Some(time) = check_in else {
            return AttendanceStatus::Present;
        };

        // Exactly 10:00:00 / 13:00:00 fall into the lower bracket.
        if time > self.half_day_after {
            AttendanceStatus::HalfDay
        } else if time > self.late_after {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    /// Status at checkout time, derived from the worked duration alone.
    /// Deliberately overwrites an earlier LATE: the amount of work is the
    /// final arbiter once the day is closed out.
    pub fn status_for_hours(&self, hours: f64) -> AttendanceStatus {
        if hours < self.full_day_hours {
            AttendanceStatus::HalfDay
        } else {
            AttendanceStatus::Present
        }
    }
}

/// Half-up to two decimals; worked hours and percentages both use this.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn explicit_statuses_pass_through_regardless_of_time() {
        let rules = StatusRules::default();
        for status in [
            AttendanceStatus::WorkFromHome,
            AttendanceStatus::Leave,
            AttendanceStatus::Holiday,
            AttendanceStatus::Absent,
        ] {
            assert_eq!(rules.evaluate(Some(status), Some(at(15, 0))), status);
            assert_eq!(rules.evaluate(Some(status), None), status);
        }
    }

    #[test]
    fn missing_check_in_defaults_to_present() {
        let rules = StatusRules::default();
        assert_eq!(rules.evaluate(None, None), AttendanceStatus::Present);
        assert_eq!(
            rules.evaluate(Some(AttendanceStatus::Present), None),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn time_brackets_are_exclusive_at_the_boundary() {
        let rules = StatusRules::default();
        assert_eq!(rules.evaluate(None, Some(at(9, 30))), AttendanceStatus::Present);
        assert_eq!(rules.evaluate(None, Some(at(10, 0))), AttendanceStatus::Present);
        assert_eq!(rules.evaluate(None, Some(at(10, 1))), AttendanceStatus::Late);
        assert_eq!(rules.evaluate(None, Some(at(13, 0))), AttendanceStatus::Late);
        assert_eq!(rules.evaluate(None, Some(at(13, 1))), AttendanceStatus::HalfDay);
    }

    #[test]
    fn requested_late_is_still_re_derived_from_time() {
        let rules = StatusRules::default();
        assert_eq!(
            rules.evaluate(Some(AttendanceStatus::Late), Some(at(9, 0))),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn duration_re_derivation_boundary_is_four_hours() {
        let rules = StatusRules::default();
        assert_eq!(rules.status_for_hours(3.99), AttendanceStatus::HalfDay);
        assert_eq!(rules.status_for_hours(4.0), AttendanceStatus::Present);
        assert_eq!(rules.status_for_hours(8.5), AttendanceStatus::Present);
    }

    #[test]
    fn rounding_works_on_minute_fractions() {
        // 511 minutes and 500 minutes worked, in hours.
        assert_eq!(round2(511.0 / 60.0), 8.52);
        assert_eq!(round2(500.0 / 60.0), 8.33);
        assert_eq!(round2(8.5), 8.5);
    }
}
