use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::engine::rules::{StatusRules, round2};
use crate::error::HrError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::store::{
    AttendanceStore, DirectoryStore, LeaveQuery, LeaveStore, NewAttendance, NewLeave,
};

/// Marking parameters. Status and check-in are both optional: HR can assert
/// a status outright, or let the rules derive one from the check-in time.
#[derive(Debug, Clone)]
pub struct MarkAttendance {
    pub employee_id: u64,
    pub hr_id: Option<u64>,
    pub date: NaiveDate,
    pub status: Option<AttendanceStatus>,
    pub check_in: Option<NaiveTime>,
}

/// Leave application parameters.
#[derive(Debug, Clone)]
pub struct ApplyLeave {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category: String,
    pub sub_category: Option<String>,
    pub reason: String,
}

/// Resolution of a pending leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Approve,
    Reject,
}

impl LeaveDecision {
    fn status(self) -> LeaveStatus {
        match self {
            LeaveDecision::Approve => LeaveStatus::Approved,
            LeaveDecision::Reject => LeaveStatus::Rejected,
        }
    }
}

/// Owns the mark/checkout transitions on the attendance ledger, the leave
/// lifecycle, and the leave-to-attendance synchronization on approval.
pub struct ReconciliationEngine {
    directory: Arc<dyn DirectoryStore>,
    attendance: Arc<dyn AttendanceStore>,
    leaves: Arc<dyn LeaveStore>,
    clock: Arc<dyn Clock>,
    rules: StatusRules,
}

impl ReconciliationEngine {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        attendance: Arc<dyn AttendanceStore>,
        leaves: Arc<dyn LeaveStore>,
        clock: Arc<dyn Clock>,
        rules: StatusRules,
    ) -> Self {
        Self {
            directory,
            attendance,
            leaves,
            clock,
            rules,
        }
    }

    pub async fn mark_attendance(
        &self,
        mark: MarkAttendance,
    ) -> Result<AttendanceRecord, HrError> {
        if mark.date > self.clock.today() {
            return Err(HrError::InvalidRequest("future attendance is not allowed"));
        }

        // Advisory check; the unique key on (employee_id, date) is the
        // authoritative guard and the insert below maps its violation.
        if self.attendance.exists(mark.employee_id, mark.date).await? {
            return Err(HrError::DuplicateRecord);
        }

        let employee = self
            .directory
            .employee(mark.employee_id)
            .await?
            .ok_or(HrError::NotFound("Employee"))?;

        let hr_id = match mark.hr_id {
            Some(id) => {
                self.directory
                    .hr(id)
                    .await?
                    .ok_or(HrError::NotFound("HR"))?
                    .id
            }
            None => employee.hr_id,
        };

        let status = self.rules.evaluate(mark.status, mark.check_in);

        let record = self
            .attendance
            .insert(NewAttendance {
                employee_id: mark.employee_id,
                hr_id: Some(hr_id),
                date: mark.date,
                status,
                check_in: mark.check_in,
            })
            .await?;

        info!(
            employee_id = record.employee_id,
            date = %record.date,
            status = %record.status,
            "attendance marked"
        );
        Ok(record)
    }

    pub async fn checkout(
        &self,
        employee_id: u64,
        checkout_time: Option<NaiveTime>,
    ) -> Result<AttendanceRecord, HrError> {
        let today = self.clock.today();

        let record = self
            .attendance
            .by_employee_and_date(employee_id, today)
            .await?
            .ok_or(HrError::NotFound("Attendance record"))?;

        let Some(check_in) = record.check_in else {
            return Err(HrError::InvalidState("employee has not checked in today"));
        };
        if record.check_out.is_some() {
            return Err(HrError::InvalidState(
                "employee has already checked out for today",
            ));
        }

        let check_out = checkout_time.unwrap_or_else(|| self.clock.time_now());
        if check_out < check_in {
            return Err(HrError::InvalidRequest(
                "checkout time cannot be before check-in time",
            ));
        }

        // Whole minutes; seconds inside a minute do not count.
        let minutes = check_out.signed_duration_since(check_in).num_minutes();
        let hours = minutes as f64 / 60.0;
        if hours < self.rules.min_hours {
            return Err(HrError::InvalidRequest(
                "minimum work duration of 1 hour is required before checkout",
            ));
        }

        let total_hours = round2(hours);
        let status = self.rules.status_for_hours(hours);

        let updated = self
            .attendance
            .complete_checkout(record.id, check_out, total_hours, status)
            .await?;
        if updated == 0 {
            // A concurrent checkout won the conditional update.
            return Err(HrError::InvalidState(
                "employee has already checked out for today",
            ));
        }

        info!(
            employee_id,
            date = %record.date,
            total_hours,
            status = %status,
            "checkout completed"
        );
        Ok(AttendanceRecord {
            check_out: Some(check_out),
            total_hours: Some(total_hours),
            status,
            ..record
        })
    }

    pub async fn today_status(
        &self,
        employee_id: u64,
    ) -> Result<Option<AttendanceRecord>, HrError> {
        self.attendance
            .by_employee_and_date(employee_id, self.clock.today())
            .await
    }

    pub async fn attendance_for_employee(
        &self,
        employee_id: u64,
    ) -> Result<Vec<AttendanceRecord>, HrError> {
        self.attendance.for_employee(employee_id).await
    }

    pub async fn apply_leave(&self, apply: ApplyLeave) -> Result<LeaveRequest, HrError> {
        if apply.start_date > apply.end_date {
            return Err(HrError::InvalidRequest("start_date cannot be after end_date"));
        }

        self.directory
            .employee(apply.employee_id)
            .await?
            .ok_or(HrError::NotFound("Employee"))?;

        self.leaves
            .insert(NewLeave {
                employee_id: apply.employee_id,
                start_date: apply.start_date,
                end_date: apply.end_date,
                category: apply.category,
                sub_category: apply.sub_category,
                reason: apply.reason,
            })
            .await
    }

    /// Resolves a pending leave. Approval backfills a LEAVE attendance row
    /// for every day of the range that has no record yet; already-marked
    /// days are left untouched and per-day failures never unwind the
    /// approval itself.
    pub async fn decide_leave(
        &self,
        leave_id: u64,
        decision: LeaveDecision,
        hr_id: u64,
    ) -> Result<LeaveRequest, HrError> {
        let leave = self
            .leaves
            .find(leave_id)
            .await?
            .ok_or(HrError::NotFound("Leave request"))?;

        if leave.status != LeaveStatus::Pending {
            return Err(HrError::InvalidState("leave request already processed"));
        }

        let hr = self
            .directory
            .hr(hr_id)
            .await?
            .ok_or(HrError::NotFound("HR"))?;

        let status = decision.status();
        let updated = self.leaves.transition(leave_id, status, hr.id).await?;
        if updated == 0 {
            return Err(HrError::InvalidState("leave request already processed"));
        }

        if decision == LeaveDecision::Approve {
            self.backfill_leave_days(&leave, hr.id).await;
        }

        info!(leave_id, status = %status, hr_id, "leave request resolved");
        Ok(LeaveRequest {
            status,
            hr_id: Some(hr.id),
            ..leave
        })
    }

    /// Best-effort per day: conflicts mean the day was already marked and
    /// are skipped; other store failures are logged and skipped so the
    /// approved leave never ends up half-rolled-back.
    async fn backfill_leave_days(&self, leave: &LeaveRequest, hr_id: u64) {
        let mut date = leave.start_date;
        while date <= leave.end_date {
            match self.attendance.exists(leave.employee_id, date).await {
                Ok(true) => {
                    debug!(leave_id = leave.id, date = %date, "day already marked, skipping");
                }
                Ok(false) => {
                    let result = self
                        .attendance
                        .insert(NewAttendance {
                            employee_id: leave.employee_id,
                            hr_id: Some(hr_id),
                            date,
                            status: AttendanceStatus::Leave,
                            check_in: None,
                        })
                        .await;
                    match result {
                        Ok(_) => {}
                        Err(HrError::DuplicateRecord) => {
                            debug!(leave_id = leave.id, date = %date, "lost backfill race, skipping");
                        }
                        Err(err) => {
                            warn!(leave_id = leave.id, date = %date, error = %err, "leave backfill failed for day");
                        }
                    }
                }
                Err(err) => {
                    warn!(leave_id = leave.id, date = %date, error = %err, "leave backfill lookup failed for day");
                }
            }

            let Some(next) = date.succ_opt() else { break };
            date = next;
        }
    }

    pub async fn leave(&self, leave_id: u64) -> Result<Option<LeaveRequest>, HrError> {
        self.leaves.find(leave_id).await
    }

    pub async fn list_leaves(
        &self,
        query: &LeaveQuery,
    ) -> Result<(Vec<LeaveRequest>, i64), HrError> {
        self.leaves.list(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FixedClock, MemoryAttendance, MemoryDirectory, MemoryLeaves, employee, hr};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    struct Fixture {
        engine: ReconciliationEngine,
        attendance: Arc<MemoryAttendance>,
        leaves: Arc<MemoryLeaves>,
    }

    fn fixture(today: NaiveDate, now: NaiveTime) -> Fixture {
        let directory = Arc::new(MemoryDirectory::default());
        directory.add_hr(hr(7));
        directory.add_hr(hr(8));
        directory.add_employee(employee(1000, 7));

        let attendance = Arc::new(MemoryAttendance::default());
        let leaves = Arc::new(MemoryLeaves::default());
        let engine = ReconciliationEngine::new(
            directory,
            attendance.clone(),
            leaves.clone(),
            Arc::new(FixedClock { today, time: now }),
            StatusRules::default(),
        );
        Fixture {
            engine,
            attendance,
            leaves,
        }
    }

    fn mark(employee_id: u64, day: NaiveDate, check_in: Option<NaiveTime>) -> MarkAttendance {
        MarkAttendance {
            employee_id,
            hr_id: None,
            date: day,
            status: None,
            check_in,
        }
    }

    #[actix_web::test]
    async fn marks_on_time_check_in_as_present() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(9, 30));

        let record = f
            .engine
            .mark_attendance(mark(1000, today, Some(time(9, 30))))
            .await
            .unwrap();

        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.check_in, Some(time(9, 30)));
        assert_eq!(record.check_out, None);
        assert_eq!(record.total_hours, None);
        // No explicit HR given: falls back to the employee's assigned HR.
        assert_eq!(record.hr_id, Some(7));
    }

    #[actix_web::test]
    async fn explicit_hr_overrides_the_assigned_one() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(9, 30));

        let record = f
            .engine
            .mark_attendance(MarkAttendance {
                hr_id: Some(8),
                ..mark(1000, today, None)
            })
            .await
            .unwrap();
        assert_eq!(record.hr_id, Some(8));
    }

    #[actix_web::test]
    async fn rejects_future_dates() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(9, 30));

        let err = f
            .engine
            .mark_attendance(mark(1000, date(2026, 1, 6), None))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::InvalidRequest(_)));
    }

    #[actix_web::test]
    async fn rejects_duplicate_marks_for_the_same_day() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(9, 30));

        f.engine
            .mark_attendance(mark(1000, today, Some(time(9, 0))))
            .await
            .unwrap();
        let err = f
            .engine
            .mark_attendance(mark(1000, today, Some(time(9, 5))))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::DuplicateRecord));
    }

    #[actix_web::test]
    async fn rejects_unknown_employee_and_unknown_hr() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(9, 30));

        let err = f
            .engine
            .mark_attendance(mark(4242, today, None))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::NotFound("Employee")));

        let err = f
            .engine
            .mark_attendance(MarkAttendance {
                hr_id: Some(999),
                ..mark(1000, today, None)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::NotFound("HR")));
    }

    #[actix_web::test]
    async fn full_day_checkout_keeps_present_and_records_hours() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(18, 0));

        f.engine
            .mark_attendance(mark(1000, today, Some(time(9, 30))))
            .await
            .unwrap();

        // Checkout time omitted: the clock supplies 18:00.
        let record = f.engine.checkout(1000, None).await.unwrap();
        assert_eq!(record.total_hours, Some(8.5));
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.check_out, Some(time(18, 0)));

        let stored = f
            .attendance
            .by_employee_and_date(1000, today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_hours, Some(8.5));
    }

    #[actix_web::test]
    async fn short_day_overwrites_late_with_half_day() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(13, 30));

        let marked = f
            .engine
            .mark_attendance(mark(1000, today, Some(time(11, 0))))
            .await
            .unwrap();
        assert_eq!(marked.status, AttendanceStatus::Late);

        let record = f.engine.checkout(1000, Some(time(13, 30))).await.unwrap();
        assert_eq!(record.total_hours, Some(2.5));
        assert_eq!(record.status, AttendanceStatus::HalfDay);
    }

    #[actix_web::test]
    async fn exactly_four_hours_counts_as_present() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(13, 0));

        f.engine
            .mark_attendance(mark(1000, today, Some(time(9, 0))))
            .await
            .unwrap();
        let record = f.engine.checkout(1000, Some(time(13, 0))).await.unwrap();
        assert_eq!(record.total_hours, Some(4.0));
        assert_eq!(record.status, AttendanceStatus::Present);
    }

    #[actix_web::test]
    async fn checkout_guards_ordering_and_duration() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(18, 0));

        // No record at all.
        let err = f.engine.checkout(1000, None).await.unwrap_err();
        assert!(matches!(err, HrError::NotFound(_)));

        f.engine
            .mark_attendance(mark(1000, today, Some(time(9, 0))))
            .await
            .unwrap();

        let err = f.engine.checkout(1000, Some(time(8, 0))).await.unwrap_err();
        assert!(matches!(err, HrError::InvalidRequest(_)));

        let err = f.engine.checkout(1000, Some(time(9, 45))).await.unwrap_err();
        assert!(matches!(err, HrError::InvalidRequest(_)));

        f.engine.checkout(1000, Some(time(17, 0))).await.unwrap();
        let err = f.engine.checkout(1000, Some(time(18, 0))).await.unwrap_err();
        assert!(matches!(err, HrError::InvalidState(_)));
    }

    #[actix_web::test]
    async fn checkout_requires_a_check_in_time() {
        let today = date(2026, 1, 5);
        let f = fixture(today, time(18, 0));

        // HR-marked WFH day has no check-in.
        f.engine
            .mark_attendance(MarkAttendance {
                status: Some(AttendanceStatus::WorkFromHome),
                ..mark(1000, today, None)
            })
            .await
            .unwrap();

        let err = f.engine.checkout(1000, None).await.unwrap_err();
        assert!(matches!(err, HrError::InvalidState(_)));
    }

    #[actix_web::test]
    async fn approval_backfills_only_unmarked_days() {
        let today = date(2026, 1, 20);
        let f = fixture(today, time(9, 0));

        // Jan 11 is already a PRESENT day.
        f.engine
            .mark_attendance(mark(1000, date(2026, 1, 11), Some(time(9, 0))))
            .await
            .unwrap();

        let leave = f
            .engine
            .apply_leave(ApplyLeave {
                employee_id: 1000,
                start_date: date(2026, 1, 10),
                end_date: date(2026, 1, 12),
                category: "sick".into(),
                sub_category: None,
                reason: "flu".into(),
            })
            .await
            .unwrap();
        assert_eq!(leave.status, LeaveStatus::Pending);

        let decided = f
            .engine
            .decide_leave(leave.id, LeaveDecision::Approve, 7)
            .await
            .unwrap();
        assert_eq!(decided.status, LeaveStatus::Approved);
        assert_eq!(decided.hr_id, Some(7));

        let jan10 = f
            .attendance
            .by_employee_and_date(1000, date(2026, 1, 10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(jan10.status, AttendanceStatus::Leave);
        assert_eq!(jan10.check_in, None);
        assert_eq!(jan10.hr_id, Some(7));

        let jan11 = f
            .attendance
            .by_employee_and_date(1000, date(2026, 1, 11))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(jan11.status, AttendanceStatus::Present);

        let jan12 = f
            .attendance
            .by_employee_and_date(1000, date(2026, 1, 12))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(jan12.status, AttendanceStatus::Leave);
    }

    #[actix_web::test]
    async fn rejection_does_not_touch_the_ledger() {
        let today = date(2026, 1, 20);
        let f = fixture(today, time(9, 0));

        let leave = f
            .engine
            .apply_leave(ApplyLeave {
                employee_id: 1000,
                start_date: date(2026, 1, 10),
                end_date: date(2026, 1, 12),
                category: "annual".into(),
                sub_category: None,
                reason: "vacation".into(),
            })
            .await
            .unwrap();

        f.engine
            .decide_leave(leave.id, LeaveDecision::Reject, 7)
            .await
            .unwrap();

        assert!(
            f.attendance
                .by_employee_and_date(1000, date(2026, 1, 10))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[actix_web::test]
    async fn leave_decisions_are_one_shot() {
        let today = date(2026, 1, 20);
        let f = fixture(today, time(9, 0));

        let leave = f
            .engine
            .apply_leave(ApplyLeave {
                employee_id: 1000,
                start_date: date(2026, 1, 10),
                end_date: date(2026, 1, 10),
                category: "annual".into(),
                sub_category: None,
                reason: "errand".into(),
            })
            .await
            .unwrap();

        f.engine
            .decide_leave(leave.id, LeaveDecision::Reject, 7)
            .await
            .unwrap();
        let err = f
            .engine
            .decide_leave(leave.id, LeaveDecision::Approve, 7)
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::InvalidState(_)));

        let stored = f.leaves.find(leave.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Rejected);
    }

    #[actix_web::test]
    async fn apply_leave_validates_the_range() {
        let today = date(2026, 1, 20);
        let f = fixture(today, time(9, 0));

        let err = f
            .engine
            .apply_leave(ApplyLeave {
                employee_id: 1000,
                start_date: date(2026, 1, 12),
                end_date: date(2026, 1, 10),
                category: "annual".into(),
                sub_category: None,
                reason: "bad range".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::InvalidRequest(_)));
    }
}
