use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::clock::Clock;
use crate::engine::rules::round2;
use crate::error::HrError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::store::{AttendanceStore, DirectoryStore};

/// Per-employee month bucket counts. Present and half days earn 1.0 and 0.5
/// working-day credit; holidays are excluded from the working-day base.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlySummary {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = 22)]
    pub total_days: u32,
    /// PRESENT + WORK_FROM_HOME.
    #[schema(example = 18)]
    pub present_days: u32,
    #[schema(example = 1)]
    pub absent_days: u32,
    /// HALF_DAY + LATE.
    #[schema(example = 2)]
    pub half_days: u32,
    #[schema(example = 1)]
    pub leave_days: u32,
    #[schema(example = 0)]
    pub holiday_days: u32,
    #[schema(example = 86.36)]
    pub attendance_percentage: f64,
}

/// Flattened, export-ready view of one attendance record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimesheetRow {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = 7, nullable = true)]
    pub hr_id: Option<u64>,
    #[schema(example = "Jane Smith", nullable = true)]
    pub hr_name: Option<String>,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:30:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "18:00:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,
    #[schema(example = 8.5, nullable = true)]
    pub working_hours: Option<f64>,
    #[schema(example = "PRESENT")]
    pub status: String,
}

/// Single-date roll-up for one HR's team.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSummary {
    #[schema(example = 12)]
    pub total_team: u64,
    /// Any of PRESENT, WORK_FROM_HOME, HALF_DAY, LATE.
    #[schema(example = 9)]
    pub present: u32,
    #[schema(example = 1)]
    pub absent: u32,
    #[schema(example = 2)]
    pub on_leave: u32,
    #[schema(example = 1)]
    pub late: u32,
    #[schema(example = 7.82)]
    pub avg_hours: f64,
}

/// One trailing calendar month of per-employee counts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PerformanceMetric {
    #[schema(example = "2026-01")]
    pub month: String,
    #[schema(example = 21)]
    pub total_days: u32,
    /// Days with a plain PRESENT status.
    #[schema(example = 17)]
    pub on_time_days: u32,
    #[schema(example = 2)]
    pub late_days: u32,
    #[schema(example = 2)]
    pub wfh_days: u32,
    #[schema(example = 7.94)]
    pub avg_hours: f64,
}

/// Maps UI filter labels onto the closed status enum, case-insensitively.
/// Unrecognized labels fall back to PRESENT; the original frontend relies
/// on this, so the fallback is kept and logged rather than rejected.
pub fn parse_status_filter(raw: &str) -> AttendanceStatus {
    let normalized = raw.trim().to_uppercase();
    match normalized.as_str() {
        "ON-TIME" | "ON_TIME" | "PRESENT" => AttendanceStatus::Present,
        "LATE" => AttendanceStatus::Late,
        "HALF DAY" | "HALF_DAY" => AttendanceStatus::HalfDay,
        "ABSENT" => AttendanceStatus::Absent,
        "WFH" | "WORK_FROM_HOME" => AttendanceStatus::WorkFromHome,
        "LEAVE" => AttendanceStatus::Leave,
        "HOLIDAY" => AttendanceStatus::Holiday,
        other => {
            warn!(filter = other, "unrecognized status filter, defaulting to PRESENT");
            AttendanceStatus::Present
        }
    }
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), HrError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(HrError::InvalidRequest("invalid month or year"))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or(HrError::InvalidRequest("invalid month or year"))?;
    Ok((first, last))
}

/// Calendar month `back` months before (year, month).
fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let total = year * 12 + month as i32 - 1 - back as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}

/// Read-only projections over the attendance ledger. Runs concurrently with
/// writers and tolerates whatever snapshot the store hands back.
pub struct AggregationEngine {
    directory: Arc<dyn DirectoryStore>,
    attendance: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
}

impl AggregationEngine {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        attendance: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            attendance,
            clock,
        }
    }

    pub async fn monthly_summary(
        &self,
        employee_id: u64,
        month: u32,
        year: i32,
    ) -> Result<MonthlySummary, HrError> {
        // Historical query: deactivated employees stay visible here.
        let employee = self
            .directory
            .employee_with_deleted(employee_id)
            .await?
            .ok_or(HrError::NotFound("Employee"))?;

        let (first, last) = month_bounds(year, month)?;
        let records = self
            .attendance
            .for_employee_between(employee_id, first, last)
            .await?;

        let mut present = 0u32;
        let mut half = 0u32;
        let mut absent = 0u32;
        let mut leave = 0u32;
        let mut holiday = 0u32;
        for record in &records {
            match record.status {
                AttendanceStatus::Present | AttendanceStatus::WorkFromHome => present += 1,
                AttendanceStatus::HalfDay | AttendanceStatus::Late => half += 1,
                AttendanceStatus::Absent => absent += 1,
                AttendanceStatus::Leave => leave += 1,
                AttendanceStatus::Holiday => holiday += 1,
            }
        }

        let total_days = records.len() as u32;
        let working_days = total_days - holiday;
        let attendance_percentage = if working_days == 0 {
            0.0
        } else {
            round2((present as f64 + 0.5 * half as f64) / working_days as f64 * 100.0)
        };

        Ok(MonthlySummary {
            employee_id,
            employee_name: employee.name,
            total_days,
            present_days: present,
            absent_days: absent,
            half_days: half,
            leave_days: leave,
            holiday_days: holiday,
            attendance_percentage,
        })
    }

    pub async fn employee_timesheet(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        status_filter: Option<&str>,
    ) -> Result<Vec<TimesheetRow>, HrError> {
        check_range(start, end)?;
        let records = self
            .attendance
            .for_employee_between(employee_id, start, end)
            .await?;
        let mut rows = self.build_rows(records, status_filter, None).await?;
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    pub async fn team_timesheet(
        &self,
        hr_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        status_filter: Option<&str>,
        employee_filter: Option<u64>,
    ) -> Result<Vec<TimesheetRow>, HrError> {
        check_range(start, end)?;
        let records = self.attendance.for_hr_between(hr_id, start, end).await?;
        let mut rows = self
            .build_rows(records, status_filter, employee_filter)
            .await?;
        sort_for_export(&mut rows);
        Ok(rows)
    }

    pub async fn company_timesheet(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        status_filter: Option<&str>,
        employee_filter: Option<u64>,
    ) -> Result<Vec<TimesheetRow>, HrError> {
        check_range(start, end)?;
        let records = self.attendance.between(start, end).await?;
        let mut rows = self
            .build_rows(records, status_filter, employee_filter)
            .await?;
        sort_for_export(&mut rows);
        Ok(rows)
    }

    pub async fn team_summary(&self, hr_id: u64, date: NaiveDate) -> Result<TeamSummary, HrError> {
        let total_team = self.directory.team_size(hr_id).await?;
        let records = self.attendance.for_hr_between(hr_id, date, date).await?;

        let mut present = 0u32;
        let mut absent = 0u32;
        let mut on_leave = 0u32;
        let mut late = 0u32;
        let mut hours_total = 0.0f64;
        let mut hours_count = 0u32;
        for record in &records {
            match record.status {
                AttendanceStatus::Present
                | AttendanceStatus::WorkFromHome
                | AttendanceStatus::HalfDay
                | AttendanceStatus::Late => present += 1,
                AttendanceStatus::Absent => absent += 1,
                AttendanceStatus::Leave => on_leave += 1,
                AttendanceStatus::Holiday => {}
            }
            if record.status == AttendanceStatus::Late {
                late += 1;
            }
            if let Some(hours) = record.total_hours {
                hours_total += hours;
                hours_count += 1;
            }
        }

        let avg_hours = if hours_count == 0 {
            0.0
        } else {
            round2(hours_total / hours_count as f64)
        };

        Ok(TeamSummary {
            total_team,
            present,
            absent,
            on_leave,
            late,
            avg_hours,
        })
    }

    /// Trailing `months` calendar months, oldest first. Months without any
    /// record report zero counts and a zero average.
    pub async fn performance(
        &self,
        employee_id: u64,
        months: u32,
    ) -> Result<Vec<PerformanceMetric>, HrError> {
        self.directory
            .employee_with_deleted(employee_id)
            .await?
            .ok_or(HrError::NotFound("Employee"))?;

        if months == 0 {
            return Ok(Vec::new());
        }

        let today = self.clock.today();
        let (oldest_year, oldest_month) = months_back(today.year(), today.month(), months - 1);
        let (window_start, _) = month_bounds(oldest_year, oldest_month)?;
        let records = self
            .attendance
            .for_employee_between(employee_id, window_start, today)
            .await?;

        let mut by_month: HashMap<(i32, u32), Vec<&AttendanceRecord>> = HashMap::new();
        for record in &records {
            by_month
                .entry((record.date.year(), record.date.month()))
                .or_default()
                .push(record);
        }

        let mut metrics = Vec::with_capacity(months as usize);
        for back in (0..months).rev() {
            let (year, month) = months_back(today.year(), today.month(), back);
            let list = by_month.get(&(year, month)).map_or(&[][..], Vec::as_slice);

            let mut on_time = 0u32;
            let mut late = 0u32;
            let mut wfh = 0u32;
            let mut hours_total = 0.0f64;
            for record in list {
                match record.status {
                    AttendanceStatus::Present => on_time += 1,
                    AttendanceStatus::Late => late += 1,
                    AttendanceStatus::WorkFromHome => wfh += 1,
                    AttendanceStatus::HalfDay
                    | AttendanceStatus::Absent
                    | AttendanceStatus::Leave
                    | AttendanceStatus::Holiday => {}
                }
                hours_total += record.total_hours.unwrap_or(0.0);
            }

            let avg_hours = if list.is_empty() {
                0.0
            } else {
                round2(hours_total / list.len() as f64)
            };

            metrics.push(PerformanceMetric {
                month: format!("{year:04}-{month:02}"),
                total_days: list.len() as u32,
                on_time_days: on_time,
                late_days: late,
                wfh_days: wfh,
                avg_hours,
            });
        }
        Ok(metrics)
    }

    /// Flattens records into rows, resolving names through the directory
    /// (soft-deleted employees included, so history keeps its names).
    async fn build_rows(
        &self,
        mut records: Vec<AttendanceRecord>,
        status_filter: Option<&str>,
        employee_filter: Option<u64>,
    ) -> Result<Vec<TimesheetRow>, HrError> {
        if let Some(filter) = status_filter {
            let status = parse_status_filter(filter);
            records.retain(|r| r.status == status);
        }
        if let Some(employee_id) = employee_filter {
            records.retain(|r| r.employee_id == employee_id);
        }

        let mut employee_names: HashMap<u64, String> = HashMap::new();
        let mut hr_names: HashMap<u64, String> = HashMap::new();
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            if !employee_names.contains_key(&record.employee_id) {
                let name = self
                    .directory
                    .employee_with_deleted(record.employee_id)
                    .await?
                    .map(|e| e.name)
                    .unwrap_or_default();
                employee_names.insert(record.employee_id, name);
            }
            if let Some(hr_id) = record.hr_id {
                if !hr_names.contains_key(&hr_id) {
                    let name = self
                        .directory
                        .hr(hr_id)
                        .await?
                        .map(|h| h.name)
                        .unwrap_or_default();
                    hr_names.insert(hr_id, name);
                }
            }

            rows.push(TimesheetRow {
                employee_id: record.employee_id,
                employee_name: employee_names[&record.employee_id].clone(),
                hr_id: record.hr_id,
                hr_name: record.hr_id.map(|id| hr_names[&id].clone()),
                date: record.date,
                check_in: record.check_in,
                check_out: record.check_out,
                working_hours: record.total_hours,
                status: record.status.to_string(),
            });
        }
        Ok(rows)
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), HrError> {
    if start > end {
        return Err(HrError::InvalidRequest("start_date cannot be after end_date"));
    }
    Ok(())
}

/// Date descending, then employee name ascending for ties.
fn sort_for_export(rows: &mut [TimesheetRow]) {
    rows.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.employee_name.cmp(&b.employee_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FixedClock, MemoryAttendance, MemoryDirectory, employee, hr, named_employee, record};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine_for(
        directory: Arc<MemoryDirectory>,
        attendance: Arc<MemoryAttendance>,
        today: NaiveDate,
    ) -> AggregationEngine {
        AggregationEngine::new(
            directory,
            attendance,
            Arc::new(FixedClock {
                today,
                time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            }),
        )
    }

    #[test]
    fn filter_labels_map_case_insensitively() {
        assert_eq!(parse_status_filter("on-time"), AttendanceStatus::Present);
        assert_eq!(parse_status_filter("ON_TIME"), AttendanceStatus::Present);
        assert_eq!(parse_status_filter(" half day "), AttendanceStatus::HalfDay);
        assert_eq!(parse_status_filter("wfh"), AttendanceStatus::WorkFromHome);
        assert_eq!(parse_status_filter("LEAVE"), AttendanceStatus::Leave);
        // Unrecognized labels keep the original fallback.
        assert_eq!(parse_status_filter("whatever"), AttendanceStatus::Present);
    }

    #[test]
    fn months_back_crosses_year_boundaries() {
        assert_eq!(months_back(2026, 3, 0), (2026, 3));
        assert_eq!(months_back(2026, 3, 2), (2026, 1));
        assert_eq!(months_back(2026, 3, 3), (2025, 12));
        assert_eq!(months_back(2026, 1, 13), (2024, 12));
    }

    #[actix_web::test]
    async fn monthly_summary_buckets_and_percentage() {
        let directory = Arc::new(MemoryDirectory::default());
        directory.add_hr(hr(7));
        directory.add_employee(employee(1000, 7));
        let attendance = Arc::new(MemoryAttendance::default());

        let days = [
            (1, AttendanceStatus::Present),
            (2, AttendanceStatus::WorkFromHome),
            (3, AttendanceStatus::Late),
            (4, AttendanceStatus::HalfDay),
            (5, AttendanceStatus::Absent),
            (6, AttendanceStatus::Leave),
            (7, AttendanceStatus::Holiday),
        ];
        for (day, status) in days {
            attendance.seed(record(1000, date(2026, 1, day), status, None));
        }
        // Outside the month: ignored.
        attendance.seed(record(1000, date(2026, 2, 1), AttendanceStatus::Present, None));

        let engine = engine_for(directory, attendance, date(2026, 2, 10));
        let summary = engine.monthly_summary(1000, 1, 2026).await.unwrap();

        assert_eq!(summary.total_days, 7);
        assert_eq!(summary.present_days, 2);
        assert_eq!(summary.half_days, 2);
        assert_eq!(summary.absent_days, 1);
        assert_eq!(summary.leave_days, 1);
        assert_eq!(summary.holiday_days, 1);
        // (2 + 0.5*2) / (7 - 1) * 100 = 50.00
        assert_eq!(summary.attendance_percentage, 50.0);
    }

    #[actix_web::test]
    async fn all_holiday_month_reports_zero_percentage() {
        let directory = Arc::new(MemoryDirectory::default());
        directory.add_hr(hr(7));
        directory.add_employee(employee(1000, 7));
        let attendance = Arc::new(MemoryAttendance::default());
        attendance.seed(record(1000, date(2026, 1, 1), AttendanceStatus::Holiday, None));
        attendance.seed(record(1000, date(2026, 1, 2), AttendanceStatus::Holiday, None));

        let engine = engine_for(directory, attendance, date(2026, 2, 10));
        let summary = engine.monthly_summary(1000, 1, 2026).await.unwrap();
        assert_eq!(summary.attendance_percentage, 0.0);
        assert_eq!(summary.total_days, 2);
    }

    #[actix_web::test]
    async fn company_timesheet_sorts_and_filters() {
        let directory = Arc::new(MemoryDirectory::default());
        directory.add_hr(hr(7));
        directory.add_employee(named_employee(1, "Bob", 7));
        directory.add_employee(named_employee(2, "Alice", 7));
        let attendance = Arc::new(MemoryAttendance::default());

        attendance.seed(record(1, date(2026, 1, 5), AttendanceStatus::Present, Some(8.5)));
        attendance.seed(record(2, date(2026, 1, 5), AttendanceStatus::Present, Some(8.0)));
        attendance.seed(record(1, date(2026, 1, 6), AttendanceStatus::Late, None));

        let engine = engine_for(directory, attendance, date(2026, 2, 10));

        let rows = engine
            .company_timesheet(date(2026, 1, 1), date(2026, 1, 31), None, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        // Jan 6 first, then Jan 5 with Alice before Bob.
        assert_eq!(rows[0].date, date(2026, 1, 6));
        assert_eq!(rows[1].employee_name, "Alice");
        assert_eq!(rows[2].employee_name, "Bob");
        assert_eq!(rows[0].status, "LATE");

        // "on-time" alias selects PRESENT rows only.
        let rows = engine
            .company_timesheet(date(2026, 1, 1), date(2026, 1, 31), Some("on-time"), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.status == "PRESENT"));

        // Employee filter narrows further.
        let rows = engine
            .company_timesheet(date(2026, 1, 1), date(2026, 1, 31), None, Some(2))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_name, "Alice");

        let err = engine
            .company_timesheet(date(2026, 2, 1), date(2026, 1, 1), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::InvalidRequest(_)));
    }

    #[actix_web::test]
    async fn team_summary_counts_and_average() {
        let directory = Arc::new(MemoryDirectory::default());
        directory.add_hr(hr(7));
        directory.add_employee(employee(1, 7));
        directory.add_employee(employee(2, 7));
        directory.add_employee(employee(3, 7));
        // A fourth team member with no record today.
        directory.add_employee(employee(4, 7));
        let attendance = Arc::new(MemoryAttendance::default());

        let day = date(2026, 1, 5);
        attendance.seed(record(1, day, AttendanceStatus::Present, Some(8.0)));
        attendance.seed(record(2, day, AttendanceStatus::Late, Some(6.0)));
        attendance.seed(record(3, day, AttendanceStatus::Leave, None));

        let engine = engine_for(directory, attendance, date(2026, 1, 5));
        let summary = engine.team_summary(7, day).await.unwrap();

        assert_eq!(summary.total_team, 4);
        assert_eq!(summary.present, 2);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.on_leave, 1);
        assert_eq!(summary.absent, 0);
        // Only the two records with hours count: (8 + 6) / 2.
        assert_eq!(summary.avg_hours, 7.0);
    }

    #[actix_web::test]
    async fn performance_reports_trailing_months_oldest_first() {
        let directory = Arc::new(MemoryDirectory::default());
        directory.add_hr(hr(7));
        directory.add_employee(employee(1000, 7));
        let attendance = Arc::new(MemoryAttendance::default());

        // January: two on-time days with hours, one late day without.
        attendance.seed(record(1000, date(2026, 1, 5), AttendanceStatus::Present, Some(8.0)));
        attendance.seed(record(1000, date(2026, 1, 6), AttendanceStatus::Present, Some(7.0)));
        attendance.seed(record(1000, date(2026, 1, 7), AttendanceStatus::Late, None));
        // March: one WFH day.
        attendance.seed(record(1000, date(2026, 3, 2), AttendanceStatus::WorkFromHome, Some(8.0)));

        let engine = engine_for(directory, attendance, date(2026, 3, 10));
        let metrics = engine.performance(1000, 3).await.unwrap();

        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0].month, "2026-01");
        assert_eq!(metrics[0].total_days, 3);
        assert_eq!(metrics[0].on_time_days, 2);
        assert_eq!(metrics[0].late_days, 1);
        // 15 recorded hours across 3 rows.
        assert_eq!(metrics[0].avg_hours, 5.0);

        // February is empty.
        assert_eq!(metrics[1].month, "2026-02");
        assert_eq!(metrics[1].total_days, 0);
        assert_eq!(metrics[1].avg_hours, 0.0);

        assert_eq!(metrics[2].month, "2026-03");
        assert_eq!(metrics[2].wfh_days, 1);
    }

    #[actix_web::test]
    async fn history_keeps_names_of_deactivated_employees() {
        let directory = Arc::new(MemoryDirectory::default());
        directory.add_hr(hr(7));
        let mut former = named_employee(1, "Bob", 7);
        former.deleted = true;
        directory.add_employee(former);
        let attendance = Arc::new(MemoryAttendance::default());
        attendance.seed(record(1, date(2026, 1, 5), AttendanceStatus::Present, Some(8.0)));

        let engine = engine_for(directory, attendance, date(2026, 1, 10));
        let rows = engine
            .company_timesheet(date(2026, 1, 1), date(2026, 1, 31), None, None)
            .await
            .unwrap();
        assert_eq!(rows[0].employee_name, "Bob");

        let summary = engine.monthly_summary(1, 1, 2026).await.unwrap();
        assert_eq!(summary.employee_name, "Bob");
    }
}
