use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;
use sqlx::prelude::FromRow;

use crate::error::HrError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::store::is_duplicate_key;

/// Fields of a record created by marking or leave backfill. Check-out and
/// total hours are always unset at insert time.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub hr_id: Option<u64>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveTime>,
}

/// Attendance ledger. Inserts surface unique-key conflicts on
/// (employee_id, date) as `DuplicateRecord`; checkout is a conditional
/// update so concurrent checkouts serialize on the row.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn exists(&self, employee_id: u64, date: NaiveDate) -> Result<bool, HrError>;
    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, HrError>;
    async fn by_employee_and_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, HrError>;
    /// Sets checkout fields iff the row has no checkout yet; returns the
    /// number of rows updated (0 when another checkout won the race).
    async fn complete_checkout(
        &self,
        id: u64,
        check_out: NaiveTime,
        total_hours: f64,
        status: AttendanceStatus,
    ) -> Result<u64, HrError>;
    async fn for_employee(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, HrError>;
    async fn for_employee_between(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, HrError>;
    async fn for_hr_between(
        &self,
        hr_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, HrError>;
    async fn between(&self, start: NaiveDate, end: NaiveDate)
    -> Result<Vec<AttendanceRecord>, HrError>;
}

pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, employee_id, hr_id, date, status, check_in, check_out, total_hours";

/// Raw row with the status still in its wire form; parsed into the closed
/// enum on the way out so a corrupt cell surfaces as a decode error instead
/// of leaking strings into the domain.
#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    hr_id: Option<u64>,
    date: NaiveDate,
    status: String,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    total_hours: Option<f64>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = HrError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AttendanceStatus>()
            .map_err(|e| HrError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            hr_id: row.hr_id,
            date: row.date,
            status,
            check_in: row.check_in,
            check_out: row.check_out,
            total_hours: row.total_hours,
        })
    }
}

fn into_records(rows: Vec<AttendanceRow>) -> Result<Vec<AttendanceRecord>, HrError> {
    rows.into_iter().map(AttendanceRecord::try_from).collect()
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn exists(&self, employee_id: u64, date: NaiveDate) -> Result<bool, HrError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance WHERE employee_id = ? AND date = ?",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, HrError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, hr_id, date, status, check_in)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.hr_id)
        .bind(record.date)
        .bind(record.status.to_string())
        .bind(record.check_in)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                HrError::DuplicateRecord
            } else {
                HrError::Database(e)
            }
        })?;

        Ok(AttendanceRecord {
            id: result.last_insert_id(),
            employee_id: record.employee_id,
            hr_id: record.hr_id,
            date: record.date,
            status: record.status,
            check_in: record.check_in,
            check_out: None,
            total_hours: None,
        })
    }

    async fn by_employee_and_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, HrError> {
        let sql = format!("SELECT {COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn complete_checkout(
        &self,
        id: u64,
        check_out: NaiveTime,
        total_hours: f64,
        status: AttendanceStatus,
    ) -> Result<u64, HrError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, total_hours = ?, status = ?
            WHERE id = ?
            AND check_out IS NULL
            "#,
        )
        .bind(check_out)
        .bind(total_hours)
        .bind(status.to_string())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn for_employee(&self, employee_id: u64) -> Result<Vec<AttendanceRecord>, HrError> {
        let sql =
            format!("SELECT {COLUMNS} FROM attendance WHERE employee_id = ? ORDER BY date DESC");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn for_employee_between(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, HrError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM attendance WHERE employee_id = ? AND date BETWEEN ? AND ?"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn for_hr_between(
        &self,
        hr_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, HrError> {
        let sql =
            format!("SELECT {COLUMNS} FROM attendance WHERE hr_id = ? AND date BETWEEN ? AND ?");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(hr_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, HrError> {
        let sql = format!("SELECT {COLUMNS} FROM attendance WHERE date BETWEEN ? AND ?");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }
}
