use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;
use sqlx::prelude::FromRow;

use crate::error::HrError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

#[derive(Debug, Clone)]
pub struct NewLeave {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category: String,
    pub sub_category: Option<String>,
    pub reason: String,
}

/// Paginated listing filter.
#[derive(Debug, Clone)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub page: u64,
    pub per_page: u64,
}

/// Leave ledger. The status transition is a conditional update guarded on
/// PENDING so a request can only be resolved once.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert(&self, leave: NewLeave) -> Result<LeaveRequest, HrError>;
    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, HrError>;
    /// Returns the number of rows updated (0 when the request was already
    /// resolved by a concurrent call).
    async fn transition(
        &self,
        id: u64,
        status: LeaveStatus,
        hr_id: u64,
    ) -> Result<u64, HrError>;
    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), HrError>;
}

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str =
    "id, employee_id, start_date, end_date, category, sub_category, reason, status, hr_id, created_at";

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    category: String,
    sub_category: Option<String>,
    reason: String,
    status: String,
    hr_id: Option<u64>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = HrError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<LeaveStatus>()
            .map_err(|e| HrError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            category: row.category,
            sub_category: row.sub_category,
            reason: row.reason,
            status,
            hr_id: row.hr_id,
            created_at: row.created_at,
        })
    }
}

// Helper enum for typed SQLx binding of the dynamic WHERE clause.
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn insert(&self, leave: NewLeave) -> Result<LeaveRequest, HrError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, category, sub_category, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.category)
        .bind(&leave.sub_category)
        .bind(&leave.reason)
        .bind(LeaveStatus::Pending.to_string())
        .execute(&self.pool)
        .await?;

        // Refetch for the DB-assigned created_at.
        self.find(result.last_insert_id())
            .await?
            .ok_or(HrError::NotFound("Leave request"))
    }

    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, HrError> {
        let sql = format!("SELECT {COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn transition(
        &self,
        id: u64,
        status: LeaveStatus,
        hr_id: u64,
    ) -> Result<u64, HrError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, hr_id = ?
            WHERE id = ?
            AND status = 'PENDING'
            "#,
        )
        .bind(status.to_string())
        .bind(hr_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), HrError> {
        let offset = (query.page.max(1) - 1) * query.per_page;

        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        let status_text = query.status.map(|s| s.to_string());
        if let Some(status) = status_text.as_deref() {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {COLUMNS} FROM leave_requests{where_sql} ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }
        let rows = data_q
            .bind(query.per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let leaves = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((leaves, total))
    }
}
