use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::error::HrError;
use crate::model::employee::Employee;
use crate::model::hr::Hr;

/// Read-mostly lookup over employees and HR staff. Soft deletion is a
/// visibility filter here: `employee` hides deactivated rows, while
/// `employee_with_deleted` keeps history queryable for aggregation.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn employee(&self, id: u64) -> Result<Option<Employee>, HrError>;
    async fn employee_with_deleted(&self, id: u64) -> Result<Option<Employee>, HrError>;
    async fn hr(&self, id: u64) -> Result<Option<Hr>, HrError>;
    /// Active employees assigned to the given HR.
    async fn team_size(&self, hr_id: u64) -> Result<u64, HrError>;
}

pub struct MySqlDirectoryStore {
    pool: MySqlPool,
}

impl MySqlDirectoryStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const EMPLOYEE_COLUMNS: &str =
    "id, name, designation, phone, department_id, hr_id, join_date, is_deleted AS deleted";

#[async_trait]
impl DirectoryStore for MySqlDirectoryStore {
    async fn employee(&self, id: u64) -> Result<Option<Employee>, HrError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? AND is_deleted = FALSE");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn employee_with_deleted(&self, id: u64) -> Result<Option<Employee>, HrError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn hr(&self, id: u64) -> Result<Option<Hr>, HrError> {
        let hr = sqlx::query_as::<_, Hr>(
            "SELECT id, name, phone, department_id FROM hr WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hr)
    }

    async fn team_size(&self, hr_id: u64) -> Result<u64, HrError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM employees WHERE hr_id = ? AND is_deleted = FALSE",
        )
        .bind(hr_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}
