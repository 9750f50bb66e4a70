use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// HR staff member. Marks attendance and resolves leave requests for the
/// employees assigned to them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Hr {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "Jane Smith")]
    pub name: String,

    #[schema(example = "+8801812345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = 10)]
    pub department_id: u64,
}
