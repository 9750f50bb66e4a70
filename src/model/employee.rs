use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "name": "John Doe",
        "designation": "Software Engineer",
        "phone": "+8801712345678",
        "department_id": 10,
        "hr_id": 7,
        "join_date": "2024-01-01",
        "deleted": false
    })
)]
pub struct Employee {
    #[schema(example = 1000)]
    pub id: u64,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "Software Engineer")]
    pub designation: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = 10)]
    pub department_id: u64,

    /// Assigned HR. Every employee reports to exactly one.
    #[schema(example = 7)]
    pub hr_id: u64,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub join_date: NaiveDate,

    /// Soft-delete marker. Inactive employees are hidden from directory
    /// lookups but keep their attendance history.
    #[schema(example = false)]
    pub deleted: bool,
}
