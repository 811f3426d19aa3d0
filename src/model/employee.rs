use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// HR profile linked 1:1 to a login user. `manager_id` points at the users
/// table and drives every approval routing decision.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "user_id": 42,
        "employee_code": "EMP-001",
        "department": "Engineering",
        "designation": "Backend Engineer",
        "manager_id": 7,
        "joining_date": "2024-01-01",
        "phone": "+8801712345678"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 42)]
    pub user_id: u64,

    #[schema(example = "EMP-001", nullable = true)]
    pub employee_code: Option<String>,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Backend Engineer", nullable = true)]
    pub designation: Option<String>,

    #[schema(example = 7, nullable = true)]
    pub manager_id: Option<u64>,

    #[schema(example = "2024-01-01", value_type = String, format = "date", nullable = true)]
    pub joining_date: Option<NaiveDate>,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,
}
