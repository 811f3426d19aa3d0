use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::types::Json;
use utoipa::ToSchema;

/// Immutable before/after record of a mutating action, append-only.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct AuditLogRow {
    pub id: u64,
    #[schema(example = "leave_approve")]
    pub action: String,
    /// Actor who performed the action.
    pub user_id: u64,
    /// User affected by the action, when different from the actor.
    pub target_user_id: Option<u64>,
    pub entity_type: Option<String>,
    pub entity_id: Option<u64>,
    #[schema(value_type = Option<Object>)]
    pub old_value: Option<Json<serde_json::Value>>,
    #[schema(value_type = Option<Object>)]
    pub new_value: Option<Json<serde_json::Value>>,
    pub remarks: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<NaiveDateTime>,
}
