use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::audit::AuditLogRow;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AuditFilter {
    #[param(example = "leave_approve")]
    pub action: Option<String>,
    /// Actor filter
    pub user_id: Option<u64>,
    /// Subject filter
    pub target_user_id: Option<u64>,
    #[param(example = "2024-01-01")]
    pub start_date: Option<String>,
    #[param(example = "2024-01-31")]
    pub end_date: Option<String>,
    #[param(example = 100)]
    pub limit: Option<u32>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

/// Audit trail listing (Admin)
#[utoipa::path(
    get,
    path = "/api/v1/audit",
    params(AuditFilter),
    responses(
        (status = 200, description = "Audit entries, newest first, at most 100"),
        (status = 400, description = "Bad date filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Audit"
)]
pub async fn list_logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AuditFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let limit = query.limit.unwrap_or(100).min(100);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(action) = &query.action {
        where_sql.push_str(" AND action = ?");
        args.push(FilterValue::Str(action.clone()));
    }
    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }
    if let Some(target_user_id) = query.target_user_id {
        where_sql.push_str(" AND target_user_id = ?");
        args.push(FilterValue::U64(target_user_id));
    }
    if let (Some(start), Some(end)) = (query.start_date.as_deref(), query.end_date.as_deref()) {
        let start: NaiveDate = start
            .parse()
            .map_err(|_| ApiError::validation("start_date must be YYYY-MM-DD"))?;
        let end: NaiveDate = end
            .parse()
            .map_err(|_| ApiError::validation("end_date must be YYYY-MM-DD"))?;
        where_sql.push_str(" AND DATE(created_at) BETWEEN ? AND ?");
        args.push(FilterValue::Date(start));
        args.push(FilterValue::Date(end));
    }

    let sql = format!(
        r#"
        SELECT id, action, user_id, target_user_id, entity_type, entity_id,
               old_value, new_value, remarks, created_at
        FROM audit_logs
        {}
        ORDER BY created_at DESC
        LIMIT ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AuditLogRow>(&sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let logs = data_q.bind(limit).fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({ "logs": logs })))
}
