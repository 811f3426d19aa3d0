use crate::api::leave_balance::{fetch_balance, settle_approval};
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{LeaveRequest, requires_balance_check};
use crate::model::review::{RequestStatus, ReviewAction};
use crate::utils::{audit, manager, workdays};
use actix_web::{HttpResponse, web};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeave {
    #[schema(example = "CL")]
    pub leave_type: String,
    #[schema(example = "2024-01-08", format = "date", value_type = String)]
    pub from_date: chrono::NaiveDate,
    #[schema(example = "2024-01-10", format = "date", value_type = String)]
    pub to_date: chrono::NaiveDate,
    pub is_half_day: Option<bool>,
    #[schema(example = "First Half")]
    pub half_day_type: Option<String>,
    #[schema(example = "Family function")]
    pub reason: String,
    pub attachment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewBody {
    #[schema(example = "Enjoy your leave")]
    pub remarks: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveHistoryFilter {
    #[param(example = "Pending")]
    pub status: Option<String>,
    #[param(example = "CL")]
    pub leave_type: Option<String>,
    #[param(example = "2024-01-01")]
    pub start_date: Option<String>,
    #[param(example = "2024-12-31")]
    pub end_date: Option<String>,
}

pub(crate) async fn fetch_leave(
    pool: &MySqlPool,
    leave_id: u64,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, user_id, leave_type, from_date, to_date, is_half_day, half_day_type,
               reason, status, approver_id, approver_remarks, applied_at, reviewed_at, attachment
        FROM leave_requests
        WHERE id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool)
    .await
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = ApplyLeave,
    responses(
        (status = 200, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted. It will be reviewed by Jane Manager",
            "days": 3.0
        })),
        (status = 400, description = "Validation failure or insufficient balance"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ApplyLeave>,
) -> Result<HttpResponse, ApiError> {
    if payload.leave_type.trim().is_empty() || payload.reason.trim().is_empty() {
        return Err(ApiError::validation("Missing required fields"));
    }
    if payload.from_date > payload.to_date {
        return Err(ApiError::validation("From date must be before to date"));
    }

    let is_half_day = payload.is_half_day.unwrap_or(false);
    let days = workdays::leave_days(payload.from_date, payload.to_date, is_half_day);

    // LOP is unbounded; every other type must fit in the credited pool of the
    // year the leave starts in.
    if requires_balance_check(payload.leave_type.trim()) {
        let year = payload.from_date.year();
        let available = fetch_balance(pool.get_ref(), auth.user_id, &payload.leave_type, year)
            .await?
            .map(|row| row.balance)
            .unwrap_or(0.0);
        if available < days {
            return Err(ApiError::InsufficientBalance {
                available,
                required: days,
            });
        }
    }

    // The request is created even when nobody is assigned to review it.
    let approver = manager::resolve_manager(pool.get_ref(), auth.user_id).await?;
    let (approver_id, manager_name) = match &approver {
        Some(m) => (Some(m.user_id), m.name.clone()),
        None => (None, "Not Assigned".to_string()),
    };

    let half_day_type = if is_half_day {
        payload.half_day_type.clone()
    } else {
        None
    };

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, leave_type, from_date, to_date, is_half_day, half_day_type,
             reason, status, approver_id, applied_at, attachment)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'Pending', ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.leave_type.trim())
    .bind(payload.from_date)
    .bind(payload.to_date)
    .bind(is_half_day)
    .bind(half_day_type)
    .bind(payload.reason.trim())
    .bind(approver_id)
    .bind(workdays::now_local())
    .bind(payload.attachment.as_deref())
    .execute(pool.get_ref())
    .await?;

    let leave = fetch_leave(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::Database)?;

    Ok(HttpResponse::Ok().json(json!({
        "leave": leave,
        "manager_name": manager_name,
        "days": days,
        "message": format!("Leave request submitted. It will be reviewed by {manager_name}"),
    })))
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Date(chrono::NaiveDate),
}

/* =========================
Own leave history
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveHistoryFilter),
    responses(
        (status = 200, description = "Own leave requests, newest first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveHistoryFilter>,
) -> Result<HttpResponse, ApiError> {
    let mut where_sql = String::from(" WHERE user_id = ?");
    let mut args: Vec<FilterValue> = vec![FilterValue::U64(auth.user_id)];

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }
    if let Some(leave_type) = query.leave_type.as_deref() {
        where_sql.push_str(" AND leave_type = ?");
        args.push(FilterValue::Str(leave_type));
    }
    if let (Some(start), Some(end)) = (query.start_date.as_deref(), query.end_date.as_deref()) {
        let start: chrono::NaiveDate = start
            .parse()
            .map_err(|_| ApiError::validation("start_date must be YYYY-MM-DD"))?;
        let end: chrono::NaiveDate = end
            .parse()
            .map_err(|_| ApiError::validation("end_date must be YYYY-MM-DD"))?;
        where_sql.push_str(" AND (from_date BETWEEN ? AND ? OR to_date BETWEEN ? AND ?)");
        args.push(FilterValue::Date(start));
        args.push(FilterValue::Date(end));
        args.push(FilterValue::Date(start));
        args.push(FilterValue::Date(end));
    }

    let sql = format!(
        r#"
        SELECT id, user_id, leave_type, from_date, to_date, is_half_day, half_day_type,
               reason, status, approver_id, approver_remarks, applied_at, reviewed_at, attachment
        FROM leave_requests
        {}
        ORDER BY applied_at DESC
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s.to_string()),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let leaves = data_q.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({ "leaves": leaves })))
}

/// Shared review path: only the request owner's *current* manager may decide,
/// and only once.
async fn adjudicate(
    pool: &MySqlPool,
    actor: &AuthUser,
    leave_id: u64,
    action: ReviewAction,
    remarks: Option<String>,
) -> Result<HttpResponse, ApiError> {
    let leave = fetch_leave(pool, leave_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;

    let status: RequestStatus = leave.status.parse().map_err(|_| ApiError::Database)?;
    if status.is_terminal() {
        return Err(ApiError::validation("Leave request already processed"));
    }

    // Authorization is re-derived from current org data, not the approver
    // stamped at apply time.
    match manager::manager_of(pool, leave.user_id).await? {
        Some(m) if m.user_id == actor.user_id => {}
        _ => return Err(ApiError::forbidden("Unauthorized: Not your team member")),
    }

    let new_status = action.resulting_status();
    let updated = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, approver_remarks = ?, reviewed_at = ?
        WHERE id = ? AND status = 'Pending'
        "#,
    )
    .bind(new_status.to_string())
    .bind(remarks.clone().unwrap_or_default())
    .bind(workdays::now_local())
    .bind(leave_id)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::validation("Leave request already processed"));
    }

    // Settlement is a second, independent write; a crash in between leaves an
    // approved request with an unsettled balance.
    if action == ReviewAction::Approve && requires_balance_check(&leave.leave_type) {
        let days = workdays::leave_days(leave.from_date, leave.to_date, leave.is_half_day);
        settle_approval(pool, &leave, days, actor).await?;
    }

    audit::record(
        pool,
        audit::AuditEvent {
            action: match action {
                ReviewAction::Approve => "leave_approve",
                ReviewAction::Reject => "leave_reject",
            },
            actor_id: actor.user_id,
            target_user_id: Some(leave.user_id),
            entity_type: "Leave",
            entity_id: Some(leave_id),
            old_value: Some(json!({ "status": RequestStatus::Pending.to_string() })),
            new_value: Some(json!({ "status": new_status.to_string() })),
            remarks: remarks.clone(),
        },
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!(
            "Leave request {} successfully",
            match action {
                ReviewAction::Approve => "approved",
                ReviewAction::Reject => "rejected",
            }
        ),
    })))
}

/* =========================
Approve leave (reporting manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    request_body(content = ReviewBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved and balance settled"),
        (status = 400, description = "Already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Actor is not the owner's reporting manager"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewBody>>,
) -> Result<HttpResponse, ApiError> {
    let remarks = body.and_then(|b| b.into_inner().remarks);
    adjudicate(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        ReviewAction::Approve,
        remarks,
    )
    .await
}

/* =========================
Reject leave (reporting manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    request_body(content = ReviewBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected, no balance change"),
        (status = 400, description = "Already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Actor is not the owner's reporting manager"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewBody>>,
) -> Result<HttpResponse, ApiError> {
    let remarks = body.and_then(|b| b.into_inner().remarks);
    adjudicate(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        ReviewAction::Reject,
        remarks,
    )
    .await
}
