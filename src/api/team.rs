use crate::api::leave_balance::fetch_balance;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::Punch;
use crate::model::regularisation::AttendanceSnapshot;
use crate::utils::workdays;
use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TeamLeaveRow {
    pub id: u64,
    pub user_id: u64,
    pub user_name: String,
    pub user_email: String,
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub is_half_day: bool,
    pub half_day_type: Option<String>,
    pub reason: String,
    pub status: String,
    pub applied_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct PendingLeave {
    #[serde(flatten)]
    pub leave: TeamLeaveRow,
    pub days: f64,
    pub available_balance: f64,
}

/* =========================
Pending leave of direct reports
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/team/leave/pending",
    responses(
        (status = 200, description = "Pending leave requests of the caller's reports, with day counts and balances"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn pending_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, TeamLeaveRow>(
        r#"
        SELECT l.id, l.user_id, u.name AS user_name, u.email AS user_email,
               l.leave_type, l.from_date, l.to_date, l.is_half_day, l.half_day_type,
               l.reason, l.status, l.applied_at
        FROM leave_requests l
        JOIN employees e ON e.user_id = l.user_id
        JOIN users u ON u.id = l.user_id
        WHERE e.manager_id = ? AND l.status = 'Pending'
        ORDER BY l.applied_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    // Same day-count the approval will later settle with, so the reviewer
    // sees exactly what will be deducted.
    let mut leaves = Vec::with_capacity(rows.len());
    for row in rows {
        let days = workdays::leave_days(row.from_date, row.to_date, row.is_half_day);
        let year = row.from_date.year();
        let available_balance = fetch_balance(pool.get_ref(), row.user_id, &row.leave_type, year)
            .await?
            .map(|b| b.balance)
            .unwrap_or(0.0);
        leaves.push(PendingLeave {
            leave: row,
            days,
            available_balance,
        });
    }

    Ok(HttpResponse::Ok().json(json!({ "leaves": leaves })))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TeamRegularisationRow {
    pub id: u64,
    pub user_id: u64,
    pub user_name: String,
    pub user_email: String,
    pub date: NaiveDate,
    pub reg_type: String,
    pub reason: String,
    pub attachment: Option<String>,
    pub status: String,
    pub applied_at: NaiveDateTime,
    pub original_attendance: Option<Json<AttendanceSnapshot>>,
}

/* =========================
Pending regularisations of direct reports
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/team/regularisation/pending",
    responses(
        (status = 200, description = "Pending regularisation requests of the caller's reports"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn pending_regularisations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let regularisations = sqlx::query_as::<_, TeamRegularisationRow>(
        r#"
        SELECT r.id, r.user_id, u.name AS user_name, u.email AS user_email,
               r.date, r.reg_type, r.reason, r.attachment, r.status, r.applied_at,
               r.original_attendance
        FROM regularisations r
        JOIN employees e ON e.user_id = r.user_id
        JOIN users u ON u.id = r.user_id
        WHERE e.manager_id = ? AND r.status = 'Pending'
        ORDER BY r.applied_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "regularisations": regularisations })))
}

/* =========================
Team attendance for a date (defaults to today)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/team/attendance",
    responses(
        (status = 200, description = "Attendance of the caller's reports for one date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TeamAttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let date = match query.date.as_deref() {
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::validation("date must be YYYY-MM-DD"))?,
        None => workdays::today_key(),
    };

    let rows = sqlx::query_as::<_, TeamAttendanceRow>(
        r#"
        SELECT u.id AS user_id, u.name AS user_name, a.punches, a.total_hours, a.status
        FROM employees e
        JOIN users u ON u.id = e.user_id
        LEFT JOIN attendance a ON a.user_id = e.user_id AND a.date = ?
        WHERE e.manager_id = ?
        ORDER BY u.name
        "#,
    )
    .bind(date)
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "date": date, "attendance": rows })))
}

#[derive(serde::Deserialize, utoipa::IntoParams, utoipa::ToSchema)]
pub struct TeamAttendanceQuery {
    #[param(example = "2024-01-08")]
    pub date: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TeamAttendanceRow {
    pub user_id: u64,
    pub user_name: String,
    pub punches: Option<Json<Vec<Punch>>>,
    pub total_hours: Option<f64>,
    pub status: Option<String>,
}
