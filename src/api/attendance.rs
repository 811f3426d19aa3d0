use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::attendance::{
    AttendanceRecord, Punch, derive_status, next_punch_type, worked_hours,
};
use crate::utils::workdays;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};

pub(crate) async fn fetch_record(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, user_id, date, punches, total_hours, status
        FROM attendance
        WHERE user_id = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

/// Whole-document write: the punches array, derived hours and status are
/// replaced together (last write wins, no row locking).
pub(crate) async fn upsert_record(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
    punches: &[Punch],
    total_hours: Option<f64>,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO attendance (user_id, date, punches, total_hours, status)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            punches = VALUES(punches),
            total_hours = VALUES(total_hours),
            status = VALUES(status)
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(Json(punches))
    .bind(total_hours)
    .bind(status)
    .execute(pool)
    .await?;
    Ok(())
}

/// Punch clock endpoint: toggles IN/OUT off the last punch of the day
#[utoipa::path(
    post,
    path = "/api/v1/attendance/punch",
    responses(
        (status = 200, description = "Punch recorded, updated record returned", body = AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let today = workdays::today_key();
    let now = workdays::now_local();

    let device = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("web")
        .to_string();
    let ip = {
        let info = req.connection_info();
        info.realip_remote_addr().map(|s| s.to_string())
    };

    let existing = fetch_record(pool.get_ref(), auth.user_id, today).await?;
    let mut punches: Vec<Punch> = existing.map(|r| r.punches.0).unwrap_or_default();

    let punch_type = next_punch_type(&punches);
    punches.push(Punch {
        punch_type,
        time: now,
        device: Some(device),
        ip,
        gps: None,
    });

    let total_hours = worked_hours(&punches, config.strict_hour_pairing);
    let status = derive_status(&punches);

    upsert_record(
        pool.get_ref(),
        auth.user_id,
        today,
        &punches,
        total_hours,
        &status.to_string(),
    )
    .await?;

    let record = fetch_record(pool.get_ref(), auth.user_id, today)
        .await?
        .ok_or(ApiError::Database)?;

    Ok(HttpResponse::Ok().json(json!({ "attendance": record })))
}

/// Today's attendance record, if any
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's record (null when no punch yet)"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let record = fetch_record(pool.get_ref(), auth.user_id, workdays::today_key()).await?;
    Ok(HttpResponse::Ok().json(json!({ "attendance": record })))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Month in YYYY-MM form; takes precedence over the explicit range
    #[param(example = "2024-01")]
    pub month: Option<String>,
    #[param(example = "2024-01-01")]
    pub start_date: Option<String>,
    #[param(example = "2024-01-31")]
    pub end_date: Option<String>,
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::validation(format!("{field} must be YYYY-MM-DD")))
}

/// Own attendance history, newest first, capped at 100 rows
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance records in range"),
        (status = 400, description = "Bad date filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ApiError> {
    let range = if let Some(month) = query.month.as_deref() {
        let (year, month_num) = month
            .split_once('-')
            .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)))
            .ok_or_else(|| ApiError::validation("month must be YYYY-MM"))?;
        Some(
            workdays::month_bounds(year, month_num)
                .ok_or_else(|| ApiError::validation("month out of range"))?,
        )
    } else if let (Some(start), Some(end)) = (query.start_date.as_deref(), query.end_date.as_deref())
    {
        Some((
            parse_date(start, "start_date")?,
            parse_date(end, "end_date")?,
        ))
    } else {
        None
    };

    let records = match range {
        Some((from, to)) => {
            sqlx::query_as::<_, AttendanceRecord>(
                r#"
                SELECT id, user_id, date, punches, total_hours, status
                FROM attendance
                WHERE user_id = ? AND date BETWEEN ? AND ?
                ORDER BY date DESC
                LIMIT 100
                "#,
            )
            .bind(auth.user_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool.get_ref())
            .await?
        }
        None => {
            sqlx::query_as::<_, AttendanceRecord>(
                r#"
                SELECT id, user_id, date, punches, total_hours, status
                FROM attendance
                WHERE user_id = ?
                ORDER BY date DESC
                LIMIT 100
                "#,
            )
            .bind(auth.user_id)
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(json!({ "attendance": records })))
}
