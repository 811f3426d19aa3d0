use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{DEFAULT_LEAVE_TYPES, LeaveRequest};
use crate::model::leave_balance::{BalanceFigures, LeaveBalance};
use crate::utils::{audit, workdays};
use actix_web::{HttpResponse, web};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

pub(crate) async fn fetch_balance(
    pool: &MySqlPool,
    user_id: u64,
    leave_type: &str,
    year: i32,
) -> Result<Option<LeaveBalance>, sqlx::Error> {
    sqlx::query_as::<_, LeaveBalance>(
        r#"
        SELECT id, user_id, leave_type, year, total_credited, used, balance,
               last_updated, last_updated_by
        FROM leave_balances
        WHERE user_id = ? AND leave_type = ? AND year = ?
        "#,
    )
    .bind(user_id)
    .bind(leave_type)
    .bind(year)
    .fetch_optional(pool)
    .await
}

async fn insert_zeroed(
    pool: &MySqlPool,
    user_id: u64,
    leave_type: &str,
    year: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_balances (user_id, leave_type, year, total_credited, used, balance)
        VALUES (?, ?, ?, 0, 0, 0)
        "#,
    )
    .bind(user_id)
    .bind(leave_type)
    .bind(year)
    .execute(pool)
    .await?;
    Ok(result.last_insert_id())
}

async fn write_figures(
    pool: &MySqlPool,
    balance_id: u64,
    figures: BalanceFigures,
    actor_id: u64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE leave_balances
        SET total_credited = ?, used = ?, balance = ?, last_updated = ?, last_updated_by = ?
        WHERE id = ?
        "#,
    )
    .bind(figures.total_credited)
    .bind(figures.used)
    .bind(figures.balance)
    .bind(workdays::now_local())
    .bind(actor_id)
    .bind(balance_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Consume `days` of the credited pool on leave approval. A missing row is
/// created zeroed first, which can legitimately drive the balance negative.
pub(crate) async fn settle_approval(
    pool: &MySqlPool,
    leave: &LeaveRequest,
    days: f64,
    actor: &AuthUser,
) -> Result<(), ApiError> {
    let year = leave.from_date.year();
    let row = fetch_balance(pool, leave.user_id, &leave.leave_type, year).await?;

    let mut figures = row.as_ref().map(BalanceFigures::from).unwrap_or_default();
    let balance_id = match row {
        Some(r) => r.id,
        None => insert_zeroed(pool, leave.user_id, &leave.leave_type, year).await?,
    };

    let old = figures;
    figures.settle(days);
    write_figures(pool, balance_id, figures, actor.user_id).await?;

    audit::record(
        pool,
        audit::AuditEvent {
            action: "leave_balance_update",
            actor_id: actor.user_id,
            target_user_id: Some(leave.user_id),
            entity_type: "LeaveBalance",
            entity_id: Some(balance_id),
            old_value: Some(json!({ "used": old.used, "balance": old.balance })),
            new_value: Some(json!({ "used": figures.used, "balance": figures.balance })),
            remarks: Some(format!(
                "Leave approved: {} for {} days",
                leave.leave_type, days
            )),
        },
    );

    Ok(())
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    #[param(example = 2024)]
    pub year: Option<i32>,
}

/* =========================
Own balance overview
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Balance figures per leave type, zeroed defaults included"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let year = query.year.unwrap_or_else(|| workdays::today_key().year());

    let rows = sqlx::query_as::<_, LeaveBalance>(
        r#"
        SELECT id, user_id, leave_type, year, total_credited, used, balance,
               last_updated, last_updated_by
        FROM leave_balances
        WHERE user_id = ? AND year = ?
        "#,
    )
    .bind(auth.user_id)
    .bind(year)
    .fetch_all(pool.get_ref())
    .await?;

    // Reads never create rows; absent types show up zeroed.
    let mut balances: BTreeMap<String, BalanceFigures> = BTreeMap::new();
    for leave_type in DEFAULT_LEAVE_TYPES {
        let figures = rows
            .iter()
            .find(|r| r.leave_type == leave_type)
            .map(BalanceFigures::from)
            .unwrap_or_default();
        balances.insert(leave_type.to_string(), figures);
    }
    for row in &rows {
        balances
            .entry(row.leave_type.clone())
            .or_insert_with(|| BalanceFigures::from(row));
    }

    Ok(HttpResponse::Ok().json(json!({ "balances": balances, "year": year })))
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustBalance {
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "CL")]
    pub leave_type: String,
    #[schema(example = 2024)]
    pub year: i32,
    /// Positive credits days, negative takes them back
    #[schema(example = 12.0)]
    pub adjustment: f64,
    #[schema(example = "Annual credit")]
    pub reason: String,
}

/* =========================
Credit adjustment (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave/balance/adjust",
    request_body = AdjustBalance,
    responses(
        (status = 200, description = "Balance adjusted", body = Object, example = json!({
            "success": true,
            "balance": { "total_credited": 12.0, "used": 0.0, "balance": 12.0 }
        })),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn adjust(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AdjustBalance>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    if payload.leave_type.trim().is_empty() || payload.reason.trim().is_empty() {
        return Err(ApiError::validation("Missing required fields"));
    }

    let row = fetch_balance(
        pool.get_ref(),
        payload.user_id,
        payload.leave_type.trim(),
        payload.year,
    )
    .await?;

    let mut figures = row.as_ref().map(BalanceFigures::from).unwrap_or_default();
    let balance_id = match row {
        Some(r) => r.id,
        None => {
            insert_zeroed(
                pool.get_ref(),
                payload.user_id,
                payload.leave_type.trim(),
                payload.year,
            )
            .await?
        }
    };

    let old = figures;
    figures.credit(payload.adjustment);
    write_figures(pool.get_ref(), balance_id, figures, auth.user_id).await?;

    audit::record(
        pool.get_ref(),
        audit::AuditEvent {
            action: "leave_balance_adjust",
            actor_id: auth.user_id,
            target_user_id: Some(payload.user_id),
            entity_type: "LeaveBalance",
            entity_id: Some(balance_id),
            old_value: Some(json!(old)),
            new_value: Some(json!(figures)),
            remarks: Some(payload.reason.trim().to_string()),
        },
    );

    Ok(HttpResponse::Ok().json(json!({ "success": true, "balance": figures })))
}
