use crate::api::attendance::{fetch_record, upsert_record};
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::AttendanceStatus;
use crate::model::review::{RequestStatus, ReviewAction};
use crate::model::regularisation::{
    AttendanceSnapshot, Regularisation, RegularisationType, synthetic_shift,
};
use crate::utils::{audit, manager, workdays};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ApplyRegularisation {
    #[schema(example = "2024-01-08", format = "date", value_type = String)]
    pub date: chrono::NaiveDate,
    #[serde(rename = "type")]
    #[schema(example = "Work From Home")]
    pub reg_type: RegularisationType,
    #[schema(example = "Internet outage at the office")]
    pub reason: String,
    pub attachment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewBody {
    pub remarks: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RegularisationFilter {
    #[param(example = "Pending")]
    pub status: Option<String>,
}

const REG_COLUMNS: &str = r#"
    SELECT id, user_id, date, reg_type, reason, attachment, status, approver_id,
           approver_remarks, applied_at, reviewed_at, original_attendance, new_attendance
    FROM regularisations
"#;

async fn fetch_regularisation(
    pool: &MySqlPool,
    reg_id: u64,
) -> Result<Option<Regularisation>, sqlx::Error> {
    sqlx::query_as::<_, Regularisation>(&format!("{REG_COLUMNS} WHERE id = ?"))
        .bind(reg_id)
        .fetch_optional(pool)
        .await
}

/* =========================
Submit a correction request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/attendance/regularisation",
    request_body = ApplyRegularisation,
    responses(
        (status = 200, description = "Regularisation submitted with the pre-correction snapshot"),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn apply(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ApplyRegularisation>,
) -> Result<HttpResponse, ApiError> {
    if payload.reason.trim().is_empty() {
        return Err(ApiError::validation("Missing required fields"));
    }

    // The pre-correction state is frozen here; approval later compares
    // against this snapshot, not against whatever the ledger holds then.
    let original = fetch_record(pool.get_ref(), auth.user_id, payload.date)
        .await?
        .map(|r| AttendanceSnapshot::of(&r));

    let approver = manager::resolve_manager(pool.get_ref(), auth.user_id).await?;
    let (approver_id, manager_name) = match &approver {
        Some(m) => (Some(m.user_id), m.name.clone()),
        None => (None, "Manager".to_string()),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO regularisations
            (user_id, date, reg_type, reason, attachment, status, approver_id,
             applied_at, original_attendance)
        VALUES (?, ?, ?, ?, ?, 'Pending', ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.date)
    .bind(payload.reg_type.to_string())
    .bind(payload.reason.trim())
    .bind(payload.attachment.as_deref())
    .bind(approver_id)
    .bind(workdays::now_local())
    .bind(original.as_ref().map(Json))
    .execute(pool.get_ref())
    .await?;

    let regularisation = fetch_regularisation(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::Database)?;

    Ok(HttpResponse::Ok().json(json!({
        "regularisation": regularisation,
        "manager_name": manager_name,
    })))
}

/* =========================
Own regularisation requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/attendance/regularisation",
    params(RegularisationFilter),
    responses(
        (status = 200, description = "Own requests, newest first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_own(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RegularisationFilter>,
) -> Result<HttpResponse, ApiError> {
    let regularisations = match query.status.as_deref() {
        Some(status) => {
            sqlx::query_as::<_, Regularisation>(&format!(
                "{REG_COLUMNS} WHERE user_id = ? AND status = ? ORDER BY applied_at DESC"
            ))
            .bind(auth.user_id)
            .bind(status)
            .fetch_all(pool.get_ref())
            .await?
        }
        None => {
            sqlx::query_as::<_, Regularisation>(&format!(
                "{REG_COLUMNS} WHERE user_id = ? ORDER BY applied_at DESC"
            ))
            .bind(auth.user_id)
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(json!({ "regularisations": regularisations })))
}

async fn adjudicate(
    pool: &MySqlPool,
    actor: &AuthUser,
    reg_id: u64,
    action: ReviewAction,
    remarks: Option<String>,
) -> Result<HttpResponse, ApiError> {
    let reg = fetch_regularisation(pool, reg_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Regularisation request not found"))?;

    let status: RequestStatus = reg.status.parse().map_err(|_| ApiError::Database)?;
    if status.is_terminal() {
        return Err(ApiError::validation("Regularisation request already processed"));
    }

    match manager::manager_of(pool, reg.user_id).await? {
        Some(m) if m.user_id == actor.user_id => {}
        _ => return Err(ApiError::forbidden("Unauthorized: Not your team member")),
    }

    let new_status = action.resulting_status();
    let reviewed_at = workdays::now_local();

    let mut new_snapshot: Option<AttendanceSnapshot> = None;

    if action == ReviewAction::Approve {
        let reg_type: RegularisationType = reg.reg_type.parse().map_err(|_| ApiError::Database)?;

        // Fetch-or-create mirrors the punch endpoint; a day with no record
        // starts out empty with the creation-default status.
        let current = fetch_record(pool, reg.user_id, reg.date).await?;
        let (cur_punches, cur_hours, cur_status) = match current {
            Some(r) => (r.punches.0, r.total_hours, r.status),
            None => (
                Vec::new(),
                None,
                AttendanceStatus::Present.to_string(),
            ),
        };

        let (punches, total_hours, att_status) = match reg_type.approved_status() {
            Some(status) => {
                let (punches, hours) = synthetic_shift(reg.date);
                (punches, Some(hours), status.to_string())
            }
            // "Other" corrections change nothing; the record is only re-saved.
            None => (cur_punches, cur_hours, cur_status),
        };

        upsert_record(
            pool,
            reg.user_id,
            reg.date,
            &punches,
            total_hours,
            &att_status,
        )
        .await?;

        let snapshot = AttendanceSnapshot {
            punches,
            total_hours,
            status: Some(att_status),
        };

        audit::record(
            pool,
            audit::AuditEvent {
                action: "attendance_regularisation",
                actor_id: actor.user_id,
                target_user_id: Some(reg.user_id),
                entity_type: "Attendance",
                entity_id: None,
                old_value: reg.original_attendance.as_ref().map(|j| json!(j.0)),
                new_value: Some(json!(snapshot)),
                remarks: Some(
                    remarks
                        .clone()
                        .unwrap_or_else(|| format!("Regularisation approved: {}", reg.reg_type)),
                ),
            },
        );

        new_snapshot = Some(snapshot);
    }

    let updated = sqlx::query(
        r#"
        UPDATE regularisations
        SET status = ?, approver_remarks = ?, reviewed_at = ?, new_attendance = ?
        WHERE id = ? AND status = 'Pending'
        "#,
    )
    .bind(new_status.to_string())
    .bind(remarks.clone().unwrap_or_default())
    .bind(reviewed_at)
    .bind(new_snapshot.as_ref().map(Json))
    .bind(reg_id)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::validation("Regularisation request already processed"));
    }

    audit::record(
        pool,
        audit::AuditEvent {
            action: match action {
                ReviewAction::Approve => "regularisation_approve",
                ReviewAction::Reject => "regularisation_reject",
            },
            actor_id: actor.user_id,
            target_user_id: Some(reg.user_id),
            entity_type: "Regularisation",
            entity_id: Some(reg_id),
            old_value: Some(json!({ "status": RequestStatus::Pending.to_string() })),
            new_value: Some(json!({ "status": new_status.to_string() })),
            remarks: remarks.clone(),
        },
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!(
            "Regularisation request {} successfully",
            match action {
                ReviewAction::Approve => "approved",
                ReviewAction::Reject => "rejected",
            }
        ),
    })))
}

/* =========================
Approve regularisation (reporting manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/attendance/regularisation/{reg_id}/approve",
    params(("reg_id" = u64, Path, description = "ID of the regularisation to approve")),
    request_body(content = ReviewBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Approved; attendance rewritten for the day"),
        (status = 400, description = "Already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Actor is not the owner's reporting manager"),
        (status = 404, description = "Regularisation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
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
Reject regularisation (reporting manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/attendance/regularisation/{reg_id}/reject",
    params(("reg_id" = u64, Path, description = "ID of the regularisation to reject")),
    request_body(content = ReviewBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Rejected; attendance untouched"),
        (status = 400, description = "Already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Actor is not the owner's reporting manager"),
        (status = 404, description = "Regularisation not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
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
