use sqlx::MySqlPool;
use sqlx::types::Json;

/// One before/after record for a mutating action.
#[derive(Debug)]
pub struct AuditEvent {
    pub action: &'static str,
    pub actor_id: u64,
    pub target_user_id: Option<u64>,
    pub entity_type: &'static str,
    pub entity_id: Option<u64>,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub remarks: Option<String>,
}

/// Fire-and-forget append. The write happens on a spawned task; a failure is
/// logged and never propagates into the operation being audited.
pub fn record(pool: &MySqlPool, event: AuditEvent) {
    let pool = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = insert(&pool, &event).await {
            tracing::warn!(error = %e, action = event.action, "audit write failed");
        }
    });
}

async fn insert(pool: &MySqlPool, event: &AuditEvent) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs
            (action, user_id, target_user_id, entity_type, entity_id, old_value, new_value, remarks)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.action)
    .bind(event.actor_id)
    .bind(event.target_user_id)
    .bind(event.entity_type)
    .bind(event.entity_id)
    .bind(event.old_value.as_ref().map(Json))
    .bind(event.new_value.as_ref().map(Json))
    .bind(event.remarks.as_deref())
    .execute(pool)
    .await?;
    Ok(())
}
