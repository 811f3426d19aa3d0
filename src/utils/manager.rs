use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// Resolved reporting manager of an employee.
#[derive(Debug, Clone)]
pub struct Approver {
    pub user_id: u64,
    pub name: String,
}

/// Display-path cache: requester -> their manager (or none). Entries are
/// short-lived and invalidated on reassignment; authorization decisions never
/// read it.
static MANAGER_CACHE: Lazy<Cache<u64, Option<Approver>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(300))
        .build()
});

const MANAGER_SQL: &str = r#"
    SELECT u.id, u.name
    FROM employees e
    JOIN users u ON u.id = e.manager_id
    WHERE e.user_id = ?
"#;

/// Who adjudicates for `user_id` right now. Always hits the database; use for
/// authorization checks at review time.
pub async fn manager_of(pool: &MySqlPool, user_id: u64) -> Result<Option<Approver>, sqlx::Error> {
    let row = sqlx::query_as::<_, (u64, String)>(MANAGER_SQL)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(id, name)| Approver { user_id: id, name }))
}

/// Cached variant for display-time resolution (stamping approver on a new
/// request, showing "will be reviewed by ...").
pub async fn resolve_manager(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Option<Approver>, sqlx::Error> {
    if let Some(hit) = MANAGER_CACHE.get(&user_id).await {
        return Ok(hit);
    }
    let resolved = manager_of(pool, user_id).await?;
    MANAGER_CACHE.insert(user_id, resolved.clone()).await;
    Ok(resolved)
}

/// Drop the cached entry after a manager reassignment.
pub async fn invalidate(user_id: u64) {
    MANAGER_CACHE.invalidate(&user_id).await;
}
