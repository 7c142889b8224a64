use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies pending migrations and returns how many ran.
pub async fn run_pending(pool: &DbPool) -> Result<u64, MigrateError> {
    let before = applied_count(pool).await;
    MIGRATOR.run(pool).await?;
    Ok(applied_count(pool).await.saturating_sub(before))
}

async fn applied_count(pool: &DbPool) -> u64 {
    let count: Result<i64, sqlx::Error> =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations").fetch_one(pool).await;
    match count {
        Ok(count) => u64::try_from(count).unwrap_or(0),
        // The bookkeeping table does not exist before the first run.
        Err(_) => 0,
    }
}
