//! Hourly purge of pending registrations, email changes and resets whose link expired.

use std::time::Duration;

use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::auth::repo_types::PendingUser;

pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub async fn purge_expired(db: &PgPool) -> anyhow::Result<u64> {
    let now = OffsetDateTime::now_utc();
    let removed = PendingUser::delete_expired(db, now).await?;
    info!(removed, at = %now, "expired pending users deleted");
    Ok(removed)
}

pub fn spawn(db: PgPool, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = purge_expired(&db).await {
                error!(error = ?e, "pending user cleanup failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::{NewPending, PendingPurpose};

    async fn pending(db: &PgPool, email: &str) -> PendingUser {
        PendingUser::create(
            db,
            NewPending {
                purpose: PendingPurpose::Registration,
                first_name: None,
                last_name: None,
                email,
                password_hash: "hash",
                user_id: None,
            },
        )
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn purge_removes_only_expired_rows(db: PgPool) {
        let stale = pending(&db, "stale@example.com").await;
        pending(&db, "fresh@example.com").await;
        sqlx::query("UPDATE pending_users SET expires_at = now() - interval '1 minute' WHERE id = $1")
            .bind(stale.id)
            .execute(&db)
            .await
            .unwrap();

        assert_eq!(purge_expired(&db).await.unwrap(), 1);
        assert_eq!(purge_expired(&db).await.unwrap(), 0);

        let left: Vec<String> = sqlx::query_scalar("SELECT email FROM pending_users")
            .fetch_all(&db)
            .await
            .unwrap();
        assert_eq!(left, ["fresh@example.com"]);
    }
}
