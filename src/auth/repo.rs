use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{AuthProvider, NewPending, PendingUser, User};

/// True when `err` wraps a Postgres unique-constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map_or(false, |db| db.is_unique_violation())
}

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password_hash, auth_provider, profile_pic, created_at";
const PENDING_COLUMNS: &str = "id, purpose, first_name, last_name, email, password_hash, token, \
                               user_id, created_at, expires_at";

impl User {
    /// Find a user by (normalized) email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Create a local account from a confirmed registration.
    pub async fn create_local_tx(
        tx: &mut Transaction<'_, Postgres>,
        pending: &PendingUser,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, first_name, last_name, password_hash, auth_provider)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&pending.email)
        .bind(&pending.first_name)
        .bind(&pending.last_name)
        .bind(&pending.password_hash)
        .bind(AuthProvider::Local.as_str())
        .fetch_one(&mut **tx)
        .await
        .context("insert local user")?;
        Ok(user)
    }

    /// Create an account for a first-time OAuth sign-in.
    pub async fn create_oauth(
        db: &PgPool,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        profile_pic: Option<&str>,
        provider: AuthProvider,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, first_name, last_name, auth_provider, profile_pic)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(provider.as_str())
        .bind(profile_pic)
        .fetch_one(db)
        .await
        .context("insert oauth user")?;
        Ok(user)
    }

    pub async fn update_names(
        db: &PgPool,
        id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET first_name = $2, last_name = $3
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(db)
        .await
        .context("update user names")?;
        Ok(user)
    }

    /// Apply a confirmed email change (names travel with it).
    pub async fn apply_email_change_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        pending: &PendingUser,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET email = $2, first_name = $3, last_name = $4
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&pending.email)
        .bind(&pending.first_name)
        .bind(&pending.last_name)
        .fetch_one(&mut **tx)
        .await
        .context("apply email change")?;
        Ok(user)
    }

    pub async fn set_password_hash(db: &PgPool, id: Uuid, hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(db)
            .await
            .context("update password hash")?;
        Ok(())
    }

    pub async fn set_password_hash_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        hash: &str,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&mut **tx)
            .await
            .context("update password hash")?;
        Ok(())
    }
}

impl PendingUser {
    /// Whether a live pending request holds `email`. An expired row for the
    /// address is dropped first so it cannot block a new request.
    pub async fn exists_for_email(db: &PgPool, email: &str) -> anyhow::Result<bool> {
        sqlx::query("DELETE FROM pending_users WHERE email = $1 AND expires_at < $2")
            .bind(email)
            .bind(OffsetDateTime::now_utc())
            .execute(db)
            .await
            .context("drop expired pending email")?;
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM pending_users WHERE email = $1")
            .bind(email)
            .fetch_optional(db)
            .await
            .context("check pending email")?;
        Ok(found.is_some())
    }

    /// Insert a pending row with a fresh token; returns the stored row.
    pub async fn create(db: &PgPool, new: NewPending<'_>) -> anyhow::Result<PendingUser> {
        let now = OffsetDateTime::now_utc();
        let token = Uuid::new_v4().to_string();
        let row = sqlx::query_as::<_, PendingUser>(&format!(
            r#"
            INSERT INTO pending_users
                (purpose, first_name, last_name, email, password_hash, token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PENDING_COLUMNS}
            "#
        ))
        .bind(new.purpose.as_str())
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(token)
        .bind(new.user_id)
        .bind(now)
        .bind(now + new.purpose.lifetime())
        .fetch_one(db)
        .await
        .context("insert pending user")?;
        Ok(row)
    }

    /// Lock the row for `token` inside a transaction.
    pub async fn find_by_token_tx(
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
    ) -> anyhow::Result<Option<PendingUser>> {
        let row = sqlx::query_as::<_, PendingUser>(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_users WHERE token = $1 FOR UPDATE"
        ))
        .bind(token)
        .fetch_optional(&mut **tx)
        .await
        .context("find pending by token")?;
        Ok(row)
    }

    pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM pending_users WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .context("delete pending user")?;
        Ok(())
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM pending_users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete pending user")?;
        Ok(())
    }

    /// Remove every row whose link expired before `now`; returns how many went.
    pub async fn delete_expired(db: &PgPool, now: OffsetDateTime) -> anyhow::Result<u64> {
        let done = sqlx::query("DELETE FROM pending_users WHERE expires_at < $1")
            .bind(now)
            .execute(db)
            .await
            .context("delete expired pending users")?;
        Ok(done.rows_affected())
    }
}
