//! Account rules behind the `/api/auth` endpoints.

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{
            non_blank, AuthResponse, CompleteRegistrationRequest, LoginRequest, RegisterRequest,
            UpdateProfileRequest, UpdateProfileResponse,
        },
        error::AuthError,
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::is_unique_violation,
        repo_types::{AuthProvider, NewPending, PendingPurpose, PendingUser, User},
    },
    mail::{password_reset_email, verification_email, OutgoingMail},
    state::AppState,
    validate::{is_strong_password, is_valid_email, normalize_email},
};

pub const PROFILE_UPDATED: &str = "Profile updated successfully!";
pub const EMAIL_CHANGE_SENT: &str = "We've sent a verification link to your new email address. \
     Please verify within 24 hours to complete the update.";

fn issue(state: &AppState, user: &User) -> Result<AuthResponse, AuthError> {
    let provider = user.provider()?;
    let token = JwtKeys::from_ref(state).sign(user.id, &user.email, provider)?;
    Ok(AuthResponse::new(user, provider, token))
}

/// Maps a unique-constraint race to `conflict`; anything else stays internal.
fn on_conflict(conflict: AuthError) -> impl FnOnce(anyhow::Error) -> AuthError {
    move |err| {
        if is_unique_violation(&err) {
            conflict
        } else {
            AuthError::Internal(err)
        }
    }
}

/// Sends `mail`; on failure the pending row is dropped so the user can retry.
async fn deliver(state: &AppState, pending: &PendingUser, mail: OutgoingMail) -> Result<(), AuthError> {
    if let Err(e) = state.mailer.send(mail).await {
        if let Err(cleanup) = PendingUser::delete(&state.db, pending.id).await {
            warn!(error = %cleanup, "could not drop pending row after mail failure");
        }
        return Err(AuthError::Mail(e));
    }
    Ok(())
}

pub async fn initiate_registration(state: &AppState, req: RegisterRequest) -> Result<(), AuthError> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidEmail);
    }
    if !is_strong_password(&req.password) {
        return Err(AuthError::WeakPassword);
    }
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AuthError::EmailTaken);
    }
    if PendingUser::exists_for_email(&state.db, &email).await? {
        return Err(AuthError::AlreadyPending(
            "A registration request is already pending for this email",
        ));
    }

    let hash = hash_password(&req.password)?;
    let pending = PendingUser::create(
        &state.db,
        NewPending {
            purpose: PendingPurpose::Registration,
            first_name: non_blank(req.first_name.as_deref()),
            last_name: non_blank(req.last_name.as_deref()),
            email: &email,
            password_hash: &hash,
            user_id: None,
        },
    )
    .await
    .map_err(on_conflict(AuthError::AlreadyPending(
        "A registration request is already pending for this email",
    )))?;

    let mail = verification_email(&state.config.frontend_url, &email, &pending.token);
    deliver(state, &pending, mail).await?;
    info!(email = %email, "registration pending verification");
    Ok(())
}

/// Confirms a registration or an email change.
pub async fn verify_email(state: &AppState, token: &str) -> Result<(), AuthError> {
    const INVALID: &str = "Invalid or Expired token. Try registering again.";

    let mut tx = state.db.begin().await.map_err(anyhow::Error::from)?;
    let pending = PendingUser::find_by_token_tx(&mut tx, token)
        .await?
        .ok_or(AuthError::InvalidToken(INVALID))?;

    let purpose = pending.purpose()?;
    if pending.is_expired_at(OffsetDateTime::now_utc()) {
        PendingUser::delete_tx(&mut tx, pending.id).await?;
        tx.commit().await.map_err(anyhow::Error::from)?;
        return Err(AuthError::InvalidToken(INVALID));
    }

    let user = match (purpose, pending.user_id) {
        (PendingPurpose::Registration, _) => User::create_local_tx(&mut tx, &pending)
            .await
            .map_err(on_conflict(AuthError::EmailTaken))?,
        (PendingPurpose::EmailChange, Some(user_id)) => {
            User::apply_email_change_tx(&mut tx, user_id, &pending)
                .await
                .map_err(on_conflict(AuthError::EmailTaken))?
        }
        _ => return Err(AuthError::InvalidToken(INVALID)),
    };
    PendingUser::delete_tx(&mut tx, pending.id).await?;
    tx.commit().await.map_err(anyhow::Error::from)?;

    info!(user_id = %user.id, email = %user.email, purpose = purpose.as_str(), "email verified");
    Ok(())
}

pub async fn login(state: &AppState, req: LoginRequest) -> Result<AuthResponse, AuthError> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidEmail);
    }

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let provider = user.provider()?;
    if provider != AuthProvider::Local {
        return Err(AuthError::WrongProvider(provider.to_string()));
    }
    let hash = user.password_hash.as_deref().ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(&req.password, hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    issue(state, &user)
}

/// Exchanges a Google id token for a session, creating the account on first use.
pub async fn login_with_google(state: &AppState, id_token: &str) -> Result<AuthResponse, AuthError> {
    let profile = state.google.verify(id_token).await.map_err(|e| {
        warn!(error = %e, "google id token rejected");
        AuthError::InvalidGoogleToken
    })?;
    let email = normalize_email(&profile.email);

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            let u = User::create_oauth(
                &state.db,
                &email,
                profile.given_name.as_deref(),
                profile.family_name.as_deref(),
                profile.picture.as_deref(),
                AuthProvider::Google,
            )
            .await?;
            info!(user_id = %u.id, email = %u.email, "google user registered");
            u
        }
    };

    info!(user_id = %user.id, "google login");
    issue(state, &user)
}

pub async fn complete_registration(
    state: &AppState,
    auth: &AuthUser,
    req: CompleteRegistrationRequest,
) -> Result<AuthResponse, AuthError> {
    let (Some(first), Some(last)) = (
        non_blank(Some(req.first_name.as_str())),
        non_blank(Some(req.last_name.as_str())),
    ) else {
        return Err(AuthError::BadRequest("First and last name are required"));
    };

    if User::find_by_id(&state.db, auth.id).await?.is_none() {
        return Err(AuthError::UserNotFound);
    }
    let user = User::update_names(&state.db, auth.id, Some(first), Some(last)).await?;
    info!(user_id = %user.id, "registration completed");
    issue(state, &user)
}

pub async fn update_profile(
    state: &AppState,
    auth: &AuthUser,
    req: UpdateProfileRequest,
) -> Result<UpdateProfileResponse, AuthError> {
    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let first = non_blank(req.first_name.as_deref()).or(user.first_name.as_deref());
    let last = non_blank(req.last_name.as_deref()).or(user.last_name.as_deref());

    match non_blank(req.new_email.as_deref()) {
        None => {
            let updated = User::update_names(&state.db, user.id, first, last).await?;
            info!(user_id = %updated.id, "profile updated");
            Ok(UpdateProfileResponse {
                message: PROFILE_UPDATED.into(),
                user: Some(issue(state, &updated)?),
            })
        }
        Some(new_email) => {
            request_email_change(state, &user, new_email, first, last).await?;
            Ok(UpdateProfileResponse {
                message: EMAIL_CHANGE_SENT.into(),
                user: None,
            })
        }
    }
}

async fn request_email_change(
    state: &AppState,
    user: &User,
    new_email: &str,
    first: Option<&str>,
    last: Option<&str>,
) -> Result<(), AuthError> {
    let new_email = normalize_email(new_email);
    if !is_valid_email(&new_email) {
        return Err(AuthError::InvalidEmail);
    }
    let hash = match (user.provider()?, user.password_hash.as_deref()) {
        (AuthProvider::Local, Some(hash)) => hash,
        (provider, _) => return Err(AuthError::WrongProvider(provider.to_string())),
    };
    if new_email == user.email {
        return Err(AuthError::BadRequest("New email is the same as the current email"));
    }
    if User::find_by_email(&state.db, &new_email).await?.is_some() {
        return Err(AuthError::EmailTaken);
    }
    if PendingUser::exists_for_email(&state.db, &new_email).await? {
        return Err(AuthError::AlreadyPending(
            "Email already pending for verification. Please check your inbox.",
        ));
    }

    let pending = PendingUser::create(
        &state.db,
        NewPending {
            purpose: PendingPurpose::EmailChange,
            first_name: first,
            last_name: last,
            email: &new_email,
            password_hash: hash,
            user_id: Some(user.id),
        },
    )
    .await
    .map_err(on_conflict(AuthError::AlreadyPending(
        "Email already pending for verification. Please check your inbox.",
    )))?;

    let mail = verification_email(&state.config.frontend_url, &new_email, &pending.token);
    deliver(state, &pending, mail).await?;
    info!(user_id = %user.id, new_email = %new_email, "email change pending verification");
    Ok(())
}

pub async fn forgot_password(state: &AppState, email: &str) -> Result<(), AuthError> {
    let email = normalize_email(email);
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or(AuthError::BadRequest("Email not registered"))?;

    let hash = match (user.provider()?, user.password_hash.as_deref()) {
        (AuthProvider::Local, Some(hash)) => hash,
        _ => return Err(AuthError::BadRequest("Cannot reset password for OAuth accounts")),
    };
    if PendingUser::exists_for_email(&state.db, &email).await? {
        return Err(AuthError::AlreadyPending(
            "A password reset request is already pending. Please check your email.",
        ));
    }

    let pending = PendingUser::create(
        &state.db,
        NewPending {
            purpose: PendingPurpose::PasswordReset,
            first_name: user.first_name.as_deref(),
            last_name: user.last_name.as_deref(),
            email: &email,
            password_hash: hash,
            user_id: Some(user.id),
        },
    )
    .await
    .map_err(on_conflict(AuthError::AlreadyPending(
        "A password reset request is already pending. Please check your email.",
    )))?;

    let mail = password_reset_email(&state.config.frontend_url, &email, &pending.token);
    deliver(state, &pending, mail).await?;
    info!(user_id = %user.id, "password reset requested");
    Ok(())
}

pub async fn reset_password(state: &AppState, token: &str, new_password: &str) -> Result<(), AuthError> {
    const INVALID: &str = "Invalid or Expired token. Try resetting your password again.";

    if !is_strong_password(new_password) {
        return Err(AuthError::WeakPassword);
    }

    let mut tx = state.db.begin().await.map_err(anyhow::Error::from)?;
    let pending = PendingUser::find_by_token_tx(&mut tx, token)
        .await?
        .ok_or(AuthError::InvalidToken(INVALID))?;
    if pending.purpose()? != PendingPurpose::PasswordReset {
        return Err(AuthError::InvalidToken(INVALID));
    }
    if pending.is_expired_at(OffsetDateTime::now_utc()) {
        PendingUser::delete_tx(&mut tx, pending.id).await?;
        tx.commit().await.map_err(anyhow::Error::from)?;
        return Err(AuthError::InvalidToken(INVALID));
    }
    if verify_password(new_password, &pending.password_hash)? {
        return Err(AuthError::SamePassword);
    }
    let user_id = pending.user_id.ok_or(AuthError::UserNotFound)?;

    let hash = hash_password(new_password)?;
    User::set_password_hash_tx(&mut tx, user_id, &hash).await?;
    PendingUser::delete_tx(&mut tx, pending.id).await?;
    tx.commit().await.map_err(anyhow::Error::from)?;

    info!(user_id = %user_id, "password reset");
    Ok(())
}

pub async fn change_password(
    state: &AppState,
    auth: &AuthUser,
    old_password: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    let provider = user.provider()?;
    let hash = match (provider, user.password_hash.as_deref()) {
        (AuthProvider::Local, Some(hash)) => hash,
        _ => return Err(AuthError::WrongProvider(provider.to_string())),
    };

    if !verify_password(old_password, hash)? {
        return Err(AuthError::WrongOldPassword);
    }
    if verify_password(new_password, hash)? {
        return Err(AuthError::SamePassword);
    }
    if !is_strong_password(new_password) {
        return Err(AuthError::WeakPassword);
    }

    let new_hash = hash_password(new_password)?;
    User::set_password_hash(&state.db, user.id, &new_hash).await?;
    info!(user_id = %user.id, "password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;
    use uuid::Uuid;

    // These paths reject before touching the database, so the lazy pool in
    // `AppState::fake` is never connected.

    #[tokio::test]
    async fn registration_rejects_invalid_email() {
        let state = AppState::fake();
        let err = initiate_registration(
            &state,
            RegisterRequest {
                first_name: None,
                last_name: None,
                email: "a@b".into(),
                password: "Aa1!aaaa".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail));
    }

    #[tokio::test]
    async fn registration_rejects_weak_password() {
        let state = AppState::fake();
        let err = initiate_registration(
            &state,
            RegisterRequest {
                first_name: Some("A".into()),
                last_name: Some("B".into()),
                email: "a@b.co".into(),
                password: "aaaaaaaa".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));
    }

    #[tokio::test]
    async fn login_rejects_invalid_email() {
        let state = AppState::fake();
        let err = login(
            &state,
            LoginRequest {
                email: "nope".into(),
                password: "x".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail));
    }

    #[tokio::test]
    async fn reset_rejects_weak_password_first() {
        let state = AppState::fake();
        let err = reset_password(&state, "any-token", "short").await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));
    }

    #[tokio::test]
    async fn complete_registration_requires_both_names() {
        let state = AppState::fake();
        let auth = AuthUser {
            id: uuid::Uuid::new_v4(),
            email: "a@b.co".into(),
            provider: AuthProvider::Google,
        };
        let err = complete_registration(
            &state,
            &auth,
            CompleteRegistrationRequest {
                first_name: "Ada".into(),
                last_name: "  ".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::BadRequest(_)));
    }

    // Database-backed paths; each test gets a fresh migrated database.

    const PASSWORD: &str = "Aa1!aaaa";

    async fn pending(db: &PgPool, purpose: PendingPurpose, email: &str, user_id: Option<Uuid>) -> PendingUser {
        let hash = hash_password(PASSWORD).unwrap();
        PendingUser::create(
            db,
            NewPending {
                purpose,
                first_name: Some("Ada"),
                last_name: Some("Lovelace"),
                email,
                password_hash: &hash,
                user_id,
            },
        )
        .await
        .unwrap()
    }

    async fn expire(db: &PgPool, id: Uuid) {
        sqlx::query("UPDATE pending_users SET expires_at = now() - interval '1 minute' WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .unwrap();
    }

    async fn pending_rows(db: &PgPool, email: &str) -> i64 {
        sqlx::query_scalar("SELECT count(*) FROM pending_users WHERE email = $1")
            .bind(email)
            .fetch_one(db)
            .await
            .unwrap()
    }

    async fn local_user(state: &AppState, email: &str) -> User {
        let p = pending(&state.db, PendingPurpose::Registration, email, None).await;
        verify_email(state, &p.token).await.unwrap();
        User::find_by_email(&state.db, email).await.unwrap().unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn verify_creates_user_and_consumes_token(db: PgPool) {
        let state = AppState::fake_with_db(db.clone());
        let p = pending(&db, PendingPurpose::Registration, "ada@example.com", None).await;

        verify_email(&state, &p.token).await.unwrap();

        let user = User::find_by_email(&db, "ada@example.com").await.unwrap().unwrap();
        assert_eq!(user.provider().unwrap(), AuthProvider::Local);
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(pending_rows(&db, "ada@example.com").await, 0);

        let err = verify_email(&state, &p.token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn verify_rejects_and_deletes_expired_token(db: PgPool) {
        let state = AppState::fake_with_db(db.clone());
        let p = pending(&db, PendingPurpose::Registration, "late@example.com", None).await;
        expire(&db, p.id).await;

        let err = verify_email(&state, &p.token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
        assert_eq!(pending_rows(&db, "late@example.com").await, 0);
        assert!(User::find_by_email(&db, "late@example.com").await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn tokens_only_work_for_their_purpose(db: PgPool) {
        let state = AppState::fake_with_db(db.clone());
        let user = local_user(&state, "ada@example.com").await;

        let reset = pending(&db, PendingPurpose::PasswordReset, "ada@example.com", Some(user.id)).await;
        let err = verify_email(&state, &reset.token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));

        let signup = pending(&db, PendingPurpose::Registration, "bob@example.com", None).await;
        let err = reset_password(&state, &signup.token, "Bb2@bbbb").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));

        assert_eq!(pending_rows(&db, "ada@example.com").await, 1);
        assert_eq!(pending_rows(&db, "bob@example.com").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn email_change_is_applied_on_verify(db: PgPool) {
        let state = AppState::fake_with_db(db.clone());
        let user = local_user(&state, "old@example.com").await;
        let change = pending(&db, PendingPurpose::EmailChange, "new@example.com", Some(user.id)).await;

        verify_email(&state, &change.token).await.unwrap();

        let updated = User::find_by_id(&db, user.id).await.unwrap().unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert!(User::find_by_email(&db, "old@example.com").await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reset_password_replaces_hash(db: PgPool) {
        let state = AppState::fake_with_db(db.clone());
        let user = local_user(&state, "ada@example.com").await;

        forgot_password(&state, "ada@example.com").await.unwrap();
        let token: String = sqlx::query_scalar("SELECT token FROM pending_users WHERE email = $1")
            .bind("ada@example.com")
            .fetch_one(&db)
            .await
            .unwrap();

        let err = reset_password(&state, &token, PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::SamePassword));

        reset_password(&state, &token, "Bb2@bbbb").await.unwrap();
        let updated = User::find_by_id(&db, user.id).await.unwrap().unwrap();
        assert!(verify_password("Bb2@bbbb", updated.password_hash.as_deref().unwrap()).unwrap());
        assert_eq!(pending_rows(&db, "ada@example.com").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn expired_requests_do_not_block_new_ones(db: PgPool) {
        let state = AppState::fake_with_db(db.clone());

        let stale = pending(&db, PendingPurpose::Registration, "again@example.com", None).await;
        expire(&db, stale.id).await;
        initiate_registration(
            &state,
            RegisterRequest {
                first_name: Some("A".into()),
                last_name: Some("B".into()),
                email: "again@example.com".into(),
                password: PASSWORD.into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(pending_rows(&db, "again@example.com").await, 1);

        let user = local_user(&state, "ada@example.com").await;
        let stale = pending(&db, PendingPurpose::PasswordReset, "ada@example.com", Some(user.id)).await;
        expire(&db, stale.id).await;
        forgot_password(&state, "ada@example.com").await.unwrap();

        let err = forgot_password(&state, "ada@example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyPending(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn verify_reports_address_taken_in_the_meantime(db: PgPool) {
        let state = AppState::fake_with_db(db.clone());
        let p = pending(&db, PendingPurpose::Registration, "race@example.com", None).await;
        User::create_oauth(&db, "race@example.com", None, None, None, AuthProvider::Google)
            .await
            .unwrap();

        let err = verify_email(&state, &p.token).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }
}
