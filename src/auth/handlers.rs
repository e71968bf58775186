use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{
            non_blank, AuthResponse, ChangePasswordRequest, CompleteRegistrationRequest,
            ForgotPasswordRequest, GoogleLoginRequest, LoginRequest, RegisterRequest,
            ResetPasswordRequest, TokenQuery, UpdateProfileRequest, UpdateProfileResponse,
        },
        error::AuthError,
        jwt::{AuthUser, JWT_COOKIE},
        services,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify", get(verify).post(verify))
        .route("/auth/login", post(login))
        .route("/auth/google", post(google_login))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/complete-registration", post(complete_registration))
        .route("/auth/update-profile", post(update_profile))
        .route("/auth/change-password", post(change_password))
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((JWT_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.cookie_secure)
        .max_age(Duration::minutes(state.config.jwt.ttl_minutes))
        .build()
}

fn cleared_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build((JWT_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<&'static str, AuthError> {
    services::initiate_registration(&state, payload).await?;
    Ok("Verification email sent")
}

#[instrument(skip(state, query))]
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<&'static str, AuthError> {
    let token = non_blank(query.token.as_deref())
        .ok_or(AuthError::InvalidToken("Verification token is required"))?;
    services::verify_email(&state, token).await?;
    Ok("Email verified! Redirecting to login...")
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    let response = services::login(&state, payload).await?;
    let jar = jar.add(session_cookie(&state, response.token.clone()));
    Ok((jar, Json(response)))
}

#[instrument(skip(state, jar, payload))]
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    let id_token = non_blank(payload.id_token.as_deref())
        .ok_or(AuthError::BadRequest("ID token is required"))?;
    let response = services::login_with_google(&state, id_token).await?;
    let jar = jar.add(session_cookie(&state, response.token.clone()));
    Ok((jar, Json(response)))
}

/// Clears the session cookie. Succeeds whether or not a session existed.
#[instrument(skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, &'static str) {
    info!("user logged out, clearing jwt cookie");
    (jar.add(cleared_cookie(&state)), "Logged out successfully")
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<&'static str, AuthError> {
    let email = non_blank(payload.email.as_deref()).ok_or(AuthError::BadRequest("Email is required"))?;
    services::forgot_password(&state, email).await?;
    Ok("Password reset link sent to your email")
}

#[instrument(skip(state, query, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<&'static str, AuthError> {
    let token = non_blank(payload.token.as_deref()).or(non_blank(query.token.as_deref()));
    let new_password = non_blank(payload.new_password.as_deref());
    let (Some(token), Some(new_password)) = (token, new_password) else {
        return Err(AuthError::BadRequest("Token and new password are required"));
    };
    services::reset_password(&state, token, new_password).await?;
    Ok("Password reset successfully")
}

#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn complete_registration(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CompleteRegistrationRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    Ok(Json(
        services::complete_registration(&state, &auth, payload).await?,
    ))
}

/// Profile errors go out as `{"error": ...}` rather than plain text.
pub struct ProfileError(AuthError);

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            return self.0.into_response();
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, ProfileError> {
    services::update_profile(&state, &auth, payload)
        .await
        .map(Json)
        .map_err(ProfileError)
}

#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<&'static str, AuthError> {
    let old = non_blank(payload.old_password.as_deref());
    let new = non_blank(payload.new_password.as_deref());
    let (Some(old), Some(new)) = (old, new) else {
        return Err(AuthError::BadRequest("Old and new passwords are required"));
    };
    services::change_password(&state, &auth, old, new).await?;
    Ok("Password changed successfully")
}
