use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Failures of the auth endpoints. The message is what the user sees.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Password does not meet complexity requirements.")]
    WeakPassword,

    #[error("Email already registered")]
    EmailTaken,

    #[error("{0}")]
    AlreadyPending(&'static str),

    #[error("{0}")]
    InvalidToken(&'static str),

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("This account uses {0} login")]
    WrongProvider(String),

    #[error("Old password is incorrect")]
    WrongOldPassword,

    #[error("New password cannot be the same as the old password")]
    SamePassword,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Invalid Google ID token")]
    InvalidGoogleToken,

    #[error("Failed to send email")]
    Mail(#[source] anyhow::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Mail(_) => StatusCode::BAD_GATEWAY,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::Internal(e) => error!(error = ?e, "request failed"),
            AuthError::Mail(e) => error!(error = ?e, "mail delivery failed"),
            _ => {}
        }
        (self.status(), self.to_string()).into_response()
    }
}
