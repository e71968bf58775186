use crate::{
    client::{
        api::{ApiClient, ApiError},
        pages::redirect_on_mount,
        routes::Route,
        session::Session,
    },
    validate::{is_valid_email, EMAIL_ERROR},
};

pub const SENT: &str = "If this email is registered, you will receive a password reset link shortly.";
pub const SEND_FAILED: &str = "Failed to send reset email. Please try again.";

pub struct ForgotPasswordPage {
    api: ApiClient,
    session: Session,
    email: String,
    pub email_error: Option<&'static str>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ForgotPasswordPage {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self {
            api,
            session,
            email: String::new(),
            email_error: None,
            message: None,
            error: None,
        }
    }

    pub fn mount(&self) -> Option<Route> {
        redirect_on_mount(&Route::ForgotPassword, &self.session)
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.email_error = (!is_valid_email(&self.email)).then_some(EMAIL_ERROR);
    }

    /// Stays on the page either way; the outcome shows up in `message` or `error`.
    pub async fn submit(&mut self) {
        self.message = None;
        self.error = None;
        if self.email_error.is_some() {
            return;
        }
        match self.api.forgot_password(self.email.trim()).await {
            Ok(_) => self.message = Some(SENT.to_string()),
            Err(ApiError::Rejected { message, .. }) => self.message = Some(message),
            Err(e) => {
                tracing::warn!(error = %e, "forgot-password request failed");
                self.error = Some(SEND_FAILED.to_string());
            }
        }
    }
}
