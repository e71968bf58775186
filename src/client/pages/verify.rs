use crate::client::{api::ApiClient, routes::Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    Verifying,
    Verified,
    Failed,
    InvalidLink,
}

impl VerifyStatus {
    pub fn message(&self) -> &'static str {
        match self {
            VerifyStatus::Verifying => "Verifying...",
            VerifyStatus::Verified => "Email verified! Redirecting to login...",
            VerifyStatus::Failed => "Verification failed or link expired.",
            VerifyStatus::InvalidLink => "Invalid verification link.",
        }
    }
}

pub struct VerifyPage {
    api: ApiClient,
    token: Option<String>,
    pub status: VerifyStatus,
}

impl VerifyPage {
    pub fn new(api: ApiClient, token: Option<String>) -> Self {
        Self {
            api,
            token,
            status: VerifyStatus::Verifying,
        }
    }

    /// Confirms the emailed token; on success the next stop is the login page.
    pub async fn mount(&mut self) -> Option<Route> {
        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            self.status = VerifyStatus::InvalidLink;
            return None;
        };
        match self.api.verify(token).await {
            Ok(_) => {
                self.status = VerifyStatus::Verified;
                Some(Route::Login)
            }
            Err(e) => {
                tracing::warn!(error = %e, "email verification failed");
                self.status = VerifyStatus::Failed;
                None
            }
        }
    }
}
