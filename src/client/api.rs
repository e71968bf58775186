//! REST calls against the auth backend.

use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::{client::session::SessionUser, config::ClientConfig};

/// Shown when the request never produced a readable answer.
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx answer; `message` is the body as the server sent it.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    /// Text a page shows inline for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Network(_) | ApiError::Decode(_) => GENERIC_ERROR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Answer to a profile update. `user` is absent when only an email change
/// was requested and is waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub message: String,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Keeps a cookie jar so the `jwt` cookie set at login rides along.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(ApiError::Network)?;
        Ok(Self {
            http,
            base: config.api_base.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/auth/{endpoint}", self.base)
    }

    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<String, ApiError> {
        text(self.http.post(self.url("register")).json(form)).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ApiError> {
        let body = json!({ "email": email, "password": password });
        decode(self.http.post(self.url("login")).json(&body)).await
    }

    #[instrument(skip_all)]
    pub async fn google_login(&self, id_token: &str) -> Result<SessionUser, ApiError> {
        let body = json!({ "idToken": id_token });
        decode(self.http.post(self.url("google")).json(&body)).await
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<String, ApiError> {
        text(self.http.post(self.url("logout"))).await
    }

    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let body = json!({ "email": email });
        text(self.http.post(self.url("forgot-password")).json(&body)).await
    }

    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, ApiError> {
        let body = json!({ "token": token, "newPassword": new_password });
        text(
            self.http
                .post(self.url("reset-password"))
                .query(&[("token", token)])
                .json(&body),
        )
        .await
    }

    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<String, ApiError> {
        text(self.http.get(self.url("verify")).query(&[("token", token)])).await
    }

    #[instrument(skip(self, bearer))]
    pub async fn complete_registration(
        &self,
        bearer: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<SessionUser, ApiError> {
        let body = json!({ "firstName": first_name, "lastName": last_name });
        decode(
            self.http
                .post(self.url("complete-registration"))
                .bearer_auth(bearer)
                .json(&body),
        )
        .await
    }

    #[instrument(skip(self, bearer))]
    pub async fn update_profile(
        &self,
        bearer: &str,
        first_name: &str,
        last_name: &str,
        new_email: Option<&str>,
    ) -> Result<ProfileUpdate, ApiError> {
        let mut body = json!({ "firstName": first_name, "lastName": last_name });
        if let Some(new_email) = new_email {
            body["newEmail"] = json!(new_email);
        }
        decode(
            self.http
                .post(self.url("update-profile"))
                .bearer_auth(bearer)
                .json(&body),
        )
        .await
    }

    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        bearer: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<String, ApiError> {
        let body = json!({ "oldPassword": old_password, "newPassword": new_password });
        text(
            self.http
                .post(self.url("change-password"))
                .bearer_auth(bearer)
                .json(&body),
        )
        .await
    }
}

async fn send(req: RequestBuilder) -> Result<Response, ApiError> {
    let resp = req.send().await.map_err(|e| {
        warn!(error = %e, "request failed");
        ApiError::Network(e)
    })?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.map_err(ApiError::Network)?;
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error }) => error,
        Err(_) => body,
    };
    debug!(%status, message = %message, "request rejected");
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn text(req: RequestBuilder) -> Result<String, ApiError> {
    send(req).await?.text().await.map_err(ApiError::Network)
}

async fn decode<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
    send(req).await?.json::<T>().await.map_err(ApiError::Decode)
}
