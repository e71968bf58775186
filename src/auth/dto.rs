use serde::{Deserialize, Serialize};

use crate::auth::repo_types::{AuthProvider, User};

/// Request body for registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// `?token=` on verify and reset-password.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRegistrationRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub new_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Returned by login, Google login, profile update and complete-registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    pub auth_provider: AuthProvider,
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: &User, provider: AuthProvider, token: String) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone().unwrap_or_default(),
            profile_pic: user.profile_pic.clone(),
            auth_provider: provider,
            token,
        }
    }
}

/// Treats `None`, empty and whitespace-only input alike.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn auth_response_uses_camel_case() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.co".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            password_hash: Some("h".into()),
            auth_provider: "local".into(),
            profile_pic: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(AuthResponse::new(&user, AuthProvider::Local, "t".into()))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "email": "a@b.co",
                "firstName": "Ada",
                "lastName": "",
                "authProvider": "local",
                "token": "t"
            })
        );
    }

    #[test]
    fn register_request_accepts_missing_names() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@b.co","password":"Aa1!aaaa"}"#).unwrap();
        assert!(req.first_name.is_none());
    }

    #[test]
    fn update_profile_reads_new_email() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"firstName":"A","lastName":"B","newEmail":"n@b.co"}"#)
                .unwrap();
        assert_eq!(req.new_email.as_deref(), Some("n@b.co"));
    }

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" x ")), Some("x"));
    }
}
