use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::AuthProvider;

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub email: String,
    #[serde(rename = "authProvider")]
    pub auth_provider: AuthProvider,
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
}
