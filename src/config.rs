use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from: String,
    /// Unset means outgoing mail is only logged.
    pub resend_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub tokeninfo_url: String,
    /// When set, id tokens issued for another client are rejected.
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub frontend_url: String,
    pub cors_origin: String,
    pub cookie_secure: bool,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub google: GoogleConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();
        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or_else(|_| frontend_url.clone());
        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or(frontend_url.starts_with("https://"));

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "tracemydata".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "tracemydata-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let mail = MailConfig {
            from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "TraceMyData <no-reply@tracemydata.app>".into()),
            resend_api_key: std::env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty()),
        };
        let google = GoogleConfig {
            tokeninfo_url: std::env::var("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/tokeninfo".into()),
            client_id: std::env::var("GOOGLE_CLIENT_ID").ok().filter(|c| !c.is_empty()),
        };

        Ok(Self {
            database_url,
            frontend_url,
            cors_origin,
            cookie_secure,
            jwt,
            mail,
            google,
        })
    }
}

/// Where the client sends its REST calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub api_base: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_base("http://localhost:8080")
    }
}

impl ClientConfig {
    pub fn with_base(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        match std::env::var("TRACEMYDATA_API") {
            Ok(base) if !base.trim().is_empty() => Self::with_base(base.trim()),
            _ => Self::default(),
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_bool(&raw))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
