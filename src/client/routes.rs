use std::fmt;

use reqwest::Url;

const ORIGIN: &str = "http://client.local";

/// Client-visible locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Register,
    Login,
    ForgotPassword,
    ResetPassword { token: Option<String> },
    CheckEmail,
    Verify { token: Option<String> },
    CompleteRegistration,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Register => "/register",
            Route::Login => "/login",
            Route::ForgotPassword => "/forgot-password",
            Route::ResetPassword { .. } => "/reset-password",
            Route::CheckEmail => "/check-email",
            Route::Verify { .. } => "/verify",
            Route::CompleteRegistration => "/complete-registration",
            Route::Dashboard => "/dashboard",
        }
    }

    /// Parses a location such as `/verify?token=abc`. Unknown paths yield `None`.
    pub fn parse(location: &str) -> Option<Route> {
        let url = Url::parse(ORIGIN).ok()?.join(location).ok()?;
        let token = url
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty());

        let route = match url.path().trim_end_matches('/') {
            "" => Route::Home,
            "/register" => Route::Register,
            "/login" => Route::Login,
            "/forgot-password" => Route::ForgotPassword,
            "/reset-password" => Route::ResetPassword { token },
            "/check-email" => Route::CheckEmail,
            "/verify" => Route::Verify { token },
            "/complete-registration" => Route::CompleteRegistration,
            "/dashboard" => Route::Dashboard,
            _ => return None,
        };
        Some(route)
    }

    /// Requires a session; anonymous visitors are sent to the login page.
    pub fn is_guarded(&self) -> bool {
        matches!(self, Route::Dashboard)
    }

    /// Only meaningful while signed out; signed-in users go to the dashboard.
    pub fn is_anonymous_only(&self) -> bool {
        matches!(
            self,
            Route::Login | Route::Register | Route::ForgotPassword | Route::ResetPassword { .. }
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Route::ResetPassword { token: Some(token) } | Route::Verify { token: Some(token) } => token,
            _ => return f.write_str(self.path()),
        };
        let base = format!("{ORIGIN}{}", self.path());
        match Url::parse_with_params(&base, [("token", token)]) {
            Ok(url) => write!(f, "{}?{}", url.path(), url.query().unwrap_or_default()),
            Err(_) => f.write_str(self.path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Some(Route::Home));
        assert_eq!(Route::parse("/dashboard/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/check-email"), Some(Route::CheckEmail));
        assert_eq!(Route::parse("/nope"), None);
    }

    #[test]
    fn extracts_token_from_query() {
        assert_eq!(
            Route::parse("/verify?token=abc-123"),
            Some(Route::Verify { token: Some("abc-123".into()) })
        );
        assert_eq!(
            Route::parse("/reset-password?token="),
            Some(Route::ResetPassword { token: None })
        );
        assert_eq!(Route::parse("/verify"), Some(Route::Verify { token: None }));
    }

    #[test]
    fn display_round_trips_tokens() {
        let route = Route::Verify { token: Some("a b&c".into()) };
        assert_eq!(Route::parse(&route.to_string()), Some(route));
        assert_eq!(Route::Login.to_string(), "/login");
    }

    #[test]
    fn only_dashboard_is_guarded() {
        assert!(Route::Dashboard.is_guarded());
        assert!(!Route::Home.is_guarded());
        assert!(Route::Login.is_anonymous_only());
        assert!(!Route::CheckEmail.is_anonymous_only());
    }
}
