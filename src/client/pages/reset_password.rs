use crate::client::{
    api::ApiClient,
    pages::redirect_on_mount,
    routes::Route,
    session::Session,
};

pub const MISSING_TOKEN: &str = "Invalid or missing token.";
pub const MISMATCH: &str = "Passwords don't match.";

pub struct ResetPasswordPage {
    api: ApiClient,
    session: Session,
    token: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub show_password: bool,
    pub error: Option<String>,
    pub success: bool,
}

impl ResetPasswordPage {
    /// `token` comes from the `?token=` of the emailed link.
    pub fn new(api: ApiClient, session: Session, token: Option<String>) -> Self {
        Self {
            api,
            session,
            token: token.filter(|t| !t.is_empty()),
            password: String::new(),
            confirm_password: String::new(),
            show_password: false,
            error: None,
            success: false,
        }
    }

    pub fn mount(&self) -> Option<Route> {
        redirect_on_mount(
            &Route::ResetPassword {
                token: self.token.clone(),
            },
            &self.session,
        )
    }

    pub async fn submit(&mut self) -> Option<Route> {
        self.error = None;
        let Some(token) = self.token.as_deref() else {
            self.error = Some(MISSING_TOKEN.to_string());
            return None;
        };
        if self.password != self.confirm_password {
            self.error = Some(MISMATCH.to_string());
            return None;
        }
        match self.api.reset_password(token, &self.password).await {
            Ok(_) => {
                self.success = true;
                Some(Route::Login)
            }
            Err(e) => {
                self.error = Some(e.user_message());
                None
            }
        }
    }
}
