use crate::client::{
    api::ApiClient,
    pages::{bearer, sign_in},
    routes::Route,
    session::Session,
};

pub const NAMES_REQUIRED: &str = "First and last name are required";

/// Collects the names a new account is still missing.
pub struct CompleteRegistrationPage {
    api: ApiClient,
    session: Session,
    pub first_name: String,
    pub last_name: String,
    pub error: Option<String>,
}

impl CompleteRegistrationPage {
    pub fn new(api: ApiClient, session: Session) -> Self {
        let (first_name, last_name) = session
            .current()
            .map(|u| (u.first_name, u.last_name))
            .unwrap_or_default();
        Self {
            api,
            session,
            first_name,
            last_name,
            error: None,
        }
    }

    pub async fn submit(&mut self) -> Option<Route> {
        self.error = None;
        let first = self.first_name.trim().to_string();
        let last = self.last_name.trim().to_string();
        if first.is_empty() || last.is_empty() {
            self.error = Some(NAMES_REQUIRED.to_string());
            return None;
        }
        let token = match bearer(&self.session) {
            Ok(token) => token,
            Err(message) => {
                self.error = Some(message);
                return None;
            }
        };
        let result = self.api.complete_registration(&token, &first, &last).await;
        sign_in(&self.session, result, &mut self.error)
    }
}
