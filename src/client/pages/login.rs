use crate::client::{
    api::ApiClient,
    pages::{redirect_on_mount, sign_in},
    routes::Route,
    session::Session,
};

pub struct LoginPage {
    api: ApiClient,
    session: Session,
    pub email: String,
    pub password: String,
    pub show_password: bool,
    pub server_error: Option<String>,
}

impl LoginPage {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self {
            api,
            session,
            email: String::new(),
            password: String::new(),
            show_password: false,
            server_error: None,
        }
    }

    /// Signed-in visitors skip straight to the dashboard.
    pub fn mount(&self) -> Option<Route> {
        redirect_on_mount(&Route::Login, &self.session)
    }

    pub fn toggle_password(&mut self) {
        self.show_password = !self.show_password;
    }

    pub async fn submit(&mut self) -> Option<Route> {
        self.server_error = None;
        let result = self.api.login(self.email.trim(), &self.password).await;
        sign_in(&self.session, result, &mut self.server_error)
    }

    /// Completes a Google sign-in with the id token returned by Google.
    pub async fn google(&mut self, id_token: &str) -> Option<Route> {
        self.server_error = None;
        let result = self.api.google_login(id_token).await;
        sign_in(&self.session, result, &mut self.server_error)
    }

    pub fn forgot_password_link() -> Route {
        Route::ForgotPassword
    }
}
