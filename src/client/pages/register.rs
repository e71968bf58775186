use crate::{
    client::{
        api::{ApiClient, Registration},
        pages::{redirect_on_mount, sign_in},
        routes::Route,
        session::Session,
    },
    validate::{is_valid_email, unmet_password_rules, PasswordRule, EMAIL_ERROR, PASSWORD_ERROR},
};

pub const FIX_EMAIL_FIRST: &str = "Fix email error before submitting.";

pub struct RegisterPage {
    api: ApiClient,
    session: Session,
    pub first_name: String,
    pub last_name: String,
    email: String,
    password: String,
    password_focused: bool,
    pub show_password: bool,
    pub email_error: Option<&'static str>,
    pub password_error: Option<&'static str>,
    unmet: Vec<PasswordRule>,
    pub server_error: Option<String>,
}

impl RegisterPage {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self {
            api,
            session,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: String::new(),
            password_focused: false,
            show_password: false,
            email_error: None,
            password_error: None,
            unmet: unmet_password_rules(""),
            server_error: None,
        }
    }

    pub fn mount(&self) -> Option<Route> {
        redirect_on_mount(&Route::Register, &self.session)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Every edit re-validates the address.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.email_error = (!is_valid_email(&self.email)).then_some(EMAIL_ERROR);
    }

    /// Edits are only checked once the field has been focused.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
        if self.password_focused {
            self.check_password();
        }
    }

    pub fn focus_password(&mut self) {
        self.password_focused = true;
    }

    fn check_password(&mut self) {
        self.unmet = unmet_password_rules(&self.password);
        self.password_error = (!self.unmet.is_empty()).then_some(PASSWORD_ERROR);
    }

    /// The guideline list with a met/unmet flag per rule, shown while the
    /// password field is focused.
    pub fn guidelines(&self) -> Vec<(PasswordRule, bool)> {
        PasswordRule::GUIDELINES
            .iter()
            .map(|rule| (*rule, !self.unmet.contains(rule)))
            .collect()
    }

    pub async fn submit(&mut self) -> Option<Route> {
        self.server_error = None;
        if !is_valid_email(&self.email) {
            self.email_error = Some(EMAIL_ERROR);
        }
        if self.email_error.is_some() {
            self.server_error = Some(FIX_EMAIL_FIRST.to_string());
            return None;
        }
        let form = Registration {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        };
        match self.api.register(&form).await {
            Ok(_) => Some(Route::CheckEmail),
            Err(e) => {
                self.server_error = Some(e.user_message());
                None
            }
        }
    }

    /// Google sign-up signs the user straight in, like the login page.
    pub async fn google(&mut self, id_token: &str) -> Option<Route> {
        self.server_error = None;
        let result = self.api.google_login(id_token).await;
        sign_in(&self.session, result, &mut self.server_error)
    }
}
