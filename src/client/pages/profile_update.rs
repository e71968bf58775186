use tracing::info;

use crate::{
    client::{api::ApiClient, logout::logout, routes::Route, session::{Session, SessionUser}},
    validate::{is_valid_email, EMAIL_ERROR},
};

pub const INVALID_EMAIL: &str = "Invalid email.";
pub const LOCAL_ONLY: &str = "Email and password are managed by your Google account.";
pub const RELOGIN: &str = "You have been logged out. Please log in again with new password.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Profile dialog opened from the dashboard.
pub struct ProfileUpdateModal {
    api: ApiClient,
    session: Session,
    user: SessionUser,
    pub first_name: String,
    pub last_name: String,
    changing_email: bool,
    new_email: String,
    pub email_error: Option<&'static str>,
    changing_password: bool,
    pub old_password: String,
    pub new_password: String,
    pub notice: Option<Notice>,
}

impl ProfileUpdateModal {
    pub fn new(api: ApiClient, session: Session, user: SessionUser) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            api,
            session,
            user,
            changing_email: false,
            new_email: String::new(),
            email_error: None,
            changing_password: false,
            old_password: String::new(),
            new_password: String::new(),
            notice: None,
        }
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    /// Address shown in the email field: the pending one while editing.
    pub fn email_field(&self) -> &str {
        if self.changing_email {
            &self.new_email
        } else {
            &self.user.email
        }
    }

    pub fn can_change_credentials(&self) -> bool {
        self.user.is_local()
    }

    pub fn is_changing_email(&self) -> bool {
        self.changing_email
    }

    pub fn is_changing_password(&self) -> bool {
        self.changing_password
    }

    pub fn start_email_change(&mut self) -> bool {
        if !self.can_change_credentials() {
            return false;
        }
        self.changing_email = true;
        self.new_email.clear();
        self.email_error = None;
        true
    }

    pub fn set_new_email(&mut self, email: impl Into<String>) {
        self.new_email = email.into();
        self.email_error = (!is_valid_email(&self.new_email)).then_some(EMAIL_ERROR);
    }

    pub fn start_password_change(&mut self) -> bool {
        if !self.can_change_credentials() {
            return false;
        }
        self.changing_password = true;
        true
    }

    /// Saves names and, if requested, the new email. Returns true when the
    /// dialog can close.
    pub async fn save(&mut self) -> bool {
        self.notice = None;
        if self.changing_email && !is_valid_email(&self.new_email) {
            self.email_error = Some(EMAIL_ERROR);
            self.notice = Some(Notice::Error(INVALID_EMAIL.to_string()));
            return false;
        }
        let new_email = self.changing_email.then_some(self.new_email.trim());
        let result = self
            .api
            .update_profile(&self.user.token, &self.first_name, &self.last_name, new_email)
            .await;
        let update = match result {
            Ok(update) => update,
            Err(e) => {
                self.notice = Some(Notice::Error(e.user_message()));
                return false;
            }
        };
        if let Some(user) = update.user {
            if let Err(e) = self.session.store(user.clone()) {
                tracing::error!(error = %e, "could not persist updated profile");
            }
            self.reset_to(user);
        } else {
            self.changing_email = false;
            self.new_email.clear();
        }
        info!(message = %update.message, "profile saved");
        self.notice = Some(Notice::Success(update.message));
        true
    }

    /// On success the user is signed out and must log in with the new password.
    pub async fn change_password(&mut self) -> Option<Route> {
        self.notice = None;
        if !self.can_change_credentials() {
            self.notice = Some(Notice::Error(LOCAL_ONLY.to_string()));
            return None;
        }
        let result = self
            .api
            .change_password(&self.user.token, &self.old_password, &self.new_password)
            .await;
        match result {
            Ok(message) => {
                info!(message = %message, "password changed, signing out");
                self.notice = Some(Notice::Success(RELOGIN.to_string()));
                Some(logout(&self.api, &self.session).await)
            }
            Err(e) => {
                self.notice = Some(Notice::Error(e.user_message()));
                None
            }
        }
    }

    fn reset_to(&mut self, user: SessionUser) {
        self.first_name = user.first_name.clone();
        self.last_name = user.last_name.clone();
        self.user = user;
        self.changing_email = false;
        self.new_email.clear();
        self.email_error = None;
        self.changing_password = false;
        self.old_password.clear();
        self.new_password.clear();
    }
}
