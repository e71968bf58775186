//! Page controllers. Each one owns its form state and receives the API
//! client and [`Session`] it works with. Actions return the route to
//! navigate to, if any.

pub mod check_email;
pub mod complete_registration;
pub mod dashboard;
pub mod forgot_password;
pub mod home;
pub mod login;
pub mod profile_update;
pub mod register;
pub mod reset_password;
pub mod verify;

use tracing::error;

use crate::client::{
    api::{ApiError, GENERIC_ERROR},
    guard::{self, Access, GuardOutcome},
    routes::Route,
    session::{Session, SessionUser},
};

pub use check_email::CheckEmailPage;
pub use complete_registration::CompleteRegistrationPage;
pub use dashboard::{DashboardPage, Tab};
pub use forgot_password::ForgotPasswordPage;
pub use home::HomePage;
pub use login::LoginPage;
pub use profile_update::ProfileUpdateModal;
pub use register::RegisterPage;
pub use reset_password::ResetPasswordPage;
pub use verify::{VerifyPage, VerifyStatus};

/// Where the session says a visitor of `route` should be sent on mount.
pub fn redirect_on_mount(route: &Route, session: &Session) -> Option<Route> {
    let user = session.current();
    match guard::check(route, Access::from(user.as_ref())) {
        GuardOutcome::Render => None,
        GuardOutcome::Redirect(to) => Some(to),
    }
}

/// Stores a freshly issued session record and routes to the dashboard.
/// Failures land in `error` for inline display.
pub(crate) fn sign_in(
    session: &Session,
    result: Result<SessionUser, ApiError>,
    error: &mut Option<String>,
) -> Option<Route> {
    let user = match result {
        Ok(user) => user,
        Err(e) => {
            *error = Some(e.user_message());
            return None;
        }
    };
    match session.store(user) {
        Ok(()) => Some(Route::Dashboard),
        Err(e) => {
            error!(error = %e, "could not persist session");
            *error = Some(GENERIC_ERROR.to_string());
            None
        }
    }
}

/// Bearer token of the signed-in user, or the error to show without one.
pub(crate) fn bearer(session: &Session) -> Result<String, String> {
    session
        .current()
        .map(|u| u.token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Please log in first.".to_string())
}
