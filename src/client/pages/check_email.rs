use crate::client::routes::Route;

/// Shown after registration while the verification link is in flight.
pub struct CheckEmailPage;

impl CheckEmailPage {
    pub const TITLE: &'static str = "Verify Your Email";
    pub const INSTRUCTIONS: &'static str = "We've sent a verification link to your email address \
        which will expire in 24 hours. Please check your inbox and click the link to activate your account.";
    pub const HINT: &'static str =
        "Didn't receive the email? Please check your spam folder or try registering again.";

    pub fn back_link() -> Route {
        Route::Login
    }
}
