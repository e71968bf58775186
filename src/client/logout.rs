use tracing::{error, info, warn};

use crate::client::{api::ApiClient, routes::Route, session::Session};

/// Tells the server to drop the `jwt` cookie, then forgets the local user.
/// The local record is cleared whatever the server says.
pub async fn logout(api: &ApiClient, session: &Session) -> Route {
    match api.logout().await {
        Ok(message) => info!(message = %message, "server session closed"),
        Err(e) => warn!(error = %e, "logout request failed"),
    }
    if let Err(e) = session.clear() {
        error!(error = %e, "failed to clear stored session");
    }
    Route::Login
}
