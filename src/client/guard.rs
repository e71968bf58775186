use crate::client::{routes::Route, session::SessionUser};

/// What the cache says about the visitor. Presence is trusted for routing
/// only; the server still checks the token on every protected call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<'a> {
    Authenticated(&'a SessionUser),
    Anonymous,
}

impl<'a> From<Option<&'a SessionUser>> for Access<'a> {
    fn from(user: Option<&'a SessionUser>) -> Self {
        user.map_or(Access::Anonymous, Access::Authenticated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    Redirect(Route),
}

/// Decides whether `route` may render for the given visitor.
pub fn check(route: &Route, access: Access<'_>) -> GuardOutcome {
    match access {
        Access::Anonymous if route.is_guarded() => GuardOutcome::Redirect(Route::Login),
        Access::Authenticated(_) if route.is_anonymous_only() => {
            GuardOutcome::Redirect(Route::Dashboard)
        }
        _ => GuardOutcome::Render,
    }
}
