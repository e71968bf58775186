use tokio::sync::watch;

use crate::client::{
    routes::Route,
    session::{Session, SessionUser},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItem {
    /// Brand mark, always linking home.
    Brand,
    Link { label: &'static str, route: Route },
    /// Signed-in user's name and picture, if any.
    Account {
        display_name: String,
        avatar: Option<String>,
    },
    /// Opens the profile dialog on the dashboard.
    Profile,
    Logout,
}

pub fn items(user: Option<&SessionUser>) -> Vec<NavItem> {
    let mut items = vec![NavItem::Brand];
    match user {
        None => items.extend([
            NavItem::Link { label: "Home", route: Route::Home },
            NavItem::Link { label: "Login", route: Route::Login },
            NavItem::Link { label: "Register", route: Route::Register },
        ]),
        Some(user) => items.extend([
            NavItem::Link { label: "Dashboard", route: Route::Dashboard },
            NavItem::Account {
                display_name: user.display_name(),
                avatar: user.profile_pic.clone().filter(|p| !p.is_empty()),
            },
            NavItem::Profile,
            NavItem::Logout,
        ]),
    }
    items
}

/// Navbar state that follows the session cache.
pub struct Navbar {
    rx: watch::Receiver<Option<SessionUser>>,
}

impl Navbar {
    pub fn new(session: &Session) -> Self {
        Self {
            rx: session.subscribe(),
        }
    }

    pub fn items(&self) -> Vec<NavItem> {
        items(self.rx.borrow().as_ref())
    }

    /// Waits for the next session change and returns the refreshed items.
    /// `None` once every session handle is gone.
    pub async fn changed(&mut self) -> Option<Vec<NavItem>> {
        self.rx.changed().await.ok()?;
        Some(items(self.rx.borrow_and_update().as_ref()))
    }
}
