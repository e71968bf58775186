use crate::client::{
    api::ApiClient,
    logout::logout,
    pages::{redirect_on_mount, ProfileUpdateModal},
    routes::Route,
    session::{Session, SessionUser},
};

/// Below this viewport width the sidebar starts collapsed.
pub const COLLAPSE_BELOW_PX: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Metadata,
    Trackers,
    Risk,
    Education,
    History,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Metadata, Tab::Trackers, Tab::Risk, Tab::Education, Tab::History];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Metadata => "Website Metadata Analyzer",
            Tab::Trackers => "Tracker Detection",
            Tab::Risk => "Privacy Risk Score",
            Tab::Education => "Privacy Education",
            Tab::History => "Scan History Dashboard",
        }
    }

    /// Planned features listed as placeholder content.
    pub fn planned(self) -> &'static [&'static str] {
        match self {
            Tab::Metadata => &[
                "URL Input Field",
                "Metadata Extraction (title, description, OG tags)",
                "Site Preview Card",
            ],
            Tab::Trackers => &[
                "Detect Embedded Trackers (e.g., Google Analytics)",
                "Display 3rd-Party Requests (Playwright/Headless Browser)",
                "Show Tracker Risk Level",
            ],
            Tab::Risk => &[
                "NLP on Privacy/Cookie Policy",
                "Risk Scoring (0-100)",
                "Risk Reason Tags",
                "Color-coded Output",
            ],
            Tab::Education => &[
                "Show Guides (e.g., \"What is fingerprinting?\")",
                "Link to Tools/Extensions (VPNs, Ad Blockers)",
                "Learn More Page (EFF, Mozilla articles)",
            ],
            Tab::History => &[
                "Timeline of Scanned Sites",
                "Export Results (CSV/PDF)",
                "Bookmark/Favorite Sites",
            ],
        }
    }
}

pub struct DashboardPage {
    api: ApiClient,
    session: Session,
    pub active_tab: Tab,
    pub collapsed: bool,
    profile: Option<ProfileUpdateModal>,
}

impl DashboardPage {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self {
            api,
            session,
            active_tab: Tab::Metadata,
            collapsed: false,
            profile: None,
        }
    }

    /// Guards the page and sizes the sidebar for the current viewport.
    pub fn mount(&mut self, viewport_width: u32) -> Option<Route> {
        if let Some(to) = redirect_on_mount(&Route::Dashboard, &self.session) {
            return Some(to);
        }
        self.resize(viewport_width);
        None
    }

    pub fn resize(&mut self, viewport_width: u32) {
        self.collapsed = viewport_width < COLLAPSE_BELOW_PX;
    }

    pub fn toggle_sidebar(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn select(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Always the latest record, including profile edits.
    pub fn user(&self) -> Option<SessionUser> {
        self.session.current()
    }

    pub fn open_profile(&mut self) -> Option<&mut ProfileUpdateModal> {
        let user = self.session.current()?;
        let modal = ProfileUpdateModal::new(self.api.clone(), self.session.clone(), user);
        Some(self.profile.insert(modal))
    }

    pub fn profile(&mut self) -> Option<&mut ProfileUpdateModal> {
        self.profile.as_mut()
    }

    pub fn close_profile(&mut self) {
        self.profile = None;
    }

    pub async fn logout(&mut self) -> Route {
        self.profile = None;
        logout(&self.api, &self.session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        session::sample_user,
        testing::{spawn_backend, ADA_TOKEN},
    };

    #[tokio::test]
    async fn anonymous_visitor_goes_to_login() {
        let (api, _) = spawn_backend().await;
        let mut page = DashboardPage::new(api, Session::in_memory());
        assert_eq!(page.mount(1280), Some(Route::Login));
    }

    #[tokio::test]
    async fn sidebar_collapses_on_narrow_viewports() {
        let (api, _) = spawn_backend().await;
        let session = Session::in_memory();
        session.store(sample_user()).unwrap();
        let mut page = DashboardPage::new(api, session);

        assert_eq!(page.mount(767), None);
        assert!(page.collapsed);
        page.resize(768);
        assert!(!page.collapsed);
        page.toggle_sidebar();
        assert!(page.collapsed);
    }

    #[test]
    fn every_tab_has_placeholder_content() {
        for tab in Tab::ALL {
            assert!(!tab.planned().is_empty(), "{}", tab.label());
        }
    }

    #[tokio::test]
    async fn profile_edits_flow_back_into_dashboard() {
        let (api, _) = spawn_backend().await;
        let session = Session::in_memory();
        let mut user = sample_user();
        user.token = ADA_TOKEN.into();
        session.store(user).unwrap();

        let mut page = DashboardPage::new(api, session);
        page.mount(1024);
        page.select(Tab::Risk);
        assert_eq!(page.active_tab, Tab::Risk);

        let modal = page.open_profile().unwrap();
        modal.first_name = "Augusta".into();
        assert!(modal.save().await);
        page.close_profile();

        assert_eq!(page.user().unwrap().first_name, "Augusta");
        assert_eq!(page.logout().await, Route::Login);
        assert!(page.user().is_none());
        assert!(page.open_profile().is_none());
    }
}
