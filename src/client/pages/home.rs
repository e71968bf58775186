use crate::client::{routes::Route, session::Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallToAction {
    pub label: &'static str,
    pub route: Route,
}

pub struct HomePage {
    session: Session,
}

impl HomePage {
    pub const HEADLINE: &'static str = "Take control of your digital footprint";

    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn calls_to_action(&self) -> Vec<CallToAction> {
        if self.session.is_authenticated() {
            vec![CallToAction {
                label: "Go to Dashboard",
                route: Route::Dashboard,
            }]
        } else {
            vec![
                CallToAction {
                    label: "Get Started",
                    route: Route::Register,
                },
                CallToAction {
                    label: "Sign In",
                    route: Route::Login,
                },
            ]
        }
    }
}
