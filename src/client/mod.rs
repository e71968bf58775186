//! Client side of TraceMyData: session cache, routing, REST calls and the
//! page controllers that drive them.

pub mod api;
pub mod guard;
pub mod logout;
pub mod navbar;
pub mod pages;
pub mod routes;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::config::ClientConfig;
pub use api::{ApiClient, ApiError};
pub use routes::Route;
pub use session::{FileBackend, MemoryBackend, Session, SessionBackend, SessionUser};
