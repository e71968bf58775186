pub mod app;
pub mod auth;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod mail;
pub mod state;
pub mod validate;
