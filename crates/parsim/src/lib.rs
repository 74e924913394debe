pub mod admin;
pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;
pub mod store;
