// storefront/src/lib.rs

//! HTTP surface of the storefront: configuration, shared state, and the
//! actix-web routes over `storefront_core`.

pub mod config;
pub mod errors;
pub mod state;
pub mod web;

pub use config::AppConfig;
pub use errors::AppError;
pub use state::AppState;
