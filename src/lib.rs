pub mod api;
pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod services;
pub mod state;
pub mod storage;

pub use app::app;
pub use state::AppState;
