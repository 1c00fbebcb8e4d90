pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod reports;
pub mod state;
pub mod types;

pub use app::app;
pub use state::AppState;
