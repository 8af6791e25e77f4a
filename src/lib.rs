pub mod app;
pub mod client;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod handlers;
pub mod markdown;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod ui;

pub use app::router;
pub use client::{ApiClient, ApiError, Guard};
pub use config::{Config, Flavor};
pub use routes::{RouteTable, View};
pub use state::AppState;
