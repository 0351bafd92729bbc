pub mod app;
pub mod catalog_handlers;
pub mod config;
pub mod guards;
pub mod metrics;
pub mod model;
pub mod order_handlers;
pub mod payment_handlers;
pub mod payments;
pub mod store;
pub mod tokens;
pub mod user_handlers;
pub mod watch_handlers;

pub use app::{build_router, AppState};
pub use config::ServiceConfig;
