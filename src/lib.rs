pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;
pub use db::MIGRATOR;
pub use error::{AppError, AppResult};
pub use routes::{create_router, AppState};
