pub mod postgres;

pub use postgres::{connect, create_pool, MIGRATOR};
