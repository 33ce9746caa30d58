//! Infrastructure layer: configuration and the Postgres ledger adapter.

pub mod config;
pub mod postgres;

pub use config::{AppConfig, ConfigError, Persistence};
pub use postgres::PostgresLedger;
