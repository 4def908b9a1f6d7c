/// Database connection and table creation
pub mod database;

/// Ledger settings loading from ledger.toml
pub mod settings;

pub use settings::{AppConfig, load_app_configuration};
