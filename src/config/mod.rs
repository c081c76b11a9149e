/// Database connection and schema initialisation
pub mod database;

/// Application settings loaded from `hirebook.toml` and the environment
pub mod settings;
