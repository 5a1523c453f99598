// Module declarations
pub mod config;
pub mod persistence;

// Re-export all implementations
pub use config::{AppEnvironment, ConfigError, EnvConfig};
pub use persistence::{InMemoryRepository, UserInMemoryRepository};
