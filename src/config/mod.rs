mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{AuthConfig, Config, SerialConfig, ServerConfig};
