//! Service configuration. Sources, later ones winning: built-in defaults,
//! `settings.toml` (or the file named by `TRIPSPLIT_CONFIG`), `TRIPSPLIT__*`
//! environment variables, and `MONGODB_URI`.

use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mongo {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub mongodb: Mongo,
    pub log: Log,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let file = env::var("TRIPSPLIT_CONFIG").unwrap_or_else(|_| "settings".to_string());

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("mongodb.uri", "")?
            .set_default("mongodb.database", "TripSplit")?
            .set_default("log.level", "info")?
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("TRIPSPLIT").separator("__"));

        if let Ok(uri) = env::var("MONGODB_URI") {
            builder = builder.set_override("mongodb.uri", uri)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }
        if self.mongodb.uri.is_empty() {
            return Err(ConfigError::Message(
                "MongoDB URI is required (set MONGODB_URI)".to_string(),
            ));
        }
        Ok(())
    }
}
