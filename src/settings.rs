use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Postgres {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub listen: String,
}

#[derive(Debug, Deserialize)]
pub struct Admin {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub postgres: Postgres,
    pub server: Server,
    pub admin: Admin,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("CARD_DEALER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
