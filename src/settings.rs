//! Handles settings for the service. Configuration is read from an optional
//! `settings.toml` and from `TEAMSPLIT_*` environment variables
//! (e.g. `TEAMSPLIT_SERVER__PORT=9000`). `MONGODB_URI` is still honored as the
//! database address when nothing else sets it.
use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Mongodb {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub mongodb: Mongodb,
    pub log: Log,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(File::with_name("settings").required(false))
    }

    fn load<S>(file: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let mut builder = Config::builder()
            .set_default("server.bind", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("mongodb.database", "OpenSplit")?
            .set_default("log.level", "info")?;
        if let Ok(uri) = std::env::var("MONGODB_URI") {
            builder = builder.set_default("mongodb.uri", uri)?;
        }

        builder
            .add_source(file)
            .add_source(
                Environment::with_prefix("TEAMSPLIT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
