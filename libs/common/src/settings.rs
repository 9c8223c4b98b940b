//! Listener settings shared by the HTTP services

use serde::Deserialize;
use std::net::SocketAddr;

/// Address a service binds to
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load `<PREFIX>_HOST` and `<PREFIX>_PORT`, falling back to `0.0.0.0` and
    /// `default_port`.
    pub fn from_env(prefix: &str, default_port: u16) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .add_source(config::Environment::with_prefix(prefix).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Socket address to hand to the listener
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}
