use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use vigil_core::error::{Result, VigilError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub access: AccessSection,

    #[serde(default)]
    pub http: HttpSection,
}

impl ExporterConfig {
    /// Defaults for everything but the version; used by hosts that build
    /// the config in code.
    pub fn new() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            access: AccessSection::default(),
            http: HttpSection::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VigilError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.access.validate()?;
        Ok(())
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Sent in the `Server` response header.
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            address: default_address(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || !self.name.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
            return Err(VigilError::Config(
                "server.name must be non-empty printable ascii".into(),
            ));
        }
        if self.address.is_empty() {
            return Err(VigilError::Config("server.address must not be empty".into()));
        }
        if !(1000..=600000).contains(&self.request_timeout_ms) {
            return Err(VigilError::Config(
                "server.request_timeout_ms must be between 1000 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_name() -> String {
    "metrics-server".into()
}
fn default_address() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    9100
}
fn default_request_timeout_ms() -> u64 {
    60000
}
fn default_max_body_bytes() -> usize {
    512
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessSection {
    /// Required on `/metrics` (and `/debug/pprof`) when set.
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Also require the token on `/health`.
    #[serde(default)]
    pub require_for_health: bool,
}

impl AccessSection {
    pub fn validate(&self) -> Result<()> {
        let has_token = self
            .token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty());
        if self.require_for_health && !has_token {
            return Err(VigilError::Config(
                "access.require_for_health needs access.token".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default)]
    pub disable_client_cache: bool,

    #[serde(default)]
    pub include_cors: bool,

    #[serde(default)]
    pub enable_debug_profiles: bool,
}
