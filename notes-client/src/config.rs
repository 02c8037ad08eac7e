use std::{sync::OnceLock, time::Duration};

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_credential_file")]
    pub credential_file: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub log_json: bool,
}

fn default_api_url() -> String {
    "http://localhost:4000".into()
}

fn default_credential_file() -> String {
    ".notes_token".into()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            credential_file: default_credential_file(),
            request_timeout_secs: default_request_timeout_secs(),
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Unset keys take their defaults; a malformed value is an error.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> crate::Result<Self> {
        let config = envy::from_iter::<_, Self>(vars)?;

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn config() -> crate::Result<&'static Config> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    let config = Config::from_env()?;

    Ok(CONFIG.get_or_init(|| config))
}
