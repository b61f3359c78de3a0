use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variables understood by earlier deployments, mapped onto config keys.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("SLACK_TOKEN", "slack.token"),
    ("SLACK_CHANNEL_ID", "slack.channel_id"),
    ("QUEUE_URL", "queue.url"),
];

/// Load configuration from an optional file with environment variable overrides.
///
/// Precedence (lowest first): TOML file, `PETCAM_SLACK_TOKEN` style variables,
/// `PETCAM_<SECTION>__<KEY>` variables.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(legacy_env())
        .merge(Env::prefixed("PETCAM_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn legacy_env() -> Env {
    Env::prefixed("PETCAM_").filter_map(|key| {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
            .map(|(_, path)| (*path).into())
    })
}
