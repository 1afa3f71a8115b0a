use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_EVENTS_PATH: &str = "/slack/events";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing `{0}` env var")]
    Missing(&'static str),

    #[error("invalid value for `{var}`: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Process-wide settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub signing_secret: String,
    pub store_url: String,
    pub port: u16,
    pub events_path: String,
    pub teams_file: Option<PathBuf>,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let signing_secret = get("SLACK_SIGNING_SECRET")
            .ok_or(ConfigError::Missing("SLACK_SIGNING_SECRET"))?
            .to_string();

        let store_url = get("PLAYER_STORE_URL")
            .ok_or(ConfigError::Missing("PLAYER_STORE_URL"))?
            .trim_end_matches('/')
            .to_string();
        if !(store_url.starts_with("http://") || store_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "PLAYER_STORE_URL",
                message: format!("`{store_url}` is not an http(s) URL"),
            });
        }

        let port = match get("WEBHOOK_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "WEBHOOK_PORT",
                message: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let events_path = get("WEBHOOK_PATH").unwrap_or(DEFAULT_EVENTS_PATH).to_string();
        if !events_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                var: "WEBHOOK_PATH",
                message: "must start with `/`".to_string(),
            });
        }

        let teams_file = get("TEAMS_FILE").map(PathBuf::from);

        Ok(Config {
            signing_secret,
            store_url,
            port,
            events_path,
            teams_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&vars(&[
            ("SLACK_SIGNING_SECRET", "shh"),
            ("PLAYER_STORE_URL", "https://draft-db.example.com/"),
        ]))
        .unwrap();

        assert_eq!(config.signing_secret, "shh");
        assert_eq!(config.store_url, "https://draft-db.example.com");
        assert_eq!(config.port, 3000);
        assert_eq!(config.events_path, "/slack/events");
        assert_eq!(config.teams_file, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(&vars(&[
            ("SLACK_SIGNING_SECRET", "shh"),
            ("PLAYER_STORE_URL", "http://localhost:9000"),
            ("WEBHOOK_PORT", "8080"),
            ("WEBHOOK_PATH", "/hooks/draft"),
            ("TEAMS_FILE", "/etc/draft/teams.toml"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.events_path, "/hooks/draft");
        assert_eq!(config.teams_file, Some(PathBuf::from("/etc/draft/teams.toml")));
    }

    #[test]
    fn test_missing_secret() {
        let err = Config::from_vars(&vars(&[("PLAYER_STORE_URL", "http://localhost")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SLACK_SIGNING_SECRET"));

        let err = Config::from_vars(&vars(&[
            ("SLACK_SIGNING_SECRET", "  "),
            ("PLAYER_STORE_URL", "http://localhost"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("SLACK_SIGNING_SECRET"));
    }

    #[test]
    fn test_invalid_values() {
        let base = [
            ("SLACK_SIGNING_SECRET", "shh"),
            ("PLAYER_STORE_URL", "http://localhost"),
        ];

        let mut bad_port = vars(&base);
        bad_port.insert("WEBHOOK_PORT".into(), "70000".into());
        assert!(matches!(
            Config::from_vars(&bad_port),
            Err(ConfigError::Invalid { var: "WEBHOOK_PORT", .. })
        ));

        let mut bad_path = vars(&base);
        bad_path.insert("WEBHOOK_PATH".into(), "slack".into());
        assert!(matches!(
            Config::from_vars(&bad_path),
            Err(ConfigError::Invalid { var: "WEBHOOK_PATH", .. })
        ));

        let bad_url = vars(&[("SLACK_SIGNING_SECRET", "shh"), ("PLAYER_STORE_URL", "draft-db")]);
        assert!(matches!(
            Config::from_vars(&bad_url),
            Err(ConfigError::Invalid { var: "PLAYER_STORE_URL", .. })
        ));
    }
}
