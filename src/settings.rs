use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/chat";
pub const DEFAULT_DB_PATH: &str = "data/spots.sqlite";
pub const DEFAULT_SESSION: &str = "default";

/// Runtime settings, read from `SPOTS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub endpoint: String,
    pub db_path: String,
    pub session: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_source(Environment::with_prefix("SPOTS"))
    }

    fn from_source(env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("endpoint", DEFAULT_ENDPOINT)?
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("session", DEFAULT_SESSION)?
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("SPOTS").source(Some(map))
    }

    #[test]
    fn defaults_without_env() {
        let s = Settings::from_source(env(&[])).unwrap();
        assert_eq!(s.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(s.db_path, DEFAULT_DB_PATH);
        assert_eq!(s.session, DEFAULT_SESSION);
    }

    #[test]
    fn env_overrides_defaults() {
        let s = Settings::from_source(env(&[
            ("SPOTS_ENDPOINT", "http://example.test/chat"),
            ("SPOTS_SESSION", "rome"),
        ]))
        .unwrap();
        assert_eq!(s.endpoint, "http://example.test/chat");
        assert_eq!(s.session, "rome");
        assert_eq!(s.db_path, DEFAULT_DB_PATH);
    }
}
