use crate::conversation::{DEFAULT_COMPLEX_TAGS, DEFAULT_PERSONA};
use crate::generator::DEFAULT_API_URL;
use crate::matcher::{is_valid_threshold, CONFIDENCE_THRESHOLD};
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    pub intents_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogicSettings {
    pub similarity_threshold: f64,
    pub complex_tags: Vec<String>,
    pub persona: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data: DataSettings,
    pub logic: LogicSettings,
    pub server: ServerSettings,
    pub generator: GeneratorSettings,
    pub history: HistorySettings,
}

impl Settings {
    /// Loads `Config.toml` (optional) with `APP__SECTION__KEY` overrides.
    /// `GEMINI_API_KEY` and `PORT` are honoured when not set otherwise.
    pub fn load() -> Result<Self> {
        Self::load_from("Config")
    }

    pub fn load_from(name: &str) -> Result<Self> {
        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name(name).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("logic.complex_tags")
                    .try_parsing(true),
            );
        let builder = match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.is_empty() => builder.set_default("generator.api_key", key)?,
            _ => builder,
        };
        let builder = match std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            Some(port) => builder.set_override("server.port", i64::from(port))?,
            None => builder,
        };

        let settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate().context("Invalid configuration")?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.logic.similarity_threshold;
        if !is_valid_threshold(threshold) {
            bail!("logic.similarity_threshold must be within [0.0, 1.0], got {}", threshold);
        }
        Ok(())
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let complex_tags: Vec<String> = DEFAULT_COMPLEX_TAGS.iter().map(|s| s.to_string()).collect();
        Ok(builder
            .set_default("data.intents_file", "intents.json")?
            .set_default("logic.similarity_threshold", CONFIDENCE_THRESHOLD)?
            .set_default("logic.complex_tags", complex_tags)?
            .set_default("logic.persona", DEFAULT_PERSONA)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("generator.api_url", DEFAULT_API_URL)?
            .set_default("generator.timeout_secs", 30)?
            .set_default("history.capacity", 10_000)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let settings = Settings::load_from("no-such-config-file").unwrap();
        assert_eq!(settings.data.intents_file, "intents.json");
        assert_eq!(settings.logic.similarity_threshold, CONFIDENCE_THRESHOLD);
        assert!(settings.logic.complex_tags.iter().any(|t| t == "hours"));
        assert_eq!(settings.generator.timeout_secs, 30);
        assert_eq!(settings.history.capacity, 10_000);
    }

    #[test]
    fn test_rejects_invalid_threshold() {
        let mut settings = Settings::load_from("no-such-config-file").unwrap();
        settings.logic.similarity_threshold = f64::NAN;
        assert!(settings.validate().is_err());

        settings.logic.similarity_threshold = 1.5;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));

        settings.logic.similarity_threshold = 0.5;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_complex_tags_from_environment() {
        // Keeps "hours" so concurrent tests reading the defaults still hold.
        std::env::set_var("APP__LOGIC__COMPLEX_TAGS", "hours,billing_issues");
        let settings = Settings::load_from("no-such-config-file");
        std::env::remove_var("APP__LOGIC__COMPLEX_TAGS");

        let settings = settings.unwrap();
        assert_eq!(settings.logic.complex_tags, vec!["hours", "billing_issues"]);
    }
}
