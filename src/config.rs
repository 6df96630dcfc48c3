use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub city_slug: String,
    pub listing_slugs: Vec<String>,
    pub delay_ms: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub accept_language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sxodim.com".to_string(),
            city_slug: "almaty".to_string(),
            listing_slugs: vec![
                "kontserty".to_string(),
                "koncerty-v-everjazz".to_string(),
                "concerty-dvorec-respubliki".to_string(),
                "vystavki".to_string(),
                "standup".to_string(),
                "vecherinki".to_string(),
            ],
            delay_ms: 1000,
            timeout_seconds: 15,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "ru-RU,ru;q=0.9,en;q=0.8".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/events.db".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to built-in
    /// production defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn listing_url(&self, slug: &str) -> String {
        format!(
            "{}/{}/events/{}",
            self.source.base_url, self.source.city_slug, slug
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_sxodim() {
        let config = Config::default();
        assert_eq!(config.source.base_url, "https://sxodim.com");
        assert_eq!(config.source.city_slug, "almaty");
        assert_eq!(config.source.listing_slugs.len(), 6);
        assert_eq!(config.source.delay_ms, 1000);
        assert_eq!(config.database.path, "data/events.db");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let parsed: Config = toml::from_str(
            r#"
            [source]
            delay_ms = 250

            [database]
            path = "/tmp/test.db"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.source.delay_ms, 250);
        assert_eq!(parsed.source.base_url, "https://sxodim.com");
        assert_eq!(parsed.database.path, "/tmp/test.db");
    }

    #[test]
    fn listing_url_joins_city_and_slug() {
        let config = Config::default();
        assert_eq!(
            config.listing_url("kontserty"),
            "https://sxodim.com/almaty/events/kontserty"
        );
    }
}
