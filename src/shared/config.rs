//! Application configuration. API credentials, paths, import settings.
//!
//! Read from `TG_CONTACTS_*` environment variables (after `.env`), plus an
//! optional file named by `TG_CONTACTS_CONFIG`.

use crate::domain::settings::{
    DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_COUNTRY, DEFAULT_ERROR_DISPLAY_CAP,
    DEFAULT_NAME_PREFIX,
};
use crate::domain::{FormattingOptions, RunConfig};
use serde::Deserialize;
use std::path::PathBuf;

const ENV_PREFIX: &str = "TG_CONTACTS";
const CONFIG_FILE_VAR: &str = "TG_CONTACTS_CONFIG";

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    pub api_id: Option<i32>,
    pub api_hash: Option<String>,
    pub session_path: Option<String>,
    /// Ledger history, reports and exports live here.
    pub data_dir: Option<String>,

    /// ISO region for numbers without a country code. Read from TG_CONTACTS_DEFAULT_COUNTRY.
    #[serde(default)]
    pub default_country: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub name_prefix: Option<String>,
    /// Skip numbers that are already contacts (default true).
    #[serde(default)]
    pub skip_existing: Option<bool>,
    /// Characters stripped before parsing, as one string, e.g. "-(). ".
    #[serde(default)]
    pub strip_chars: Option<String>,
    #[serde(default)]
    pub auto_add_country_code: Option<bool>,
    #[serde(default)]
    pub min_digit_length: Option<usize>,
    #[serde(default)]
    pub max_digit_length: Option<usize>,
    /// Delay in ms between batch submissions. Read from TG_CONTACTS_BATCH_DELAY_MS.
    #[serde(default)]
    pub batch_delay_ms: Option<u64>,
    #[serde(default)]
    pub error_display_cap: Option<usize>,
    /// Use the in-memory gateway instead of Telegram.
    #[serde(default)]
    pub dry_run: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_VAR) {
            c = c.add_source(config::File::with_name(&path));
        }
        // Environment wins over the file.
        c = c.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or("./data"))
    }

    pub fn session_path_or_default(&self) -> PathBuf {
        PathBuf::from(self.session_path.as_deref().unwrap_or("./session.db"))
    }

    pub fn default_country_or_default(&self) -> String {
        self.default_country
            .as_deref()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
    }

    /// Zero is rejected by the importer, so it falls back to the default here.
    pub fn batch_size_or_default(&self) -> usize {
        self.batch_size.filter(|&n| n > 0).unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn name_prefix_or_default(&self) -> String {
        self.name_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_NAME_PREFIX.to_string())
    }

    pub fn batch_delay_ms_or_default(&self) -> u64 {
        self.batch_delay_ms.unwrap_or(DEFAULT_BATCH_DELAY_MS)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run.unwrap_or(false)
    }

    pub fn formatting_options(&self) -> FormattingOptions {
        let defaults = FormattingOptions::default();
        FormattingOptions {
            strip_chars: self
                .strip_chars
                .as_deref()
                .map(|s| s.chars().collect())
                .unwrap_or(defaults.strip_chars),
            auto_add_country_code: self
                .auto_add_country_code
                .unwrap_or(defaults.auto_add_country_code),
            min_digit_length: self.min_digit_length.unwrap_or(defaults.min_digit_length),
            max_digit_length: self.max_digit_length.unwrap_or(defaults.max_digit_length),
        }
    }

    /// Typed settings for the import core.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            default_country: self.default_country_or_default(),
            batch_size: self.batch_size_or_default(),
            name_prefix: self.name_prefix_or_default(),
            skip_existing: self.skip_existing.unwrap_or(true),
            batch_delay_ms: self.batch_delay_ms_or_default(),
            error_display_cap: self.error_display_cap.unwrap_or(DEFAULT_ERROR_DISPLAY_CAP),
            formatting: self.formatting_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(AppConfig::default().run_config(), RunConfig::default());
    }

    #[test]
    fn test_overrides_flow_into_run_config() {
        let cfg = AppConfig {
            default_country: Some(" us ".into()),
            batch_size: Some(0),
            strip_chars: Some("-/".into()),
            skip_existing: Some(false),
            batch_delay_ms: Some(250),
            ..AppConfig::default()
        };
        let run = cfg.run_config();
        assert_eq!(run.default_country, "US");
        assert_eq!(run.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(run.formatting.strip_chars, vec!['-', '/']);
        assert!(!run.skip_existing);
        assert_eq!(run.batch_delay_ms, 250);
    }

    #[test]
    fn test_file_source_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.toml");
        std::fs::write(&path, "batch_size = 20\nname_prefix = \"Lead\"\ndry_run = true\n").unwrap();
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.batch_size_or_default(), 20);
        assert_eq!(cfg.name_prefix_or_default(), "Lead");
        assert!(cfg.is_dry_run());
    }
}
