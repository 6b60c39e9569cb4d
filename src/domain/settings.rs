//! Typed run settings consumed by the core. Built from `shared::config::AppConfig`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTRY: &str = "HK";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_NAME_PREFIX: &str = "Contact";
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1000;
pub const DEFAULT_ERROR_DISPLAY_CAP: usize = 20;

/// Normalizer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingOptions {
    /// Characters removed before parsing.
    pub strip_chars: Vec<char>,
    /// Prepend the default region's dialing prefix to numbers without `+`.
    pub auto_add_country_code: bool,
    pub min_digit_length: usize,
    pub max_digit_length: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            strip_chars: vec!['-', '(', ')', '.', ' '],
            auto_add_country_code: false,
            min_digit_length: 7,
            max_digit_length: 15,
        }
    }
}

/// Everything one import run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// ISO region used when a number has no explicit country code.
    pub default_country: String,
    pub batch_size: usize,
    pub name_prefix: String,
    pub skip_existing: bool,
    /// Pause between successive batch submissions.
    pub batch_delay_ms: u64,
    /// Max error strings kept on the report for display.
    pub error_display_cap: usize,
    pub formatting: FormattingOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_country: DEFAULT_COUNTRY.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            skip_existing: true,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            error_display_cap: DEFAULT_ERROR_DISPLAY_CAP,
            formatting: FormattingOptions::default(),
        }
    }
}
