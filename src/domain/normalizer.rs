//! Number normalizer: raw candidate text -> `PhoneRecord`.
//!
//! Pipeline: strip punctuation, apply region quirks, guess a missing `+`,
//! optionally add the default dialing prefix, then validate against the
//! numbering plan. Deterministic and side-effect free.

use crate::domain::entities::PhoneRecord;
use crate::domain::errors::ParseError;
use crate::domain::numbering::{self, ParsedNumber};
use crate::domain::settings::FormattingOptions;

/// Rewrite for a known local input format that the general path would misread.
///
/// Matches bare digit strings only (before any `+` is guessed), so a number
/// the user wrote with an explicit `+` is never rewritten.
#[derive(Debug)]
pub struct RegionQuirk {
    pub name: &'static str,
    pub prefix: &'static str,
    pub length: usize,
    /// Digits from this offset onwards are kept.
    pub keep_from: usize,
    pub replacement: &'static str,
}

impl RegionQuirk {
    fn apply(&self, digits: &str) -> Option<String> {
        let matches = digits.len() == self.length
            && digits.starts_with(self.prefix)
            && digits.chars().all(|c| c.is_ascii_digit());
        matches.then(|| format!("{}{}", self.replacement, &digits[self.keep_from..]))
    }
}

/// Ordered; first match wins.
pub static REGION_QUIRKS: &[RegionQuirk] = &[
    // 8210 2XXX XXXX: HK subscriber number behind a 5-digit local prefix whose
    // last digit is the subscriber's leading 2.
    RegionQuirk {
        name: "hk-82102-local",
        prefix: "82102",
        length: 12,
        keep_from: 4,
        replacement: "+852 ",
    },
];

/// Stateless normalizer bound to a default region and formatting options.
#[derive(Debug, Clone)]
pub struct Normalizer {
    default_country: String,
    options: FormattingOptions,
}

impl Normalizer {
    pub fn new(default_country: impl Into<String>, options: FormattingOptions) -> Self {
        Self {
            default_country: default_country.into(),
            options,
        }
    }

    pub fn default_country(&self) -> &str {
        &self.default_country
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// Normalize one candidate. Never fails: problems end up in `error_reason`.
    pub fn normalize(&self, candidate: &str) -> PhoneRecord {
        let raw = candidate.trim().to_string();
        let stripped: String = raw
            .chars()
            .filter(|c| !self.options.strip_chars.contains(c))
            .collect();
        let stripped = stripped.trim();
        if stripped.is_empty() {
            return PhoneRecord::invalid(raw, String::new(), ParseError::Empty.to_string());
        }

        let mut cleaned = match REGION_QUIRKS.iter().find_map(|q| q.apply(stripped)) {
            Some(rewritten) => rewritten,
            None => self.prefix_country_code(stripped),
        };

        if !cleaned.starts_with('+') && digit_count(&cleaned) >= 10 {
            let speculative = format!("+{}", cleaned);
            if self.validate(&speculative).is_ok() {
                cleaned = speculative;
            }
        }

        match self.validate(&cleaned) {
            Ok(parsed) => PhoneRecord::valid(raw, cleaned, parsed.e164(), parsed.country_code()),
            Err(e) => PhoneRecord::invalid(raw, cleaned, e.to_string()),
        }
    }

    /// Heuristic `+` for international numbers typed without one, then the
    /// configured default dialing prefix for whatever is still national.
    fn prefix_country_code(&self, stripped: &str) -> String {
        if !stripped.starts_with('+') && looks_international(stripped) {
            return format!("+{}", stripped);
        }
        if !stripped.starts_with('+') && self.options.auto_add_country_code {
            if let Some(prefix) = numbering::dialing_prefix(&self.default_country) {
                return format!("{}{}", prefix, stripped);
            }
        }
        stripped.to_string()
    }

    fn validate(&self, s: &str) -> Result<ParsedNumber, ParseError> {
        let well_formed = s
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c.is_whitespace());
        let digits = digit_count(s);
        if well_formed && digits > 0 {
            if digits < self.options.min_digit_length {
                return Err(ParseError::TooShort);
            }
            if digits > self.options.max_digit_length {
                return Err(ParseError::TooLong);
            }
        }
        numbering::parse(s, &self.default_country)
    }
}

/// Free-function form of [`Normalizer::normalize`].
pub fn normalize(candidate: &str, default_country: &str, options: &FormattingOptions) -> PhoneRecord {
    Normalizer::new(default_country, options.clone()).normalize(candidate)
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// 11 digits starting with 1 (NANP), or 11+ digits starting with 2-9.
fn looks_international(s: &str) -> bool {
    let len = s.chars().count();
    if len < 10 || !s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match s.chars().next() {
        Some('1') => len == 11,
        Some('2'..='9') => len >= 11,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use regex::Regex;

    static E164_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").unwrap());

    fn hk() -> Normalizer {
        Normalizer::new("HK", FormattingOptions::default())
    }

    #[test]
    fn test_hk_local_prefix_rewrite() {
        let r = hk().normalize("821020131384");
        assert!(r.is_valid(), "{:?}", r);
        assert_eq!(r.e164(), Some("+85220131384"));
        assert_eq!(r.country_code(), Some("+852"));
        assert_eq!(r.cleaned(), "+852 20131384");
    }

    #[test]
    fn test_explicit_plus_is_not_rewritten() {
        let r = hk().normalize("+82 10 2013 1384");
        assert_eq!(r.e164(), Some("+821020131384"));
    }

    #[test]
    fn test_us_formatted_number() {
        let r = hk().normalize("+1 (202) 555-0191");
        assert!(r.is_valid());
        assert_eq!(r.e164(), Some("+12025550191"));
        assert_eq!(r.country_code(), Some("+1"));
        assert_eq!(r.raw(), "+1 (202) 555-0191");
    }

    #[test]
    fn test_nanp_without_plus() {
        let r = hk().normalize("1-202-555-0191");
        assert_eq!(r.e164(), Some("+12025550191"));
    }

    #[test]
    fn test_national_number_uses_default_region() {
        let r = hk().normalize("9123 4567");
        assert_eq!(r.e164(), Some("+85291234567"));
    }

    #[test]
    fn test_auto_add_country_code() {
        let opts = FormattingOptions {
            auto_add_country_code: true,
            ..FormattingOptions::default()
        };
        let r = Normalizer::new("KE", opts).normalize("0712 345 678");
        assert_eq!(r.cleaned(), "+2540712345678");
        assert_eq!(r.e164(), Some("+254712345678"));
    }

    #[test]
    fn test_letters_only_is_invalid() {
        let r = hk().normalize("abc");
        assert!(!r.is_valid());
        assert!(r.e164().is_none());
        assert!(!r.error_reason().unwrap_or_default().is_empty());
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        let r = hk().normalize("   ");
        assert_eq!(r.error_reason(), Some("empty"));
        let r = hk().normalize("(--).");
        assert_eq!(r.error_reason(), Some("empty"));
        assert!(!hk().normalize("+++").is_valid());
    }

    #[test]
    fn test_too_many_digits_is_invalid_not_panic() {
        let r = hk().normalize("+852 9123 4567 8901 2345");
        assert!(!r.is_valid());
        assert_eq!(r.error_reason(), Some("too long"));
        assert_eq!(r.cleaned(), "+8529123456789012345");
    }

    #[test]
    fn test_too_short() {
        let r = hk().normalize("12345");
        assert_eq!(r.error_reason(), Some("too short"));
    }

    #[test]
    fn test_invalid_country_code() {
        let r = hk().normalize("+999 1234 5678");
        assert_eq!(r.error_reason(), Some("invalid country code"));
    }

    #[test]
    fn test_deterministic_and_round_trip() {
        let inputs = [
            "821020131384",
            "+1 (202) 555-0191",
            "9123 4567",
            "+44 7911 123456",
            "abc",
            "12345",
        ];
        let n = hk();
        for input in inputs {
            let a = n.normalize(input);
            let b = n.normalize(input);
            assert_eq!(a, b);
            if let Some(e164) = a.e164() {
                assert!(E164_RE.is_match(e164), "{}", e164);
                let again = n.normalize(e164);
                assert!(again.is_valid());
                assert_eq!(again.e164(), Some(e164));
            } else {
                assert!(a.error_reason().is_some());
            }
        }
    }

    #[test]
    fn test_free_function_matches_struct() {
        let opts = FormattingOptions::default();
        assert_eq!(normalize("91234567", "HK", &opts), hk().normalize("91234567"));
    }

    #[test]
    fn test_last4() {
        let r = hk().normalize("+1 (202) 555-0191");
        assert_eq!(r.last4(), "0191");
    }
}
