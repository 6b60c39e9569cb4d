//! International numbering plan. Country calling codes, trunk prefixes and the
//! assigned national-number ranges used to validate E.164 numbers.
//!
//! Ranges are deliberately coarse (leading digits + length) rather than a full
//! carrier-level database; they are enough to reject typos, wrong lengths and
//! unassigned prefixes in bulk input.

use crate::domain::errors::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;

/// E.164 caps a full number (country code + NSN) at 15 digits.
pub const E164_MAX_DIGITS: usize = 15;

/// Numbering rules for one region.
#[derive(Debug)]
pub struct CountryPlan {
    /// ISO 3166-1 alpha-2 region code.
    pub region: &'static str,
    pub calling_code: u16,
    /// National trunk prefix dialled before the NSN inside the country (e.g. "0").
    pub trunk_prefix: Option<&'static str>,
    pub min_len: usize,
    pub max_len: usize,
    /// National significant number pattern; anchored at compile time.
    pub pattern: &'static str,
}

static PLANS: &[CountryPlan] = &[
    CountryPlan { region: "US", calling_code: 1, trunk_prefix: Some("1"), min_len: 10, max_len: 10, pattern: r"[2-9]\d{2}[2-9]\d{6}" },
    CountryPlan { region: "CA", calling_code: 1, trunk_prefix: Some("1"), min_len: 10, max_len: 10, pattern: r"[2-9]\d{2}[2-9]\d{6}" },
    CountryPlan { region: "RU", calling_code: 7, trunk_prefix: Some("8"), min_len: 10, max_len: 10, pattern: r"[3489]\d{9}" },
    CountryPlan { region: "ZA", calling_code: 27, trunk_prefix: Some("0"), min_len: 9, max_len: 9, pattern: r"[1-8]\d{8}" },
    CountryPlan { region: "NL", calling_code: 31, trunk_prefix: Some("0"), min_len: 9, max_len: 9, pattern: r"[1-9]\d{8}" },
    CountryPlan { region: "FR", calling_code: 33, trunk_prefix: Some("0"), min_len: 9, max_len: 9, pattern: r"[1-9]\d{8}" },
    CountryPlan { region: "ES", calling_code: 34, trunk_prefix: None, min_len: 9, max_len: 9, pattern: r"[5-9]\d{8}" },
    CountryPlan { region: "IT", calling_code: 39, trunk_prefix: None, min_len: 6, max_len: 11, pattern: r"3\d{8,9}|0\d{5,10}" },
    CountryPlan { region: "GB", calling_code: 44, trunk_prefix: Some("0"), min_len: 9, max_len: 10, pattern: r"7\d{9}|[1-3]\d{8,9}|[89]\d{9}" },
    CountryPlan { region: "DE", calling_code: 49, trunk_prefix: Some("0"), min_len: 6, max_len: 12, pattern: r"1[5-7]\d{8,9}|[2-9]\d{5,11}" },
    CountryPlan { region: "BR", calling_code: 55, trunk_prefix: Some("0"), min_len: 10, max_len: 11, pattern: r"[1-9]{2}(?:9\d{8}|[2-5]\d{7})" },
    CountryPlan { region: "MY", calling_code: 60, trunk_prefix: Some("0"), min_len: 8, max_len: 10, pattern: r"1\d{8,9}|[3-9]\d{7,8}" },
    CountryPlan { region: "AU", calling_code: 61, trunk_prefix: Some("0"), min_len: 9, max_len: 9, pattern: r"[2-478]\d{8}" },
    CountryPlan { region: "ID", calling_code: 62, trunk_prefix: Some("0"), min_len: 8, max_len: 12, pattern: r"8\d{8,11}|[2-7]\d{7,10}" },
    CountryPlan { region: "PH", calling_code: 63, trunk_prefix: Some("0"), min_len: 8, max_len: 10, pattern: r"9\d{9}|[2-8]\d{7,8}" },
    CountryPlan { region: "SG", calling_code: 65, trunk_prefix: None, min_len: 8, max_len: 8, pattern: r"[3689]\d{7}" },
    CountryPlan { region: "TH", calling_code: 66, trunk_prefix: Some("0"), min_len: 8, max_len: 9, pattern: r"[2-9]\d{7,8}" },
    CountryPlan { region: "JP", calling_code: 81, trunk_prefix: Some("0"), min_len: 9, max_len: 10, pattern: r"[1-9]\d{8,9}" },
    CountryPlan { region: "KR", calling_code: 82, trunk_prefix: Some("0"), min_len: 8, max_len: 10, pattern: r"1[0-9]\d{7,8}|[2-6]\d{7,9}|70\d{8}" },
    CountryPlan { region: "VN", calling_code: 84, trunk_prefix: Some("0"), min_len: 9, max_len: 10, pattern: r"[35789]\d{8}|2\d{9}" },
    CountryPlan { region: "CN", calling_code: 86, trunk_prefix: Some("0"), min_len: 9, max_len: 11, pattern: r"1[3-9]\d{9}|[2-9]\d{8,10}" },
    CountryPlan { region: "IN", calling_code: 91, trunk_prefix: Some("0"), min_len: 10, max_len: 10, pattern: r"[1-9]\d{9}" },
    CountryPlan { region: "NG", calling_code: 234, trunk_prefix: Some("0"), min_len: 8, max_len: 10, pattern: r"[7-9][01]\d{8}|[1-9]\d{7}" },
    CountryPlan { region: "KE", calling_code: 254, trunk_prefix: Some("0"), min_len: 9, max_len: 9, pattern: r"[1-7]\d{8}" },
    CountryPlan { region: "HK", calling_code: 852, trunk_prefix: None, min_len: 8, max_len: 8, pattern: r"[2-9]\d{7}" },
    CountryPlan { region: "MO", calling_code: 853, trunk_prefix: None, min_len: 8, max_len: 8, pattern: r"[2-8]\d{7}" },
    CountryPlan { region: "TW", calling_code: 886, trunk_prefix: Some("0"), min_len: 8, max_len: 9, pattern: r"[2-9]\d{7,8}" },
    CountryPlan { region: "AE", calling_code: 971, trunk_prefix: Some("0"), min_len: 8, max_len: 9, pattern: r"5[024-8]\d{7}|[2-479]\d{7}" },
];

/// Compiled NSN patterns, index-aligned with `PLANS`.
static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    PLANS
        .iter()
        .map(|p| Regex::new(&format!("^(?:{})$", p.pattern)).expect("valid NSN pattern"))
        .collect()
});

/// A number that passed numbering-plan validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNumber {
    pub calling_code: u16,
    /// National significant number (trunk prefix removed).
    pub national: String,
    pub region: &'static str,
}

impl ParsedNumber {
    /// Strict E.164: `+<cc><nsn>`, no separators.
    pub fn e164(&self) -> String {
        format!("+{}{}", self.calling_code, self.national)
    }

    /// Calling code with plus sign, e.g. "+852".
    pub fn country_code(&self) -> String {
        format!("+{}", self.calling_code)
    }
}

/// Look up a plan by ISO region code (case-insensitive).
pub fn plan_for_region(region: &str) -> Option<&'static CountryPlan> {
    PLANS
        .iter()
        .find(|p| p.region.eq_ignore_ascii_case(region.trim()))
}

/// Dialing prefix for a region, e.g. "HK" -> "+852".
pub fn dialing_prefix(region: &str) -> Option<String> {
    plan_for_region(region).map(|p| format!("+{}", p.calling_code))
}

/// Splits a leading country calling code off `digits`. Calling codes are
/// prefix-free, so the first 1-3 digit prefix known to the table is the code.
fn split_calling_code(digits: &str) -> Option<(u16, &str)> {
    (1..=3usize.min(digits.len())).find_map(|n| {
        let code: u16 = digits[..n].parse().ok()?;
        PLANS
            .iter()
            .any(|p| p.calling_code == code)
            .then(|| (code, &digits[n..]))
    })
}

/// Parse a compact number string (`+` and digits; whitespace ignored).
///
/// Numbers with a leading `+` carry their own country code. Anything else is a
/// national number interpreted with `default_region`.
pub fn parse(input: &str, default_region: &str) -> Result<ParsedNumber, ParseError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ParseError::Empty);
    }
    let (international, digits) = match compact.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, compact.as_str()),
    };
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::NotANumber(input.trim().to_string()));
    }
    if digits.is_empty() {
        return Err(ParseError::Empty);
    }

    if international {
        let (code, national) = split_calling_code(digits).ok_or(ParseError::InvalidCountryCode)?;
        let mut first_err = None;
        for (idx, plan) in PLANS.iter().enumerate().filter(|(_, p)| p.calling_code == code) {
            match validate_national(idx, plan, national) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        Err(first_err.unwrap_or(ParseError::InvalidCountryCode))
    } else {
        let (idx, plan) = PLANS
            .iter()
            .enumerate()
            .find(|(_, p)| p.region.eq_ignore_ascii_case(default_region.trim()))
            .ok_or_else(|| ParseError::UnknownRegion(default_region.to_string()))?;
        validate_national(idx, plan, digits)
    }
}

fn validate_national(
    idx: usize,
    plan: &'static CountryPlan,
    national: &str,
) -> Result<ParsedNumber, ParseError> {
    let nsn = match plan.trunk_prefix.and_then(|t| national.strip_prefix(t)) {
        Some(rest) if (plan.min_len..=plan.max_len).contains(&rest.len()) => rest,
        _ => national,
    };
    if nsn.len() < plan.min_len {
        return Err(ParseError::TooShort);
    }
    let code_len = plan.calling_code.to_string().len();
    if nsn.len() > plan.max_len || code_len + nsn.len() > E164_MAX_DIGITS {
        return Err(ParseError::TooLong);
    }
    if !PATTERNS[idx].is_match(nsn) {
        return Err(ParseError::NotAssigned(plan.calling_code));
    }
    Ok(ParsedNumber {
        calling_code: plan.calling_code,
        national: nsn.to_string(),
        region: plan.region,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_international_hk() {
        let n = parse("+85291234567", "US").unwrap();
        assert_eq!(n.calling_code, 852);
        assert_eq!(n.region, "HK");
        assert_eq!(n.e164(), "+85291234567");
        assert_eq!(n.country_code(), "+852");
    }

    #[test]
    fn test_parse_ignores_whitespace() {
        let n = parse("+852 2013 1384", "HK").unwrap();
        assert_eq!(n.e164(), "+85220131384");
    }

    #[test]
    fn test_parse_national_uses_default_region() {
        let n = parse("91234567", "hk").unwrap();
        assert_eq!(n.e164(), "+85291234567");
    }

    #[test]
    fn test_trunk_prefix_stripped() {
        let n = parse("07911123456", "GB").unwrap();
        assert_eq!(n.e164(), "+447911123456");
        let n = parse("+82 010 2013 1384", "HK").unwrap();
        assert_eq!(n.e164(), "+821020131384");
    }

    #[test]
    fn test_nanp_shares_calling_code() {
        let n = parse("+12025550191", "HK").unwrap();
        assert_eq!(n.calling_code, 1);
        assert_eq!(n.national, "2025550191");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("", "HK"), Err(ParseError::Empty));
        assert_eq!(parse("+", "HK"), Err(ParseError::Empty));
        assert_eq!(parse("+999123456789", "HK"), Err(ParseError::InvalidCountryCode));
        assert_eq!(parse("1234567", "XX"), Err(ParseError::UnknownRegion("XX".into())));
        assert_eq!(parse("+852123", "HK"), Err(ParseError::TooShort));
        assert_eq!(parse("+852912345678", "HK"), Err(ParseError::TooLong));
        assert_eq!(parse("+85212345678", "HK"), Err(ParseError::NotAssigned(852)));
        assert!(matches!(parse("12a45678", "HK"), Err(ParseError::NotANumber(_))));
    }

    #[test]
    fn test_dialing_prefix() {
        assert_eq!(dialing_prefix("HK").as_deref(), Some("+852"));
        assert_eq!(dialing_prefix("ke").as_deref(), Some("+254"));
        assert_eq!(dialing_prefix("ZZ"), None);
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(PATTERNS.len(), PLANS.len());
    }
}
