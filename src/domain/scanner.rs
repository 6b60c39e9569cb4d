//! File scanner: pulls one candidate number out of each line of free text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Runs of phone-ish characters (digits and common separators), 7+ long.
static RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9\-().\s+]{7,}").expect("Failed to compile phone run regex"));

const COMMENT_MARKERS: &[&str] = &["#", "//"];

/// A candidate substring and the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub line: usize,
    pub text: String,
}

/// Line scanner. Pure: scanning the same lines twice yields the same candidates.
#[derive(Debug, Clone, Copy)]
pub struct FileScanner {
    min_digits: usize,
}

impl Default for FileScanner {
    fn default() -> Self {
        Self { min_digits: 7 }
    }
}

impl FileScanner {
    pub fn new(min_digits: usize) -> Self {
        Self { min_digits }
    }

    /// Lazily yields one candidate per usable line. Blank lines, comments,
    /// labels/headers and lines without a long enough run are skipped.
    pub fn scan<I, S>(&self, lines: I) -> impl Iterator<Item = Candidate>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scanner = *self;
        lines
            .into_iter()
            .enumerate()
            .filter_map(move |(idx, line)| {
                scanner.extract(line.as_ref()).map(|text| Candidate {
                    line: idx + 1,
                    text,
                })
            })
    }

    /// Candidate for a single line, if any.
    pub fn extract(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() || COMMENT_MARKERS.iter().any(|m| line.starts_with(m)) {
            return None;
        }
        if line.chars().any(char::is_alphabetic) && !self.looks_like_phone(line) {
            return None;
        }
        let mut best: Option<&str> = None;
        for m in RUN_RE.find_iter(line) {
            if best.is_none_or(|b| m.as_str().len() > b.len()) {
                best = Some(m.as_str());
            }
        }
        best.map(str::trim)
            .filter(|s| s.chars().any(|c| c.is_ascii_digit()))
            .map(String::from)
    }

    fn looks_like_phone(&self, text: &str) -> bool {
        text.chars().filter(|c| c.is_ascii_digit()).count() >= self.min_digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_comments_and_headers() {
        let lines = [
            "",
            "# exported numbers",
            "// another comment",
            "Phone Numbers",
            "9123 4567",
        ];
        let got: Vec<Candidate> = FileScanner::default().scan(lines).collect();
        assert_eq!(
            got,
            vec![Candidate {
                line: 5,
                text: "9123 4567".into()
            }]
        );
    }

    #[test]
    fn test_label_with_number_keeps_longest_run() {
        let s = FileScanner::default();
        assert_eq!(
            s.extract("John: +1 (202) 555-0191, ext 12").as_deref(),
            Some("+1 (202) 555-0191")
        );
    }

    #[test]
    fn test_tie_keeps_first_run() {
        let s = FileScanner::default();
        assert_eq!(
            s.extract("1234567 x 7654321").as_deref(),
            Some("1234567")
        );
    }

    #[test]
    fn test_short_runs_dropped() {
        let s = FileScanner::default();
        assert_eq!(s.extract("12-34"), None);
        assert_eq!(s.extract("room 12 floor 3"), None);
    }

    #[test]
    fn test_scan_is_restartable() {
        let lines = vec!["91234567", "junk", "+852 6123 4567"];
        let s = FileScanner::default();
        let a: Vec<_> = s.scan(&lines).collect();
        let b: Vec<_> = s.scan(&lines).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[1].line, 3);
    }
}
