//! Suite classification and filesystem-safe test names
//!
//! Both functions here are total: every test name maps to exactly one suite
//! and to exactly one (possibly empty) directory name.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Maximum length of a sanitized test name.
pub const MAX_SANITIZED_LEN: usize = 100;

/// Logical grouping of tests inferred from their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suite {
    Authentication,
    Dashboard,
    Administration,
    Validation,
    General,
}

impl Suite {
    /// Ordered classification rules; the first keyword found in the
    /// lower-cased test name decides the suite.
    const RULES: [(&'static str, Suite); 4] = [
        ("login", Suite::Authentication),
        ("dashboard", Suite::Dashboard),
        ("admin", Suite::Administration),
        ("validate", Suite::Validation),
    ];

    /// Directory name of the suite under `suites/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Suite::Authentication => "Authentication",
            Suite::Dashboard => "Dashboard",
            Suite::Administration => "Administration",
            Suite::Validation => "Validation",
            Suite::General => "General",
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a test into a suite by case-insensitive keyword match.
pub fn classify_suite(test_name: &str) -> Suite {
    let lowered = test_name.to_lowercase();
    Suite::RULES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, suite)| *suite)
        .unwrap_or(Suite::General)
}

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9\s_-]").expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Derive a filesystem-safe directory name from a test name.
///
/// Strips everything outside `[A-Za-z0-9 _-]`, collapses whitespace runs to a
/// single underscore, lower-cases and truncates to [`MAX_SANITIZED_LEN`].
/// The result only ever contains `[a-z0-9_-]` and may be empty.
pub fn sanitize_test_name(test_name: &str) -> String {
    let stripped = disallowed_chars().replace_all(test_name, "");
    let mut sanitized = whitespace_runs()
        .replace_all(&stripped, "_")
        .to_ascii_lowercase();
    // Both passes together leave only ASCII, so byte truncation is char-safe.
    sanitized.truncate(MAX_SANITIZED_LEN);
    sanitized
}
