//! Object path selection.

use std::fmt;

use regex::Regex;

/// Selects object paths in a snapshot.
///
/// Numbered objects (sessions, namespaces, controllers) get their numbers
/// from the daemon, so tests usually select them by prefix or pattern.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// The path must equal the string.
    Exact(String),
    /// The path must start with the string.
    Prefix(String),
    /// The path must match the regular expression.
    Pattern(Regex),
}

impl PathMatcher {
    #[must_use]
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Compiles a regular-expression matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Returns true if `path` is selected.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Prefix(p) => path.starts_with(p.as_str()),
            Self::Pattern(re) => re.is_match(path),
        }
    }
}

impl fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "path {p}"),
            Self::Prefix(p) => write!(f, "paths under {p}"),
            Self::Pattern(re) => write!(f, "paths matching /{}/", re.as_str()),
        }
    }
}

impl From<&str> for PathMatcher {
    fn from(path: &str) -> Self {
        Self::exact(path)
    }
}

impl From<String> for PathMatcher {
    fn from(path: String) -> Self {
        Self::Exact(path)
    }
}
