//! Version types for semantic versioning support.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Matches the first `major[.minor[.patch]]` run of digits in a string.
static COERCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{1,16})(?:\.(\d{1,16}))?(?:\.(\d{1,16}))?(?:$|[^\d])")
        .expect("coerce pattern should compile")
});

/// Error types for version operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),

    #[error("This filename doesn't match the required format 'v0.0.0__description', please provide {missing} for: {filename}")]
    InvalidFilenameFormat { filename: String, missing: &'static str },
}

/// Represents a semantic version (major.minor.patch).
///
/// Field order matters: the derived ordering compares major, then minor,
/// then patch.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    /// Create a new SemVer instance.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a strict version string (e.g., "1.2.3") into a SemVer.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::InvalidFormat(s.to_string()));
        }

        let component = |part: &str| {
            part.parse::<u64>()
                .map_err(|_| VersionError::InvalidFormat(s.to_string()))
        };

        Ok(Self::new(
            component(parts[0])?,
            component(parts[1])?,
            component(parts[2])?,
        ))
    }

    /// Leniently extract a version from arbitrary text.
    ///
    /// The first run of up to three dot-separated numbers wins and missing
    /// components default to zero, so `v0` becomes `0.0.0` and `0.1` becomes
    /// `0.1.0`, and timestamp tokens like `v202401011200` stay whole. Returns
    /// `None` when no component of at most 16 digits is present.
    pub fn coerce(s: &str) -> Option<Self> {
        let captures = COERCE_PATTERN.captures(s)?;

        let component = |index: usize| -> Option<u64> {
            match captures.get(index) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };

        Some(Self::new(component(1)?, component(2)?, component(3)?))
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for SemVer {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semver_parse_valid() {
        let v = SemVer::parse("1.2.3").unwrap();
        assert_eq!(v, SemVer::new(1, 2, 3));
    }

    #[test]
    fn test_semver_parse_invalid_format() {
        assert!(SemVer::parse("1.2").is_err());
        assert!(SemVer::parse("1").is_err());
        assert!(SemVer::parse("1.2.3.4").is_err());
        assert!(SemVer::parse("").is_err());
        assert!(SemVer::parse("a.b.c").is_err());
    }

    #[test]
    fn test_coerce_partial_versions() {
        assert_eq!(SemVer::coerce("v0"), Some(SemVer::new(0, 0, 0)));
        assert_eq!(SemVer::coerce("0.1"), Some(SemVer::new(0, 1, 0)));
        assert_eq!(SemVer::coerce("v0.1"), Some(SemVer::new(0, 1, 0)));
        assert_eq!(SemVer::coerce("v1.2.3"), Some(SemVer::new(1, 2, 3)));
        assert_eq!(SemVer::coerce("20240101"), Some(SemVer::new(20240101, 0, 0)));
    }

    #[test]
    fn test_coerce_ignores_suffixes() {
        assert_eq!(SemVer::coerce("v1.2.3-beta"), Some(SemVer::new(1, 2, 3)));
        assert_eq!(SemVer::coerce("1.2.3.4"), Some(SemVer::new(1, 2, 3)));
        assert_eq!(SemVer::coerce("release-2"), Some(SemVer::new(2, 0, 0)));
    }

    #[test]
    fn test_coerce_rejects_text_without_numbers() {
        assert_eq!(SemVer::coerce("vX"), None);
        assert_eq!(SemVer::coerce(""), None);
        assert_eq!(SemVer::coerce("README"), None);
    }

    #[test]
    fn test_coerce_accepts_timestamp_versions() {
        assert_eq!(
            SemVer::coerce("v202401011200"),
            Some(SemVer::new(202401011200, 0, 0))
        );
        assert_eq!(
            SemVer::coerce("v9999999999999999"),
            Some(SemVer::new(9999999999999999, 0, 0))
        );
    }

    #[test]
    fn test_coerce_rejects_components_over_sixteen_digits() {
        assert_eq!(SemVer::coerce("12345678901234567"), None);
        assert_eq!(SemVer::coerce("v1.12345678901234567"), None);
    }

    #[test]
    fn test_semver_display() {
        assert_eq!(SemVer::new(1, 2, 3).to_string(), "1.2.3");
    }

    #[test]
    fn test_semver_ordering() {
        let mut versions = vec![
            SemVer::new(2, 0, 0),
            SemVer::new(0, 1, 0),
            SemVer::new(1, 0, 10),
            SemVer::new(1, 0, 9),
        ];
        versions.sort();

        assert_eq!(versions[0], SemVer::new(0, 1, 0));
        assert_eq!(versions[1], SemVer::new(1, 0, 9));
        assert_eq!(versions[2], SemVer::new(1, 0, 10));
        assert_eq!(versions[3], SemVer::new(2, 0, 0));
    }
}
