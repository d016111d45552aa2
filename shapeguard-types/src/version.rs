//! Simplified semantic versions used to gate upgrades.
//!
//! Only the major.minor.patch triple takes part in ordering. Prerelease and
//! build metadata are not understood: a component contributes its leading
//! decimal digits, and anything else (including a missing component) is 0.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A version as a comparable `(major, minor, patch)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct SchemaVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SchemaVersion {
    /// Creates a version from its three components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a version string leniently. Never fails.
    ///
    /// `"2"` is `2.0.0`, `"1.x.3"` is `1.0.3`, `"1.2.3-beta"` is `1.2.3`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = s.trim().split('.').map(leading_number);
        let major = parts.next().unwrap_or(0);
        let minor = parts.next().unwrap_or(0);
        let patch = parts.next().unwrap_or(0);
        Self::new(major, minor, patch)
    }

    /// Returns true if `self` is strictly older than `other`.
    #[must_use]
    pub fn is_older_than(&self, other: &SchemaVersion) -> bool {
        self < other
    }
}

fn leading_number(component: &str) -> u64 {
    let digits: String = component
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for SchemaVersion {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for SchemaVersion {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<SchemaVersion> for String {
    fn from(v: SchemaVersion) -> Self {
        v.to_string()
    }
}
