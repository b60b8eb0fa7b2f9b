//! Tenant identifier

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the storefront the current session operates on
/// (e.g. `acme.myshopify.com`).
///
/// Only constructible through [`ShopDomain::parse`], so a value of this
/// type always carries a non-empty store handle followed by the expected
/// domain suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Validate `candidate` against `suffix`.
    ///
    /// Accepts `<handle><suffix>` where the handle is made of ASCII
    /// alphanumerics and hyphens and does not start with a hyphen. The
    /// comparison is case-insensitive and the stored value is lowercased.
    pub fn parse(candidate: &str, suffix: &str) -> Option<Self> {
        let candidate = candidate.trim().to_ascii_lowercase();
        let suffix = suffix.trim().to_ascii_lowercase();
        if suffix.is_empty() {
            return None;
        }

        let handle = candidate.strip_suffix(suffix.as_str())?;
        let valid_handle = !handle.is_empty()
            && !handle.starts_with('-')
            && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

        valid_handle.then_some(Self(candidate))
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
