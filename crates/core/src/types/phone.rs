//! Sri Lankan phone numbers and postal codes.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Trunk prefix `0`, or country code `94` with or without `+`, followed by a
/// nine digit subscriber number that does not start with `0`.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+94|94|0)([1-9][0-9]{8})$").expect("phone pattern is a valid regex")
});

static POSTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("postal pattern is a valid regex"));

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("enter a Sri Lankan number such as 0771234567 or +94771234567")]
    InvalidFormat,
}

/// A Sri Lankan phone number, stored in `+94XXXXXXXXX` form.
///
/// Spaces, dashes and parentheses are ignored when parsing.
///
/// ```
/// use rigbay_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("077 123-4567").unwrap();
/// assert_eq!(phone.as_str(), "+94771234567");
/// assert!(phone.is_mobile());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] for blank input and
    /// [`PhoneError::InvalidFormat`] for anything that is not a Sri Lankan number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let cleaned: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '\t'))
            .collect();
        if cleaned.is_empty() {
            return Err(PhoneError::Empty);
        }

        let subscriber = PHONE_RE
            .captures(&cleaned)
            .and_then(|caps| caps.get(1))
            .ok_or(PhoneError::InvalidFormat)?;

        Ok(Self(format!("+94{}", subscriber.as_str())))
    }

    /// The normalized `+94` form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The national form with trunk prefix, e.g. `0771234567`.
    #[must_use]
    pub fn national(&self) -> String {
        format!("0{}", self.0.trim_start_matches("+94"))
    }

    /// Mobile numbers start with `7` after the country code.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        self.0.starts_with("+947")
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    #[error("postal code cannot be empty")]
    Empty,
    #[error("postal code must be 5 digits")]
    InvalidFormat,
}

/// A Sri Lankan postal code (five digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse a postal code.
    ///
    /// # Errors
    ///
    /// Returns an error unless the trimmed input is exactly five ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PostalCodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PostalCodeError::Empty);
        }
        if !POSTAL_RE.is_match(s) {
            return Err(PostalCodeError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = PostalCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_accepts_local_and_international_forms() {
        for input in ["0771234567", "+94771234567", "94771234567", "+94 77 123 4567"] {
            let phone = PhoneNumber::parse(input).unwrap();
            assert_eq!(phone.as_str(), "+94771234567", "input {input}");
        }
    }

    #[test]
    fn test_phone_landline() {
        let phone = PhoneNumber::parse("011-2345678").unwrap();
        assert_eq!(phone.as_str(), "+94112345678");
        assert_eq!(phone.national(), "0112345678");
        assert!(!phone.is_mobile());
    }

    #[test]
    fn test_phone_rejects_bad_numbers() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::parse(" - "), Err(PhoneError::Empty));
        for input in ["077123456", "07712345678", "+1 555 123 4567", "0071234567", "07712a4567"] {
            assert_eq!(
                PhoneNumber::parse(input),
                Err(PhoneError::InvalidFormat),
                "input {input}"
            );
        }
    }

    #[test]
    fn test_postal_code() {
        assert_eq!(PostalCode::parse(" 10350 ").unwrap().as_str(), "10350");
        assert_eq!(PostalCode::parse(""), Err(PostalCodeError::Empty));
        assert_eq!(PostalCode::parse("1035"), Err(PostalCodeError::InvalidFormat));
        assert_eq!(PostalCode::parse("103500"), Err(PostalCodeError::InvalidFormat));
        assert_eq!(PostalCode::parse("1O350"), Err(PostalCodeError::InvalidFormat));
    }
}
