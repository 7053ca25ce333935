//! Coupon code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CouponCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CouponCodeError {
    /// The input string is empty.
    #[error("coupon code cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("coupon code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters outside `A-Z0-9`.
    #[error("coupon code may only contain uppercase letters and digits")]
    InvalidCharacter,
}

/// A coupon code.
///
/// Codes are uppercase alphanumeric strings, e.g. `GIFT7K2QZ4`. Input is
/// trimmed and uppercased before validation so that user-typed codes match
/// regardless of case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    /// Maximum length of a coupon code.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `CouponCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains characters other than ASCII
    /// letters and digits.
    pub fn parse(s: &str) -> Result<Self, CouponCodeError> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(CouponCodeError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(CouponCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return Err(CouponCodeError::InvalidCharacter);
        }

        Ok(Self(s))
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CouponCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let code = CouponCode::parse("GIFT7K2QZ4").unwrap();
        assert_eq!(code.as_str(), "GIFT7K2QZ4");
    }

    #[test]
    fn test_parse_uppercases() {
        let code = CouponCode::parse(" gift7k2qz4 ").unwrap();
        assert_eq!(code.as_str(), "GIFT7K2QZ4");
    }

    #[test]
    fn test_parse_rejects_empty_and_symbols() {
        assert!(matches!(CouponCode::parse(""), Err(CouponCodeError::Empty)));
        assert!(matches!(
            CouponCode::parse("GIFT-10"),
            Err(CouponCodeError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "A".repeat(40);
        assert!(matches!(
            CouponCode::parse(&long),
            Err(CouponCodeError::TooLong { .. })
        ));
    }
}
