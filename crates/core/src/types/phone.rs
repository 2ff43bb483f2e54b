//! Messaging phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// The input contains no digits.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input has more digits than E.164 allows.
    #[error("phone number must be at most {max} digits")]
    TooLong {
        /// Maximum allowed number of digits.
        max: usize,
    },
    /// The input contains a character that is neither a digit nor formatting.
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// A phone number in the digits-only international form used by messaging
/// deep links (`5355512345`, no `+`, spaces or dashes).
///
/// ## Constraints
///
/// - Formatting characters (`+`, spaces, `-`, `.`, `(`, `)`) are stripped
/// - At least one digit, at most 15 (E.164 limit)
///
/// ## Examples
///
/// ```
/// use tienda_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+53 5 555-1234").unwrap();
/// assert_eq!(phone.as_str(), "5355551234");
///
/// assert!(PhoneNumber::parse("").is_err());
/// assert!(PhoneNumber::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `PhoneNumber`, dropping formatting characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Contains characters other than digits and formatting
    /// - Has no digits
    /// - Has more than 15 digits
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let mut digits = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '0'..='9' => digits.push(c),
                '+' | ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneNumberError::InvalidCharacter(other)),
            }
        }

        if digits.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        if digits.len() > Self::MAX_DIGITS {
            return Err(PhoneNumberError::TooLong {
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(digits))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
