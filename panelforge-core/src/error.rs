//! The crate's error type.
//!

use crate::texts::get_text;
use std::fmt::Display;

/// Grabbed from the [PosgreSQL docs
/// ](https://www.postgresql.org/docs/current/errcodes-appendix.html). The
/// actual SQLSTATE standard is not open source?
///
pub const SQLSTATE_FOREIGN_KEY_VIOLATION: &'static str = "23503";

/// Grabbed from the [PosgreSQL docs
/// ](https://www.postgresql.org/docs/current/errcodes-appendix.html). The
/// actual SQLSTATE standard is not open source?
///
pub const SQLSTATE_UNIQUE_VIOLATION: &'static str = "23505";

/// `Result` with the error type fixed to [`Error`](enum.Error.html).
///
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of error kinds the core can surface to a caller.
///
/// The implementation of `Display` converts the error texts to a format
/// suitable as keys for [localization](../texts/index.html). There is also a
/// [`localize()`](#method.localize) method that performs the actual
/// translation.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// `Use()` called with no adapter registered or no configuration set.
    /// Fatal at boot.
    ///
    ConfigurationMissing(String),

    /// The host application object handed to `SetApp` is not of the type the
    /// adapter expects. Fatal at boot.
    ///
    AdapterTypeMismatch(String),

    /// `SetContext` was called with a host request of the wrong type. A
    /// programming error, fatal per request.
    ///
    ContextTypeMismatch(String),

    /// The CSRF-like form token is missing or stale.
    ///
    TokenInvalid(String),

    /// A required parameter is missing, or has the wrong shape.
    ///
    ParameterInvalid(String),

    /// No valid session is present where one is required.
    ///
    AuthRequired(String),

    /// Credentials presented at `/signin` did not check out.
    ///
    AuthFailed(String),

    /// A table, row, or menu entry referenced by id does not exist.
    ///
    NotFound(String),

    /// The database backing a `Connection` failed while reading or writing.
    ///
    PersistenceError(DatabaseError),

    /// Unspecified error, for adapter-specific wrapping.
    ///
    Other(String),
}

impl Error {
    /// Create an `Error::PersistenceError`.
    ///
    pub fn persistence<T: Display>(sqlstate: Option<&str>, text: T) -> Self {
        Self::PersistenceError(DatabaseError {
            sqlstate: sqlstate.map(|c| c.to_string()),
            text: text.to_string(),
        })
    }

    /// The variant is [`PersistenceError`](#variant.PersistenceError) and the
    /// database error code is `sqlstate`.
    ///
    pub fn is_persistence_error(&self, sqlstate: &str) -> bool {
        match self {
            Error::PersistenceError(de) => {
                de.sqlstate.as_ref().map(|s| s == sqlstate).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// The variant is [`PersistenceError`](#variant.PersistenceError) with
    /// `SQLSTATE 23503`.
    ///
    pub fn is_foreign_key_violation(&self) -> bool {
        self.is_persistence_error(SQLSTATE_FOREIGN_KEY_VIOLATION)
    }

    /// The variant is [`PersistenceError`](#variant.PersistenceError) with
    /// `SQLSTATE 23505`.
    ///
    pub fn is_unique_violation(&self) -> bool {
        self.is_persistence_error(SQLSTATE_UNIQUE_VIOLATION)
    }

    /// Like [`to_string()`](#method.to_string), but [localizes
    /// ](../texts/index.html) the texts before collecting them in a string.
    ///
    pub fn localize(&self) -> String {
        self.format(true).join("\n")
    }

    /// Returns the *second* line of the formatted error (the part naming the
    /// offending value), localized if `localize`. Falls back to the first
    /// line if there is only one.
    ///
    pub fn one_liner(&self, localize: bool) -> String {
        let lines = self.format(localize);
        match lines.len() {
            0 => String::new(),
            1 => lines[0].clone(),
            _ => lines[1].clone(),
        }
    }

    /// Create an `Error::Other`.
    ///
    pub fn other<T: Display>(text: T) -> Self {
        Self::Other(text.to_string())
    }

    /// Create an `Error::NotFound`.
    ///
    pub fn not_found<T: Display>(text: T) -> Self {
        Self::NotFound(text.to_string())
    }

    /// Create an `Error::ParameterInvalid`.
    ///
    pub fn parameter_invalid<T: Display>(text: T) -> Self {
        Self::ParameterInvalid(text.to_string())
    }

    /// Like [`to_string()`](#method.to_string), but the lines are not joined.
    ///
    pub fn to_strings(&self) -> Vec<String> {
        self.format(false)
    }

    // --- private -----------------------------------------------------------

    fn variant_name(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "ConfigurationMissing",
            Self::AdapterTypeMismatch(_) => "AdapterTypeMismatch",
            Self::ContextTypeMismatch(_) => "ContextTypeMismatch",
            Self::TokenInvalid(_) => "TokenInvalid",
            Self::ParameterInvalid(_) => "ParameterInvalid",
            Self::AuthRequired(_) => "AuthRequired",
            Self::AuthFailed(_) => "AuthFailed",
            Self::NotFound(_) => "NotFound",
            Self::PersistenceError(_) => "PersistenceError",
            Self::Other(_) => "Other",
        }
    }

    fn format_variant(var: &str) -> String {
        format!("error--{}", var)
    }

    fn format_error(var: &str, err: &str) -> String {
        format!("error--{}--{}", var, err)
    }

    fn format(&self, localize: bool) -> Vec<String> {
        use v_htmlescape::escape;

        let variant = self.variant_name();
        let text = match self {
            Self::PersistenceError(DatabaseError { sqlstate, text }) => {
                let prefix = sqlstate
                    .as_ref()
                    .map(|ss| format!("{}--", ss))
                    .unwrap_or_default();
                prefix + text
            }
            Self::ConfigurationMissing(t)
            | Self::AdapterTypeMismatch(t)
            | Self::ContextTypeMismatch(t)
            | Self::TokenInvalid(t)
            | Self::ParameterInvalid(t)
            | Self::AuthRequired(t)
            | Self::AuthFailed(t)
            | Self::NotFound(t)
            | Self::Other(t) => t.clone(),
        };
        let mut texts =
            vec![Self::format_variant(variant), Self::format_error(variant, &text)];
        let result = texts.drain(..).map(|err| {
            escape(&if localize { get_text(&err, &[]) } else { err }).to_string()
        });
        if localize {
            result.filter(|s| !s.is_empty()).collect()
        } else {
            result.collect()
        }
    }
}

/// Check for an error variant, optionally with its wrapped text.
/// ```
/// use panelforge_core::{is_error, Error};
///
/// assert!(is_error!(Error::not_found("manager/1"), NotFound));
/// assert!(is_error!(Error::not_found("manager/1"), NotFound("manager/1")));
/// assert!(!is_error!(Error::not_found("manager/1"), AuthRequired));
/// ```
#[macro_export]
macro_rules! is_error {
    ( $error:expr, $variant:ident $( , )? ) => {
        match $error {
            $crate::Error::$variant(_) => true,
            _ => false,
        }
    };
    ( $error:expr, $variant:ident ( $text:expr ) $( , )? ) => {
        match $error {
            $crate::Error::$variant(t) => t == $text,
            _ => false,
        }
    };
}

/// Simplify mapping another error type to this one.
///
/// Requires `$variant` to be one of the single-string-payload variants:
/// `ConfigurationMissing`, `AdapterTypeMismatch`, `ContextTypeMismatch`,
/// `TokenInvalid`, `ParameterInvalid`, `AuthRequired`, `AuthFailed`,
/// `NotFound`, `Other`.
///
#[macro_export]
macro_rules! map_error {
    ($variant: ident, $result: expr $( , )? ) => {
        ($result).map_err(|e| $crate::Error::$variant(e.to_string()))
    };
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.format(false).join("\n"))
    }
}

/// Create an `Error::Other`.
///
impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

/// Create an `Error::Other`.
///
impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// The contents of the [error](enum.Error.html) variant [`PersistenceError`
/// ](enum.Error.html#variant.PersistenceError).
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatabaseError {
    /// Code according to the `SQLSTATE` standard.
    ///
    pub sqlstate: Option<String>,
    /// Error text as received from the database driver.
    ///
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_variant_and_text() {
        assert_eq!(
            Error::not_found("manager/1").to_string(),
            "error--NotFound\nerror--NotFound--manager/1",
        );
        assert_eq!(
            Error::persistence(Some("23505"), "duplicate key").to_string(),
            "error--PersistenceError\nerror--PersistenceError--23505--duplicate key",
        );
    }

    #[test]
    fn sqlstate_predicates() {
        let unique = Error::persistence(Some(SQLSTATE_UNIQUE_VIOLATION), "dup");
        assert!(unique.is_unique_violation());
        assert!(!unique.is_foreign_key_violation());
    }
}
