//! Error types for cycle-safe serialization.
//!
//! ## Error Categories
//!
//! - **Caller faults**: errors returned by a value transform or a cycle sentinel
//!   producer. These are handed back to the caller exactly as they were returned.
//! - **Unsupported values**: values the JSON engine cannot represent, such as a
//!   big integer that reached it with coercion disabled.
//! - **Engine / I/O errors**: failures reported by `serde_json` or by the writer.
//!
//! The identity tracking itself has no failure path.
//!
//! ## Examples
//!
//! ```rust
//! use serde_cyclic::{to_string_with_options, StringifyOptions, Value};
//! use num_bigint::BigInt;
//!
//! let value = Value::from(BigInt::from(7));
//! let options = StringifyOptions::new().with_coerce_bigints(false);
//! assert!(to_string_with_options(&value, options).is_err());
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur during serialization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during writing
    #[error("IO error: {0}")]
    Io(String),

    /// Error reported by the JSON engine
    #[error("JSON error: {0}")]
    Json(String),

    /// Value that the JSON engine refuses to encode
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an unsupported type error for values that cannot be encoded as JSON.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// This is the usual way for a value transform or sentinel producer to fail.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_cyclic::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for writer failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates an engine error, such as a cycle handed to the encoder directly.
    pub fn json(msg: &str) -> Self {
        Error::Json(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.to_string())
        } else {
            Error::Json(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::unsupported_type("BigInt").to_string(),
            "Unsupported type: BigInt"
        );
        assert_eq!(Error::custom("boom").to_string(), "Error: boom");
        assert_eq!(Error::io("closed").to_string(), "IO error: closed");
        assert_eq!(Error::json("loop").to_string(), "JSON error: loop");
    }

    #[test]
    fn test_ser_error_custom() {
        let err = <Error as serde::ser::Error>::custom("bad");
        assert_eq!(err, Error::Custom("bad".to_string()));
    }
}
