//! Configuration options for serialization.
//!
//! - [`StringifyOptions`]: main configuration struct
//! - [`Space`]: indentation of the JSON output
//!
//! ## Examples
//!
//! ```rust
//! use serde_cyclic::{to_string_with_options, Space, StringifyOptions, Value};
//!
//! let data = Value::object(vec![("x", Value::from(1))]);
//!
//! let options = StringifyOptions::new().with_space(Space::Indent(4));
//! let json = to_string_with_options(&data, options).unwrap();
//! assert_eq!(json, "{\n    \"x\": 1\n}");
//! ```

/// Maximum indentation width; wider settings are clamped.
pub const MAX_INDENT: usize = 10;

/// Indentation of the JSON output.
///
/// A width of zero or an empty string produces compact output.
///
/// ```rust
/// use serde_cyclic::Space;
///
/// assert_eq!(Space::Indent(2).indent(), Some("  ".to_string()));
/// assert_eq!(Space::Indent(0).indent(), None);
/// assert_eq!(Space::Indent(40).indent().map(|s| s.len()), Some(10));
/// assert_eq!(Space::Text("\t".into()).indent(), Some("\t".to_string()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Space {
    #[default]
    None,
    /// Indent each level by this many spaces (at most [`MAX_INDENT`]).
    Indent(usize),
    /// Indent each level by this text (its first [`MAX_INDENT`] characters).
    Text(String),
}

impl Space {
    /// The per-level indentation string, or `None` for compact output.
    #[must_use]
    pub fn indent(&self) -> Option<String> {
        let indent = match self {
            Space::None => return None,
            Space::Indent(width) => " ".repeat((*width).min(MAX_INDENT)),
            Space::Text(text) => text.chars().take(MAX_INDENT).collect(),
        };
        if indent.is_empty() {
            None
        } else {
            Some(indent)
        }
    }
}

impl From<usize> for Space {
    fn from(width: usize) -> Self {
        Space::Indent(width)
    }
}

impl From<&str> for Space {
    fn from(text: &str) -> Self {
        Space::Text(text.to_string())
    }
}

/// Configuration options for cycle-safe serialization.
///
/// ```rust
/// use serde_cyclic::{Space, StringifyOptions};
///
/// let options = StringifyOptions::new();
/// assert!(options.coerce_bigints);
/// assert_eq!(options.space, Space::None);
///
/// let options = StringifyOptions::pretty().with_coerce_bigints(false);
/// assert_eq!(options.space, Space::Indent(2));
/// assert!(!options.coerce_bigints);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringifyOptions {
    pub space: Space,
    pub coerce_bigints: bool,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        StringifyOptions {
            space: Space::None,
            coerce_bigints: true,
        }
    }
}

impl StringifyOptions {
    /// Creates default options (compact output, big integers as strings).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for output indented by two spaces per level.
    #[must_use]
    pub fn pretty() -> Self {
        StringifyOptions {
            space: Space::Indent(2),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_space(mut self, space: impl Into<Space>) -> Self {
        self.space = space.into();
        self
    }

    /// Chooses whether big integers are rendered as decimal strings.
    ///
    /// When disabled, a big integer reaching the encoder fails the whole call.
    #[must_use]
    pub fn with_coerce_bigints(mut self, coerce: bool) -> Self {
        self.coerce_bigints = coerce;
        self
    }
}
