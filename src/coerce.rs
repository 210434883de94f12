//! Big integer coercion.
//!
//! JSON has no arbitrary-precision integers, so by default a [`Value::BigInt`]
//! is replaced by its exact base-10 digit string before it reaches the engine.

use crate::Value;

/// Replaces a big integer with its decimal string when `enabled`.
///
/// Every other value, including strings produced by a value transform, is
/// returned unchanged.
///
/// ```rust
/// use num_bigint::BigInt;
/// use serde_cyclic::{coerce, Value};
///
/// let big = Value::from(BigInt::parse_bytes(b"-12345678901234567890123", 10).unwrap());
/// assert_eq!(coerce(big.clone(), true), Value::from("-12345678901234567890123"));
/// assert_eq!(coerce(big.clone(), false), big);
/// ```
#[must_use]
pub fn coerce(value: Value, enabled: bool) -> Value {
    match value {
        Value::BigInt(big) if enabled => Value::String(big.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn test_leaves_other_values_alone() {
        assert_eq!(coerce(Value::from(12), true), Value::from(12));
        assert_eq!(coerce(Value::from("12"), true), Value::from("12"));
        let arr = Value::array(vec![Value::from(BigInt::from(1))]);
        assert!(coerce(arr.clone(), true).ptr_eq(&arr));
    }

    #[test]
    fn test_same_digits_every_time() {
        let big = BigInt::parse_bytes(b"12345678901234567891234567890123456789", 10).unwrap();
        let first = coerce(Value::from(big.clone()), true);
        let second = coerce(Value::from(big), true);
        assert_eq!(first, second);
        assert_eq!(first.as_str(), Some("12345678901234567891234567890123456789"));
    }
}
