//! Numeric Value Helpers
//!
//! State components on the numeric side are `f64`. Abstract states must be
//! hashable and comparable for interning, so this module provides a bitwise
//! key: two values are the same state component iff their bit patterns
//! match. Every value in one registry is derived from the task's initial
//! values by the task's own effect arithmetic, so bit identity coincides
//! with semantic identity (and NaN never arises; division by zero is
//! rejected during normalization).

/// Hashable identity key for an `f64` state component.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueKey(u64);

impl From<f64> for ValueKey {
    fn from(v: f64) -> Self {
        ValueKey(v.to_bits())
    }
}

/// Bitwise keys for a whole numeric state vector.
pub fn vector_key(values: &[f64]) -> Vec<ValueKey> {
    values.iter().map(|&v| ValueKey::from(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equality() {
        assert_eq!(ValueKey::from(1.5), ValueKey::from(1.5));
        assert_ne!(ValueKey::from(1.5), ValueKey::from(-1.5));
        // 0.0 and -0.0 are distinct bit patterns, hence distinct keys.
        assert_ne!(ValueKey::from(0.0), ValueKey::from(-0.0));
    }

    #[test]
    fn test_vector_key() {
        let a = vector_key(&[1.0, 2.0]);
        let b = vector_key(&[1.0, 2.0]);
        let c = vector_key(&[2.0, 1.0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
