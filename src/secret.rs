//! Secret values, e.g., passwords and authentication data.

use std::fmt::{Debug, Formatter};

use subtle::ConstantTimeEq;

use crate::core::IString;

/// A wrapper to ensure that secrets are neither logged nor compared in
/// non-constant time.
///
/// `Debug` prints the inner value in builds with `debug_assertions` only;
/// release builds print `/* REDACTED */`.
#[derive(Clone)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    /// Create a new secret.
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Expose the inner secret (opting-out of all guarantees).
    pub fn declassify(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> PartialEq for Secret<T>
where
    T: CompareCT<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.0.compare_ct(&other.0)
    }
}

impl<T> Eq for Secret<T> where T: CompareCT<T> {}

impl<T> Debug for Secret<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        #[cfg(not(debug_assertions))]
        return write!(f, "/* REDACTED */");
        #[cfg(debug_assertions)]
        return self.0.fmt(f);
    }
}

/// Constant-time comparison.
pub trait CompareCT<T> {
    #[must_use]
    fn compare_ct(&self, other: &T) -> bool;
}

impl<T> CompareCT<T> for Vec<u8>
where
    T: AsRef<[u8]>,
{
    fn compare_ct(&self, other: &T) -> bool {
        self.as_slice().ct_eq(other.as_ref()).unwrap_u8() == 1
    }
}

impl CompareCT<IString> for IString {
    fn compare_ct(&self, other: &IString) -> bool {
        // The wire representation is not part of the secret, compare the raw
        // values.
        self.as_bytes().ct_eq(other.as_bytes()).unwrap_u8() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare() {
        let lhs = Secret::new(b"alice".to_vec());
        let rhs = Secret::new(b"alice".to_vec());
        assert_eq!(lhs, rhs);

        let rhs = Secret::new(b"bob".to_vec());
        assert_ne!(lhs, rhs);
    }

    #[test]
    fn test_debug_in_tests_shows_value() {
        // Tests run with `debug_assertions`, thus, the value is visible.
        let secret = Secret::new(b"pass".to_vec());
        assert!(format!("{secret:?}").contains("112"));
    }
}
