//! Authentication-related types.
//!
//! The engine only shuttles opaque challenge/response payloads; mechanism
//! semantics (SASL state) live in the caller.

use std::fmt::{Display, Formatter};

use crate::{
    core::{Atom, AtomError},
    secret::Secret,
};

/// Note: Defined by \[SASL\]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// RFC 4616: The PLAIN Simple Authentication and Security Layer (SASL) Mechanism
    Plain,
    /// The (non-standardized) LOGIN SASL mechanism.
    Login,
    Other(Atom),
}

impl From<Atom> for AuthMechanism {
    fn from(atom: Atom) -> Self {
        match atom.as_ref().to_ascii_lowercase().as_str() {
            "plain" => AuthMechanism::Plain,
            "login" => AuthMechanism::Login,
            _ => AuthMechanism::Other(atom),
        }
    }
}

impl TryFrom<&str> for AuthMechanism {
    type Error = AtomError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(Self::from(Atom::try_from(value)?))
    }
}

impl Display for AuthMechanism {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => f.write_str("PLAIN"),
            Self::Login => f.write_str("LOGIN"),
            Self::Other(atom) => f.write_str(atom.as_ref()),
        }
    }
}

/// Data sent by the client in response to a continuation request during an
/// AUTHENTICATE exchange.
///
/// The raw payload is base64-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticateData {
    /// Continue the exchange with the given raw (not yet base64-encoded)
    /// payload.
    Continue(Secret<Vec<u8>>),
    /// Cancel the exchange; wire form `*`.
    Cancel,
}

impl AuthenticateData {
    pub fn r#continue(data: impl Into<Vec<u8>>) -> Self {
        Self::Continue(Secret::new(data.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mechanism_from_atom() {
        assert_eq!(
            AuthMechanism::try_from("plain").unwrap(),
            AuthMechanism::Plain
        );
        assert_eq!(
            AuthMechanism::try_from("LOGIN").unwrap(),
            AuthMechanism::Login
        );
        assert!(matches!(
            AuthMechanism::try_from("GSSAPI").unwrap(),
            AuthMechanism::Other(_)
        ));
        assert!(AuthMechanism::try_from("NO SPACE").is_err());
    }
}
