//! Mailbox-related types.

use crate::core::{AString, IString, LiteralError};

/// A mailbox name.
///
/// `INBOX` is case-insensitive and gets its own variant so that `inbox`,
/// `Inbox`, etc. all compare equal.
///
/// # ABNF definition
///
/// ```abnf
/// mailbox = "INBOX" / astring
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mailbox {
    Inbox,
    Other(AString),
}

impl From<AString> for Mailbox {
    fn from(value: AString) -> Self {
        let is_inbox = match &value {
            AString::Atom(atom) => atom.as_ref().eq_ignore_ascii_case("inbox"),
            AString::String(IString::Quoted(quoted)) => {
                quoted.inner().eq_ignore_ascii_case("inbox")
            }
            AString::String(IString::Literal(_)) => false,
        };

        if is_inbox {
            Self::Inbox
        } else {
            Self::Other(value)
        }
    }
}

impl TryFrom<&str> for Mailbox {
    type Error = LiteralError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("inbox") {
            Ok(Self::Inbox)
        } else {
            Ok(Self::Other(AString::try_from(value)?))
        }
    }
}

impl TryFrom<String> for Mailbox {
    type Error = LiteralError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Literal, Quoted};

    #[test]
    fn test_inbox_is_case_insensitive() {
        assert_eq!(Mailbox::try_from("inbox").unwrap(), Mailbox::Inbox);
        assert_eq!(Mailbox::try_from("InBoX").unwrap(), Mailbox::Inbox);
        assert!(matches!(
            Mailbox::try_from("inbox ").unwrap(),
            Mailbox::Other(_)
        ));
    }

    #[test]
    fn test_other_prefers_quoted() {
        assert_eq!(
            Mailbox::try_from("Sent Items").unwrap(),
            Mailbox::Other(AString::String(IString::Quoted(
                Quoted::try_from("Sent Items").unwrap()
            )))
        );
        assert_eq!(
            Mailbox::try_from("a\nb").unwrap(),
            Mailbox::Other(AString::String(IString::Literal(
                Literal::try_from("a\nb").unwrap()
            )))
        );
    }
}
