//! Flag-related types.
//!
//! These only appear on the parsing side of this crate: the command subset
//! does not carry flag arguments, but FLAGS responses, PERMANENTFLAGS codes,
//! and unsolicited FETCH flag updates do.

use crate::core::Atom;

/// `flag = "\Answered" / "\Flagged" / "\Deleted" / "\Seen" / "\Draft" / flag-keyword / flag-extension`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    Answered,
    Deleted,
    Draft,
    Flagged,
    Seen,
    /// Keyword flag, e.g., `$Forwarded`.
    Keyword(Atom),
    /// `flag-extension = "\" atom`
    Extension(Atom),
}

impl Flag {
    /// Resolves a backslash-prefixed flag name.
    pub(crate) fn system(atom: Atom) -> Self {
        match atom.as_ref().to_ascii_lowercase().as_str() {
            "answered" => Self::Answered,
            "deleted" => Self::Deleted,
            "draft" => Self::Draft,
            "flagged" => Self::Flagged,
            "seen" => Self::Seen,
            _ => Self::Extension(atom),
        }
    }
}

/// `flag-fetch = flag / "\Recent"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagFetch {
    Flag(Flag),
    Recent,
}

/// `flag-perm = flag / "\*"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagPerm {
    Flag(Flag),
    /// The client can create new keyword flags.
    Asterisk,
}

/// `mbx-list-flags`, i.e., the name attributes in LIST/LSUB responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagNameAttribute {
    Noinferiors,
    Noselect,
    Marked,
    Unmarked,
    Extension(Atom),
}

impl From<Atom> for FlagNameAttribute {
    fn from(atom: Atom) -> Self {
        match atom.as_ref().to_ascii_lowercase().as_str() {
            "noinferiors" => Self::Noinferiors,
            "noselect" => Self::Noselect,
            "marked" => Self::Marked,
            "unmarked" => Self::Unmarked,
            _ => Self::Extension(atom),
        }
    }
}
