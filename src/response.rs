//! Server responses.

use std::num::NonZeroU32;

use crate::{
    auth::AuthMechanism,
    core::{Atom, QuotedChar, Tag, Text},
    flag::{Flag, FlagFetch, FlagNameAttribute, FlagPerm},
    mailbox::Mailbox,
    status::StatusDataItem,
};

/// Response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Status responses can be tagged or untagged. Tagged status responses
    /// indicate the completion result (OK, NO, or BAD status) of a client
    /// command, and have a tag matching the command.
    Status(Status),
    /// All server data is untagged. An untagged response is indicated by the
    /// token "*" instead of a tag.
    Data(Data),
    /// Command continuation request responses use the token "+" instead of a
    /// tag. These responses are sent by the server to indicate acceptance of
    /// an incomplete client command and readiness for the remainder of the
    /// command.
    ContinuationRequest(ContinuationRequest),
}

/// Status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Untagged(StatusBody),
    Tagged(Tagged),
    Bye(Bye),
}

impl Status {
    pub fn new<T>(
        tag: Option<Tag>,
        kind: StatusKind,
        code: Option<Code>,
        text: T,
    ) -> Result<Self, T::Error>
    where
        T: TryInto<Text>,
    {
        let body = StatusBody {
            kind,
            code,
            text: text.try_into()?,
        };

        match tag {
            Some(tag) => Ok(Self::Tagged(Tagged { tag, body })),
            None => Ok(Self::Untagged(body)),
        }
    }

    pub fn ok<T>(tag: Option<Tag>, code: Option<Code>, text: T) -> Result<Self, T::Error>
    where
        T: TryInto<Text>,
    {
        Self::new(tag, StatusKind::Ok, code, text)
    }

    pub fn no<T>(tag: Option<Tag>, code: Option<Code>, text: T) -> Result<Self, T::Error>
    where
        T: TryInto<Text>,
    {
        Self::new(tag, StatusKind::No, code, text)
    }

    pub fn bad<T>(tag: Option<Tag>, code: Option<Code>, text: T) -> Result<Self, T::Error>
    where
        T: TryInto<Text>,
    {
        Self::new(tag, StatusKind::Bad, code, text)
    }

    pub fn bye<T>(code: Option<Code>, text: T) -> Result<Self, T::Error>
    where
        T: TryInto<Text>,
    {
        Ok(Self::Bye(Bye {
            code,
            text: text.try_into()?,
        }))
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            Self::Tagged(Tagged { tag, .. }) => Some(tag),
            _ => None,
        }
    }
}

/// Status body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBody {
    pub kind: StatusKind,
    /// Response code (optional).
    pub code: Option<Code>,
    /// Human-readable text that MAY be displayed to the user.
    pub text: Text,
}

/// Status kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ok,
    No,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged {
    pub tag: Tag,
    pub body: StatusBody,
}

/// Indicates that the server is about to close the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bye {
    pub code: Option<Code>,
    pub text: Text,
}

/// A response code.
///
/// The typed variants are the codes a client core reacts to; everything else
/// is preserved verbatim in [`Code::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    /// `ALERT`
    Alert,
    /// `CAPABILITY`
    Capability(Vec<Capability>),
    /// `PARSE`
    Parse,
    /// `PERMANENTFLAGS`
    PermanentFlags(Vec<FlagPerm>),
    /// `READ-ONLY`
    ReadOnly,
    /// `READ-WRITE`
    ReadWrite,
    /// `TRYCREATE`
    TryCreate,
    /// `UIDNEXT`
    UidNext(NonZeroU32),
    /// `UIDVALIDITY`
    UidValidity(NonZeroU32),
    /// `UNSEEN`
    Unseen(NonZeroU32),
    /// An unknown code, preserved byte-for-byte.
    Other(CodeOther),
}

/// An (unknown) code.
///
/// It's raw and not validated, i.e., it could contain invalid data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOther(Vec<u8>);

impl CodeOther {
    pub(crate) fn new(inner: Vec<u8>) -> Self {
        Self(inner)
    }

    pub fn inner(&self) -> &[u8] {
        &self.0
    }
}

/// A capability advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Imap4Rev1,
    Auth(AuthMechanism),
    /// RFC 2177 IDLE.
    Idle,
    /// RFC 7888 non-synchronising literals.
    ///
    /// Recognised so that callers can see it, but the engine always emits
    /// synchronising literals.
    LiteralPlus,
    Other(Atom),
}

impl From<Atom> for Capability {
    fn from(atom: Atom) -> Self {
        match atom.as_ref().to_ascii_uppercase().as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IDLE" => Self::Idle,
            "LITERAL+" => Self::LiteralPlus,
            upper => match upper.strip_prefix("AUTH=") {
                Some(mechanism) => match Atom::try_from(mechanism.to_owned()) {
                    Ok(mechanism) => Self::Auth(AuthMechanism::from(mechanism)),
                    Err(_) => Self::Other(atom),
                },
                None => Self::Other(atom),
            },
        }
    }
}

/// Server and mailbox status data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* LIST ...`
    List {
        items: Vec<FlagNameAttribute>,
        delimiter: Option<QuotedChar>,
        mailbox: Mailbox,
    },
    /// `* LSUB ...`
    Lsub {
        items: Vec<FlagNameAttribute>,
        delimiter: Option<QuotedChar>,
        mailbox: Mailbox,
    },
    /// `* STATUS ...`
    Status {
        mailbox: Mailbox,
        items: Vec<StatusDataItem>,
    },
    /// `* SEARCH ...`
    Search(Vec<NonZeroU32>),
    /// `* FLAGS ...`
    Flags(Vec<Flag>),
    /// `* <n> EXISTS`
    Exists(u32),
    /// `* <n> RECENT`
    Recent(u32),
    /// `* <n> EXPUNGE`
    Expunge(NonZeroU32),
    /// `* <n> FETCH ...`
    ///
    /// Unsolicited flag updates (RFC 2683); only the FLAGS and UID attributes
    /// are modelled, message-body parsing is out of scope for this crate.
    Fetch {
        seq: NonZeroU32,
        items: Vec<MessageDataItem>,
    },
}

/// An attribute in a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDataItem {
    Flags(Vec<FlagFetch>),
    Uid(NonZeroU32),
}

/// A continuation request.
///
/// The server sends these to release the next literal chunk of an outbound
/// command, or to hand challenge data to the client during IDLE and
/// AUTHENTICATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationRequest {
    /// A human-readable continuation, e.g., `+ Ready for additional text`.
    Basic { code: Option<Code>, text: Text },
    /// Base64-encoded challenge data. An empty payload (`+\r\n`) decodes to
    /// an empty vector.
    Base64(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_from_atom() {
        let tests = [
            ("IMAP4rev1", Capability::Imap4Rev1),
            ("IDLE", Capability::Idle),
            ("LITERAL+", Capability::LiteralPlus),
            (
                "AUTH=PLAIN",
                Capability::Auth(AuthMechanism::Plain),
            ),
            (
                "XLIST",
                Capability::Other(Atom::try_from("XLIST").unwrap()),
            ),
        ];

        for (input, expected) in tests {
            let got = Capability::from(Atom::try_from(input).unwrap());
            assert_eq!(expected, got);
        }
    }

    #[test]
    fn test_status_helpers() {
        let status = Status::ok(Some(Tag::try_from("A1").unwrap()), None, "done").unwrap();
        assert_eq!(status.tag().map(Tag::inner), Some("A1"));

        let status = Status::bye(None, "shutting down").unwrap();
        assert_eq!(status.tag(), None);
    }
}
