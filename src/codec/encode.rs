//! # Encoding of messages.
//!
//! [`Command::encode`] does not "dump" a final serialization but yields the
//! message through [`Fragment`]s. This is required because the usage of
//! literals changes the IMAP message flow: everything up to (and including) a
//! literal stop `{N}\r\n` may be sent immediately, while the literal payload
//! must be held back until the server sent a continuation request.
//!
//! [`Encoded::chunks`] assembles the fragments into exactly the byte runs a
//! transport may write between such stops: a command with K literals yields
//! K+1 chunks, a command without literals yields a single chunk ending in
//! `\r\n`.
//!
//! # Example
//!
//! ```rust
//! use imap_engine::command::{Command, CommandBody};
//!
//! let command = Command::new("a", CommandBody::rename("\n", "to").unwrap()).unwrap();
//!
//! let chunks = command.encode().chunks();
//! assert_eq!(chunks[0], b"a RENAME {1}\r\n");
//! assert_eq!(chunks[1], b"\n \"to\"\r\n");
//! ```

use std::{collections::VecDeque, io::Write};

use base64::{engine::general_purpose::STANDARD as _base64, Engine};

use crate::{
    auth::{AuthMechanism, AuthenticateData},
    command::{Command, CommandBody},
    core::{escape_quoted, AString, AtomExt, IString, Literal, Quoted, Tag},
    mailbox::Mailbox,
    status::StatusDataItemName,
};

/// An encoded message.
///
/// Iterating yields [`Fragment`]s; [`Encoded::chunks`] or [`Encoded::dump`]
/// consume the message as contiguous byte runs.
#[derive(Clone, Debug)]
pub struct Encoded {
    items: VecDeque<Fragment>,
}

impl Encoded {
    /// Dump the (remaining) encoded data without being guided by [`Fragment`]s.
    ///
    /// Note: This is only sound when the message contains no synchronising
    /// literals, or when talking to a peer that already agreed to receive
    /// them.
    pub fn dump(self) -> Vec<u8> {
        let mut out = Vec::new();

        for fragment in self.items {
            match fragment {
                Fragment::Line { mut data } => out.append(&mut data),
                Fragment::Literal { mut data } => out.append(&mut data),
            }
        }

        out
    }

    /// Assemble the fragments into wire chunks.
    ///
    /// A chunk boundary sits before every literal payload: the preceding
    /// chunk ends with the announcing `{N}\r\n` and the following chunk may
    /// only be written after a continuation request.
    pub fn chunks(self) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        let mut current = Vec::new();

        for fragment in self.items {
            match fragment {
                Fragment::Line { mut data } => current.append(&mut data),
                Fragment::Literal { mut data } => {
                    chunks.push(std::mem::take(&mut current));
                    current.append(&mut data);
                }
            }
        }

        chunks.push(current);
        chunks
    }
}

impl Iterator for Encoded {
    type Item = Fragment;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.pop_front()
    }
}

/// The intended action of a client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Fragment {
    /// A line that is ready to be send.
    Line { data: Vec<u8> },

    /// A literal payload that must await a continuation request before it
    /// should be send.
    Literal { data: Vec<u8> },
}

//--------------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct EncodeContext {
    accumulator: Vec<u8>,
    items: VecDeque<Fragment>,
}

impl EncodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self) {
        self.items.push_back(Fragment::Line {
            data: std::mem::take(&mut self.accumulator),
        })
    }

    pub fn push_literal(&mut self) {
        self.items.push_back(Fragment::Literal {
            data: std::mem::take(&mut self.accumulator),
        })
    }

    pub fn into_items(self) -> VecDeque<Fragment> {
        let Self {
            accumulator,
            mut items,
        } = self;

        if !accumulator.is_empty() {
            items.push_back(Fragment::Line { data: accumulator });
        }

        items
    }

    #[cfg(test)]
    pub(crate) fn dump(self) -> Vec<u8> {
        let mut out = Vec::new();

        for item in self.into_items() {
            match item {
                Fragment::Line { data } | Fragment::Literal { data } => {
                    out.extend_from_slice(&data)
                }
            }
        }

        out
    }
}

impl Write for EncodeContext {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.accumulator.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Command {
    /// Encode this command.
    pub fn encode(&self) -> Encoded {
        let mut ctx = EncodeContext::new();
        // Safety: `unwrap` can't panic as writing into an `EncodeContext`
        // never fails.
        self.encode_ctx(&mut ctx).unwrap();

        Encoded {
            items: ctx.into_items(),
        }
    }
}

impl AuthenticateData {
    /// Encode this authentication data as a single continuation line.
    pub fn encode(&self) -> Encoded {
        let mut ctx = EncodeContext::new();
        // Safety: see `Command::encode`.
        self.encode_ctx(&mut ctx).unwrap();

        Encoded {
            items: ctx.into_items(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

pub(crate) trait EncodeIntoContext {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()>;
}

pub(crate) fn join_serializable<I: EncodeIntoContext>(
    elements: &[I],
    sep: &[u8],
    ctx: &mut EncodeContext,
) -> std::io::Result<()> {
    if let Some((last, head)) = elements.split_last() {
        for item in head {
            item.encode_ctx(ctx)?;
            ctx.write_all(sep)?;
        }

        last.encode_ctx(ctx)?;
    }

    Ok(())
}

impl EncodeIntoContext for Command {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        self.tag.encode_ctx(ctx)?;
        ctx.write_all(b" ")?;
        self.body.encode_ctx(ctx)?;
        ctx.write_all(b"\r\n")
    }
}

impl EncodeIntoContext for Tag {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        ctx.write_all(self.inner().as_bytes())
    }
}

impl EncodeIntoContext for CommandBody {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        match self {
            CommandBody::Capability => ctx.write_all(b"CAPABILITY"),
            CommandBody::Noop => ctx.write_all(b"NOOP"),
            CommandBody::Logout => ctx.write_all(b"LOGOUT"),
            CommandBody::Authenticate {
                mechanism,
                initial_response,
            } => {
                ctx.write_all(b"AUTHENTICATE")?;
                ctx.write_all(b" ")?;
                mechanism.encode_ctx(ctx)?;

                if let Some(ir) = initial_response {
                    ctx.write_all(b" ")?;

                    // RFC 4959 (https://datatracker.ietf.org/doc/html/rfc4959#section-3)
                    // "To send a zero-length initial response, the client MUST send a single pad character ("=").
                    // This indicates that the response is present, but is a zero-length string."
                    if ir.declassify().is_empty() {
                        ctx.write_all(b"=")?;
                    } else {
                        ctx.write_all(_base64.encode(ir.declassify()).as_bytes())?;
                    }
                }

                Ok(())
            }
            CommandBody::Login { username, password } => {
                ctx.write_all(b"LOGIN")?;
                ctx.write_all(b" ")?;
                username.encode_ctx(ctx)?;
                ctx.write_all(b" ")?;
                password.declassify().encode_ctx(ctx)
            }
            CommandBody::Select { mailbox } => {
                ctx.write_all(b"SELECT")?;
                ctx.write_all(b" ")?;
                mailbox.encode_ctx(ctx)
            }
            CommandBody::Examine { mailbox } => {
                ctx.write_all(b"EXAMINE")?;
                ctx.write_all(b" ")?;
                mailbox.encode_ctx(ctx)
            }
            CommandBody::Create { mailbox } => {
                ctx.write_all(b"CREATE")?;
                ctx.write_all(b" ")?;
                mailbox.encode_ctx(ctx)
            }
            CommandBody::Delete { mailbox } => {
                ctx.write_all(b"DELETE")?;
                ctx.write_all(b" ")?;
                mailbox.encode_ctx(ctx)
            }
            CommandBody::Rename { from, to } => {
                ctx.write_all(b"RENAME")?;
                ctx.write_all(b" ")?;
                from.encode_ctx(ctx)?;
                ctx.write_all(b" ")?;
                to.encode_ctx(ctx)
            }
            CommandBody::Subscribe { mailbox } => {
                ctx.write_all(b"SUBSCRIBE")?;
                ctx.write_all(b" ")?;
                mailbox.encode_ctx(ctx)
            }
            CommandBody::Unsubscribe { mailbox } => {
                ctx.write_all(b"UNSUBSCRIBE")?;
                ctx.write_all(b" ")?;
                mailbox.encode_ctx(ctx)
            }
            CommandBody::List { reference, pattern } => {
                ctx.write_all(b"LIST")?;
                ctx.write_all(b" ")?;
                reference.encode_ctx(ctx)?;
                ctx.write_all(b" ")?;
                pattern.encode_ctx(ctx)
            }
            CommandBody::Lsub { reference, pattern } => {
                ctx.write_all(b"LSUB")?;
                ctx.write_all(b" ")?;
                reference.encode_ctx(ctx)?;
                ctx.write_all(b" ")?;
                pattern.encode_ctx(ctx)
            }
            CommandBody::Status {
                mailbox,
                item_names,
            } => {
                ctx.write_all(b"STATUS")?;
                ctx.write_all(b" ")?;
                mailbox.encode_ctx(ctx)?;
                ctx.write_all(b" ")?;
                ctx.write_all(b"(")?;
                join_serializable(item_names, b" ", ctx)?;
                ctx.write_all(b")")
            }
            CommandBody::Check => ctx.write_all(b"CHECK"),
            CommandBody::Close => ctx.write_all(b"CLOSE"),
            CommandBody::Expunge => ctx.write_all(b"EXPUNGE"),
            CommandBody::Idle => ctx.write_all(b"IDLE"),
        }
    }
}

impl EncodeIntoContext for AuthMechanism {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        write!(ctx, "{}", self)
    }
}

impl EncodeIntoContext for AuthenticateData {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        match self {
            Self::Continue(data) => {
                let encoded = _base64.encode(data.declassify());
                ctx.write_all(encoded.as_bytes())?;
                ctx.write_all(b"\r\n")
            }
            Self::Cancel => ctx.write_all(b"*\r\n"),
        }
    }
}

impl EncodeIntoContext for AString {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        match self {
            AString::Atom(atom) => atom.encode_ctx(ctx),
            AString::String(imap_str) => imap_str.encode_ctx(ctx),
        }
    }
}

impl EncodeIntoContext for AtomExt {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        ctx.write_all(self.inner().as_bytes())
    }
}

impl EncodeIntoContext for IString {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        match self {
            Self::Literal(val) => val.encode_ctx(ctx),
            Self::Quoted(val) => val.encode_ctx(ctx),
        }
    }
}

impl EncodeIntoContext for Literal {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        write!(ctx, "{{{}}}\r\n", self.as_ref().len())?;

        ctx.push_line();
        ctx.write_all(self.as_ref())?;
        ctx.push_literal();

        Ok(())
    }
}

impl EncodeIntoContext for Quoted {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        write!(ctx, "\"{}\"", escape_quoted(self.inner()))
    }
}

impl EncodeIntoContext for Mailbox {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        match self {
            Mailbox::Inbox => ctx.write_all(b"INBOX"),
            Mailbox::Other(other) => other.encode_ctx(ctx),
        }
    }
}

impl EncodeIntoContext for StatusDataItemName {
    fn encode_ctx(&self, ctx: &mut EncodeContext) -> std::io::Result<()> {
        match self {
            Self::Messages => ctx.write_all(b"MESSAGES"),
            Self::Recent => ctx.write_all(b"RECENT"),
            Self::UidNext => ctx.write_all(b"UIDNEXT"),
            Self::UidValidity => ctx.write_all(b"UIDVALIDITY"),
            Self::Unseen => ctx.write_all(b"UNSEEN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthMechanism;

    fn known_answer_test_encode((test_object, expected_bytes): (impl EncodeIntoContext, &[u8])) {
        let mut ctx = EncodeContext::new();
        test_object.encode_ctx(&mut ctx).unwrap();

        let got_bytes = ctx.dump();

        assert_eq!(
            expected_bytes,
            got_bytes.as_slice(),
            "expected {:?}, got {:?}",
            std::str::from_utf8(expected_bytes),
            std::str::from_utf8(&got_bytes),
        );
    }

    #[test]
    fn test_encode_command() {
        let tests: Vec<(Command, &[u8])> = vec![
            (
                Command::new("a", CommandBody::login("foo", "bar").unwrap()).unwrap(),
                b"a LOGIN \"foo\" \"bar\"\r\n",
            ),
            (
                Command::new("a", CommandBody::Capability).unwrap(),
                b"a CAPABILITY\r\n",
            ),
            (
                Command::new("A142", CommandBody::select("blurdybloop").unwrap()).unwrap(),
                b"A142 SELECT \"blurdybloop\"\r\n",
            ),
            (
                Command::new("1", CommandBody::Idle).unwrap(),
                b"1 IDLE\r\n",
            ),
            (
                Command::new(
                    "A001",
                    CommandBody::authenticate(AuthMechanism::try_from("GSSAPI").unwrap()),
                )
                .unwrap(),
                b"A001 AUTHENTICATE GSSAPI\r\n",
            ),
            (
                Command::new(
                    "A",
                    CommandBody::authenticate_with_ir(AuthMechanism::Plain, b"".as_ref()),
                )
                .unwrap(),
                b"A AUTHENTICATE PLAIN =\r\n",
            ),
            (
                Command::new(
                    "A",
                    CommandBody::status(
                        "INBOX",
                        vec![StatusDataItemName::Messages, StatusDataItemName::Unseen],
                    )
                    .unwrap(),
                )
                .unwrap(),
                b"A STATUS INBOX (MESSAGES UNSEEN)\r\n",
            ),
        ];

        for test in tests {
            known_answer_test_encode(test);
        }
    }

    #[test]
    fn test_encode_quoted_escaping() {
        known_answer_test_encode((
            Command::new("a", CommandBody::create("mail\"box").unwrap()).unwrap(),
            b"a CREATE \"mail\\\"box\"\r\n",
        ));
    }

    #[test]
    fn test_chunks_without_literal() {
        let command = Command::new("a", CommandBody::Noop).unwrap();

        assert_eq!(command.encode().chunks(), vec![b"a NOOP\r\n".to_vec()]);
    }

    #[test]
    fn test_chunks_with_one_literal() {
        let command =
            Command::new("x", CommandBody::rename("\n", "to").unwrap()).unwrap();

        assert_eq!(
            command.encode().chunks(),
            vec![b"x RENAME {1}\r\n".to_vec(), b"\n \"to\"\r\n".to_vec()]
        );
    }

    #[test]
    fn test_chunks_with_two_literals() {
        let command =
            Command::new("x", CommandBody::rename("\n", "\r").unwrap()).unwrap();

        assert_eq!(
            command.encode().chunks(),
            vec![
                b"x RENAME {1}\r\n".to_vec(),
                b"\n {1}\r\n".to_vec(),
                b"\r\r\n".to_vec(),
            ]
        );
    }

    #[test]
    fn test_encode_authenticate_data() {
        let tests: Vec<(AuthenticateData, &[u8])> = vec![
            (
                AuthenticateData::r#continue(b"hello".as_ref()),
                b"aGVsbG8=\r\n",
            ),
            (AuthenticateData::r#continue(b"".as_ref()), b"\r\n"),
            (AuthenticateData::Cancel, b"*\r\n"),
        ];

        for (data, expected) in tests {
            assert_eq!(data.encode().dump(), expected);
        }
    }
}
