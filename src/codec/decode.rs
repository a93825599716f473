//! # Decoding of server output.
//!
//! The response grammar lives here as one streaming parser per ABNF rule,
//! with [`decode_response`] as the public entry point. Every parser takes an
//! input (`&[u8]`) and produces a remainder and a parsed value.
//!
//! Decoding is more elaborate than it seems on a first glance: server data
//! may contain literals, and a line that ends in a literal stop `{N}\r\n` is
//! not yet a complete message. [`decode_response`] signals this through
//! [`DecodeError::LiteralFound`] so that the framing layer can wait for the
//! announced bytes (no continuation request is involved for server-sent
//! literals).
//!
//! Note that IMAP traces are not guaranteed to be UTF-8. Thus, be careful
//! when using code like `from_utf8(...)`.

use std::{
    num::{NonZeroU32, ParseIntError, TryFromIntError},
    str::from_utf8,
};

use abnf_core::streaming::{crlf, dquote, sp};
use base64::{engine::general_purpose::STANDARD as _base64, Engine};
use nom::{
    branch::alt,
    bytes::streaming::{escaped, tag, tag_no_case, take, take_until, take_while, take_while1, take_while_m_n},
    character::streaming::{char, digit1},
    combinator::{map, map_res, opt, value},
    error::{ErrorKind, FromExternalError, ParseError},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, terminated, tuple},
};

use crate::{
    core::{
        is_any_text_char_except_quoted_specials, is_astring_char, is_atom_char, is_quoted_specials,
        is_text_char, unescape_quoted, AString, Atom, AtomExt, IString, Literal, Quoted,
        QuotedChar, Tag, Text,
    },
    flag::{Flag, FlagFetch, FlagNameAttribute, FlagPerm},
    mailbox::Mailbox,
    response::{
        Bye, Capability, Code, CodeOther, ContinuationRequest, Data, MessageDataItem, Response,
        Status, StatusBody, StatusKind, Tagged,
    },
    status::StatusDataItem,
};

/// An extended version of [`nom::IResult`].
pub(crate) type ImapResult<I, O> = Result<(I, O), nom::Err<ImapParseError<I>>>;

/// An extended version of [`nom::error::Error`].
#[derive(Debug)]
pub(crate) struct ImapParseError<I> {
    #[allow(unused)]
    pub input: I,
    pub kind: ImapErrorKind,
}

/// An extended version of [`nom::error::ErrorKind`].
#[derive(Debug)]
pub(crate) enum ImapErrorKind {
    Literal { length: u32 },
    LiteralContainsNul,
    BadNumber,
    BadBase64,
    Nom(ErrorKind),
}

impl<I> ParseError<I> for ImapParseError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        Self {
            input,
            kind: ImapErrorKind::Nom(kind),
        }
    }

    fn append(input: I, kind: ErrorKind, _: Self) -> Self {
        Self {
            input,
            kind: ImapErrorKind::Nom(kind),
        }
    }
}

impl<I> FromExternalError<I, ParseIntError> for ImapParseError<I> {
    fn from_external_error(input: I, _: ErrorKind, _: ParseIntError) -> Self {
        Self {
            input,
            kind: ImapErrorKind::BadNumber,
        }
    }
}

impl<I> FromExternalError<I, TryFromIntError> for ImapParseError<I> {
    fn from_external_error(input: I, _: ErrorKind, _: TryFromIntError) -> Self {
        Self {
            input,
            kind: ImapErrorKind::BadNumber,
        }
    }
}

impl<I> FromExternalError<I, base64::DecodeError> for ImapParseError<I> {
    fn from_external_error(input: I, _: ErrorKind, _: base64::DecodeError) -> Self {
        Self {
            input,
            kind: ImapErrorKind::BadBase64,
        }
    }
}

/// Error during decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// More data is needed.
    Incomplete,

    /// More data is needed: the decoder stopped at the beginning of literal
    /// data whose `length` bytes are not buffered yet.
    LiteralFound { length: u32 },

    /// Decoding failed.
    Failed,
}

/// Decode a single server response (or continuation request) from `input`.
///
/// Returns the remainder and the parsed [`Response`] on success.
pub fn decode_response(input: &[u8]) -> Result<(&[u8], Response), DecodeError> {
    match response(input) {
        Ok((remaining, response)) => Ok((remaining, response)),
        Err(nom::Err::Incomplete(_)) => Err(DecodeError::Incomplete),
        Err(nom::Err::Failure(error)) => match error.kind {
            ImapErrorKind::Literal { length } => Err(DecodeError::LiteralFound { length }),
            _ => Err(DecodeError::Failed),
        },
        Err(nom::Err::Error(_)) => Err(DecodeError::Failed),
    }
}

// ----- number -----

/// `number = 1*DIGIT`
///
/// Unsigned 32-bit integer (0 <= n < 4,294,967,296)
fn number(input: &[u8]) -> ImapResult<&[u8], u32> {
    map_res(
        // Safety: `unwrap` is safe because `1*DIGIT` contains ASCII-only characters.
        map(digit1, |val| from_utf8(val).unwrap()),
        str::parse::<u32>,
    )(input)
}

/// `nz-number = digit-nz *DIGIT`
///
/// Non-zero unsigned 32-bit integer (0 < n < 4,294,967,296)
fn nz_number(input: &[u8]) -> ImapResult<&[u8], NonZeroU32> {
    map_res(number, NonZeroU32::try_from)(input)
}

// ----- string -----

/// `string = quoted / literal`
fn string(input: &[u8]) -> ImapResult<&[u8], IString> {
    alt((map(quoted, IString::Quoted), map(literal, IString::Literal)))(input)
}

/// `quoted = DQUOTE *QUOTED-CHAR DQUOTE`
///
/// This function only allocates a new String, when needed, i.e. when
/// quoted chars need to be replaced.
fn quoted(input: &[u8]) -> ImapResult<&[u8], Quoted> {
    let mut parser = tuple((
        dquote,
        map(
            opt(escaped(
                take_while1(is_any_text_char_except_quoted_specials),
                '\\',
                nom::character::streaming::one_of("\\\""),
            )),
            // Safety: `unwrap` is safe because quoted chars are ASCII-only.
            |val: Option<&[u8]>| from_utf8(val.unwrap_or_default()).unwrap(),
        ),
        dquote,
    ));

    let (remaining, (_, quoted, _)) = parser(input)?;

    Ok((
        remaining,
        Quoted::unvalidated(unescape_quoted(quoted).into_owned()),
    ))
}

/// `QUOTED-CHAR = <any TEXT-CHAR except quoted-specials> / "\" quoted-specials`
fn quoted_char(input: &[u8]) -> ImapResult<&[u8], QuotedChar> {
    map(
        alt((
            map(
                take_while_m_n(1, 1, is_any_text_char_except_quoted_specials),
                |bytes: &[u8]| bytes[0] as char,
            ),
            map(
                tuple((tag("\\"), take_while_m_n(1, 1, is_quoted_specials))),
                |(_, bytes): (_, &[u8])| bytes[0] as char,
            ),
        )),
        QuotedChar::unvalidated,
    )(input)
}

/// `literal = "{" number "}" CRLF *CHAR8`
///
/// Number represents the number of CHAR8s
fn literal(input: &[u8]) -> ImapResult<&[u8], Literal> {
    let (remaining, length) =
        terminated(delimited(tag(b"{"), number, tag(b"}")), crlf)(input)?;

    // Signal the framing layer that more data is required.
    // Note: This doesn't trigger when there is data following the literal prefix.
    if remaining.is_empty() {
        return Err(nom::Err::Failure(ImapParseError {
            input,
            kind: ImapErrorKind::Literal { length },
        }));
    }

    let (remaining, data) = take(length)(remaining)?;

    match Literal::try_from(data) {
        Ok(literal) => Ok((remaining, literal)),
        Err(_) => Err(nom::Err::Failure(ImapParseError {
            input,
            kind: ImapErrorKind::LiteralContainsNul,
        })),
    }
}

// ----- astring / atom / text -----

/// `astring = 1*ASTRING-CHAR / string`
fn astring(input: &[u8]) -> ImapResult<&[u8], AString> {
    alt((
        map(take_while1(is_astring_char), |bytes: &[u8]| {
            // Safety: `unwrap` is safe because `is_astring_char` enforces
            // ASCII-only characters.
            AString::Atom(AtomExt::unvalidated(from_utf8(bytes).unwrap()))
        }),
        map(string, AString::String),
    ))(input)
}

/// `atom = 1*ATOM-CHAR`
fn atom(input: &[u8]) -> ImapResult<&[u8], Atom> {
    let (remaining, parsed_atom) = take_while1(is_atom_char)(input)?;

    // Safety: `unwrap` is safe because `is_atom_char` enforces ASCII-only
    // characters.
    Ok((remaining, Atom::unvalidated(from_utf8(parsed_atom).unwrap())))
}

/// `text = 1*TEXT-CHAR`
fn text(input: &[u8]) -> ImapResult<&[u8], Text> {
    map(take_while1(is_text_char), |bytes| {
        // Safety: `unwrap` is safe because `is_text_char` enforces ASCII-only
        // characters.
        Text::unvalidated(from_utf8(bytes).unwrap())
    })(input)
}

// ----- response -----

/// `response = continue-req / response-data / response-tagged` (edited)
///
/// The standard's `response` rule describes a full session transcript; a
/// streaming client decodes one element at a time.
pub(crate) fn response(input: &[u8]) -> ImapResult<&[u8], Response> {
    alt((
        map(continue_req, Response::ContinuationRequest),
        response_data,
        map(response_tagged, Response::Status),
    ))(input)
}

/// `continue-req = "+" [SP (resp-text / base64)] CRLF` (edited)
///
/// The standard requires the SP, but `+\r\n` (an empty continuation, e.g.,
/// from a server that has no challenge data) is accepted in the wild and
/// produced by well-known servers.
fn continue_req(input: &[u8]) -> ImapResult<&[u8], ContinuationRequest> {
    // A helper to postpone the unification to `ContinuationRequest` in the
    // `alt` combinator below.
    enum Either<A, B> {
        Base64(A),
        Basic(B),
    }

    let mut parser = delimited(
        tag(b"+"),
        opt(preceded(
            sp,
            alt((
                map(
                    map_res(take_until("\r\n"), |line: &[u8]| _base64.decode(line)),
                    Either::Base64,
                ),
                map(resp_text, Either::Basic),
            )),
        )),
        crlf,
    );

    let (remaining, maybe_payload) = parser(input)?;

    let continuation = match maybe_payload {
        Some(Either::Base64(data)) => ContinuationRequest::Base64(data),
        Some(Either::Basic((code, text))) => ContinuationRequest::Basic { code, text },
        None => ContinuationRequest::Base64(Vec::new()),
    };

    Ok((remaining, continuation))
}

/// ```abnf
/// response-data = "*" SP (
///                    resp-cond-state /
///                    resp-cond-bye /
///                    mailbox-data /
///                    message-data /
///                    capability-data
///                  ) CRLF
/// ```
fn response_data(input: &[u8]) -> ImapResult<&[u8], Response> {
    delimited(
        tag(b"* "),
        alt((
            map(resp_cond_state, |(kind, code, text)| {
                Response::Status(Status::Untagged(StatusBody { kind, code, text }))
            }),
            map(resp_cond_bye, |(code, text)| {
                Response::Status(Status::Bye(Bye { code, text }))
            }),
            map(mailbox_data, Response::Data),
            map(message_data, Response::Data),
            map(capability_data, |caps| {
                Response::Data(Data::Capability(caps))
            }),
        )),
        crlf,
    )(input)
}

/// `response-tagged = tag SP resp-cond-state CRLF`
fn response_tagged(input: &[u8]) -> ImapResult<&[u8], Status> {
    let mut parser = tuple((tag_imap, sp, resp_cond_state, crlf));

    let (remaining, (tag, _, (kind, code, text), _)) = parser(input)?;

    Ok((
        remaining,
        Status::Tagged(Tagged {
            tag,
            body: StatusBody { kind, code, text },
        }),
    ))
}

/// `resp-cond-state = ("OK" / "NO" / "BAD") SP resp-text`
///
/// Status condition
fn resp_cond_state(input: &[u8]) -> ImapResult<&[u8], (StatusKind, Option<Code>, Text)> {
    let mut parser = tuple((
        alt((
            value(StatusKind::Ok, tag_no_case("OK ")),
            value(StatusKind::No, tag_no_case("NO ")),
            value(StatusKind::Bad, tag_no_case("BAD ")),
        )),
        resp_text,
    ));

    let (remaining, (kind, (maybe_code, text))) = parser(input)?;

    Ok((remaining, (kind, maybe_code, text)))
}

/// `resp-cond-bye = "BYE" SP resp-text`
fn resp_cond_bye(input: &[u8]) -> ImapResult<&[u8], (Option<Code>, Text)> {
    preceded(tag_no_case(b"BYE "), resp_text)(input)
}

/// `resp-text = ["[" resp-text-code "]" SP] text`
fn resp_text(input: &[u8]) -> ImapResult<&[u8], (Option<Code>, Text)> {
    // When the text starts with "[", we insist on parsing a code.
    // Otherwise, a broken code could be interpreted as text.
    let (_, start) = opt(tag(b"["))(input)?;

    if start.is_some() {
        tuple((
            preceded(
                tag(b"["),
                map(
                    alt((
                        terminated(resp_text_code, tag(b"]")),
                        map(
                            terminated(
                                take_while(|b: u8| b != b']' && b != b'\r' && b != b'\n'),
                                tag(b"]"),
                            ),
                            |bytes: &[u8]| Code::Other(CodeOther::new(bytes.to_vec())),
                        ),
                    )),
                    Some,
                ),
            ),
            preceded(sp, text),
        ))(input)
    } else {
        map(text, |text| (None, text))(input)
    }
}

/// ```abnf
/// resp-text-code = "ALERT" /
///                  capability-data /
///                  "PARSE" /
///                  "PERMANENTFLAGS" SP "(" [flag-perm *(SP flag-perm)] ")" /
///                  "READ-ONLY" /
///                  "READ-WRITE" /
///                  "TRYCREATE" /
///                  "UIDNEXT" SP nz-number /
///                  "UIDVALIDITY" SP nz-number /
///                  "UNSEEN" SP nz-number /
///                  atom [SP 1*<any TEXT-CHAR except "]">]
/// ```
///
/// The final `atom ...` fallback is handled in [`resp_text`].
fn resp_text_code(input: &[u8]) -> ImapResult<&[u8], Code> {
    alt((
        value(Code::Alert, tag_no_case(b"ALERT")),
        map(capability_data, Code::Capability),
        value(Code::Parse, tag_no_case(b"PARSE")),
        map(
            preceded(
                tag_no_case(b"PERMANENTFLAGS "),
                delimited(
                    tag(b"("),
                    map(opt(separated_list1(sp, flag_perm)), |maybe_flags| {
                        maybe_flags.unwrap_or_default()
                    }),
                    tag(b")"),
                ),
            ),
            Code::PermanentFlags,
        ),
        value(Code::ReadOnly, tag_no_case(b"READ-ONLY")),
        value(Code::ReadWrite, tag_no_case(b"READ-WRITE")),
        value(Code::TryCreate, tag_no_case(b"TRYCREATE")),
        map(preceded(tag_no_case(b"UIDNEXT "), nz_number), Code::UidNext),
        map(
            preceded(tag_no_case(b"UIDVALIDITY "), nz_number),
            Code::UidValidity,
        ),
        map(preceded(tag_no_case(b"UNSEEN "), nz_number), Code::Unseen),
    ))(input)
}

/// `capability-data = "CAPABILITY" *(SP capability) SP "IMAP4rev1" *(SP capability)` (edited)
///
/// The "IMAP4rev1 must be present" requirement is left to the caller; some
/// servers get it wrong.
fn capability_data(input: &[u8]) -> ImapResult<&[u8], Vec<Capability>> {
    preceded(tag_no_case("CAPABILITY "), separated_list1(sp, capability))(input)
}

/// `capability = ("AUTH=" auth-type) / atom`
fn capability(input: &[u8]) -> ImapResult<&[u8], Capability> {
    map(atom, Capability::from)(input)
}

// ----- tag -----

/// `tag = 1*<any ASTRING-CHAR except "+">`
fn tag_imap(input: &[u8]) -> ImapResult<&[u8], Tag> {
    map(take_while1(|b| is_astring_char(b) && b != b'+'), |val| {
        // Safety: `unwrap` is safe because `is_astring_char` enforces
        // ASCII-only characters.
        Tag::unvalidated(from_utf8(val).unwrap())
    })(input)
}

// ----- mailbox data -----

/// ```abnf
/// mailbox-data = "FLAGS" SP flag-list /
///                "LIST" SP mailbox-list /
///                "LSUB" SP mailbox-list /
///                "SEARCH" *(SP nz-number) /
///                "STATUS" SP mailbox SP "(" [status-att-list] ")" /
///                number SP "EXISTS" /
///                number SP "RECENT"
/// ```
fn mailbox_data(input: &[u8]) -> ImapResult<&[u8], Data> {
    alt((
        map(preceded(tag_no_case(b"FLAGS "), flag_list), Data::Flags),
        map(
            preceded(tag_no_case(b"LIST "), mailbox_list),
            |(items, delimiter, mailbox)| Data::List {
                items,
                delimiter,
                mailbox,
            },
        ),
        map(
            preceded(tag_no_case(b"LSUB "), mailbox_list),
            |(items, delimiter, mailbox)| Data::Lsub {
                items,
                delimiter,
                mailbox,
            },
        ),
        map(
            preceded(tag_no_case(b"SEARCH"), many0(preceded(sp, nz_number))),
            Data::Search,
        ),
        map(
            tuple((
                tag_no_case(b"STATUS "),
                mailbox,
                sp,
                delimited(tag(b"("), opt(separated_list1(sp, status_att)), tag(b")")),
            )),
            |(_, mailbox, _, items)| Data::Status {
                mailbox,
                items: items.unwrap_or_default(),
            },
        ),
        map(terminated(number, tag_no_case(b" EXISTS")), Data::Exists),
        map(terminated(number, tag_no_case(b" RECENT")), Data::Recent),
    ))(input)
}

/// `mailbox-list = "(" [mbx-list-flags] ")" SP (DQUOTE QUOTED-CHAR DQUOTE / nil) SP mailbox`
#[allow(clippy::type_complexity)]
fn mailbox_list(
    input: &[u8],
) -> ImapResult<&[u8], (Vec<FlagNameAttribute>, Option<QuotedChar>, Mailbox)> {
    let mut parser = tuple((
        delimited(
            tag(b"("),
            opt(separated_list1(sp, flag_name_attribute)),
            tag(b")"),
        ),
        sp,
        alt((
            map(delimited(dquote, quoted_char, dquote), Some),
            value(None, tag_no_case(b"NIL")),
        )),
        sp,
        mailbox,
    ));

    let (remaining, (items, _, delimiter, _, mailbox)) = parser(input)?;

    Ok((remaining, (items.unwrap_or_default(), delimiter, mailbox)))
}

/// `mailbox = "INBOX" / astring`
///
/// INBOX is case-insensitive; the conversion from [`AString`] handles it.
fn mailbox(input: &[u8]) -> ImapResult<&[u8], Mailbox> {
    map(astring, Mailbox::from)(input)
}

/// `status-att-list = status-att SP number *(SP status-att SP number)` (edited)
fn status_att(input: &[u8]) -> ImapResult<&[u8], StatusDataItem> {
    alt((
        map(
            preceded(tag_no_case(b"MESSAGES "), number),
            StatusDataItem::Messages,
        ),
        map(
            preceded(tag_no_case(b"RECENT "), number),
            StatusDataItem::Recent,
        ),
        map(
            preceded(tag_no_case(b"UIDNEXT "), nz_number),
            StatusDataItem::UidNext,
        ),
        map(
            preceded(tag_no_case(b"UIDVALIDITY "), nz_number),
            StatusDataItem::UidValidity,
        ),
        map(
            preceded(tag_no_case(b"UNSEEN "), number),
            StatusDataItem::Unseen,
        ),
    ))(input)
}

// ----- message data -----

/// `message-data = nz-number SP ("EXPUNGE" / ("FETCH" SP msg-att))`
fn message_data(input: &[u8]) -> ImapResult<&[u8], Data> {
    let (remaining, seq) = terminated(nz_number, sp)(input)?;

    alt((
        map(tag_no_case(b"EXPUNGE"), move |_| Data::Expunge(seq)),
        map(preceded(tag_no_case(b"FETCH "), msg_att), move |items| {
            Data::Fetch { seq, items }
        }),
    ))(remaining)
}

/// `msg-att = "(" (msg-att-dynamic / msg-att-static) *(SP (msg-att-dynamic / msg-att-static)) ")"` (edited)
///
/// Restricted to the attributes this crate models (FLAGS and UID).
fn msg_att(input: &[u8]) -> ImapResult<&[u8], Vec<MessageDataItem>> {
    delimited(tag(b"("), separated_list1(sp, msg_att_item), tag(b")"))(input)
}

fn msg_att_item(input: &[u8]) -> ImapResult<&[u8], MessageDataItem> {
    alt((
        map(
            preceded(
                tag_no_case(b"FLAGS "),
                delimited(
                    tag(b"("),
                    opt(separated_list1(sp, flag_fetch)),
                    tag(b")"),
                ),
            ),
            |flags| MessageDataItem::Flags(flags.unwrap_or_default()),
        ),
        map(preceded(tag_no_case(b"UID "), nz_number), MessageDataItem::Uid),
    ))(input)
}

// ----- flags -----

/// `flag-list = "(" [flag *(SP flag)] ")"`
fn flag_list(input: &[u8]) -> ImapResult<&[u8], Vec<Flag>> {
    delimited(
        tag(b"("),
        map(opt(separated_list1(sp, flag)), |maybe_flags| {
            maybe_flags.unwrap_or_default()
        }),
        tag(b")"),
    )(input)
}

/// `flag = "\Answered" / "\Flagged" / "\Deleted" / "\Seen" / "\Draft" / flag-keyword / flag-extension`
fn flag(input: &[u8]) -> ImapResult<&[u8], Flag> {
    alt((
        map(preceded(char('\\'), atom), Flag::system),
        map(atom, Flag::Keyword),
    ))(input)
}

/// `flag-fetch = flag / "\Recent"`
fn flag_fetch(input: &[u8]) -> ImapResult<&[u8], FlagFetch> {
    alt((
        value(FlagFetch::Recent, tag_no_case(b"\\Recent")),
        map(flag, FlagFetch::Flag),
    ))(input)
}

/// `flag-perm = flag / "\*"`
fn flag_perm(input: &[u8]) -> ImapResult<&[u8], FlagPerm> {
    alt((
        value(FlagPerm::Asterisk, tag(b"\\*")),
        map(flag, FlagPerm::Flag),
    ))(input)
}

/// `mbx-list-flags`, always `"\" atom` on the wire.
fn flag_name_attribute(input: &[u8]) -> ImapResult<&[u8], FlagNameAttribute> {
    map(preceded(char('\\'), atom), FlagNameAttribute::from)(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tagged_status() {
        let tests: Vec<(&[u8], Result<(&[u8], Response), DecodeError>)> = vec![
            (
                b"a OK ok\r\n",
                Ok((
                    b"".as_ref(),
                    Response::Status(
                        Status::ok(Some(Tag::unvalidated("a")), None, "ok").unwrap(),
                    ),
                )),
            ),
            (
                b"A1 NO [ALERT] oh no\r\nrest",
                Ok((
                    b"rest".as_ref(),
                    Response::Status(
                        Status::no(Some(Tag::unvalidated("A1")), Some(Code::Alert), "oh no")
                            .unwrap(),
                    ),
                )),
            ),
            (
                b"A1 BAD parse error\r\n",
                Ok((
                    b"".as_ref(),
                    Response::Status(
                        Status::bad(Some(Tag::unvalidated("A1")), None, "parse error").unwrap(),
                    ),
                )),
            ),
            // Incomplete
            (b"a OK ok", Err(DecodeError::Incomplete)),
            (b"a OK ok\r", Err(DecodeError::Incomplete)),
            // Failed
            (b"*** x\r\n", Err(DecodeError::Failed)),
        ];

        for (test, expected) in tests {
            let got = decode_response(test);

            dbg!((std::str::from_utf8(test).unwrap(), &expected, &got));

            assert_eq!(expected, got);
        }
    }

    #[test]
    fn test_decode_untagged() {
        let tests: Vec<(&[u8], Response)> = vec![
            (
                b"* OK [UNSEEN 17] message 17 is first unseen\r\n",
                Response::Status(
                    Status::ok(
                        None,
                        Some(Code::Unseen(NonZeroU32::new(17).unwrap())),
                        "message 17 is first unseen",
                    )
                    .unwrap(),
                ),
            ),
            (
                b"* BYE shutting down\r\n",
                Response::Status(Status::bye(None, "shutting down").unwrap()),
            ),
            (
                b"* CAPABILITY IMAP4rev1 IDLE AUTH=PLAIN\r\n",
                Response::Data(Data::Capability(vec![
                    Capability::Imap4Rev1,
                    Capability::Idle,
                    Capability::Auth(crate::auth::AuthMechanism::Plain),
                ])),
            ),
            (b"* 23 EXISTS\r\n", Response::Data(Data::Exists(23))),
            (b"* 5 RECENT\r\n", Response::Data(Data::Recent(5))),
            (
                b"* 44 EXPUNGE\r\n",
                Response::Data(Data::Expunge(NonZeroU32::new(44).unwrap())),
            ),
            (
                b"* SEARCH 2 3 6\r\n",
                Response::Data(Data::Search(vec![
                    NonZeroU32::new(2).unwrap(),
                    NonZeroU32::new(3).unwrap(),
                    NonZeroU32::new(6).unwrap(),
                ])),
            ),
            (b"* SEARCH\r\n", Response::Data(Data::Search(vec![]))),
            (
                b"* FLAGS (\\Answered \\Seen $Junk)\r\n",
                Response::Data(Data::Flags(vec![
                    Flag::Answered,
                    Flag::Seen,
                    Flag::Keyword(Atom::unvalidated("$Junk")),
                ])),
            ),
            (
                b"* LIST (\\Noselect) \"/\" foo\r\n",
                Response::Data(Data::List {
                    items: vec![FlagNameAttribute::Noselect],
                    delimiter: Some(QuotedChar::unvalidated('/')),
                    mailbox: Mailbox::Other(AString::Atom(AtomExt::unvalidated("foo"))),
                }),
            ),
            (
                b"* STATUS blurdybloop (MESSAGES 231 UIDNEXT 44292)\r\n",
                Response::Data(Data::Status {
                    mailbox: Mailbox::Other(AString::Atom(AtomExt::unvalidated("blurdybloop"))),
                    items: vec![
                        StatusDataItem::Messages(231),
                        StatusDataItem::UidNext(NonZeroU32::new(44292).unwrap()),
                    ],
                }),
            ),
            (
                b"* 14 FETCH (FLAGS (\\Seen \\Deleted))\r\n",
                Response::Data(Data::Fetch {
                    seq: NonZeroU32::new(14).unwrap(),
                    items: vec![MessageDataItem::Flags(vec![
                        FlagFetch::Flag(Flag::Seen),
                        FlagFetch::Flag(Flag::Deleted),
                    ])],
                }),
            ),
        ];

        for (test, expected) in tests {
            let got = decode_response(test);

            dbg!((std::str::from_utf8(test).unwrap(), &expected, &got));

            assert_eq!(Ok((b"".as_ref(), expected)), got);
        }
    }

    #[test]
    fn test_decode_continuation_request() {
        let tests: Vec<(&[u8], ContinuationRequest)> = vec![
            (
                b"+ OK\r\n",
                ContinuationRequest::Basic {
                    code: None,
                    text: Text::unvalidated("OK"),
                },
            ),
            (
                b"+ idling\r\n",
                ContinuationRequest::Basic {
                    code: None,
                    text: Text::unvalidated("idling"),
                },
            ),
            // Empty continuation, e.g., `AUTHENTICATE` without challenge data.
            (b"+\r\n", ContinuationRequest::Base64(vec![])),
            (b"+ \r\n", ContinuationRequest::Base64(vec![])),
            // Base64 takes precedence over text when both would parse.
            (
                b"+ aGVsbG8=\r\n",
                ContinuationRequest::Base64(b"hello".to_vec()),
            ),
        ];

        for (test, expected) in tests {
            let got = decode_response(test);

            dbg!((std::str::from_utf8(test).unwrap(), &expected, &got));

            assert_eq!(
                Ok((b"".as_ref(), Response::ContinuationRequest(expected))),
                got
            );
        }
    }

    #[test]
    fn test_decode_literal() {
        // A literal whose payload is not buffered yet ...
        assert_eq!(
            decode_response(b"* LIST () \"/\" {3}\r\n"),
            Err(DecodeError::LiteralFound { length: 3 })
        );

        // ... and the complete message.
        assert_eq!(
            decode_response(b"* LIST () \"/\" {3}\r\nfoo\r\n"),
            Ok((
                b"".as_ref(),
                Response::Data(Data::List {
                    items: vec![],
                    delimiter: Some(QuotedChar::unvalidated('/')),
                    mailbox: Mailbox::Other(AString::String(IString::Literal(
                        Literal::try_from("foo").unwrap()
                    ))),
                })
            ))
        );
    }

    #[test]
    fn test_decode_quoted_mailbox() {
        assert_eq!(
            decode_response(b"* LIST () NIL \"Sent \\\"Items\\\"\"\r\n"),
            Ok((
                b"".as_ref(),
                Response::Data(Data::List {
                    items: vec![],
                    delimiter: None,
                    mailbox: Mailbox::Other(AString::String(IString::Quoted(
                        Quoted::unvalidated("Sent \"Items\"")
                    ))),
                })
            ))
        );
    }

    #[test]
    fn test_decode_inbox_case_insensitive() {
        assert_eq!(
            decode_response(b"* STATUS iNbOx (MESSAGES 1)\r\n"),
            Ok((
                b"".as_ref(),
                Response::Data(Data::Status {
                    mailbox: Mailbox::Inbox,
                    items: vec![StatusDataItem::Messages(1)],
                })
            ))
        );
    }

    #[test]
    fn test_decode_permanent_flags() {
        assert_eq!(
            decode_response(b"* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n"),
            Ok((
                b"".as_ref(),
                Response::Status(
                    Status::ok(
                        None,
                        Some(Code::PermanentFlags(vec![
                            FlagPerm::Flag(Flag::Deleted),
                            FlagPerm::Flag(Flag::Seen),
                            FlagPerm::Asterisk,
                        ])),
                        "Limited",
                    )
                    .unwrap()
                ),
            ))
        );
    }

    #[test]
    fn test_decode_unknown_code_is_preserved() {
        let got = decode_response(b"* OK [HIGHESTMODSEQ 715194045007] Ok\r\n").unwrap();

        match got.1 {
            Response::Status(Status::Untagged(StatusBody {
                code: Some(Code::Other(other)),
                ..
            })) => {
                assert_eq!(other.inner(), b"HIGHESTMODSEQ 715194045007");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
