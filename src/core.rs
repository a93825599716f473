//! Core data types.
//!
//! To guarantee that only valid messages reach the wire, the crate models
//! IMAP's string classes as validated types such as [`Atom`], [`Quoted`], and
//! [`Literal`]. The representation of a value may change the protocol flow: a
//! mailbox name can be sent as a quoted string or as a literal, and a literal
//! requires a continuation round-trip before its payload may be transmitted.
//! Validation happens on construction, so encoding is infallible and a
//! rejected value surfaces to the caller that tried to create it.
//!
//! When a value is constructed through [`IString`]'s `TryFrom` conversions,
//! the quoted form is chosen whenever it is legal; the literal form is used
//! only for payloads a quoted string cannot carry (CR, LF, or bytes outside
//! US-ASCII).

use std::borrow::Cow;

use thiserror::Error;

// ----- character classes -----

fn is_ctl(byte: u8) -> bool {
    byte < 0x20 || byte == 0x7f
}

/// `ATOM-CHAR = <any CHAR except atom-specials>`
///
/// ```abnf
/// atom-specials   = "(" / ")" / "{" / SP / CTL / list-wildcards / quoted-specials / resp-specials
/// list-wildcards  = "%" / "*"
/// quoted-specials = DQUOTE / "\"
/// resp-specials   = "]"
/// ```
pub(crate) fn is_atom_char(byte: u8) -> bool {
    byte.is_ascii()
        && !is_ctl(byte)
        && !matches!(
            byte,
            b'(' | b')' | b'{' | b' ' | b'%' | b'*' | b'"' | b'\\' | b']'
        )
}

/// `ASTRING-CHAR = ATOM-CHAR / resp-specials`
pub(crate) fn is_astring_char(byte: u8) -> bool {
    is_atom_char(byte) || byte == b']'
}

/// `TEXT-CHAR = <any CHAR except CR and LF>` with `CHAR = %x01-7F`
pub(crate) fn is_text_char(byte: u8) -> bool {
    byte != 0x00 && byte != b'\r' && byte != b'\n' && byte.is_ascii()
}

/// `CHAR8 = %x01-ff`
pub(crate) fn is_char8(byte: u8) -> bool {
    byte != 0x00
}

pub(crate) fn is_quoted_specials(byte: u8) -> bool {
    byte == b'"' || byte == b'\\'
}

pub(crate) fn is_any_text_char_except_quoted_specials(byte: u8) -> bool {
    is_text_char(byte) && !is_quoted_specials(byte)
}

// ----- quoting helpers -----

pub(crate) fn escape_quoted(unescaped: &str) -> Cow<str> {
    let mut escaped = Cow::Borrowed(unescaped);

    if escaped.contains('\\') {
        escaped = Cow::Owned(escaped.replace('\\', "\\\\"));
    }

    if escaped.contains('"') {
        escaped = Cow::Owned(escaped.replace('"', "\\\""));
    }

    escaped
}

pub(crate) fn unescape_quoted(escaped: &str) -> Cow<str> {
    let mut unescaped = Cow::Borrowed(escaped);

    if unescaped.contains("\\\\") {
        unescaped = Cow::Owned(unescaped.replace("\\\\", "\\"));
    }

    if unescaped.contains("\\\"") {
        unescaped = Cow::Owned(unescaped.replace("\\\"", "\""));
    }

    unescaped
}

// ----- tag -----

/// A client-chosen identifier matching a command to its tagged response.
///
/// # ABNF definition
///
/// ```abnf
/// tag = 1*<any ASTRING-CHAR except "+">
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn validate(value: impl AsRef<[u8]>) -> Result<(), TagError> {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(TagError::Empty);
        }

        if let Some(position) = value
            .iter()
            .position(|b| !is_astring_char(*b) || *b == b'+')
        {
            return Err(TagError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }

    pub(crate) fn unvalidated(inner: impl Into<String>) -> Self {
        let inner = inner.into();

        #[cfg(debug_assertions)]
        Self::validate(&inner).unwrap();

        Self(inner)
    }
}

impl TryFrom<&str> for Tag {
    type Error = TagError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::validate(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Tag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;

        Ok(Self(value))
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum TagError {
    #[error("Must not be empty")]
    Empty,
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- atom -----

/// A string subset to model IMAP's `atom`s.
///
/// # ABNF definition
///
/// ```abnf
/// atom = 1*ATOM-CHAR
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom(String);

impl Atom {
    pub fn validate(value: impl AsRef<[u8]>) -> Result<(), AtomError> {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(AtomError::Empty);
        }

        if let Some(position) = value.iter().position(|b| !is_atom_char(*b)) {
            return Err(AtomError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }

    pub(crate) fn unvalidated(inner: impl Into<String>) -> Self {
        let inner = inner.into();

        #[cfg(debug_assertions)]
        Self::validate(&inner).unwrap();

        Self(inner)
    }
}

impl TryFrom<&str> for Atom {
    type Error = AtomError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::validate(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Atom {
    type Error = AtomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;

        Ok(Self(value))
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum AtomError {
    #[error("Must not be empty")]
    Empty,
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- extended atom -----

/// A string subset to model IMAP's `1*ASTRING-CHAR` ("extended `atom`").
///
/// This type is required due to the use of `1*ASTRING-CHAR` in `astring`:
/// `]` is allowed here but not in [`Atom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomExt(String);

impl AtomExt {
    pub fn validate(value: impl AsRef<[u8]>) -> Result<(), AtomError> {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(AtomError::Empty);
        }

        if let Some(position) = value.iter().position(|b| !is_astring_char(*b)) {
            return Err(AtomError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }

    pub(crate) fn unvalidated(inner: impl Into<String>) -> Self {
        let inner = inner.into();

        #[cfg(debug_assertions)]
        Self::validate(&inner).unwrap();

        Self(inner)
    }
}

impl TryFrom<&str> for AtomExt {
    type Error = AtomError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::validate(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl From<Atom> for AtomExt {
    fn from(value: Atom) -> Self {
        Self(value.0)
    }
}

impl AsRef<str> for AtomExt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ----- string -----

/// Either a quoted string or a literal.
///
/// The `TryFrom` conversions prefer [`Quoted`] whenever the value is legal as
/// a quoted string and fall back to [`Literal`] otherwise. This tie-break is
/// deterministic: only CR, LF, NUL, or non-ASCII bytes force the literal form
/// (and NUL is not representable at all).
///
/// # ABNF definition
///
/// ```abnf
/// string = quoted / literal
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IString {
    Literal(Literal),
    Quoted(Quoted),
}

impl IString {
    /// Returns the raw value, without quoting or literal framing.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Literal(literal) => literal.as_ref(),
            Self::Quoted(quoted) => quoted.inner().as_bytes(),
        }
    }
}

impl TryFrom<&str> for IString {
    type Error = LiteralError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.as_bytes().to_vec())
    }
}

impl TryFrom<String> for IString {
    type Error = LiteralError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.into_bytes())
    }
}

impl TryFrom<&[u8]> for IString {
    type Error = LiteralError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from(value.to_vec())
    }
}

impl TryFrom<Vec<u8>> for IString {
    type Error = LiteralError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        if value.iter().all(|b| is_text_char(*b)) {
            // Safety: `unwrap` can't panic because `is_text_char` implies ASCII.
            return Ok(Self::Quoted(Quoted(String::from_utf8(value).unwrap())));
        }

        Ok(Self::Literal(Literal::try_from(value)?))
    }
}

// ----- astring -----

/// `astring = 1*ASTRING-CHAR / string`
///
/// The atom form only appears on the parsing side; values constructed through
/// [`IString`] always use the string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AString {
    Atom(AtomExt),
    String(IString),
}

impl AString {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Atom(atom) => atom.inner().as_bytes(),
            Self::String(string) => string.as_bytes(),
        }
    }
}

impl From<IString> for AString {
    fn from(value: IString) -> Self {
        Self::String(value)
    }
}

impl TryFrom<&str> for AString {
    type Error = LiteralError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(Self::String(IString::try_from(value)?))
    }
}

// ----- quoted -----

/// A quoted string.
///
/// The inner value is unescaped; `"` and `\` are escaped during encoding.
///
/// # ABNF definition
///
/// ```abnf
/// quoted          = DQUOTE *QUOTED-CHAR DQUOTE
/// QUOTED-CHAR     = <any TEXT-CHAR except quoted-specials> / "\" quoted-specials
/// quoted-specials = DQUOTE / "\"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quoted(String);

impl Quoted {
    pub fn validate(value: impl AsRef<[u8]>) -> Result<(), QuotedError> {
        let value = value.as_ref();

        if let Some(position) = value.iter().position(|b| !is_text_char(*b)) {
            return Err(QuotedError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }

    pub(crate) fn unvalidated(inner: impl Into<String>) -> Self {
        let inner = inner.into();

        #[cfg(debug_assertions)]
        Self::validate(&inner).unwrap();

        Self(inner)
    }
}

impl TryFrom<&str> for Quoted {
    type Error = QuotedError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::validate(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl AsRef<str> for Quoted {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum QuotedError {
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- literal -----

/// A length-prefixed byte string.
///
/// On the wire, a literal is announced by the stop `{N}\r\n`; the N payload
/// bytes may only follow after the server acknowledged the stop with a
/// continuation request.
///
/// # ABNF definition
///
/// ```abnf
/// literal = "{" number "}" CRLF *CHAR8
///            ; Number represents the number of CHAR8s
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(Vec<u8>);

impl Literal {
    pub fn validate(value: impl AsRef<[u8]>) -> Result<(), LiteralError> {
        let value = value.as_ref();

        if let Some(position) = value.iter().position(|b| !is_char8(*b)) {
            return Err(LiteralError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }
}

impl TryFrom<&[u8]> for Literal {
    type Error = LiteralError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::validate(value)?;

        Ok(Self(value.to_vec()))
    }
}

impl TryFrom<Vec<u8>> for Literal {
    type Error = LiteralError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::validate(&value)?;

        Ok(Self(value))
    }
}

impl TryFrom<&str> for Literal {
    type Error = LiteralError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.as_bytes())
    }
}

impl AsRef<[u8]> for Literal {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum LiteralError {
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- text -----

/// A human-readable text, e.g., the explanation of a status response.
///
/// # ABNF definition
///
/// ```abnf
/// text = 1*TEXT-CHAR
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text(String);

impl Text {
    pub fn validate(value: impl AsRef<[u8]>) -> Result<(), TextError> {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(TextError::Empty);
        }

        if let Some(position) = value.iter().position(|b| !is_text_char(*b)) {
            return Err(TextError::ByteNotAllowed {
                found: value[position],
                position,
            });
        }

        Ok(())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }

    pub(crate) fn unvalidated(inner: impl Into<String>) -> Self {
        let inner = inner.into();

        #[cfg(debug_assertions)]
        Self::validate(&inner).unwrap();

        Self(inner)
    }
}

impl TryFrom<&str> for Text {
    type Error = TextError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::validate(value)?;

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Text {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;

        Ok(Self(value))
    }
}

impl AsRef<str> for Text {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum TextError {
    #[error("Must not be empty")]
    Empty,
    #[error("Invalid byte b'\\x{found:02x}' at index {position}")]
    ByteNotAllowed { found: u8, position: usize },
}

// ----- quoted char -----

/// A single quoted character, e.g., the mailbox hierarchy delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuotedChar(char);

impl QuotedChar {
    pub fn validate(value: char) -> Result<(), QuotedCharError> {
        if value.is_ascii() && is_text_char(value as u8) {
            Ok(())
        } else {
            Err(QuotedCharError::Invalid(value))
        }
    }

    pub fn inner(&self) -> char {
        self.0
    }

    pub(crate) fn unvalidated(inner: char) -> Self {
        #[cfg(debug_assertions)]
        Self::validate(inner).unwrap();

        Self(inner)
    }
}

impl TryFrom<char> for QuotedChar {
    type Error = QuotedCharError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::validate(value)?;

        Ok(Self(value))
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum QuotedCharError {
    #[error("Invalid character {0:?}")]
    Invalid(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag() {
        assert!(Tag::try_from("A1").is_ok());
        assert!(Tag::try_from("abc123").is_ok());

        assert!(Tag::try_from("").is_err());
        assert!(Tag::try_from("A+1").is_err());
        assert!(Tag::try_from("A 1").is_err());
    }

    #[test]
    fn test_atom() {
        assert!(Atom::try_from("NOOP").is_ok());
        assert!(Atom::try_from("AUTH=PLAIN").is_ok());
        assert!(Atom::try_from("LITERAL+").is_ok());

        assert!(Atom::try_from("").is_err());
        assert!(Atom::try_from("a b").is_err());
        assert!(Atom::try_from("x]").is_err());
        assert!(Atom::try_from("x*").is_err());
    }

    #[test]
    fn test_istring_prefers_quoted() {
        let tests: &[(&[u8], IString)] = &[
            (b"foo", IString::Quoted(Quoted("foo".into()))),
            (b"", IString::Quoted(Quoted(String::new()))),
            (b"a b \"c\"", IString::Quoted(Quoted("a b \"c\"".into()))),
            (b"\n", IString::Literal(Literal(b"\n".to_vec()))),
            (b"\r", IString::Literal(Literal(b"\r".to_vec()))),
            (b"a\xffb", IString::Literal(Literal(b"a\xffb".to_vec()))),
        ];

        for (input, expected) in tests {
            let got = IString::try_from(*input).unwrap();
            assert_eq!(*expected, got);
        }

        // NUL is representable neither quoted nor as a literal.
        assert!(IString::try_from(b"\x00".as_ref()).is_err());
    }

    #[test]
    fn test_escape_quoted() {
        assert_eq!(escape_quoted("alice"), "alice");
        assert_eq!(escape_quoted("\\alice\\"), "\\\\alice\\\\");
        assert_eq!(escape_quoted("alice\""), "alice\\\"");
        assert_eq!(unescape_quoted(r#"\\alice\\ \""#), "\\alice\\ \"");
    }

    #[test]
    fn test_text() {
        assert!(Text::try_from("ok").is_ok());
        assert!(Text::try_from("").is_err());
        assert!(Text::try_from("a\rb").is_err());
        assert!(Text::try_from("a\nb").is_err());
    }
}
