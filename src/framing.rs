//! Line/literal framing of the inbound byte stream.
//!
//! All interactions transmitted by client and server are in the form of
//! lines, that is, strings that end with a CRLF. The protocol receiver of an
//! IMAP4rev1 client is either ...

use thiserror::Error;

/// ... reading a line, or ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FramingState {
    ReadLine { to_consume_acc: usize },
    /// ... is reading a sequence of octets with a known count followed by a
    /// line.
    ReadLiteral { to_consume_acc: usize, length: u32 },
}

impl Default for FramingState {
    fn default() -> Self {
        FramingState::ReadLine { to_consume_acc: 0 }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    #[error("Expected `\\r\\n`, got `\\n`")]
    NotCrLf,
}

/// Skip the first `skip` bytes of `buf` and count how many more bytes are
/// needed to cover the next `\r\n`.
///
/// This function returns `None` when no line was found, `Some(Ok(length))`
/// with `buf[..skip + length]` being the first line (including `\r\n`), or
/// `Some(Err(length))` with `buf[..skip + length]` being the first line
/// (including `\n`) with a missing `\r`.
pub(crate) fn find_crlf_inclusive(skip: usize, buf: &[u8]) -> Option<Result<usize, usize>> {
    buf.iter().skip(skip).position(|item| *item == b'\n').map(
        |position| {
            if buf[skip + position.saturating_sub(1)] == b'\r' {
                Ok(position + 1)
            } else {
                Err(position + 1)
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_crlf_inclusive() {
        let tests = [
            (b"A\r".as_ref(), 0, None),
            (b"A\r\n", 0, Some(Ok(3))),
            (b"A\n", 0, Some(Err(2))),
            (b"\n", 0, Some(Err(1))),
            (b"aaa\r\nA\r".as_ref(), 5, None),
            (b"aaa\r\nA\r\n", 5, Some(Ok(3))),
            (b"aaa\r\nA\n", 5, Some(Err(2))),
            (b"aaa\r\n\n", 5, Some(Err(1))),
        ];

        for (test, skip, expected) in tests {
            let got = find_crlf_inclusive(skip, test);

            dbg!((std::str::from_utf8(test).unwrap(), skip, &expected, &got));

            assert_eq!(expected, got);
        }
    }
}
