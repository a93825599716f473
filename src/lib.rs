//! # Client-side IMAP protocol engine
//!
//! imap-engine is the stateful core of an IMAP4rev1 (RFC 3501) client: a
//! duplex, sans-I/O handler that turns structured commands into wire bytes
//! and wire bytes into structured responses, while honouring the protocol
//! rules that make this harder than it sounds:
//!
//! * **Synchronising literals** (RFC 3501, section 4.3). A command argument
//!   that cannot be sent as a quoted string is announced as `{N}\r\n`; the
//!   remainder of the command may only be transmitted after the server
//!   answered with a continuation request (`+`). The engine queues commands,
//!   releases their chunks strictly in submission order, and resolves a
//!   completion signal when a command has fully left.
//! * **Mode inversion** for IDLE (RFC 2177) and AUTHENTICATE. After these
//!   commands, continuation requests carry server data and must be forwarded
//!   upstream instead of being consumed as literal acknowledgements.
//!
//! The crate is sans-I/O: it never touches a socket. Feed it server bytes,
//! drain events and write chunks, and wire it to whatever transport you use.
//!
//! ## Example
//!
//! ```rust
//! use imap_engine::{
//!     command::{Command, CommandBody},
//!     engine::{ClientEngine, ClientEvent, ClientItem},
//! };
//!
//! let mut engine = ClientEngine::new();
//!
//! let login = Command::new("a", CommandBody::login("alice", "password").unwrap()).unwrap();
//! engine.submit(ClientItem::Command(login)).unwrap();
//! assert_eq!(engine.next_write().unwrap(), b"a LOGIN \"alice\" \"password\"\r\n");
//!
//! engine.feed(b"a OK LOGIN completed\r\n");
//! assert!(matches!(
//!     engine.next_event().unwrap(),
//!     Some(ClientEvent::Response(_))
//! ));
//! ```
//!
//! ## Scope
//!
//! The engine mediates an established connection. Connecting, greeting
//! handling, TLS, LOGOUT, and SASL mechanism state are the caller's job, as
//! is driving the actual socket.

#![forbid(unsafe_code)]
#![deny(missing_debug_implementations)]

pub mod auth;
pub mod codec;
pub mod command;
pub mod core;
pub mod engine;
pub mod flag;
pub mod mailbox;
pub mod response;
pub mod secret;
pub mod status;

mod framing;

pub use engine::{ClientEngine, ClientEvent, ClientItem, Completion, Mode};
pub use framing::FramingError;
