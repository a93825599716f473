//! The duplex client engine.
//!
//! [`ClientEngine`] mediates between structured [commands](crate::command)
//! and the wire. It is sans-I/O: the caller feeds server bytes in with
//! [`ClientEngine::feed`], drains parsed [`ClientEvent`]s with
//! [`ClientEngine::next_event`], and writes out the byte chunks returned by
//! [`ClientEngine::next_write`] — one chunk per write.
//!
//! The engine owns two intertwined pieces of state:
//!
//! * An **outbound queue** of partially-sent commands. Everything up to the
//!   first literal stop of a command is released immediately; each further
//!   chunk is released only when the server acknowledges the preceding stop
//!   with a continuation request (`+`). Chunks of different commands are
//!   never interleaved: the bytes on the wire are the concatenation of the
//!   encodings in submission order.
//! * A **mode** selecting the dispatch policy for continuation requests.
//!   After `IDLE` or `AUTHENTICATE` has been emitted, continuation requests
//!   carry server data and are forwarded upstream instead of being consumed
//!   to advance a literal. Mode transitions happen at command boundaries
//!   only, so the outbound queue head never awaits a literal acknowledgement
//!   while continuations are forwarded.
//!
//! # Example
//!
//! ```rust
//! use imap_engine::{
//!     command::{Command, CommandBody},
//!     engine::{ClientEngine, ClientItem},
//! };
//!
//! let mut engine = ClientEngine::new();
//!
//! let command = Command::new("x", CommandBody::rename("\n", "to").unwrap()).unwrap();
//! let mut completion = engine.submit(ClientItem::Command(command)).unwrap();
//!
//! // Only the part up to the literal stop is released ...
//! assert_eq!(engine.next_write().unwrap(), b"x RENAME {1}\r\n");
//! assert!(engine.next_write().is_none());
//!
//! // ... until the server sends a continuation request.
//! engine.feed(b"+ OK\r\n");
//! assert!(engine.next_event().unwrap().is_none());
//! assert_eq!(engine.next_write().unwrap(), b"\n \"to\"\r\n");
//! assert_eq!(completion.try_resolved(), Some(Ok(())));
//! ```

use std::{
    collections::VecDeque,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::{Buf, BytesMut};
use log::{error, warn};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::{
    auth::AuthenticateData,
    codec::decode::{decode_response, DecodeError},
    command::{Command, CommandBody},
    core::Tag,
    framing::{find_crlf_inclusive, FramingError, FramingState},
    response::{ContinuationRequest, Response, Status, Tagged},
};

/// An item submitted to the outbound half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientItem {
    /// A tagged command.
    Command(Command),
    /// End the current IDLE session; wire form `DONE\r\n`.
    IdleDone,
    /// Answer a continuation request during AUTHENTICATE.
    Authenticate(AuthenticateData),
}

/// An item delivered by the inbound half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A tagged, untagged, or fatal response.
    Response(Response),
    /// A continuation request carrying IDLE or AUTHENTICATE data.
    Continuation(ContinuationRequest),
    /// A continuation request arrived although no literal acknowledgement
    /// was outstanding.
    ///
    /// This is the only protocol fault the engine survives: the continuation
    /// is dropped and the connection stays usable. Whether to tear down
    /// anyway is the caller's decision.
    UnexpectedContinuation(ContinuationRequest),
}

/// The dispatch policy for inbound continuation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Continuation requests acknowledge literal stops; receiving one while
    /// no stop is outstanding is a protocol fault.
    ExpectingResponses,
    /// An IDLE session is active; continuation requests carry server data
    /// and are forwarded upstream.
    Idle,
    /// An AUTHENTICATE exchange is active; continuation requests carry
    /// challenge data and are forwarded upstream. The tagged response with
    /// the remembered tag ends the exchange.
    Authenticating { tag: Tag },
}

impl Mode {
    pub fn expects_continuations(&self) -> bool {
        !matches!(self, Self::ExpectingResponses)
    }
}

/// A deferred mode transition, applied when the carrying command's final
/// chunk has been handed to the transport.
#[derive(Debug)]
enum ModeSwitch {
    Idle,
    Authenticate(Tag),
}

#[derive(Debug)]
struct QueuedCommand {
    /// Remaining chunks; the first one is released when the command reaches
    /// the queue head, all further ones await continuation requests.
    chunks: VecDeque<Vec<u8>>,
    /// Whether the first chunk has been released.
    started: bool,
    done: Option<oneshot::Sender<Result<(), CommandError>>>,
    switch: Option<ModeSwitch>,
}

/// A one-shot signal resolved once every chunk of a submission has been
/// handed to the transport.
///
/// Can be polled as a `Future`, or checked synchronously with
/// [`Completion::try_resolved`].
#[derive(Debug)]
pub struct Completion(oneshot::Receiver<Result<(), CommandError>>);

impl Completion {
    fn pending() -> (oneshot::Sender<Result<(), CommandError>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self(receiver))
    }

    fn resolved() -> Self {
        let (sender, receiver) = oneshot::channel();
        // Safety: `unwrap` can't panic as the receiver is alive.
        sender.send(Ok(())).unwrap();
        Self(receiver)
    }

    /// Returns the outcome if the signal has been resolved yet.
    pub fn try_resolved(&mut self) -> Option<Result<(), CommandError>> {
        match self.0.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(Err(CommandError::ConnectionClosed))
            }
        }
    }
}

impl Future for Completion {
    type Output = Result<(), CommandError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx).map(|outcome| match outcome {
            Ok(outcome) => outcome,
            // The engine was dropped without resolving the signal.
            Err(_) => Err(CommandError::ConnectionClosed),
        })
    }
}

/// Error of a rejected submission. The outbound queue is untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Only DONE or authentication data may be submitted while continuation requests are expected")]
    AwaitingContinuation,
    #[error("DONE is only valid during an IDLE session")]
    NotIdling,
    #[error("Authentication data is only valid during an AUTHENTICATE exchange")]
    NotAuthenticating,
    #[error("The connection is no longer usable")]
    ConnectionClosed,
}

/// Error resolved into the [`Completion`] of a command whose emission is no
/// longer possible.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Connection closed before the command was fully sent")]
    ConnectionClosed,
    #[error("Protocol error on the connection")]
    Protocol,
}

/// Fatal error of the inbound half.
///
/// All pending completions have been failed; the caller is expected to close
/// the connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error("Parsing failed")]
    ParseFailed,
}

/// The duplex protocol handler.
///
/// See the [module-level documentation](self) for an overview.
#[derive(Debug)]
pub struct ClientEngine {
    mode: Mode,
    queue: VecDeque<QueuedCommand>,
    framing: FramingState,
    buffer: BytesMut,
    writes: VecDeque<Vec<u8>>,
    poisoned: bool,
}

impl ClientEngine {
    pub fn new() -> Self {
        Self {
            mode: Mode::ExpectingResponses,
            queue: VecDeque::new(),
            framing: FramingState::default(),
            buffer: BytesMut::new(),
            writes: VecDeque::new(),
            poisoned: false,
        }
    }

    /// The current continuation dispatch mode.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Submit an item to the outbound half.
    ///
    /// Anything that can be released right away (at least the first chunk of
    /// a command when the queue is empty) becomes available through
    /// [`Self::next_write`] before this method returns.
    pub fn submit(&mut self, item: ClientItem) -> Result<Completion, SubmitError> {
        if self.poisoned {
            return Err(SubmitError::ConnectionClosed);
        }

        match item {
            ClientItem::Command(command) => {
                if self.mode.expects_continuations() {
                    return Err(SubmitError::AwaitingContinuation);
                }

                let switch = match &command.body {
                    CommandBody::Idle => Some(ModeSwitch::Idle),
                    CommandBody::Authenticate { .. } => {
                        Some(ModeSwitch::Authenticate(command.tag.clone()))
                    }
                    _ => None,
                };

                let (done, completion) = Completion::pending();
                self.queue.push_back(QueuedCommand {
                    chunks: command.encode().chunks().into(),
                    started: false,
                    done: Some(done),
                    switch,
                });
                self.pump();

                Ok(completion)
            }
            ClientItem::IdleDone => {
                if !matches!(self.mode, Mode::Idle) {
                    return Err(SubmitError::NotIdling);
                }

                self.writes.push_back(b"DONE\r\n".to_vec());
                self.mode = Mode::ExpectingResponses;
                // Commands enqueued behind the IDLE may start now.
                self.pump();

                Ok(Completion::resolved())
            }
            ClientItem::Authenticate(data) => {
                if !matches!(self.mode, Mode::Authenticating { .. }) {
                    return Err(SubmitError::NotAuthenticating);
                }

                self.writes.push_back(data.encode().dump());

                Ok(Completion::resolved())
            }
        }
    }

    /// Append bytes received from the server.
    ///
    /// Any split is fine, including mid-line; call [`Self::next_event`] to
    /// drive parsing.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Parse the next inbound item.
    ///
    /// Returns `Ok(None)` when more data is needed. Continuation requests
    /// that acknowledge a literal stop are consumed internally (releasing
    /// the next outbound chunk) and do not surface as events.
    pub fn next_event(&mut self) -> Result<Option<ClientEvent>, EngineError> {
        if self.poisoned {
            return Ok(None);
        }

        loop {
            match self.framing {
                FramingState::ReadLine { to_consume_acc } => {
                    match find_crlf_inclusive(to_consume_acc, self.buffer.as_ref()) {
                        // After skipping `to_consume_acc` bytes, we need
                        // `to_consume` more bytes to form a full line
                        // (including the `\r\n`).
                        Some(Ok(to_consume)) => {
                            let message_end = to_consume_acc + to_consume;

                            let decoded = decode_response(&self.buffer.as_ref()[..message_end])
                                .map(|(remaining, response)| {
                                    debug_assert!(remaining.is_empty());
                                    response
                                });

                            match decoded {
                                Ok(response) => {
                                    self.buffer.advance(message_end);
                                    self.framing = FramingState::ReadLine { to_consume_acc: 0 };

                                    if let Some(event) = self.dispatch(response) {
                                        return Ok(Some(event));
                                    }
                                }
                                // We found a literal and need to wait for
                                // (at least) `length` more bytes.
                                Err(DecodeError::LiteralFound { length }) => {
                                    self.buffer.reserve(length as usize);

                                    self.framing = FramingState::ReadLiteral {
                                        to_consume_acc: message_end,
                                        length,
                                    };
                                }
                                // `Incomplete` should not happen because a
                                // line that doesn't end with a literal is
                                // always "complete" in IMAP.
                                Err(DecodeError::Incomplete) | Err(DecodeError::Failed) => {
                                    let discarded = self.buffer.split_to(message_end);
                                    error!("Parsing failed. discarded = {discarded:?}");

                                    self.poison(CommandError::Protocol);
                                    return Err(EngineError::ParseFailed);
                                }
                            }
                        }
                        // Note: This line is missing the `\r\n` and the
                        // connection can't be trusted anymore.
                        Some(Err(to_discard)) => {
                            let discarded = self.buffer.split_to(to_consume_acc + to_discard);
                            error!("Expected `\\r\\n`, got `\\n`. discarded = {discarded:?}");

                            self.poison(CommandError::Protocol);
                            return Err(EngineError::Framing(FramingError::NotCrLf));
                        }
                        // More data needed.
                        None => return Ok(None),
                    }
                }
                FramingState::ReadLiteral {
                    to_consume_acc,
                    length,
                } => {
                    if to_consume_acc + length as usize <= self.buffer.len() {
                        self.framing = FramingState::ReadLine {
                            to_consume_acc: to_consume_acc + length as usize,
                        };
                    } else {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Take the next outbound chunk, if any.
    ///
    /// The granularity is normative: one chunk per write, no batching across
    /// chunks.
    pub fn next_write(&mut self) -> Option<Vec<u8>> {
        self.writes.pop_front()
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Mark the connection as gone.
    ///
    /// Every pending [`Completion`] is failed with
    /// [`CommandError::ConnectionClosed`]; further submissions are rejected.
    pub fn connection_closed(&mut self) {
        self.poison(CommandError::ConnectionClosed);
    }

    fn dispatch(&mut self, response: Response) -> Option<ClientEvent> {
        match response {
            Response::ContinuationRequest(continuation) => {
                if self.mode.expects_continuations() {
                    return Some(ClientEvent::Continuation(continuation));
                }

                if self.advance_literal() {
                    None
                } else {
                    warn!("Unexpected continuation request");

                    Some(ClientEvent::UnexpectedContinuation(continuation))
                }
            }
            response => {
                let authenticate_done = matches!(
                    (&self.mode, &response),
                    (
                        Mode::Authenticating { tag },
                        Response::Status(Status::Tagged(Tagged { tag: got, .. })),
                    ) if got == tag
                );

                if authenticate_done {
                    self.mode = Mode::ExpectingResponses;
                    self.pump();
                }

                Some(ClientEvent::Response(response))
            }
        }
    }

    /// Release queue-head chunks while possible.
    ///
    /// The first chunk of a command is released when it reaches the head;
    /// further chunks are only released by [`Self::advance_literal`]. Stops
    /// at the first head that awaits a continuation, and entirely while
    /// continuations are forwarded upstream.
    fn pump(&mut self) {
        while !self.mode.expects_continuations() {
            let (chunk, exhausted) = match self.queue.front_mut() {
                Some(head) if !head.started => {
                    head.started = true;
                    let chunk = head.chunks.pop_front();
                    (chunk, head.chunks.is_empty())
                }
                _ => return,
            };

            if let Some(chunk) = chunk {
                self.writes.push_back(chunk);
            }

            if exhausted {
                self.finish_head();
            } else {
                return;
            }
        }
    }

    /// Consume a continuation request as a literal acknowledgement.
    ///
    /// Returns `false` when no literal acknowledgement was outstanding.
    fn advance_literal(&mut self) -> bool {
        let (chunk, exhausted) = match self.queue.front_mut() {
            Some(head) if head.started && !head.chunks.is_empty() => {
                let chunk = head.chunks.pop_front();
                (chunk, head.chunks.is_empty())
            }
            _ => return false,
        };

        if let Some(chunk) = chunk {
            self.writes.push_back(chunk);
        }

        if exhausted {
            self.finish_head();
            self.pump();
        }

        true
    }

    /// Pop the exhausted queue head: resolve its completion and apply its
    /// deferred mode transition.
    fn finish_head(&mut self) {
        if let Some(mut entry) = self.queue.pop_front() {
            if let Some(done) = entry.done.take() {
                let _ = done.send(Ok(()));
            }

            match entry.switch.take() {
                Some(ModeSwitch::Idle) => self.mode = Mode::Idle,
                Some(ModeSwitch::Authenticate(tag)) => {
                    self.mode = Mode::Authenticating { tag };
                }
                None => {}
            }
        }
    }

    fn poison(&mut self, kind: CommandError) {
        self.poisoned = true;

        for mut entry in self.queue.drain(..) {
            if let Some(done) = entry.done.take() {
                let _ = done.send(Err(kind));
            }
        }
    }
}

impl Default for ClientEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthMechanism;

    fn command(tag: &str, body: CommandBody) -> ClientItem {
        ClientItem::Command(Command::new(tag, body).unwrap())
    }

    fn drain(engine: &mut ClientEngine) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = engine.next_write() {
            out.extend(chunk);
        }
        out
    }

    #[test]
    fn test_mode_symmetry_idle() {
        let mut engine = ClientEngine::new();
        assert_eq!(*engine.mode(), Mode::ExpectingResponses);

        engine.submit(command("1", CommandBody::Idle)).unwrap();
        assert_eq!(*engine.mode(), Mode::Idle);

        engine.submit(ClientItem::IdleDone).unwrap();
        assert_eq!(*engine.mode(), Mode::ExpectingResponses);

        assert_eq!(drain(&mut engine), b"1 IDLE\r\nDONE\r\n");
    }

    #[test]
    fn test_mode_symmetry_authenticate() {
        let mut engine = ClientEngine::new();

        engine
            .submit(command(
                "A001",
                CommandBody::authenticate(AuthMechanism::Plain),
            ))
            .unwrap();
        assert_eq!(
            *engine.mode(),
            Mode::Authenticating {
                tag: Tag::try_from("A001").unwrap()
            }
        );

        engine.feed(b"A001 OK done\r\n");
        assert!(matches!(
            engine.next_event().unwrap(),
            Some(ClientEvent::Response(_))
        ));
        assert_eq!(*engine.mode(), Mode::ExpectingResponses);
    }

    #[test]
    fn test_invalid_submissions() {
        let mut engine = ClientEngine::new();

        assert_eq!(
            engine.submit(ClientItem::IdleDone).unwrap_err(),
            SubmitError::NotIdling
        );
        assert_eq!(
            engine
                .submit(ClientItem::Authenticate(AuthenticateData::Cancel))
                .unwrap_err(),
            SubmitError::NotAuthenticating
        );

        engine.submit(command("1", CommandBody::Idle)).unwrap();
        assert_eq!(
            engine.submit(command("2", CommandBody::Noop)).unwrap_err(),
            SubmitError::AwaitingContinuation
        );
        assert_eq!(
            engine
                .submit(ClientItem::Authenticate(AuthenticateData::Cancel))
                .unwrap_err(),
            SubmitError::NotAuthenticating
        );
    }

    #[test]
    fn test_unexpected_continuation_with_idle_queue() {
        let mut engine = ClientEngine::new();

        engine.feed(b"+ OK\r\n");
        assert!(matches!(
            engine.next_event().unwrap(),
            Some(ClientEvent::UnexpectedContinuation(_))
        ));

        // The engine stays usable.
        engine.submit(command("a", CommandBody::Noop)).unwrap();
        assert_eq!(drain(&mut engine), b"a NOOP\r\n");
    }

    #[test]
    fn test_connection_closed_fails_pending_completions() {
        let mut engine = ClientEngine::new();

        let mut completion = engine
            .submit(command("x", CommandBody::rename("\n", "to").unwrap()))
            .unwrap();
        assert_eq!(completion.try_resolved(), None);

        engine.connection_closed();
        assert_eq!(
            completion.try_resolved(),
            Some(Err(CommandError::ConnectionClosed))
        );
        assert_eq!(
            engine.submit(command("y", CommandBody::Noop)).unwrap_err(),
            SubmitError::ConnectionClosed
        );
    }

    #[test]
    fn test_mode_switch_waits_for_command_boundary() {
        let mut engine = ClientEngine::new();

        // A command that is still waiting for its literal acknowledgement ...
        engine
            .submit(command("x", CommandBody::rename("\n", "to").unwrap()))
            .unwrap();
        // ... with an IDLE queued behind it.
        engine.submit(command("1", CommandBody::Idle)).unwrap();
        assert_eq!(drain(&mut engine), b"x RENAME {1}\r\n");
        assert_eq!(*engine.mode(), Mode::ExpectingResponses);

        // The acknowledgement releases the literal chunk, then the IDLE.
        engine.feed(b"+ OK\r\n");
        assert_eq!(engine.next_event().unwrap(), None);
        assert_eq!(drain(&mut engine), b"\n \"to\"\r\n1 IDLE\r\n");
        assert_eq!(*engine.mode(), Mode::Idle);
    }
}
