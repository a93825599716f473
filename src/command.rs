//! Client commands.
//!
//! The variants cover the connection-management and mailbox-management
//! surface a client core drives itself: LOGIN/AUTHENTICATE, the mailbox CRUD
//! commands (whose astring arguments are what exercises the literal
//! machinery), and IDLE.

use thiserror::Error;

use crate::{
    auth::AuthMechanism,
    core::{IString, LiteralError, Tag, TagError},
    mailbox::Mailbox,
    secret::Secret,
    status::StatusDataItemName,
};

/// A command, consisting of a client-chosen tag and a command body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub tag: Tag,
    pub body: CommandBody,
}

impl Command {
    pub fn new<T>(tag: T, body: CommandBody) -> Result<Self, T::Error>
    where
        T: TryInto<Tag>,
    {
        Ok(Self {
            tag: tag.try_into()?,
            body,
        })
    }
}

/// A command body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandBody {
    // ----- any state -----
    Capability,
    Noop,
    Logout,

    // ----- not authenticated -----
    /// `AUTHENTICATE mechanism [initial-response]`
    ///
    /// Submitting this command puts the engine into continuation mode until
    /// the matching tagged response arrives; the challenge/response rounds
    /// are driven through [`AuthenticateData`](crate::auth::AuthenticateData).
    Authenticate {
        mechanism: AuthMechanism,
        /// Initial response per RFC 4959, sent base64-encoded on the command
        /// line itself (`=` for a present-but-empty response).
        initial_response: Option<Secret<Vec<u8>>>,
    },
    Login {
        username: IString,
        password: Secret<IString>,
    },

    // ----- authenticated -----
    Select {
        mailbox: Mailbox,
    },
    Examine {
        mailbox: Mailbox,
    },
    Create {
        mailbox: Mailbox,
    },
    Delete {
        mailbox: Mailbox,
    },
    Rename {
        from: Mailbox,
        to: Mailbox,
    },
    Subscribe {
        mailbox: Mailbox,
    },
    Unsubscribe {
        mailbox: Mailbox,
    },
    List {
        reference: Mailbox,
        pattern: IString,
    },
    Lsub {
        reference: Mailbox,
        pattern: IString,
    },
    Status {
        mailbox: Mailbox,
        item_names: Vec<StatusDataItemName>,
    },

    // ----- selected -----
    Check,
    Close,
    Expunge,

    /// RFC 2177 IDLE.
    ///
    /// Submitting this command puts the engine into continuation mode; the
    /// session is ended with [`ClientItem::IdleDone`](crate::engine::ClientItem).
    Idle,
}

impl CommandBody {
    pub fn login<U, P>(username: U, password: P) -> Result<Self, CommandError>
    where
        U: TryInto<IString, Error = LiteralError>,
        P: TryInto<IString, Error = LiteralError>,
    {
        Ok(Self::Login {
            username: username.try_into()?,
            password: Secret::new(password.try_into()?),
        })
    }

    pub fn authenticate(mechanism: AuthMechanism) -> Self {
        Self::Authenticate {
            mechanism,
            initial_response: None,
        }
    }

    pub fn authenticate_with_ir(
        mechanism: AuthMechanism,
        initial_response: impl Into<Vec<u8>>,
    ) -> Self {
        Self::Authenticate {
            mechanism,
            initial_response: Some(Secret::new(initial_response.into())),
        }
    }

    pub fn select<M>(mailbox: M) -> Result<Self, CommandError>
    where
        M: TryInto<Mailbox, Error = LiteralError>,
    {
        Ok(Self::Select {
            mailbox: mailbox.try_into()?,
        })
    }

    pub fn examine<M>(mailbox: M) -> Result<Self, CommandError>
    where
        M: TryInto<Mailbox, Error = LiteralError>,
    {
        Ok(Self::Examine {
            mailbox: mailbox.try_into()?,
        })
    }

    pub fn create<M>(mailbox: M) -> Result<Self, CommandError>
    where
        M: TryInto<Mailbox, Error = LiteralError>,
    {
        Ok(Self::Create {
            mailbox: mailbox.try_into()?,
        })
    }

    pub fn delete<M>(mailbox: M) -> Result<Self, CommandError>
    where
        M: TryInto<Mailbox, Error = LiteralError>,
    {
        Ok(Self::Delete {
            mailbox: mailbox.try_into()?,
        })
    }

    pub fn rename<F, T>(from: F, to: T) -> Result<Self, CommandError>
    where
        F: TryInto<Mailbox, Error = LiteralError>,
        T: TryInto<Mailbox, Error = LiteralError>,
    {
        Ok(Self::Rename {
            from: from.try_into()?,
            to: to.try_into()?,
        })
    }

    pub fn list<R, P>(reference: R, pattern: P) -> Result<Self, CommandError>
    where
        R: TryInto<Mailbox, Error = LiteralError>,
        P: TryInto<IString, Error = LiteralError>,
    {
        Ok(Self::List {
            reference: reference.try_into()?,
            pattern: pattern.try_into()?,
        })
    }

    pub fn status<M>(mailbox: M, item_names: Vec<StatusDataItemName>) -> Result<Self, CommandError>
    where
        M: TryInto<Mailbox, Error = LiteralError>,
    {
        Ok(Self::Status {
            mailbox: mailbox.try_into()?,
            item_names,
        })
    }
}

/// Error during creation of a command.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Literal(#[from] LiteralError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Literal;

    #[test]
    fn test_command_new() {
        assert!(Command::new("a", CommandBody::Noop).is_ok());
        assert!(Command::new("a+", CommandBody::Noop).is_err());
        assert!(Command::new("", CommandBody::Noop).is_err());
    }

    #[test]
    fn test_login_rejects_nul() {
        assert!(CommandBody::login("alice", "p\x00ss").is_err());
        assert!(CommandBody::login("alice", "pass").is_ok());
    }

    #[test]
    fn test_rename_argument_forms() {
        let body = CommandBody::rename("\n", "to").unwrap();

        match body {
            CommandBody::Rename { from, to } => {
                assert_eq!(
                    from,
                    Mailbox::Other(
                        IString::Literal(Literal::try_from("\n").unwrap()).into()
                    )
                );
                assert!(matches!(
                    to,
                    Mailbox::Other(crate::core::AString::String(IString::Quoted(_)))
                ));
            }
            _ => unreachable!(),
        }
    }
}
