//! STATUS-related types.

use std::num::NonZeroU32;

/// An item name a STATUS command asks for.
///
/// `status-att = "MESSAGES" / "RECENT" / "UIDNEXT" / "UIDVALIDITY" / "UNSEEN"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDataItemName {
    Messages,
    Recent,
    UidNext,
    UidValidity,
    Unseen,
}

/// An item in a STATUS response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDataItem {
    /// The number of messages in the mailbox.
    Messages(u32),
    /// The number of messages with the \Recent flag set.
    Recent(u32),
    /// The next unique identifier value of the mailbox.
    UidNext(NonZeroU32),
    /// The unique identifier validity value of the mailbox.
    UidValidity(NonZeroU32),
    /// The number of messages which do not have the \Seen flag set.
    Unseen(u32),
}
