use std::fmt;

use crate::{errors::Error, Result};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marker Telegram puts in front of a channel's bare id to build the
/// "fully-qualified" id used by the Bot API (`-100<raw>`).
pub const CHANNEL_ID_PREFIX: &str = "-100";

/// Fully-qualified (Bot API style) channel id, e.g. `-1001234567890`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub i64);

impl ChannelId {
    /// Derive the fully-qualified id from the bare MTProto channel id.
    ///
    /// This is a textual concatenation, not arithmetic: `1234567890` becomes
    /// `-1001234567890`.
    pub fn from_raw(raw: i64) -> Result<Self> {
        let text = format!("{CHANNEL_ID_PREFIX}{raw}");
        text.parse::<i64>()
            .map(Self)
            .map_err(|e| Error::InvalidChannelId(format!("{text}: {e}")))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
