use std::fmt;

/// Who the user session is logged in as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub username: Option<String>,
}

impl fmt::Display for Identity {
    /// Preferred handle, else the numeric id.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.username.as_deref().filter(|u| !u.is_empty()) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerKind {
    User,
    Channel,
}

/// A resolved remote entity, ready to be used as a request argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRef {
    pub kind: PeerKind,
    pub id: i64,
    pub access_hash: Option<i64>,
}

/// Result of a "create channel" call: bare ids of the chats it returned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreatedChannel {
    pub channels: Vec<i64>,
}

/// Admin capabilities granted on a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdminRights {
    pub change_info: bool,
    pub post_messages: bool,
    pub edit_messages: bool,
    pub delete_messages: bool,
    pub ban_users: bool,
    pub invite_users: bool,
    pub pin_messages: bool,
    pub add_admins: bool,
    pub anonymous: bool,
    pub manage_call: bool,
    pub other: bool,
}

impl AdminRights {
    /// Fixed grant for the bot on a personal archive channel.
    ///
    /// The bot may not appoint other admins and never posts anonymously.
    pub const fn archive_bot() -> Self {
        Self {
            change_info: true,
            post_messages: true,
            edit_messages: true,
            delete_messages: true,
            ban_users: true,
            invite_users: true,
            pin_messages: true,
            add_admins: false,
            anonymous: false,
            manage_call: true,
            other: true,
        }
    }
}
