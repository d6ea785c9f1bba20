use std::path::PathBuf;

/// Core error type for the archive bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently (abort at startup vs degrade per request).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error at {path}: {reason}")]
    Store { path: PathBuf, reason: String },

    #[error("invalid channel id: {0}")]
    InvalidChannelId(String),

    #[error(transparent)]
    UserSession(#[from] UserSessionError),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the user-mode (MTProto) session.
///
/// Transports translate their own error types into one of these tags so the
/// registry and the archive workflow can branch on them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UserSessionError {
    /// The session is invalid or expired; a new one has to be generated.
    #[error("user session authorization failed: {0}")]
    Authorization(String),

    /// Telegram asked us to back off (`FLOOD_WAIT_X`).
    #[error("rate limited by telegram: retry in {seconds}s")]
    RateLimited { seconds: u32 },

    #[error("user session remote error: {0}")]
    Remote(String),
}

impl UserSessionError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
