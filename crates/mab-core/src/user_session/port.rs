use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::UserSessionError;

use super::{
    context::ContextToken,
    types::{AdminRights, CreatedChannel, Identity, PeerRef},
};

pub type SessionResult<T> = std::result::Result<T, UserSessionError>;

/// Hexagonal port for the user-mode Telegram session (MTProto).
///
/// One instance is a single connection. It is shared by `Arc`; implementations
/// must allow concurrent requests once connected. Rate limits surface as
/// [`UserSessionError::RateLimited`].
#[async_trait]
pub trait UserSessionClient: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn connect(&self) -> SessionResult<()>;
    async fn disconnect(&self) -> SessionResult<()>;

    async fn is_authorized(&self) -> SessionResult<bool>;
    async fn get_me(&self) -> SessionResult<Identity>;

    /// Create a broadcast channel (not a megagroup).
    async fn create_broadcast_channel(&self, title: &str, about: &str)
        -> SessionResult<CreatedChannel>;

    /// Resolve a channel by its bare id.
    async fn resolve_channel(&self, raw_id: i64) -> SessionResult<PeerRef>;

    /// Resolve a user by `@username`.
    async fn resolve_username(&self, username: &str) -> SessionResult<PeerRef>;

    async fn edit_admin_rights(
        &self,
        channel: &PeerRef,
        user: &PeerRef,
        rights: AdminRights,
        rank: &str,
    ) -> SessionResult<()>;
}

/// Builds fresh, not yet connected clients bound to a context.
pub trait UserSessionConnector: Send + Sync {
    fn build(&self, ctx: ContextToken) -> Arc<dyn UserSessionClient>;
}
