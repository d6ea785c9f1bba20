//! Shared user-mode (MTProto) session: ports, lifecycle decisions and the registry
//! that hands out the single connected client.

pub mod context;
pub mod lifecycle;
pub mod port;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod fakes;

pub use context::{ContextSource, ContextToken, FixedContext};
pub use port::{SessionResult, UserSessionClient, UserSessionConnector};
pub use registry::SessionRegistry;
pub use types::{AdminRights, CreatedChannel, Identity, PeerKind, PeerRef};
