//! Personal archive channels.
//!
//! Each user gets one private broadcast channel, created by the user-mode
//! session, with the bot promoted to admin so it can post media there.

use std::{sync::Arc, time::Duration};

use tracing::{error, info, warn};

use crate::{
    domain::{ChannelId, UserId},
    errors::{Error, UserSessionError},
    store::UserStore,
    user_session::{AdminRights, SessionRegistry, UserSessionClient},
    utils::normalize_username,
    Result,
};

/// Custom title shown next to the bot in the channel's admin list.
pub const ARCHIVE_ADMIN_RANK: &str = "bot";

/// What a provisioning attempt ended with.
///
/// Only `Existing` and `Created` carry a channel; every other variant means
/// nothing was persisted and the whole workflow can be retried later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Existing(ChannelId),
    Created(ChannelId),
    /// The user session could not be acquired.
    Unavailable(UserSessionError),
    /// Telegram asked for a pause; we already waited it out.
    RateLimited { seconds: u32 },
    Failed(String),
}

impl ProvisionOutcome {
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::Existing(id) | Self::Created(id) => Some(*id),
            _ => None,
        }
    }
}

pub fn archive_about(bot_username: &str) -> String {
    format!("Personal media archive for {}", normalize_username(bot_username))
}

pub struct ArchiveProvisioner {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn UserStore>,
}

impl ArchiveProvisioner {
    pub fn new(registry: Arc<SessionRegistry>, store: Arc<dyn UserStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Return the user's archive channel, creating it on first use.
    pub async fn provision(&self, user_id: UserId, bot_username: &str) -> ProvisionOutcome {
        let user = match self.store.get_or_create_user(user_id).await {
            Ok(u) => u,
            Err(e) => {
                error!("[Archive] Failed to load user {user_id}: {e}");
                return ProvisionOutcome::Failed(e.to_string());
            }
        };
        if let Some(existing) = user.personal_archive() {
            info!("[Archive] Personal channel for user {user_id} already exists: {existing}");
            return ProvisionOutcome::Existing(existing);
        }

        info!("[Archive] Creating personal archive channel for user {user_id}...");

        let client = match self.registry.acquire(false).await {
            Ok(c) => c,
            Err(e) => {
                error!("[Archive] Unable to initialize user session: {e}");
                return ProvisionOutcome::Unavailable(e);
            }
        };

        match self.create_archive(client.as_ref(), user_id, bot_username).await {
            Ok(channel) => {
                info!("[Archive] Successfully created channel {channel} for user {user_id}.");
                ProvisionOutcome::Created(channel)
            }
            Err(Error::UserSession(UserSessionError::RateLimited { seconds })) => {
                warn!("[Archive] Flood wait error: waiting for {seconds} seconds.");
                tokio::time::sleep(Duration::from_secs(u64::from(seconds))).await;
                ProvisionOutcome::RateLimited { seconds }
            }
            Err(e) => {
                error!("[Archive] Error creating personal channel for user {user_id}: {e:?}");
                ProvisionOutcome::Failed(e.to_string())
            }
        }
    }

    async fn create_archive(
        &self,
        client: &dyn UserSessionClient,
        user_id: UserId,
        bot_username: &str,
    ) -> Result<ChannelId> {
        let created = client
            .create_broadcast_channel(&user_id.to_string(), &archive_about(bot_username))
            .await?;
        let raw_id = created.channels.first().copied().ok_or_else(|| {
            Error::External("create channel returned no chats".to_string())
        })?;
        let channel_id = ChannelId::from_raw(raw_id)?;

        let channel = client.resolve_channel(raw_id).await?;
        let bot = client
            .resolve_username(&normalize_username(bot_username))
            .await?;

        client
            .edit_admin_rights(
                &channel,
                &bot,
                AdminRights::archive_bot(),
                ARCHIVE_ADMIN_RANK,
            )
            .await?;

        self.store.set_personal_archive(user_id, channel_id).await?;
        Ok(channel_id)
    }
}
