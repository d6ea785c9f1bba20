//! User-mode session over MTProto, backed by `grammers`.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use grammers_client::{types::Chat, Client, Config as ClientConfig, InitParams, InvocationError};
use grammers_session::Session;
use grammers_tl_types as tl;
use tracing::warn;

use mab_core::{
    config::Config,
    user_session::{
        AdminRights, ContextToken, CreatedChannel, Identity, PeerKind, PeerRef, SessionResult,
        UserSessionClient, UserSessionConnector,
    },
    UserSessionError,
};

pub struct GrammersConnector {
    api_id: i32,
    api_hash: String,
    session_file: PathBuf,
}

impl GrammersConnector {
    pub fn new(cfg: &Config) -> Self {
        Self {
            api_id: cfg.telegram_api_id,
            api_hash: cfg.telegram_api_hash.clone(),
            session_file: cfg.user_session_file.clone(),
        }
    }
}

impl UserSessionConnector for GrammersConnector {
    fn build(&self, ctx: ContextToken) -> Arc<dyn UserSessionClient> {
        Arc::new(GrammersSession {
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            session_file: self.session_file.clone(),
            ctx,
            client: Mutex::new(None),
            channel_hashes: Mutex::new(HashMap::new()),
        })
    }
}

pub struct GrammersSession {
    api_id: i32,
    api_hash: String,
    session_file: PathBuf,
    ctx: ContextToken,
    client: Mutex<Option<Client>>,
    /// Known channel access hashes, keyed by bare id.
    channel_hashes: Mutex<HashMap<i64, i64>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn map_rpc(code: i32, name: &str, value: Option<u32>) -> UserSessionError {
    if name == "FLOOD_WAIT" {
        UserSessionError::RateLimited {
            seconds: value.unwrap_or(0),
        }
    } else if code == 401 {
        UserSessionError::Authorization(name.to_string())
    } else {
        UserSessionError::Remote(format!("rpc error {code}: {name}"))
    }
}

fn access_hash(peer: &PeerRef) -> SessionResult<i64> {
    peer.access_hash.ok_or_else(|| {
        UserSessionError::Remote(format!("{:?} {} has no access hash", peer.kind, peer.id))
    })
}

impl GrammersSession {
    fn client(&self) -> SessionResult<Client> {
        lock(&self.client).clone().ok_or_else(|| {
            UserSessionError::Remote(format!("user session for {:?} is not connected", self.ctx))
        })
    }

    /// Translate a grammers error. Anything but an RPC answer means the
    /// transport is gone, so the client is dropped and `is_connected` turns false.
    fn map_invocation(&self, e: InvocationError) -> UserSessionError {
        match e {
            InvocationError::Rpc(rpc) => map_rpc(rpc.code, &rpc.name, rpc.value),
            other => {
                warn!("[UserSession] Transport error, dropping connection: {other}");
                self.forget_client();
                UserSessionError::Remote(other.to_string())
            }
        }
    }

    fn forget_client(&self) {
        let Some(client) = lock(&self.client).take() else {
            return;
        };
        if let Err(e) = client.session().save_to_file(&self.session_file) {
            warn!("[UserSession] Failed to save session file: {e}");
        }
    }

    /// Look a channel up among the account's dialogs, caching every channel hash seen.
    async fn find_channel_in_dialogs(&self, raw_id: i64) -> SessionResult<Option<i64>> {
        let client = self.client()?;
        let mut dialogs = client.iter_dialogs();
        let mut found = None;
        while let Some(dialog) = dialogs.next().await.map_err(|e| self.map_invocation(e))? {
            let chat = dialog.chat();
            if !matches!(chat, Chat::Channel(_)) {
                continue;
            }
            let packed = chat.pack();
            if let Some(hash) = packed.access_hash {
                lock(&self.channel_hashes).insert(packed.id, hash);
                if packed.id == raw_id {
                    found = Some(hash);
                    break;
                }
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl UserSessionClient for GrammersSession {
    /// grammers does not expose the socket state; a held client counts as
    /// connected until a call fails at the transport level.
    fn is_connected(&self) -> bool {
        lock(&self.client).is_some()
    }

    async fn connect(&self) -> SessionResult<()> {
        let session = Session::load_file_or_create(&self.session_file).map_err(|e| {
            UserSessionError::Remote(format!(
                "cannot load session file {}: {e}",
                self.session_file.display()
            ))
        })?;

        let client = Client::connect(ClientConfig {
            session,
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| UserSessionError::Remote(format!("connect failed: {e}")))?;

        *lock(&self.client) = Some(client);
        Ok(())
    }

    async fn disconnect(&self) -> SessionResult<()> {
        // Dropping the last handle closes the connection.
        self.forget_client();
        Ok(())
    }

    async fn is_authorized(&self) -> SessionResult<bool> {
        self.client()?
            .is_authorized()
            .await
            .map_err(|e| self.map_invocation(e))
    }

    async fn get_me(&self) -> SessionResult<Identity> {
        let me = self.client()?.get_me().await.map_err(|e| self.map_invocation(e))?;
        Ok(Identity {
            id: me.id(),
            username: me.username().map(str::to_string),
        })
    }

    async fn create_broadcast_channel(
        &self,
        title: &str,
        about: &str,
    ) -> SessionResult<CreatedChannel> {
        let updates = self
            .client()?
            .invoke(&tl::functions::channels::CreateChannel {
                broadcast: true,
                megagroup: false,
                for_import: false,
                forum: false,
                title: title.to_string(),
                about: about.to_string(),
                geo_point: None,
                address: None,
                ttl_period: None,
            })
            .await
            .map_err(|e| self.map_invocation(e))?;

        let chats = match updates {
            tl::enums::Updates::Updates(u) => u.chats,
            tl::enums::Updates::Combined(u) => u.chats,
            _ => Vec::new(),
        };

        let mut hashes = lock(&self.channel_hashes);
        let mut channels = Vec::new();
        for chat in chats {
            if let tl::enums::Chat::Channel(c) = chat {
                if let Some(hash) = c.access_hash {
                    hashes.insert(c.id, hash);
                }
                channels.push(c.id);
            }
        }
        Ok(CreatedChannel { channels })
    }

    async fn resolve_channel(&self, raw_id: i64) -> SessionResult<PeerRef> {
        let cached = lock(&self.channel_hashes).get(&raw_id).copied();
        let hash = match cached {
            Some(hash) => Some(hash),
            None => self.find_channel_in_dialogs(raw_id).await?,
        };
        match hash {
            Some(access_hash) => Ok(PeerRef {
                kind: PeerKind::Channel,
                id: raw_id,
                access_hash: Some(access_hash),
            }),
            None => Err(UserSessionError::Remote(format!(
                "channel {raw_id} not found among this account's dialogs"
            ))),
        }
    }

    async fn resolve_username(&self, username: &str) -> SessionResult<PeerRef> {
        let name = username.trim_start_matches('@');
        let chat = self
            .client()?
            .resolve_username(name)
            .await
            .map_err(|e| self.map_invocation(e))?
            .ok_or_else(|| UserSessionError::Remote(format!("username {username} not found")))?;

        let kind = match &chat {
            Chat::User(_) => PeerKind::User,
            _ => {
                return Err(UserSessionError::Remote(format!(
                    "{username} does not belong to a user"
                )))
            }
        };
        let packed = chat.pack();
        Ok(PeerRef {
            kind,
            id: packed.id,
            access_hash: packed.access_hash,
        })
    }

    async fn edit_admin_rights(
        &self,
        channel: &PeerRef,
        user: &PeerRef,
        rights: AdminRights,
        rank: &str,
    ) -> SessionResult<()> {
        let request = tl::functions::channels::EditAdmin {
            channel: tl::types::InputChannel {
                channel_id: channel.id,
                access_hash: access_hash(channel)?,
            }
            .into(),
            user_id: tl::types::InputUser {
                user_id: user.id,
                access_hash: access_hash(user)?,
            }
            .into(),
            admin_rights: tl::types::ChatAdminRights {
                change_info: rights.change_info,
                post_messages: rights.post_messages,
                edit_messages: rights.edit_messages,
                delete_messages: rights.delete_messages,
                ban_users: rights.ban_users,
                invite_users: rights.invite_users,
                pin_messages: rights.pin_messages,
                add_admins: rights.add_admins,
                anonymous: rights.anonymous,
                manage_call: rights.manage_call,
                other: rights.other,
                manage_topics: false,
                post_stories: false,
                edit_stories: false,
                delete_stories: false,
            }
            .into(),
            rank: rank.to_string(),
        };

        self.client()?
            .invoke(&request)
            .await
            .map_err(|e| self.map_invocation(e))?;
        Ok(())
    }
}
