use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    domain::{ChannelId, UserId},
    errors::Error,
    utils::iso_timestamp_utc,
    Result,
};

/// Per-user row. `personal_archive_id` is written once and never changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    #[serde(default)]
    pub personal_archive_id: Option<i64>,
    #[serde(default)]
    pub created_at: String,
}

impl UserRecord {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id: user_id.0,
            personal_archive_id: None,
            created_at: iso_timestamp_utc(),
        }
    }

    pub fn personal_archive(&self) -> Option<ChannelId> {
        self.personal_archive_id.map(ChannelId)
    }
}

/// Persistence port used by the archive workflow.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch the user's record, creating (and committing) an empty one on first sight.
    async fn get_or_create_user(&self, user_id: UserId) -> Result<UserRecord>;

    /// Record the user's archive channel and commit.
    ///
    /// Fails if a different channel is already recorded.
    async fn set_personal_archive(&self, user_id: UserId, channel: ChannelId) -> Result<()>;
}

fn assign_archive(
    users: &mut BTreeMap<i64, UserRecord>,
    user_id: UserId,
    channel: ChannelId,
) -> std::result::Result<(), String> {
    let rec = users
        .entry(user_id.0)
        .or_insert_with(|| UserRecord::new(user_id));
    match rec.personal_archive_id {
        Some(existing) if existing != channel.0 => Err(format!(
            "user {user_id} already has archive {existing}, refusing to overwrite with {channel}"
        )),
        _ => {
            rec.personal_archive_id = Some(channel.0);
            Ok(())
        }
    }
}

/// Volatile store (tests, dry runs).
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<i64, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: UserId) -> Option<UserRecord> {
        self.users.lock().await.get(&user_id.0).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_or_create_user(&self, user_id: UserId) -> Result<UserRecord> {
        let mut users = self.users.lock().await;
        Ok(users
            .entry(user_id.0)
            .or_insert_with(|| UserRecord::new(user_id))
            .clone())
    }

    async fn set_personal_archive(&self, user_id: UserId, channel: ChannelId) -> Result<()> {
        let mut users = self.users.lock().await;
        assign_archive(&mut users, user_id, channel).map_err(|reason| Error::Store {
            path: PathBuf::from(":memory:"),
            reason,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFileData {
    users: Vec<UserRecord>,
}

/// User store backed by a single JSON file, rewritten on every commit.
pub struct JsonUserStore {
    path: PathBuf,
    users: Mutex<BTreeMap<i64, UserRecord>>,
}

impl JsonUserStore {
    /// Open the store, creating an empty file if none exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let users = match load_store_file(&path)? {
            Some(data) => data.users.into_iter().map(|u| (u.user_id, u)).collect(),
            None => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)?;
                }
                let empty = BTreeMap::new();
                save_store_file(&path, &empty)?;
                empty
            }
        };
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn get_or_create_user(&self, user_id: UserId) -> Result<UserRecord> {
        let mut users = self.users.lock().await;
        if let Some(rec) = users.get(&user_id.0) {
            return Ok(rec.clone());
        }
        let rec = UserRecord::new(user_id);
        users.insert(user_id.0, rec.clone());
        if let Err(e) = save_store_file(&self.path, &users) {
            users.remove(&user_id.0);
            return Err(e);
        }
        Ok(rec)
    }

    async fn set_personal_archive(&self, user_id: UserId, channel: ChannelId) -> Result<()> {
        let mut users = self.users.lock().await;
        // Memory only follows a successful write.
        let mut next = users.clone();
        assign_archive(&mut next, user_id, channel).map_err(|reason| Error::Store {
            path: self.path.clone(),
            reason,
        })?;
        save_store_file(&self.path, &next)?;
        *users = next;
        Ok(())
    }
}

fn load_store_file(path: &Path) -> Result<Option<StoreFileData>> {
    if !path.exists() {
        return Ok(None);
    }
    let txt = std::fs::read_to_string(path)?;
    if txt.trim().is_empty() {
        return Ok(Some(StoreFileData::default()));
    }
    let data: StoreFileData = serde_json::from_str(&txt)?;
    Ok(Some(data))
}

fn save_store_file(path: &Path, users: &BTreeMap<i64, UserRecord>) -> Result<()> {
    let data = StoreFileData {
        users: users.values().cloned().collect(),
    };
    let txt = serde_json::to_string_pretty(&data)?;
    // Atomic replace.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, txt)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
