use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use mab_core::{archive::ArchiveProvisioner, config::Config};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub archive: Arc<ArchiveProvisioner>,
    /// The bot's own username, as granted admin on archive channels.
    pub bot_username: String,
    pub user_locks: Arc<UserLocks>,
}

/// Per-user serialization so one user cannot run two provisioning attempts at once.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub async fn lock_user(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Poll the Bot API until the dispatcher stops or Ctrl-C is received.
pub async fn run_polling(cfg: Arc<Config>, archive: Arc<ArchiveProvisioner>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot.get_me().await?;
    let bot_username = me.username().to_string();
    info!("[Bot] Started as @{bot_username}");

    let state = Arc::new(AppState {
        archive,
        bot_username,
        user_locks: Arc::new(UserLocks::default()),
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build();

    info!("[Bot] Starting bot polling...");
    tokio::select! {
        _ = dispatcher.dispatch() => {
            warn!("[Bot] Dispatcher stopped.");
        }
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("[Bot] Interrupt received, stopping polling.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn user_locks_serialize_same_user_only() {
        let locks = UserLocks::default();

        let held = locks.lock_user(1).await;
        // Another user is not blocked.
        let other = tokio::time::timeout(Duration::from_millis(50), locks.lock_user(2)).await;
        assert!(other.is_ok());

        // Same user waits until the first guard is dropped.
        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.lock_user(1)).await;
        assert!(blocked.is_err());

        drop(held);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.lock_user(1)).await;
        assert!(again.is_ok());
    }
}
