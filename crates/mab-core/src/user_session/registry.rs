use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use super::{
    context::{ContextSource, ContextToken},
    lifecycle::{self, LifecycleState, RecreateReason},
    port::{SessionResult, UserSessionClient, UserSessionConnector},
};

#[derive(Default)]
struct Slot {
    client: Option<Arc<dyn UserSessionClient>>,
    owner: Option<ContextToken>,
    state: Option<LifecycleState>,
}

impl Slot {
    fn clear(&mut self, state: LifecycleState) {
        self.client = None;
        self.owner = None;
        self.state = Some(state);
    }
}

/// Owner of the single shared user-session client.
///
/// Every lifecycle transition (`acquire`, `shutdown`) runs under one async
/// mutex, so two callers never connect at the same time. The returned client
/// is shared by `Arc` and may be used concurrently once handed out.
pub struct SessionRegistry {
    connector: Arc<dyn UserSessionConnector>,
    context: Arc<dyn ContextSource>,
    slot: Mutex<Slot>,
}

impl SessionRegistry {
    pub fn new(connector: Arc<dyn UserSessionConnector>, context: Arc<dyn ContextSource>) -> Self {
        Self {
            connector,
            context,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Return a connected, authorized client for the caller's context.
    pub async fn acquire(
        &self,
        force_reconnect: bool,
    ) -> SessionResult<Arc<dyn UserSessionClient>> {
        self.acquire_in(self.context.current(), force_reconnect).await
    }

    /// Same as [`Self::acquire`] with an explicit caller context.
    pub async fn acquire_in(
        &self,
        caller: ContextToken,
        force_reconnect: bool,
    ) -> SessionResult<Arc<dyn UserSessionClient>> {
        let mut slot = self.slot.lock().await;

        let owner = slot.client.as_ref().and(slot.owner);
        if let Some(reason) = lifecycle::should_recreate(owner, caller, force_reconnect) {
            match reason {
                RecreateReason::Forced => {
                    info!("[UserSession] Forced reconnect requested, dropping current client.")
                }
                RecreateReason::ContextChanged { owner, caller } => info!(
                    "[UserSession] Client owned by {owner:?} requested from {caller:?}, recreating."
                ),
            }
            if let Some(old) = slot.client.take() {
                lifecycle::teardown(old.as_ref()).await;
            }
            slot.clear(LifecycleState::Absent);
        }

        let client = if let Some(existing) = slot.client.clone() {
            existing
        } else {
            let fresh = self.connector.build(caller);
            slot.client = Some(fresh.clone());
            slot.owner = Some(caller);
            slot.state = Some(LifecycleState::Absent);
            fresh
        };

        if client.is_connected() {
            return Ok(client);
        }

        slot.state = Some(LifecycleState::Connecting);
        if let Err(e) = client.connect().await {
            error!("[UserSession] Connect failed: {e}");
            slot.state = Some(LifecycleState::Failed);
            return Err(e);
        }
        slot.state = Some(LifecycleState::ConnectedUnverified);

        match lifecycle::validate(client.as_ref()).await {
            Ok(me) => {
                slot.state = Some(LifecycleState::Authorized);
                info!("[UserSession] Client connected successfully as {me}.");
                Ok(client)
            }
            Err(e) => {
                // Never leave a connected-but-unauthorized client behind: the next
                // acquire would see "connected" and hand it out unchecked.
                error!("[UserSession] CRITICAL: {e}");
                lifecycle::teardown(client.as_ref()).await;
                slot.clear(LifecycleState::Failed);
                Err(e)
            }
        }
    }

    /// Disconnect and forget the shared client. No-op when nothing is connected.
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(client) = slot.client.take() {
            if client.is_connected() {
                match client.disconnect().await {
                    Ok(()) => info!("[UserSession] Client disconnected."),
                    Err(e) => error!("[UserSession] Disconnect failed: {e}"),
                }
            }
        }
        slot.clear(LifecycleState::Absent);
    }

    pub async fn state(&self) -> LifecycleState {
        self.slot
            .lock()
            .await
            .state
            .unwrap_or(LifecycleState::Absent)
    }

    /// Context that owns the current client, if any.
    pub async fn owner(&self) -> Option<ContextToken> {
        let slot = self.slot.lock().await;
        slot.client.as_ref().and(slot.owner)
    }
}
