//! In-process stand-ins for the MTProto transport, shared by the unit tests.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::UserSessionError;

use super::{
    context::{ContextSource, ContextToken},
    port::{SessionResult, UserSessionClient, UserSessionConnector},
    types::{AdminRights, CreatedChannel, Identity, PeerKind, PeerRef},
};

pub(crate) const FAKE_BOT_USER_ID: i64 = 777;

#[derive(Clone, Debug)]
pub(crate) struct FakePlan {
    pub authorized: bool,
    pub connect_error: Option<UserSessionError>,
    pub connect_delay: Duration,
    pub raw_channel_id: i64,
    pub create_error: Option<UserSessionError>,
    pub admin_error: Option<UserSessionError>,
}

impl Default for FakePlan {
    fn default() -> Self {
        Self {
            authorized: true,
            connect_error: None,
            connect_delay: Duration::ZERO,
            raw_channel_id: 1234567890,
            create_error: None,
            admin_error: None,
        }
    }
}

pub(crate) struct FakeClient {
    ctx: ContextToken,
    plan: FakePlan,
    connected: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    remote_calls: AtomicUsize,
    pub created: Mutex<Vec<(String, String)>>,
    pub resolved_usernames: Mutex<Vec<String>>,
    pub grants: Mutex<Vec<(PeerRef, PeerRef, AdminRights, String)>>,
}

impl FakeClient {
    pub fn new(ctx: ContextToken, plan: FakePlan) -> Self {
        Self {
            ctx,
            plan,
            connected: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            remote_calls: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            resolved_usernames: Mutex::new(Vec::new()),
            grants: Mutex::new(Vec::new()),
        }
    }

    pub fn context(&self) -> ContextToken {
        self.ctx
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn remote_call_count(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    fn remote(&self) {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserSessionClient for FakeClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> SessionResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.plan.connect_delay.is_zero() {
            tokio::time::sleep(self.plan.connect_delay).await;
        }
        if let Some(e) = &self.plan.connect_error {
            return Err(e.clone());
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> SessionResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_authorized(&self) -> SessionResult<bool> {
        Ok(self.plan.authorized)
    }

    async fn get_me(&self) -> SessionResult<Identity> {
        Ok(Identity {
            id: 1000,
            username: Some("archive_user".to_string()),
        })
    }

    async fn create_broadcast_channel(
        &self,
        title: &str,
        about: &str,
    ) -> SessionResult<CreatedChannel> {
        self.remote();
        self.created
            .lock()
            .unwrap()
            .push((title.to_string(), about.to_string()));
        if let Some(e) = &self.plan.create_error {
            return Err(e.clone());
        }
        Ok(CreatedChannel {
            channels: vec![self.plan.raw_channel_id],
        })
    }

    async fn resolve_channel(&self, raw_id: i64) -> SessionResult<PeerRef> {
        self.remote();
        Ok(PeerRef {
            kind: PeerKind::Channel,
            id: raw_id,
            access_hash: Some(11),
        })
    }

    async fn resolve_username(&self, username: &str) -> SessionResult<PeerRef> {
        self.remote();
        self.resolved_usernames
            .lock()
            .unwrap()
            .push(username.to_string());
        Ok(PeerRef {
            kind: PeerKind::User,
            id: FAKE_BOT_USER_ID,
            access_hash: Some(22),
        })
    }

    async fn edit_admin_rights(
        &self,
        channel: &PeerRef,
        user: &PeerRef,
        rights: AdminRights,
        rank: &str,
    ) -> SessionResult<()> {
        self.remote();
        if let Some(e) = &self.plan.admin_error {
            return Err(e.clone());
        }
        self.grants.lock().unwrap().push((
            channel.clone(),
            user.clone(),
            rights,
            rank.to_string(),
        ));
        Ok(())
    }
}

pub(crate) struct FakeConnector {
    plan: FakePlan,
    clients: Mutex<Vec<Arc<FakeClient>>>,
}

impl FakeConnector {
    pub fn new(plan: FakePlan) -> Self {
        Self {
            plan,
            clients: Mutex::new(Vec::new()),
        }
    }

    pub fn build_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    pub fn connect_count(&self) -> usize {
        self.clients
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.connect_count())
            .sum()
    }

    pub fn remote_call_count(&self) -> usize {
        self.clients
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.remote_call_count())
            .sum()
    }

    pub fn client(&self, idx: usize) -> Arc<FakeClient> {
        self.clients.lock().unwrap()[idx].clone()
    }
}

impl UserSessionConnector for FakeConnector {
    fn build(&self, ctx: ContextToken) -> Arc<dyn UserSessionClient> {
        let client = Arc::new(FakeClient::new(ctx, self.plan.clone()));
        self.clients.lock().unwrap().push(client.clone());
        client
    }
}

/// Context source whose token can be swapped to simulate a new runtime.
pub(crate) struct SwitchableContext {
    current: Mutex<ContextToken>,
}

impl SwitchableContext {
    pub fn new(token: ContextToken) -> Self {
        Self {
            current: Mutex::new(token),
        }
    }

    pub fn switch_to(&self, token: ContextToken) {
        *self.current.lock().unwrap() = token;
    }
}

impl ContextSource for SwitchableContext {
    fn current(&self) -> ContextToken {
        *self.current.lock().unwrap()
    }
}
