//! Connect / validate / reconnect decisions used by the registry.

use tracing::warn;

use crate::errors::UserSessionError;

use super::{
    context::ContextToken,
    port::{SessionResult, UserSessionClient},
    types::Identity,
};

/// Where the shared client currently stands.
///
/// `Authorized` is the success state. `Failed` is terminal for the call that
/// produced it; the next `acquire` starts again from `Absent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Absent,
    Connecting,
    ConnectedUnverified,
    Authorized,
    Failed,
}

/// Why an existing client has to be torn down before serving a caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecreateReason {
    Forced,
    ContextChanged {
        owner: ContextToken,
        caller: ContextToken,
    },
}

/// Decide whether the client owned by `owner` can serve `caller`.
///
/// `owner` is `None` when no client exists, in which case there is nothing to
/// tear down. A forced reconnect wins over everything else.
pub fn should_recreate(
    owner: Option<ContextToken>,
    caller: ContextToken,
    force_reconnect: bool,
) -> Option<RecreateReason> {
    let owner = owner?;
    if force_reconnect {
        return Some(RecreateReason::Forced);
    }
    if owner != caller {
        return Some(RecreateReason::ContextChanged { owner, caller });
    }
    None
}

/// Check that a freshly connected client is logged in and report who it is.
pub async fn validate(client: &dyn UserSessionClient) -> SessionResult<Identity> {
    if !client.is_authorized().await? {
        return Err(UserSessionError::Authorization(
            "session invalid or expired, generate a new one".to_string(),
        ));
    }
    client.get_me().await
}

/// Disconnect a client that is being discarded. Already-disconnected clients
/// are left alone; disconnect failures only get logged since the client is
/// dropped either way.
pub async fn teardown(client: &dyn UserSessionClient) {
    if !client.is_connected() {
        return;
    }
    if let Err(e) = client.disconnect().await {
        warn!("[UserSession] disconnect during teardown failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_session::fakes::{FakeClient, FakePlan};

    #[test]
    fn nothing_to_recreate_without_a_client() {
        let caller = ContextToken::mint();
        assert_eq!(should_recreate(None, caller, false), None);
        assert_eq!(should_recreate(None, caller, true), None);
    }

    #[test]
    fn same_owner_is_reused_unless_forced() {
        let ctx = ContextToken::mint();
        assert_eq!(should_recreate(Some(ctx), ctx, false), None);
        assert_eq!(
            should_recreate(Some(ctx), ctx, true),
            Some(RecreateReason::Forced)
        );
    }

    #[test]
    fn foreign_owner_is_recreated() {
        let owner = ContextToken::mint();
        let caller = ContextToken::mint();
        assert_eq!(
            should_recreate(Some(owner), caller, false),
            Some(RecreateReason::ContextChanged { owner, caller })
        );
    }

    #[tokio::test]
    async fn validate_rejects_unauthorized_session() {
        let client = FakeClient::new(
            ContextToken::mint(),
            FakePlan {
                authorized: false,
                ..FakePlan::default()
            },
        );
        client.connect().await.unwrap();

        let err = validate(&client).await.unwrap_err();
        assert!(matches!(err, UserSessionError::Authorization(_)));
    }

    #[tokio::test]
    async fn validate_returns_identity() {
        let client = FakeClient::new(ContextToken::mint(), FakePlan::default());
        client.connect().await.unwrap();

        let me = validate(&client).await.unwrap();
        assert_eq!(me.to_string(), "archive_user");
    }

    #[tokio::test]
    async fn teardown_skips_disconnected_clients() {
        let client = FakeClient::new(ContextToken::mint(), FakePlan::default());
        teardown(&client).await;
        assert_eq!(client.disconnect_count(), 0);

        client.connect().await.unwrap();
        teardown(&client).await;
        assert_eq!(client.disconnect_count(), 1);
        assert!(!client.is_connected());
    }
}
