use std::{future::Future, sync::Arc};

use tracing::{error, info};

use mab_core::{
    archive::ArchiveProvisioner,
    config::Config,
    store::{JsonUserStore, UserStore},
    user_session::{ContextToken, FixedContext, SessionRegistry, UserSessionConnector},
    Error, Result,
};

mod mtproto;

#[tokio::main]
async fn main() -> Result<()> {
    mab_core::logging::init("mab")?;

    let cfg = Arc::new(Config::load()?);

    info!("Opening user store at {}...", cfg.archive_db_path.display());
    let store: Arc<dyn UserStore> = Arc::new(JsonUserStore::open(&cfg.archive_db_path)?);
    info!("User store ready.");

    let connector: Arc<dyn UserSessionConnector> =
        Arc::new(mtproto::GrammersConnector::new(&cfg));

    let polling_cfg = cfg.clone();
    run(connector, store, move |archive| async move {
        mab_telegram::router::run_polling(polling_cfg, archive)
            .await
            .map_err(|e| Error::External(format!("telegram bot failed: {e}")))
    })
    .await
}

/// Bring up the user session, serve until `serve` returns, then tear the
/// session down. `serve` is never reached without an authorized session.
async fn run<S, Fut>(
    connector: Arc<dyn UserSessionConnector>,
    store: Arc<dyn UserStore>,
    serve: S,
) -> Result<()>
where
    S: FnOnce(Arc<ArchiveProvisioner>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let registry = Arc::new(SessionRegistry::new(
        connector,
        Arc::new(FixedContext::new(ContextToken::mint())),
    ));

    info!("Starting user session client...");
    if let Err(e) = registry.acquire(false).await {
        error!("Failed to start user session client: {e}");
        return Err(e.into());
    }

    let archive = Arc::new(ArchiveProvisioner::new(registry.clone(), store));
    let served = serve(archive).await;

    registry.shutdown().await;
    info!("Bot stopped.");
    served
}
