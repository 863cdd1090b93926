use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sb_core::{
    bot::{default_bots, BotDeps, MultiBot},
    config::Config,
    dispatch::Dispatcher,
    error_sink,
    i18n::{Catalog, Localizer},
    store::{ChatStateService, MemoryStore, TokenService},
};

#[tokio::main]
async fn main() -> Result<(), sb_core::Error> {
    sb_core::logging::init("sb")?;

    let cfg = Arc::new(Config::load()?);
    let cancel = CancellationToken::new();

    let (errors, sink) = error_sink::channel();
    let sink_task = tokio::spawn(sink.run(cancel.child_token()));

    let store = Arc::new(MemoryStore::new(cfg.default_page_size));
    let i18n: Arc<dyn Localizer> = Arc::new(Catalog);
    let deps = BotDeps {
        cfg: cfg.clone(),
        states: ChatStateService::new(store.clone(), errors.clone()),
        tokens: TokenService::new(store.clone(), cfg.consume_tokens),
        users: store.clone(),
        rooms: store.clone(),
        i18n: i18n.clone(),
    };

    let bots = default_bots(&deps);
    info!(
        bots = bots.len(),
        max_concurrent = cfg.max_concurrent_handlers,
        "bots registered"
    );
    let dispatcher = Arc::new(Dispatcher::new(
        MultiBot::new(bots, cfg.max_concurrent_handlers, errors.clone()),
        deps.states.clone(),
        errors,
    ));

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        ctrl_c.cancel();
    });

    let polled = sb_telegram::router::run_polling(cfg, dispatcher, store, i18n, cancel.clone()).await;

    cancel.cancel();
    match sink_task.await {
        Ok(processed) => info!(processed, "error sink drained"),
        Err(e) => warn!(error = %e, "error sink task failed"),
    }

    polled.map_err(|e| sb_core::Error::External(format!("telegram bot failed: {e}")))
}
