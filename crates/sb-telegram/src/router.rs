use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sb_core::{
    config::Config, dispatch::Dispatcher as BotDispatcher, i18n::Localizer,
    messaging::port::MessagingPort, store::UserStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub dispatcher: Arc<BotDispatcher>,
    pub users: Arc<dyn UserStore>,
    pub messenger: Arc<dyn MessagingPort>,
    pub i18n: Arc<dyn Localizer>,
    /// Cancelled on shutdown; every dispatch observes it.
    pub cancel: CancellationToken,
}

/// Long-poll Telegram until Ctrl-C or `cancel` fires.
pub async fn run_polling(
    cfg: Arc<Config>,
    dispatcher: Arc<BotDispatcher>,
    users: Arc<dyn UserStore>,
    i18n: Arc<dyn Localizer>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => {
            if !me.username().eq_ignore_ascii_case(&cfg.bot_name) {
                warn!(
                    configured = %cfg.bot_name,
                    actual = %me.username(),
                    "BOT_NAME does not match the bot account"
                );
            }
            info!(bot = %me.username(), "polling started");
        }
        Err(e) => warn!(error = %e, "getMe failed"),
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        cfg,
        dispatcher,
        users,
        messenger,
        i18n,
        cancel: cancel.clone(),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build();

    // Stop polling when the process-wide token is cancelled.
    let shutdown = dispatcher.shutdown_token();
    tokio::spawn(async move {
        cancel.cancelled().await;
        if let Ok(done) = shutdown.shutdown() {
            done.await;
        }
    });

    dispatcher.dispatch().await;
    info!("polling stopped");

    Ok(())
}
