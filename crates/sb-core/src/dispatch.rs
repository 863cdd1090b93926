//! Single entry point used by the transport: attach state, run bots, clean up.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

use crate::{
    bot::{MultiBot, Outcome},
    error_sink::ErrorReporter,
    errors::Error,
    model::Update,
    store::ChatStateService,
};

pub struct Dispatcher {
    bots: MultiBot,
    states: ChatStateService,
    errors: ErrorReporter,
}

impl Dispatcher {
    pub fn new(bots: MultiBot, states: ChatStateService, errors: ErrorReporter) -> Self {
        Self {
            bots,
            states,
            errors,
        }
    }

    /// Fire-and-forget failure reporting for callers outside the bots.
    pub fn report_error(&self, err: &Error, context: Option<&str>) {
        self.errors.report(err, context);
    }

    /// Route one update through every reacting bot.
    ///
    /// The user's pending state is attached before any predicate runs and
    /// deleted once every scheduled bot has finished, whatever they returned.
    /// A state a bot opened during this dispatch has a new id and survives.
    pub async fn dispatch(&self, cancel: &CancellationToken, update: Update) -> Outcome {
        let user_id = update.user.id;
        let span = info_span!("dispatch", user_id = user_id.0);

        async move {
            let chat_state = match self.states.find_by_user(user_id).await {
                Ok(state) => state,
                Err(e) => {
                    self.errors.report(&e, Some("chat state lookup failed"));
                    None
                }
            };
            if let Some(state) = &chat_state {
                debug!(action = %state.action, "attached chat state");
            }

            let update = Arc::new(update.with_chat_state(chat_state));
            let outcome = self.bots.run(cancel, update.clone()).await;

            self.states.clean(update.chat_state.as_ref()).await;
            outcome
        }
        .instrument(span)
        .await
    }
}
