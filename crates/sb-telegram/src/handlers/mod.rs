//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - converts the Telegram update into a core `Update` (upserting the sender)
//! - runs it through the core dispatcher
//! - delivers the merged response and follows redirect hints

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use sb_core::{
    bot::Outcome,
    errors::Error,
    i18n::Localizer,
    messaging::deliver,
    model::{CallbackAnswer, OutgoingAction, ResponseDirective, Update as CoreUpdate, User},
};

use crate::router::AppState;

mod callback;
mod text;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    text::handle_text(msg, state).await
}

/// Core user from Telegram sender fields.
pub(crate) fn core_user(from: &teloxide::types::User) -> User {
    let mut user = User::new(sb_core::domain::UserId(from.id.0 as i64), from.full_name());
    user.username = from.username.clone();
    user.user_lang = from.language_code.clone();
    user
}

/// Refresh the stored user and pick up their saved preferences.
pub(crate) async fn known_user(state: &AppState, user: User) -> User {
    match state.users.upsert(&user).await {
        Ok(stored) => stored,
        Err(e) => {
            state
                .dispatcher
                .report_error(&e, Some("user upsert failed"));
            user
        }
    }
}

/// Dispatch, deliver, and follow up to `max_redirects` redirect hints.
pub(crate) async fn process(state: &AppState, update: CoreUpdate) {
    let mut next = Some(update);
    let mut hops = 0usize;

    while let Some(update) = next.take() {
        let Outcome { response, error } = state.dispatcher.dispatch(&state.cancel, update.clone()).await;

        let response = match &error {
            Some(e) if !e.is_cancelled() && !response.send => {
                fallback(state.i18n.as_ref(), &state.cfg.default_lang, &update, e)
            }
            _ => response,
        };
        deliver(state.messenger.as_ref(), &response).await;
        if let Some(id) = unanswered_callback(&update, &response) {
            if let Err(e) = state.messenger.answer_callback_query(id, None).await {
                warn!(error = %e, "failed to answer callback query");
            }
        }

        let Some(redirect) = response.redirect else {
            continue;
        };
        if error.as_ref().is_some_and(Error::is_cancelled) {
            continue;
        }
        if hops >= state.cfg.max_redirects {
            warn!(
                user_id = update.user.id.0,
                action = %redirect.action,
                "redirect limit reached"
            );
            continue;
        }
        hops += 1;
        next = Some(update.redirected(redirect.action));
    }
}

/// Button press the delivered response did not answer (no bot reacted,
/// or none acknowledged it). Telegram keeps the button spinning until answered.
pub(crate) fn unanswered_callback<'a>(
    update: &'a CoreUpdate,
    response: &ResponseDirective,
) -> Option<&'a str> {
    let answered = response.send && response.callback_answer.is_some();
    update.callback_id().filter(|_| !answered)
}

/// Reply shown when every reacting bot failed and nothing else is sent.
pub(crate) fn fallback(
    i18n: &dyn Localizer,
    default_lang: &str,
    update: &CoreUpdate,
    err: &Error,
) -> ResponseDirective {
    let locale = update.user.locale(default_lang);
    let key = match err {
        Error::InvalidToken(_) | Error::TokenConsumed(_) | Error::NotFound { kind: "token", .. } => {
            "button_expired"
        }
        _ => "error_generic",
    };
    let text = i18n.text(key, locale);

    match update.callback_id() {
        // A toast on the pressed button is enough.
        Some(id) => ResponseDirective {
            callback_answer: Some(CallbackAnswer {
                callback_id: id.to_string(),
                text: Some(text),
            }),
            send: true,
            ..ResponseDirective::default()
        },
        None => ResponseDirective::send(vec![OutgoingAction::SendText {
            chat_id: update.chat.id,
            text,
            keyboard: None,
        }]),
    }
}
