//! Reactive bots and the registry the dispatcher runs them from.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    i18n::Localizer,
    messaging::types::InlineKeyboard,
    model::{CallbackAnswer, OutgoingAction, ResponseDirective, Update},
    store::{ChatStateService, RoomStore, TokenService, UserStore},
    Result,
};

mod create_room;
mod language;
pub mod multi;
mod room_name;
mod start_screen;

pub use create_room::CreateRoom;
pub use language::Language;
pub use multi::{MultiBot, Outcome};
pub use room_name::RoomName;
pub use start_screen::StartScreen;

pub const START_COMMAND: &str = "/start";
pub const LANG_COMMAND: &str = "/lang";

// actions
pub const VIEW_START: &str = "start";
pub const CREATE_ROOM: &str = "create_room";

/// A unit that conditionally reacts to an update and produces a partial response.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;

    /// In-memory check against static triggers (commands, action tags, chat
    /// kind, attached state). Must not do I/O.
    fn has_react(&self, update: &Update) -> bool;

    /// Do the work. Runs concurrently with other matching bots and should
    /// return promptly once `cancel` fires.
    async fn on_message(
        &self,
        cancel: &CancellationToken,
        update: &Update,
    ) -> Result<ResponseDirective>;

    /// Response and error together. Composites override this so a failing
    /// child does not discard what its siblings produced.
    async fn on_message_outcome(&self, cancel: &CancellationToken, update: &Update) -> Outcome {
        match self.on_message(cancel, update).await {
            Ok(response) => Outcome {
                response,
                error: None,
            },
            Err(e) => Outcome {
                response: ResponseDirective::default(),
                error: Some(e),
            },
        }
    }

    /// True if the handler already forwards its own failures to the error
    /// sink (composites do), so an enclosing composite must not report them again.
    fn reports_errors(&self) -> bool {
        false
    }
}

/// Shared collaborators handed to every built-in bot.
#[derive(Clone)]
pub struct BotDeps {
    pub cfg: Arc<Config>,
    pub states: ChatStateService,
    pub tokens: TokenService,
    pub users: Arc<dyn UserStore>,
    pub rooms: Arc<dyn RoomStore>,
    pub i18n: Arc<dyn Localizer>,
}

impl BotDeps {
    pub fn text(&self, key: &str, update: &Update) -> String {
        self.i18n
            .text(key, update.user.locale(&self.cfg.default_lang))
    }
}

/// Registry of built-in bots, in registration order.
pub fn default_bots(deps: &BotDeps) -> Vec<Arc<dyn Handler>> {
    vec![
        Arc::new(StartScreen::new(deps.clone())),
        Arc::new(CreateRoom::new(deps.clone())),
        Arc::new(RoomName::new(deps.clone())),
        Arc::new(Language::new(deps.clone())),
    ]
}

/// Show a screen: edit the message whose button was pressed, or send a new one.
pub(crate) fn screen(
    update: &Update,
    text: String,
    keyboard: Option<InlineKeyboard>,
) -> OutgoingAction {
    match update.callback_message() {
        Some(message) => OutgoingAction::EditText {
            message,
            text,
            keyboard,
        },
        None => OutgoingAction::SendText {
            chat_id: update.chat.id,
            text,
            keyboard,
        },
    }
}

/// Acknowledge a pressed button, if the update is one.
pub(crate) fn ack(update: &Update) -> Option<CallbackAnswer> {
    update.callback_id().map(|id| CallbackAnswer {
        callback_id: id.to_string(),
        text: None,
    })
}
