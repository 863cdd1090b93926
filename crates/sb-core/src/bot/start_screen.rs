use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    bot::{ack, screen, BotDeps, Handler, CREATE_ROOM, START_COMMAND, VIEW_START},
    domain::Action,
    messaging::types::{InlineButton, InlineKeyboard},
    model::{ResponseDirective, Update},
    Result,
};

/// Main screen with a "create room" button.
///
/// Triggers: `/start` in private chats, `/start@<bot>` in groups, or a
/// `start` action (button or redirect).
pub struct StartScreen {
    deps: BotDeps,
}

impl StartScreen {
    pub fn new(deps: BotDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for StartScreen {
    fn name(&self) -> &'static str {
        "start_screen"
    }

    fn has_react(&self, u: &Update) -> bool {
        if u.has_action(VIEW_START) {
            return true;
        }
        let Some(text) = u.text() else {
            return false;
        };
        let text = text.trim();
        if u.is_private() {
            text == START_COMMAND
        } else {
            text.strip_prefix(START_COMMAND)
                .and_then(|rest| rest.strip_prefix('@'))
                .is_some_and(|name| name.eq_ignore_ascii_case(&self.deps.cfg.bot_name))
        }
    }

    async fn on_message(
        &self,
        _cancel: &CancellationToken,
        u: &Update,
    ) -> Result<ResponseDirective> {
        let token = self
            .deps
            .tokens
            .issue(Action::new(CREATE_ROOM), None)
            .await?;

        let keyboard = InlineKeyboard::one_per_row(vec![InlineButton::new(
            self.deps.text("btn_create_room", u),
            token.callback_data(),
        )]);
        let main = screen(u, self.deps.text("scrn_main", u), Some(keyboard));

        Ok(ResponseDirective::send(vec![main]).with_callback_answer(ack(u)))
    }
}
