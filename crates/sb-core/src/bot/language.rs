use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    bot::{BotDeps, Handler, LANG_COMMAND},
    model::{OutgoingAction, ResponseDirective, Update},
    Result,
};

/// `/lang <code>`: store the user's explicit language choice.
pub struct Language {
    deps: BotDeps,
}

impl Language {
    pub fn new(deps: BotDeps) -> Self {
        Self { deps }
    }

    fn is_command(&self, word: &str) -> bool {
        match word.split_once('@') {
            Some((cmd, bot)) => cmd == LANG_COMMAND && bot.eq_ignore_ascii_case(&self.deps.cfg.bot_name),
            None => word == LANG_COMMAND,
        }
    }
}

#[async_trait]
impl Handler for Language {
    fn name(&self) -> &'static str {
        "language"
    }

    fn has_react(&self, u: &Update) -> bool {
        u.text()
            .and_then(|t| t.split_whitespace().next())
            .is_some_and(|w| self.is_command(w))
    }

    async fn on_message(
        &self,
        _cancel: &CancellationToken,
        u: &Update,
    ) -> Result<ResponseDirective> {
        let code = u
            .text()
            .and_then(|t| t.split_whitespace().nth(1))
            .map(str::to_lowercase);

        let text = match code {
            Some(code) if self.deps.i18n.supports(&code) => {
                self.deps.users.set_lang(u.user.id, &code).await?;
                info!(user_id = u.user.id.0, lang = %code, "language selected");
                self.deps.i18n.text("lang_set", &code)
            }
            _ => self.deps.text("lang_usage", u),
        };

        Ok(ResponseDirective::send(vec![OutgoingAction::SendText {
            chat_id: u.chat.id,
            text,
            keyboard: None,
        }]))
    }
}
