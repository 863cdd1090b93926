use std::sync::Arc;

use teloxide::prelude::*;
use tracing::debug;

use sb_core::{
    domain::{ChatId, MessageId},
    model::{Chat, Payload, Update as CoreUpdate},
};

use crate::handlers::{core_user, known_user, process};
use crate::router::AppState;

pub(crate) fn chat_of(chat: &teloxide::types::Chat) -> Chat {
    if chat.is_private() {
        Chat::private(ChatId(chat.id.0))
    } else {
        Chat::group(ChatId(chat.id.0))
    }
}

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    // Only text messages reach the bots.
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    let user = known_user(&state, core_user(from)).await;
    let update = CoreUpdate::new(
        user,
        chat_of(&msg.chat),
        Payload::text(MessageId(msg.id.0), text),
    );

    process(&state, update).await;
    Ok(())
}
