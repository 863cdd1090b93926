use std::sync::Arc;

use teloxide::prelude::*;

use sb_core::{
    domain::{ChatId, MessageId, MessageRef},
    model::{Chat, Payload, Update as CoreUpdate},
};

use crate::handlers::{core_user, known_user, process, text::chat_of};
use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();

    // Nothing to route; `process` answers every other press.
    if data.is_empty() {
        let _ = state.messenger.answer_callback_query(&q.id, None).await;
        return Ok(());
    }

    let user = known_user(&state, core_user(&q.from)).await;
    let (chat, message) = match &q.message {
        Some(m) => (
            chat_of(&m.chat),
            Some(MessageRef {
                chat_id: ChatId(m.chat.id.0),
                message_id: MessageId(m.id.0),
            }),
        ),
        // Inline-mode buttons carry no message; answer in the private chat.
        None => (Chat::private(ChatId(user.id.0)), None),
    };

    let update = CoreUpdate::new(user, chat, Payload::callback(q.id.clone(), data, message));
    process(&state, update).await;
    Ok(())
}
