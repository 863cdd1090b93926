use tracing::warn;

use crate::{
    messaging::port::MessagingPort,
    model::{OutgoingAction, ResponseDirective},
};

/// Perform a merged directive against a messenger.
///
/// Nothing happens unless `send` is set. A failing action is logged and the
/// remaining ones still run; returns how many calls succeeded.
pub async fn deliver(messenger: &dyn MessagingPort, directive: &ResponseDirective) -> usize {
    if !directive.send {
        return 0;
    }

    let mut delivered = 0usize;
    for action in &directive.actions {
        let res = match action {
            OutgoingAction::SendText {
                chat_id,
                text,
                keyboard,
            } => messenger
                .send_html(*chat_id, text, keyboard.as_ref())
                .await
                .map(|_| ()),
            OutgoingAction::EditText {
                message,
                text,
                keyboard,
            } => {
                if messenger.capabilities().supports_edit {
                    messenger.edit_html(*message, text, keyboard.as_ref()).await
                } else {
                    messenger
                        .send_html(message.chat_id, text, keyboard.as_ref())
                        .await
                        .map(|_| ())
                }
            }
            OutgoingAction::DeleteMessage(message) => messenger.delete_message(*message).await,
        };
        match res {
            Ok(()) => delivered += 1,
            Err(e) => warn!(error = %e, "failed to deliver outgoing action"),
        }
    }

    if let Some(answer) = &directive.callback_answer {
        match messenger
            .answer_callback_query(&answer.callback_id, answer.text.as_deref())
            .await
        {
            Ok(()) => delivered += 1,
            Err(e) => warn!(error = %e, "failed to answer callback query"),
        }
    }

    delivered
}
