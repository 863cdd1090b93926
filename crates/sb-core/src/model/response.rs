use crate::{
    domain::{Action, ChatId, MessageRef},
    messaging::types::InlineKeyboard,
};

/// One transport call to perform.
#[derive(Clone, Debug, PartialEq)]
pub enum OutgoingAction {
    SendText {
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    EditText {
        message: MessageRef,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    DeleteMessage(MessageRef),
}

/// Answer to a pressed button (the small toast Telegram shows).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackAnswer {
    pub callback_id: String,
    pub text: Option<String>,
}

/// Asks the transport to dispatch a follow-up update with this action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub action: Action,
}

/// Transport-agnostic description of what to send back.
///
/// Partial directives from several bots are combined with [`merge`](Self::merge).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseDirective {
    pub actions: Vec<OutgoingAction>,
    pub callback_answer: Option<CallbackAnswer>,
    pub redirect: Option<Redirect>,
    pub send: bool,
}

impl ResponseDirective {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Directive with `send = true`.
    pub fn send(actions: Vec<OutgoingAction>) -> Self {
        Self {
            actions,
            send: true,
            ..Self::default()
        }
    }

    pub fn with_callback_answer(mut self, answer: Option<CallbackAnswer>) -> Self {
        self.callback_answer = answer;
        self
    }

    pub fn with_redirect(mut self, action: Action) -> Self {
        self.redirect = Some(Redirect { action });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
            && self.callback_answer.is_none()
            && self.redirect.is_none()
            && !self.send
    }

    /// Fold another bot's partial result into this one.
    ///
    /// Actions concatenate, `send` is OR'd, and a later non-empty callback
    /// answer or redirect replaces the current one.
    pub fn merge(&mut self, other: ResponseDirective) {
        self.actions.extend(other.actions);
        self.send |= other.send;
        if other.callback_answer.is_some() {
            self.callback_answer = other.callback_answer;
        }
        if other.redirect.is_some() {
            self.redirect = other.redirect;
        }
    }
}
