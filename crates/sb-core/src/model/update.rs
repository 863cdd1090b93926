use crate::{
    domain::{Action, ChatId, MessageId, MessageRef, TokenId},
    model::records::{parse_callback_data, ConversationState, User},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub kind: ChatKind,
}

impl Chat {
    pub fn private(id: ChatId) -> Self {
        Self {
            id,
            kind: ChatKind::Private,
        }
    }

    pub fn group(id: ChatId) -> Self {
        Self {
            id,
            kind: ChatKind::Group,
        }
    }
}

/// What the user actually did.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Text {
        message_id: MessageId,
        text: String,
    },
    /// A pressed inline button. `action`/`token_id` are parsed from the
    /// callback data once, at construction.
    Callback {
        callback_id: String,
        data: String,
        action: Option<Action>,
        token_id: Option<TokenId>,
        message: Option<MessageRef>,
    },
    /// Synthesized by the transport when a previous response asked for a redirect.
    Redirect { action: Action },
}

impl Payload {
    pub fn text(message_id: MessageId, text: impl Into<String>) -> Self {
        Self::Text {
            message_id,
            text: text.into(),
        }
    }

    pub fn callback(
        callback_id: impl Into<String>,
        data: impl Into<String>,
        message: Option<MessageRef>,
    ) -> Self {
        let data = data.into();
        let (action, token_id) = parse_callback_data(&data);
        Self::Callback {
            callback_id: callback_id.into(),
            data,
            action,
            token_id,
            message,
        }
    }
}

/// One incoming chat event plus the user's pending conversation state.
#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    pub user: User,
    pub chat: Chat,
    pub payload: Payload,
    pub chat_state: Option<ConversationState>,
}

impl Update {
    pub fn new(user: User, chat: Chat, payload: Payload) -> Self {
        Self {
            user,
            chat,
            payload,
            chat_state: None,
        }
    }

    /// Same event, enriched with the state the dispatcher found for the user.
    pub fn with_chat_state(self, chat_state: Option<ConversationState>) -> Self {
        Self { chat_state, ..self }
    }

    /// Follow-up event for a redirect hint, same user and chat.
    pub fn redirected(&self, action: Action) -> Self {
        Self::new(self.user.clone(), self.chat, Payload::Redirect { action })
    }

    pub fn is_private(&self) -> bool {
        self.chat.kind == ChatKind::Private
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.payload, Payload::Callback { .. })
    }

    pub fn callback_id(&self) -> Option<&str> {
        match &self.payload {
            Payload::Callback { callback_id, .. } => Some(callback_id.as_str()),
            _ => None,
        }
    }

    /// Message holding the pressed button, if the transport reported it.
    pub fn callback_message(&self) -> Option<MessageRef> {
        match &self.payload {
            Payload::Callback { message, .. } => *message,
            _ => None,
        }
    }

    /// Action tag of a pressed button or a redirect.
    pub fn action(&self) -> Option<&Action> {
        match &self.payload {
            Payload::Callback { action, .. } => action.as_ref(),
            Payload::Redirect { action } => Some(action),
            Payload::Text { .. } => None,
        }
    }

    pub fn has_action(&self, tag: &str) -> bool {
        self.action().is_some_and(|a| a.as_str() == tag)
    }

    pub fn token_id(&self) -> Option<TokenId> {
        match &self.payload {
            Payload::Callback { token_id, .. } => *token_id,
            _ => None,
        }
    }

    /// Action of the attached conversation state.
    pub fn state_action(&self) -> Option<&Action> {
        self.chat_state.as_ref().map(|s| &s.action)
    }

    pub fn has_state_action(&self, tag: &str) -> bool {
        self.state_action().is_some_and(|a| a.as_str() == tag)
    }
}
