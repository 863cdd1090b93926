use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Action, StateId, TokenId, UserId};

/// Payload carried by tokens and conversation states.
///
/// Every field is optional; a bot only fills the ones its follow-up needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Pending interaction for one user: "the next reply is expected to be X".
///
/// At most one is live per user id; see `ChatStateStore::save`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: StateId,
    pub user_id: UserId,
    pub action: Action,
    pub payload: Option<TokenPayload>,
    pub created_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(user_id: UserId, action: Action, payload: Option<TokenPayload>) -> Self {
        Self {
            id: StateId::new(),
            user_id,
            action,
            payload,
            created_at: Utc::now(),
        }
    }
}

/// A persisted offer ("button") the user can resolve later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub action: Action,
    pub payload: Option<TokenPayload>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_at: Option<DateTime<Utc>>,
}

const CALLBACK_SEPARATOR: char = ':';

impl Token {
    pub fn new(action: Action, payload: Option<TokenPayload>) -> Self {
        Self {
            id: TokenId::new(),
            action,
            payload,
            created_at: Utc::now(),
            consumed_at: None,
        }
    }

    /// Telegram callback data: `<action>:<token-id>`.
    pub fn callback_data(&self) -> String {
        format!("{}{CALLBACK_SEPARATOR}{}", self.action, self.id)
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}

/// Split callback data produced by `Token::callback_data`.
///
/// The action is returned even when the id part is malformed, so the owning
/// bot can still react and report an invalid token.
pub fn parse_callback_data(data: &str) -> (Option<Action>, Option<TokenId>) {
    let Some((action, id)) = data.rsplit_once(CALLBACK_SEPARATOR) else {
        return (None, None);
    };
    if action.is_empty() {
        return (None, None);
    }
    (Some(Action::new(action)), TokenId::parse(id))
}

/// Bot user with stored preferences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Option<String>,
    pub display_name: String,
    /// Language reported by the client.
    pub user_lang: Option<String>,
    /// Language chosen explicitly with `/lang`.
    pub selected_lang: Option<String>,
    pub count_in_page: u32,
    pub notification_on: bool,
}

impl User {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            username: None,
            display_name: display_name.into(),
            user_lang: None,
            selected_lang: None,
            count_in_page: 0,
            notification_on: true,
        }
    }

    pub fn locale<'a>(&'a self, default: &'a str) -> &'a str {
        self.selected_lang
            .as_deref()
            .or(self.user_lang.as_deref())
            .filter(|l| !l.is_empty())
            .unwrap_or(default)
    }
}

/// A shared expense room created through the `create_room` flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub owner: UserId,
    pub members: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(name: impl Into<String>, owner: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner,
            members: vec![owner],
            created_at: Utc::now(),
        }
    }
}
