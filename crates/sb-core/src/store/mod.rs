//! Persistence ports.
//!
//! Each operation is atomic per document (per user id / token id); that is the
//! only concurrency boundary the bots rely on, there is no extra locking above
//! the store.

use async_trait::async_trait;

use crate::{
    domain::{StateId, TokenId, UserId},
    model::{ConversationState, Room, Token, User},
    Result,
};

pub mod memory;
pub mod service;

pub use memory::MemoryStore;
pub use service::{ChatStateService, TokenService};

#[async_trait]
pub trait ChatStateStore: Send + Sync {
    /// Upsert keyed by `state.user_id`; replaces any state the user already had.
    async fn save(&self, state: &ConversationState) -> Result<()>;
    /// No-op if the state is already gone.
    async fn delete_by_id(&self, id: StateId) -> Result<()>;
    async fn delete_by_user(&self, user_id: UserId) -> Result<()>;
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<ConversationState>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save(&self, token: &Token) -> Result<TokenId>;
    async fn save_all(&self, tokens: Vec<Token>) -> Result<Vec<Token>>;
    /// `Error::NotFound` for unknown ids.
    async fn find_by_id(&self, id: TokenId) -> Result<Token>;
    /// Mark the token consumed and return it; `Error::TokenConsumed` if it
    /// already was.
    async fn consume(&self, id: TokenId) -> Result<Token>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert or refresh identity fields, keeping stored preferences.
    async fn upsert(&self, user: &User) -> Result<User>;
    async fn find_by_id(&self, id: UserId) -> Result<User>;
    async fn set_lang(&self, id: UserId, lang: &str) -> Result<()>;
    async fn set_count_in_page(&self, id: UserId, count: u32) -> Result<()>;
    async fn set_notification(&self, id: UserId, on: bool) -> Result<()>;
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn save(&self, room: &Room) -> Result<()>;
    async fn find_by_id(&self, id: uuid::Uuid) -> Result<Room>;
    async fn find_by_member(&self, user_id: UserId) -> Result<Vec<Room>>;
}
