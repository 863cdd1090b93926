use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    domain::{StateId, TokenId, UserId},
    errors::Error,
    model::{ConversationState, Room, Token, User},
    store::{ChatStateStore, RoomStore, TokenStore, UserStore},
    Result,
};

pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Stored user document; unset preferences are filled in on read.
#[derive(Clone, Debug)]
struct UserRecord {
    username: Option<String>,
    display_name: String,
    user_lang: Option<String>,
    selected_lang: Option<String>,
    count_in_page: Option<u32>,
    notification_on: Option<bool>,
}

impl UserRecord {
    fn empty() -> Self {
        Self {
            username: None,
            display_name: String::new(),
            user_lang: None,
            selected_lang: None,
            count_in_page: None,
            notification_on: None,
        }
    }
}

#[derive(Default)]
struct Collections {
    states: HashMap<UserId, ConversationState>,
    tokens: HashMap<TokenId, Token>,
    users: HashMap<UserId, UserRecord>,
    rooms: HashMap<Uuid, Room>,
}

/// Process-local store implementing every persistence port.
///
/// Each operation takes the lock exactly once, which gives the same
/// per-document atomicity a document database offers.
pub struct MemoryStore {
    default_page_size: u32,
    inner: Mutex<Collections>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl MemoryStore {
    pub fn new(default_page_size: u32) -> Self {
        Self {
            default_page_size: default_page_size.max(1),
            inner: Mutex::new(Collections::default()),
        }
    }

    fn to_user(&self, id: UserId, rec: &UserRecord) -> User {
        User {
            id,
            username: rec.username.clone(),
            display_name: rec.display_name.clone(),
            user_lang: rec.user_lang.clone(),
            selected_lang: rec.selected_lang.clone(),
            count_in_page: rec
                .count_in_page
                .filter(|c| *c > 0)
                .unwrap_or(self.default_page_size),
            notification_on: rec.notification_on.unwrap_or(true),
        }
    }

    async fn update_user(&self, id: UserId, f: impl FnOnce(&mut UserRecord)) -> Result<()> {
        let mut inner = self.inner.lock().await;
        f(inner.users.entry(id).or_insert_with(UserRecord::empty));
        Ok(())
    }
}

#[async_trait]
impl ChatStateStore for MemoryStore {
    async fn save(&self, state: &ConversationState) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.states.insert(state.user_id, state.clone());
        Ok(())
    }

    async fn delete_by_id(&self, id: StateId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.states.retain(|_, s| s.id != id);
        Ok(())
    }

    async fn delete_by_user(&self, user_id: UserId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.states.remove(&user_id);
        Ok(())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<ConversationState>> {
        let inner = self.inner.lock().await;
        Ok(inner.states.get(&user_id).cloned())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn save(&self, token: &Token) -> Result<TokenId> {
        let mut inner = self.inner.lock().await;
        inner.tokens.insert(token.id, token.clone());
        Ok(token.id)
    }

    async fn save_all(&self, tokens: Vec<Token>) -> Result<Vec<Token>> {
        let mut inner = self.inner.lock().await;
        for t in &tokens {
            inner.tokens.insert(t.id, t.clone());
        }
        Ok(tokens)
    }

    async fn find_by_id(&self, id: TokenId) -> Result<Token> {
        let inner = self.inner.lock().await;
        inner
            .tokens
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("token", id))
    }

    async fn consume(&self, id: TokenId) -> Result<Token> {
        let mut inner = self.inner.lock().await;
        let token = inner
            .tokens
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("token", id))?;
        if token.is_consumed() {
            return Err(Error::TokenConsumed(id.to_string()));
        }
        token.consumed_at = Some(Utc::now());
        Ok(token.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert(&self, user: &User) -> Result<User> {
        let mut inner = self.inner.lock().await;
        let rec = inner.users.entry(user.id).or_insert_with(UserRecord::empty);
        rec.username = user.username.clone();
        rec.display_name = user.display_name.clone();
        rec.user_lang = user.user_lang.clone();
        let rec = rec.clone();
        Ok(self.to_user(user.id, &rec))
    }

    async fn find_by_id(&self, id: UserId) -> Result<User> {
        let inner = self.inner.lock().await;
        inner
            .users
            .get(&id)
            .map(|rec| self.to_user(id, rec))
            .ok_or_else(|| Error::not_found("user", id.0))
    }

    async fn set_lang(&self, id: UserId, lang: &str) -> Result<()> {
        let lang = lang.to_string();
        self.update_user(id, |rec| rec.selected_lang = Some(lang))
            .await
    }

    async fn set_count_in_page(&self, id: UserId, count: u32) -> Result<()> {
        self.update_user(id, |rec| rec.count_in_page = Some(count))
            .await
    }

    async fn set_notification(&self, id: UserId, on: bool) -> Result<()> {
        self.update_user(id, |rec| rec.notification_on = Some(on))
            .await
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn save(&self, room: &Room) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Room> {
        let inner = self.inner.lock().await;
        inner
            .rooms
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("room", id))
    }

    async fn find_by_member(&self, user_id: UserId) -> Result<Vec<Room>> {
        let inner = self.inner.lock().await;
        let mut rooms: Vec<Room> = inner
            .rooms
            .values()
            .filter(|r| r.members.contains(&user_id))
            .cloned()
            .collect();
        rooms.sort_by_key(|r| r.created_at);
        Ok(rooms)
    }
}
