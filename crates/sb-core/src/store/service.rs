use std::sync::Arc;

use tracing::debug;

use crate::{
    domain::{Action, TokenId, UserId},
    error_sink::ErrorReporter,
    errors::Error,
    model::{ConversationState, Token, TokenPayload},
    store::{ChatStateStore, TokenStore},
    Result,
};

/// Conversation state lifecycle on top of a `ChatStateStore`.
#[derive(Clone)]
pub struct ChatStateService {
    store: Arc<dyn ChatStateStore>,
    errors: ErrorReporter,
}

impl ChatStateService {
    pub fn new(store: Arc<dyn ChatStateStore>, errors: ErrorReporter) -> Self {
        Self { store, errors }
    }

    /// Create (or replace) the pending interaction for a user.
    pub async fn open(
        &self,
        user_id: UserId,
        action: Action,
        payload: Option<TokenPayload>,
    ) -> Result<ConversationState> {
        let state = ConversationState::new(user_id, action, payload);
        self.store.save(&state).await?;
        Ok(state)
    }

    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<ConversationState>> {
        self.store.find_by_user(user_id).await
    }

    /// Remove a consumed state.
    ///
    /// Deletes by id, so a state opened for the same user while this one was
    /// being processed survives. Failures go to the error sink only.
    pub async fn clean(&self, state: Option<&ConversationState>) {
        let Some(state) = state else {
            return;
        };
        match self.store.delete_by_id(state.id).await {
            Ok(()) => debug!(user_id = state.user_id.0, action = %state.action, "chat state cleaned"),
            Err(e) => self.errors.report(&e, Some("chat state cleanup failed")),
        }
    }
}

/// Token issuance and resolution on top of a `TokenStore`.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    consume_on_resolve: bool,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>, consume_on_resolve: bool) -> Self {
        Self {
            store,
            consume_on_resolve,
        }
    }

    pub async fn issue(&self, action: Action, payload: Option<TokenPayload>) -> Result<Token> {
        let token = Token::new(action, payload);
        self.store.save(&token).await?;
        Ok(token)
    }

    pub async fn issue_all(&self, tokens: Vec<Token>) -> Result<Vec<Token>> {
        self.store.save_all(tokens).await
    }

    /// Look up the token behind a pressed button and check it belongs to `expected`.
    ///
    /// With consumption enabled the first resolution marks the token used and
    /// later ones fail with `Error::TokenConsumed`.
    pub async fn resolve(&self, id: Option<TokenId>, expected: &str) -> Result<Token> {
        let id = id.ok_or_else(|| Error::InvalidToken(format!("missing token id for {expected}")))?;

        let token = self.store.find_by_id(id).await?;
        if token.action.as_str() != expected {
            return Err(Error::InvalidToken(format!(
                "token {id} has action {}, expected {expected}",
                token.action
            )));
        }
        if self.consume_on_resolve {
            return self.store.consume(id).await;
        }
        Ok(token)
    }
}
