use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    bot::{ack, BotDeps, Handler, CREATE_ROOM},
    domain::Action,
    model::{OutgoingAction, ResponseDirective, Update},
    Result,
};

/// "Create room" button: asks for a room name and waits for the reply.
pub struct CreateRoom {
    deps: BotDeps,
}

impl CreateRoom {
    pub fn new(deps: BotDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for CreateRoom {
    fn name(&self) -> &'static str {
        "create_room"
    }

    fn has_react(&self, u: &Update) -> bool {
        u.is_callback() && u.has_action(CREATE_ROOM)
    }

    async fn on_message(
        &self,
        _cancel: &CancellationToken,
        u: &Update,
    ) -> Result<ResponseDirective> {
        let token = self.deps.tokens.resolve(u.token_id(), CREATE_ROOM).await?;

        let state = self
            .deps
            .states
            .open(u.user.id, Action::new(CREATE_ROOM), token.payload)
            .await?;
        info!(user_id = u.user.id.0, state_id = %state.id, "waiting for room name");

        let prompt = OutgoingAction::SendText {
            chat_id: u.chat.id,
            text: self.deps.text("enter_room_name", u),
            keyboard: None,
        };
        Ok(ResponseDirective::send(vec![prompt]).with_callback_answer(ack(u)))
    }
}
