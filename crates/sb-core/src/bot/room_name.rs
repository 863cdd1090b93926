use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    bot::{BotDeps, Handler, CREATE_ROOM, VIEW_START},
    domain::Action,
    formatting::fill,
    model::{OutgoingAction, ResponseDirective, Room, Update},
    Result,
};

pub const MAX_ROOM_NAME_CHARS: usize = 64;

/// Reply to the "enter room name" prompt.
///
/// Reacts only while the user has a pending `create_room` state. A valid
/// name creates the room and sends the user back to the main screen; an
/// invalid one re-opens the prompt.
pub struct RoomName {
    deps: BotDeps,
}

impl RoomName {
    pub fn new(deps: BotDeps) -> Self {
        Self { deps }
    }
}

fn valid_name(text: &str) -> Option<&str> {
    let name = text.trim();
    let len = name.chars().count();
    (1..=MAX_ROOM_NAME_CHARS).contains(&len).then_some(name)
}

#[async_trait]
impl Handler for RoomName {
    fn name(&self) -> &'static str {
        "room_name"
    }

    fn has_react(&self, u: &Update) -> bool {
        u.has_state_action(CREATE_ROOM) && u.text().is_some_and(|t| !t.trim_start().starts_with('/'))
    }

    async fn on_message(
        &self,
        _cancel: &CancellationToken,
        u: &Update,
    ) -> Result<ResponseDirective> {
        let text = u.text().unwrap_or_default();

        let Some(name) = valid_name(text) else {
            // Keep waiting: the attached state is cleaned after dispatch.
            let payload = u.chat_state.as_ref().and_then(|s| s.payload.clone());
            self.deps
                .states
                .open(u.user.id, Action::new(CREATE_ROOM), payload)
                .await?;
            let retry = OutgoingAction::SendText {
                chat_id: u.chat.id,
                text: self.deps.text("room_name_invalid", u),
                keyboard: None,
            };
            return Ok(ResponseDirective::send(vec![retry]));
        };

        let room = Room::new(name, u.user.id);
        self.deps.rooms.save(&room).await?;
        info!(user_id = u.user.id.0, room_id = %room.id, "room created");

        let done = OutgoingAction::SendText {
            chat_id: u.chat.id,
            text: fill(&self.deps.text("room_created", u), &[("name", name)]),
            keyboard: None,
        };
        Ok(ResponseDirective::send(vec![done]).with_redirect(Action::new(VIEW_START)))
    }
}
