//! Shapes exchanged between the transport, the dispatcher and the bots.

pub mod records;
pub mod response;
pub mod update;

pub use records::{ConversationState, Room, Token, TokenPayload, User};
pub use response::{CallbackAnswer, OutgoingAction, Redirect, ResponseDirective};
pub use update::{Chat, ChatKind, Payload, Update};
