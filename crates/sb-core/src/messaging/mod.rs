//! Cross-messenger abstractions (Telegram today).

pub mod deliver;
pub mod port;
pub mod types;

pub use deliver::deliver;
