//! Data models for store entities and derived views.

mod conversation;
mod ids;
mod message;
mod user;

pub use conversation::Conversation;
pub use ids::{Email, MessageId};
pub use message::Message;
pub use user::User;

/// Entity kind names as the store knows them.
pub mod kinds {
    /// The message entity collection.
    pub const MESSAGE: &str = "Message";
    /// The user/auth collection.
    pub const USER: &str = "User";
}
