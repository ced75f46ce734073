//! Typed API groups over the entity store.

mod message;
mod user;

pub use message::MessageApi;
pub use user::UserApi;
