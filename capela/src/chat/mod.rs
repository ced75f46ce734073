//! The messaging core: log synchronization, conversation aggregation,
//! unread tracking, and the interactive session.

mod aggregate;
mod poll;
mod session;
mod sync;
mod unread;

pub use aggregate::aggregate;
pub use poll::{PollConfig, PollerGuard};
pub use session::ChatSession;
pub use sync::MessageSynchronizer;
pub use unread::UnreadTracker;
