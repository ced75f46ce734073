//! Rust client library for the Capela community app backend.
//!
//! Wraps the hosted entity store behind a typed client and layers the
//! private-messaging core on top: conversation aggregation, unread
//! tracking, and polling-based near-real-time delivery.

pub mod api;
pub mod chat;
pub mod client;
pub mod error;
pub mod models;
pub mod store;

// Re-export main types
pub use client::{AuthInfo, CapelaClient, CapelaClientBuilder, HttpConfig};
pub use error::{Error, Result};

// Re-export commonly used models
pub use models::{Conversation, Email, Message, MessageId, User};

// Re-export the store seam and the chat layer
pub use api::{MessageApi, UserApi};
pub use chat::{aggregate, ChatSession, MessageSynchronizer, PollConfig, PollerGuard, UnreadTracker};
pub use store::{EntityStore, MemoryStore};
