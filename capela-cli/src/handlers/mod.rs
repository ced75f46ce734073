//! Data-shaping handlers behind the CLI commands.

pub mod chat;
pub mod member;
