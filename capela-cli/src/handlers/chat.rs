//! Chat handlers.

use anyhow::{bail, Result};
use capela::{CapelaClient, ChatSession, Conversation, Email, Message, User};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::output::{format_relative_time, format_time, PlainPrint, TableRow};

/// Conversation summary for display.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationInfo {
    pub with: String,
    pub email: String,
    pub preview: String,
    pub last_time: Option<DateTime<Utc>>,
    pub unread: u32,
}

impl ConversationInfo {
    fn new(conversation: Conversation, roster: &[User]) -> Self {
        let with = roster
            .iter()
            .find(|u| u.email == conversation.counterpart)
            .map(|u| u.full_name.clone())
            .unwrap_or_else(|| conversation.counterpart.to_string());

        let (preview, last_time) = match &conversation.last_message {
            Some(last) => (last.content.clone(), Some(last.created_date)),
            None => ("(no messages yet)".to_string(), None),
        };

        Self {
            with,
            email: conversation.counterpart.0,
            preview,
            last_time,
            unread: conversation.unread_count,
        }
    }
}

impl TableRow for ConversationInfo {
    fn headers() -> Vec<&'static str> {
        vec!["With", "Email", "Last message", "When", "Unread"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.with.clone(),
            self.email.clone(),
            self.preview.clone(),
            self.last_time.map(format_relative_time).unwrap_or_default(),
            if self.unread > 0 {
                self.unread.to_string()
            } else {
                "".to_string()
            },
        ]
    }
}

impl PlainPrint for ConversationInfo {
    fn plain_print(&self) {
        let badge = if self.unread > 0 {
            format!(" ({})", self.unread).red().to_string()
        } else {
            String::new()
        };
        let when = self
            .last_time
            .map(format_relative_time)
            .unwrap_or_default();
        println!(
            "{} <{}>{} {}",
            self.with.green(),
            self.email.dimmed(),
            badge,
            when.dimmed()
        );
        println!("   {}", self.preview);
    }
}

/// One line of a thread for display.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadLine {
    pub from: String,
    pub when: DateTime<Utc>,
    pub content: String,
    pub mine: bool,
}

impl ThreadLine {
    fn new(message: &Message, me: &Email, counterpart_name: &str) -> Self {
        let mine = &message.sender == me;
        Self {
            from: if mine {
                "me".to_string()
            } else {
                counterpart_name.to_string()
            },
            when: message.created_date,
            content: message.content.clone(),
            mine,
        }
    }
}

impl TableRow for ThreadLine {
    fn headers() -> Vec<&'static str> {
        vec!["When", "From", "Message"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            format_time(self.when),
            self.from.clone(),
            self.content.clone(),
        ]
    }
}

impl PlainPrint for ThreadLine {
    fn plain_print(&self) {
        let from = if self.mine {
            self.from.cyan()
        } else {
            self.from.green()
        };
        println!(
            "{} {}: {}",
            format_time(self.when).dimmed(),
            from,
            self.content
        );
    }
}

/// Open a chat session, translating the unauthenticated case into a
/// sign-in hint.
pub(crate) async fn connect(client: &CapelaClient) -> Result<ChatSession> {
    match client.chat().await {
        Ok(session) => Ok(session),
        Err(e) if e.is_auth_error() => {
            bail!("Not signed in. Run `capela auth set <TOKEN>` first.")
        }
        Err(e) => Err(e.into()),
    }
}

/// List conversation summaries, newest exchange first.
pub async fn list_conversations(client: &CapelaClient) -> Result<Vec<ConversationInfo>> {
    let session = connect(client).await?;
    let roster = session.roster();
    Ok(session
        .conversations()
        .into_iter()
        .map(|c| ConversationInfo::new(c, &roster))
        .collect())
}

/// Open a thread, marking its backlog read, and return the lines.
pub async fn read_thread(
    client: &CapelaClient,
    counterpart: &str,
) -> Result<(String, Vec<ThreadLine>)> {
    let session = connect(client).await?;
    let counterpart = Email::new(counterpart);

    let name = session
        .roster()
        .iter()
        .find(|u| u.email == counterpart)
        .map(|u| u.full_name.clone())
        .unwrap_or_else(|| counterpart.to_string());

    session.select_conversation(counterpart.clone()).await;
    let me = session.current_user().email.clone();
    let lines = session
        .thread(&counterpart)
        .iter()
        .map(|m| ThreadLine::new(m, &me, &name))
        .collect();
    Ok((name, lines))
}

/// Send a message to a member. Goes straight through the message API:
/// sending from the command line is not viewing, so the counterpart's
/// unread backlog must stay untouched.
pub async fn send_message(client: &CapelaClient, counterpart: &str, content: &str) -> Result<()> {
    if content.trim().is_empty() {
        bail!("Message is empty");
    }

    match client
        .messages()
        .send(&Email::new(counterpart), content)
        .await
    {
        Ok(_) => Ok(()),
        Err(e) if e.is_auth_error() => {
            bail!("Not signed in. Run `capela auth set <TOKEN>` first.")
        }
        Err(e) => Err(e.into()),
    }
}

/// Total unread-message count for the signed-in user.
pub async fn unread_count(client: &CapelaClient) -> Result<usize> {
    let me = client.users().me().await?;
    let unread = client.messages().unread_for(&me.email).await?;
    Ok(unread.len())
}
