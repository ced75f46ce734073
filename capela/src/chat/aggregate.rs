//! Conversation aggregation.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Conversation, Email, Message, User};

/// Derive per-counterpart conversation summaries from a flat message log
/// and the member roster.
///
/// Pure function of its inputs; the caller re-runs it on every log
/// refresh and the output is rebuilt from scratch each time. For each
/// counterpart the summary carries the newest message by
/// `(created_date, id)` and the count of unread messages addressed to
/// `current`. Every roster member other than `current` gets an entry even
/// with no messages yet, so any member is selectable as a conversation
/// target. Self-messages are skipped.
///
/// Ordering: conversations with messages first, newest last message
/// first; message-less conversations after, in roster order.
pub fn aggregate(messages: &[Message], users: &[User], current: &User) -> Vec<Conversation> {
    let me = &current.email;
    let mut by_counterpart: HashMap<Email, Conversation> = HashMap::new();

    for message in messages {
        let Some(other) = message.counterpart(me) else {
            continue;
        };

        let entry = by_counterpart
            .entry(other.clone())
            .or_insert_with(|| Conversation::empty(other.clone()));

        let newer = match &entry.last_message {
            Some(last) => message.sort_key() > last.sort_key(),
            None => true,
        };
        if newer {
            entry.last_message = Some(message.clone());
        }
        if &message.receiver_email == me && !message.is_read {
            entry.unread_count += 1;
        }
    }

    let roster_pos: HashMap<&Email, usize> = users
        .iter()
        .enumerate()
        .map(|(i, u)| (&u.email, i))
        .collect();

    for user in users {
        if &user.email == me {
            continue;
        }
        by_counterpart
            .entry(user.email.clone())
            .or_insert_with(|| Conversation::empty(user.email.clone()));
    }

    let mut conversations: Vec<Conversation> = by_counterpart.into_values().collect();
    conversations.sort_by(|a, b| match (&a.last_message, &b.last_message) {
        (Some(x), Some(y)) => y.sort_key().cmp(&x.sort_key()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            let pa = roster_pos.get(&a.counterpart).copied().unwrap_or(usize::MAX);
            let pb = roster_pos.get(&b.counterpart).copied().unwrap_or(usize::MAX);
            pa.cmp(&pb)
        }
    });
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn user(email: &str) -> User {
        User::new(email, email.split('@').next().unwrap())
    }

    fn msg(id: &str, from: &str, to: &str, minute: u32, is_read: bool) -> Message {
        Message {
            id: id.into(),
            sender: from.into(),
            receiver_email: to.into(),
            content: format!("message {}", id),
            created_date: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            is_read,
        }
    }

    #[test]
    fn test_empty_roster_backfill() {
        // Scenario: a has no messages at all; roster is [a, b, c].
        let users = vec![user("a@x.com"), user("b@x.com"), user("c@x.com")];
        let conversations = aggregate(&[], &users, &users[0]);

        assert_eq!(conversations.len(), 2);
        for conv in &conversations {
            assert_eq!(conv.last_message, None);
            assert_eq!(conv.unread_count, 0);
        }
        let keys: Vec<&str> = conversations
            .iter()
            .map(|c| c.counterpart.as_str())
            .collect();
        assert!(keys.contains(&"b@x.com"));
        assert!(keys.contains(&"c@x.com"));
    }

    #[test]
    fn test_last_message_and_unread() {
        // Scenario: b -> a unread at T1, a -> b read at T2 > T1.
        let users = vec![user("a@x.com"), user("b@x.com")];
        let messages = vec![
            msg("1", "b@x.com", "a@x.com", 0, false),
            msg("2", "a@x.com", "b@x.com", 5, true),
        ];

        let conversations = aggregate(&messages, &users, &users[0]);
        assert_eq!(conversations.len(), 1);

        let conv = &conversations[0];
        assert_eq!(conv.counterpart.as_str(), "b@x.com");
        assert_eq!(conv.last_message.as_ref().unwrap().id.as_str(), "2");
        // The T1 message is unread but the count only tracks messages
        // addressed to the current user that are still unread.
        assert_eq!(conv.unread_count, 1);

        // Seen from b's side the backlog is clear.
        let from_b = aggregate(&messages, &users, &users[1]);
        assert_eq!(from_b[0].unread_count, 0);
        assert_eq!(from_b[0].last_message.as_ref().unwrap().id.as_str(), "2");
    }

    #[test]
    fn test_unread_count_per_counterpart() {
        let users = vec![user("a@x.com"), user("b@x.com"), user("c@x.com")];
        let messages = vec![
            msg("1", "b@x.com", "a@x.com", 0, false),
            msg("2", "b@x.com", "a@x.com", 1, false),
            msg("3", "b@x.com", "a@x.com", 2, true),
            msg("4", "c@x.com", "a@x.com", 3, false),
        ];

        let conversations = aggregate(&messages, &users, &users[0]);
        let unread: HashMap<&str, u32> = conversations
            .iter()
            .map(|c| (c.counterpart.as_str(), c.unread_count))
            .collect();
        assert_eq!(unread["b@x.com"], 2);
        assert_eq!(unread["c@x.com"], 1);
    }

    #[test]
    fn test_pure_and_repeatable() {
        let users = vec![user("a@x.com"), user("b@x.com"), user("c@x.com")];
        let messages = vec![
            msg("1", "b@x.com", "a@x.com", 0, false),
            msg("2", "a@x.com", "c@x.com", 1, true),
        ];

        let first = aggregate(&messages, &users, &users[0]);
        let second = aggregate(&messages, &users, &users[0]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ordering() {
        let users = vec![
            user("a@x.com"),
            user("b@x.com"),
            user("c@x.com"),
            user("d@x.com"),
            user("e@x.com"),
        ];
        let messages = vec![
            msg("1", "b@x.com", "a@x.com", 0, true),
            msg("2", "c@x.com", "a@x.com", 9, true),
        ];

        let conversations = aggregate(&messages, &users, &users[0]);
        let keys: Vec<&str> = conversations
            .iter()
            .map(|c| c.counterpart.as_str())
            .collect();
        // Newest exchange first, then the message-less members in roster
        // order.
        assert_eq!(keys, vec!["c@x.com", "b@x.com", "d@x.com", "e@x.com"]);
    }

    #[test]
    fn test_timestamp_tie_broken_by_id() {
        let users = vec![user("a@x.com"), user("b@x.com")];
        let messages = vec![
            msg("9", "b@x.com", "a@x.com", 0, true),
            msg("10", "b@x.com", "a@x.com", 0, true),
        ];

        let conversations = aggregate(&messages, &users, &users[0]);
        // Same timestamp: the lexicographically larger id wins.
        assert_eq!(conversations[0].last_message.as_ref().unwrap().id.as_str(), "9");
    }

    #[test]
    fn test_self_messages_skipped() {
        let users = vec![user("a@x.com"), user("b@x.com")];
        let messages = vec![msg("1", "a@x.com", "a@x.com", 0, false)];

        let conversations = aggregate(&messages, &users, &users[0]);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].counterpart.as_str(), "b@x.com");
        assert_eq!(conversations[0].last_message, None);
        assert_eq!(conversations[0].unread_count, 0);
    }
}
