//! User models.

use serde::{Deserialize, Serialize};

use super::Email;

/// A registered community member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Email address, the unique addressing key.
    pub email: Email,
    /// Display name.
    pub full_name: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    /// Create a user with just an address and a name.
    pub fn new(email: impl Into<Email>, full_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            full_name: full_name.into(),
            avatar_url: None,
        }
    }

    /// Single-letter initial for avatar fallbacks.
    pub fn initial(&self) -> Option<char> {
        self.full_name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
    }

    /// Case-insensitive name match, used by roster search.
    pub fn name_matches(&self, term: &str) -> bool {
        self.full_name
            .to_lowercase()
            .contains(&term.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial() {
        let u = User::new("maria@example.com", "maria souza");
        assert_eq!(u.initial(), Some('M'));

        let nameless = User::new("x@example.com", "");
        assert_eq!(nameless.initial(), None);
    }

    #[test]
    fn test_name_matches() {
        let u = User::new("joao@example.com", "João Pereira");
        assert!(u.name_matches("pere"));
        assert!(u.name_matches("PEREIRA"));
        assert!(!u.name_matches("silva"));
    }
}
