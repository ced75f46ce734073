//! Member roster handlers.

use anyhow::Result;
use capela::{CapelaClient, User};
use colored::Colorize;
use serde::Serialize;

use crate::output::{PlainPrint, TableRow};

/// Roster entry for display.
#[derive(Debug, Clone, Serialize)]
pub struct MemberInfo {
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<User> for MemberInfo {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name,
            email: user.email.0,
            avatar_url: user.avatar_url,
        }
    }
}

impl TableRow for MemberInfo {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Email", "Avatar"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.full_name.clone(),
            self.email.clone(),
            if self.avatar_url.is_some() {
                "yes".to_string()
            } else {
                "".to_string()
            },
        ]
    }
}

impl PlainPrint for MemberInfo {
    fn plain_print(&self) {
        println!("{} <{}>", self.full_name.green(), self.email.dimmed());
    }
}

/// List the member roster, optionally narrowed by a name substring.
pub async fn list_members(
    client: &CapelaClient,
    search: Option<&str>,
) -> Result<Vec<MemberInfo>> {
    let api = client.users();
    let users = match search {
        Some(term) => api.search(term).await?,
        None => api.list().await?,
    };
    Ok(users.into_iter().map(MemberInfo::from).collect())
}
