//! Member commands.

use anyhow::Result;

use crate::config::build_authed_client;
use crate::handlers::member as handlers;
use crate::output::{print_table, OutputFormat};

/// List the member roster.
pub async fn handle(search: Option<String>, format: OutputFormat) -> Result<()> {
    let client = build_authed_client()?;
    let members = handlers::list_members(&client, search.as_deref()).await?;
    print_table(members, format);
    Ok(())
}
