// jmap-cli/src/commands/session.rs
use crate::output::{print_response, Response};
use anyhow::Result;
use jmap_rpc::core::CoreCapability;
use jmap_rpc::{Client, HttpClient, Session};
use serde_json::{json, Value};

pub async fn run<C: HttpClient>(client: &Client<C>) -> Result<()> {
    let session = client.current_session().await?;
    print_response(&Response::ok(summary(&session)))
}

/// What the server advertises, with capability URIs and account ids sorted.
pub fn summary(session: &Session) -> Value {
    let mut capabilities: Vec<&str> = session
        .raw_capabilities
        .keys()
        .map(|u| u.as_str())
        .collect();
    capabilities.sort_unstable();

    let mut accounts: Vec<_> = session.accounts.values().collect();
    accounts.sort_by(|a, b| a.id.cmp(&b.id));
    let accounts: Vec<Value> = accounts
        .into_iter()
        .map(|account| {
            let mut capabilities: Vec<&str> = account
                .raw_capabilities
                .keys()
                .map(|u| u.as_str())
                .collect();
            capabilities.sort_unstable();
            json!({
                "id": account.id,
                "name": account.name,
                "isPersonal": account.is_personal,
                "isReadOnly": account.is_read_only,
                "capabilities": capabilities,
            })
        })
        .collect();

    json!({
        "username": session.username,
        "apiUrl": session.api_url,
        "state": session.state,
        "capabilities": capabilities,
        "core": session.capability::<CoreCapability>(),
        "accounts": accounts,
        "primaryAccounts": session.primary_accounts,
    })
}
