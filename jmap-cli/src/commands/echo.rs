// jmap-cli/src/commands/echo.rs
use crate::output::{print_response, Meta, Response};
use anyhow::{bail, Result};
use jmap_rpc::core::Echo;
use jmap_rpc::{Client, HttpClient, Request};
use serde_json::Value;

pub async fn run<C: HttpClient>(client: &Client<C>, pairs: &[String]) -> Result<()> {
    let mut echo = Echo::new();
    for pair in pairs {
        let (key, value) = parse_pair(pair)?;
        echo = echo.with(key, value);
    }

    let mut request = Request::new();
    let call_id = request.invoke(&echo)?;
    let mut response = client.execute(&request).await?;
    let echoed: Echo = response.take(&call_id)?;

    let meta = Meta {
        session_state: Some(response.session_state),
        ..Default::default()
    };
    print_response(&Response::ok_with_meta(echoed.arguments, meta))
}

/// `key=value`; the value is read as JSON when it parses, else as a string.
pub fn parse_pair(pair: &str) -> Result<(&str, Value)> {
    let Some((key, value)) = pair.split_once('=') else {
        bail!("Expected key=value, got '{}'", pair);
    };
    if key.is_empty() {
        bail!("Empty key in '{}'", pair);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key, value))
}
