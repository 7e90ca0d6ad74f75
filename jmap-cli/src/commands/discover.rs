// jmap-cli/src/commands/discover.rs
use crate::output::{print_response, Response};
use anyhow::Result;
use serde_json::{json, Value};

/// Lists the session endpoints advertised for `domain`, most preferred first.
pub async fn run(domain: &str) -> Result<()> {
    let endpoints = jmap_rpc::discover::discover(domain).await?;
    print_response(&Response::ok(summary(domain, &endpoints)))
}

pub fn summary(domain: &str, endpoints: &[String]) -> Value {
    json!({
        "domain": domain,
        "sessionUrls": endpoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_keeps_order() {
        let endpoints = vec![
            "https://jmap.example.com/.well-known/jmap".to_string(),
            "https://backup.example.com:8443/.well-known/jmap".to_string(),
        ];
        assert_eq!(
            summary("example.com", &endpoints),
            json!({
                "domain": "example.com",
                "sessionUrls": [
                    "https://jmap.example.com/.well-known/jmap",
                    "https://backup.example.com:8443/.well-known/jmap"
                ]
            })
        );
    }
}
