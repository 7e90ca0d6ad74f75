// jmap-cli/src/commands/setup.rs
use crate::config::{AuthConfig, Config, ServerConfig};
use crate::output::{print_error, print_header, print_success};
use anyhow::Result;
use dialoguer::{Input, Password};
use jmap_rpc::{Client, ReqwestClient, Session};
use std::sync::Arc;

/// Exit code type
pub type SetupExitCode = i32;

/// Run the interactive setup command
pub async fn run_setup() -> Result<SetupExitCode> {
    println!("JMAP CLI Setup");
    println!();

    let session_url: String = Input::new()
        .with_prompt("Session URL (eg https://jmap.example.com/.well-known/jmap)")
        .interact_text()?;

    let token = Password::new()
        .with_prompt("API token")
        .interact()?;

    if token.is_empty() {
        print_error("API token cannot be empty");
        return Ok(2);
    }

    println!();
    println!("Validating credentials...");

    match validate(&session_url, &token).await {
        Ok(session) => {
            print_header("Username", &session.username);
            print_header("API URL", &session.api_url);

            let config = Config {
                server: ServerConfig {
                    session_url: Some(session_url),
                    domain: None,
                },
                auth: AuthConfig {
                    token: Some(token),
                    ..Default::default()
                },
            };

            if let Err(e) = config.save() {
                print_error(&format!("Couldn't write config file: {}", e));
                return Ok(2);
            }

            println!();
            print_success("Credentials saved!");
            println!("Try: jmap session");
            Ok(0)
        }
        Err(e) => {
            print_error(&e.to_string());
            Ok(2)
        }
    }
}

/// Fetches the session with the given credentials.
pub async fn validate(session_url: &str, token: &str) -> jmap_rpc::Result<Arc<Session>> {
    let client = Client::new(ReqwestClient::new().with_token(token.to_string()))
        .with_session_endpoint(session_url);
    client.authenticate().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::session::tests::SESSION;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_validate_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jmap"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SESSION, "application/json"))
            .mount(&server)
            .await;

        let session = validate(&format!("{}/.well-known/jmap", server.uri()), "secret")
            .await
            .unwrap();
        assert_eq!(session.username, "john@example.com");
    }

    #[tokio::test]
    async fn test_validate_rejected_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = validate(&format!("{}/.well-known/jmap", server.uri()), "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, jmap_rpc::Error::Authentication { status: 401 }));
    }
}
