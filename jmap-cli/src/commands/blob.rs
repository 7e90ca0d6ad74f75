// jmap-cli/src/commands/blob.rs
use crate::output::{print_response, Meta, Response, SafetyRejected};
use anyhow::{anyhow, bail, Result};
use jmap_rpc::core::{CoreCapability, URI as CORE};
use jmap_rpc::{Client, HttpClient, Session};
use serde_json::{json, Value};
use std::path::Path;

/// The explicit account if given, otherwise the session's default account
/// for Core.
pub fn resolve_account(session: &Session, explicit: Option<&str>) -> Result<String> {
    match explicit {
        Some(id) if session.account(id).is_some() => Ok(id.to_string()),
        Some(id) => bail!("Account '{}' is not in the session", id),
        None => session
            .default_account(CORE)
            .map(|id| id.to_string())
            .ok_or_else(|| anyhow!("The session lists no accounts")),
    }
}

pub async fn upload<C: HttpClient>(
    client: &Client<C>,
    path: &Path,
    media_type: Option<&str>,
    account: Option<&str>,
) -> Result<()> {
    let (result, account_id) = upload_file(client, path, media_type, account).await?;
    let meta = Meta {
        account_id: Some(account_id),
        ..Default::default()
    };
    print_response(&Response::ok_with_meta(result, meta))
}

pub async fn upload_file<C: HttpClient>(
    client: &Client<C>,
    path: &Path,
    media_type: Option<&str>,
    account: Option<&str>,
) -> Result<(Value, String)> {
    let session = client.current_session().await?;
    let account_id = resolve_account(&session, account)?;

    let content = tokio::fs::read(path).await?;
    if let Some(core) = session.capability::<CoreCapability>() {
        if core.max_size_upload > 0 && content.len() as u64 > core.max_size_upload {
            bail!(
                "{} is {} bytes; the server accepts at most {}",
                path.display(),
                content.len(),
                core.max_size_upload
            );
        }
    }

    let media_type = match media_type {
        Some(media_type) => media_type.to_string(),
        None => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    };
    log::info!("uploading {} as {}", path.display(), media_type);

    let uploaded = client.upload(&account_id, &media_type, content).await?;
    Ok((serde_json::to_value(&uploaded)?, account_id))
}

pub struct DownloadArgs<'a> {
    pub blob_id: &'a str,
    pub output: &'a Path,
    pub account: Option<&'a str>,
    pub media_type: Option<&'a str>,
    pub name: Option<&'a str>,
    pub force: bool,
}

pub async fn download<C: HttpClient>(client: &Client<C>, args: DownloadArgs<'_>) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(SafetyRejected(format!(
            "{} already exists. Pass --force to overwrite it",
            args.output.display()
        ))
        .into());
    }

    let session = client.current_session().await?;
    let account_id = resolve_account(&session, args.account)?;
    let media_type = args.media_type.unwrap_or("application/octet-stream");
    let name = args.name.unwrap_or(args.blob_id);

    let data = client
        .download(&account_id, args.blob_id, media_type, name)
        .await?;
    tokio::fs::write(args.output, &data).await?;

    let result = json!({
        "blobId": args.blob_id,
        "size": data.len(),
        "savedTo": args.output.display().to_string(),
    });
    let meta = Meta {
        account_id: Some(account_id),
        ..Default::default()
    };
    print_response(&Response::ok_with_meta(result, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::session::tests::{session, SESSION};
    use jmap_rpc::ReqwestClient;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_resolve_account() {
        let session = session();
        assert_eq!(resolve_account(&session, None).unwrap(), "a1");
        assert_eq!(resolve_account(&session, Some("b2")).unwrap(), "b2");
        assert!(resolve_account(&session, Some("zz")).is_err());
    }

    async fn mock_server() -> MockServer {
        let server = MockServer::start().await;
        let body = SESSION.replace("https://jmap.example.com", &server.uri());
        Mock::given(method("GET"))
            .and(path("/.well-known/jmap"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;
        server
    }

    fn client(server: &MockServer) -> Client<ReqwestClient> {
        Client::new(ReqwestClient::new().with_token("secret".to_string()))
            .with_session_endpoint(format!("{}/.well-known/jmap", server.uri()))
    }

    #[tokio::test]
    async fn test_upload_guesses_media_type() {
        let server = mock_server().await;
        Mock::given(method("POST"))
            .and(path("/upload/a1/"))
            .and(header("content-type", "text/plain"))
            .and(body_bytes(b"hello".to_vec()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "accountId": "a1",
                "blobId": "G1234",
                "type": "text/plain",
                "size": 5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = std::env::temp_dir().join(format!("jmap-upload-{}.txt", std::process::id()));
        tokio::fs::write(&file, b"hello").await.unwrap();

        let (result, account_id) = upload_file(&client(&server), &file, None, None)
            .await
            .unwrap();
        let _ = std::fs::remove_file(&file);

        assert_eq!(account_id, "a1");
        assert_eq!(result["blobId"], "G1234");
        assert_eq!(result["size"], 5);
    }

    #[tokio::test]
    async fn test_download_uses_held_session() {
        let server = mock_server().await;
        Mock::given(method("GET"))
            .and(path("/download/a1/G1234/notes.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client.authenticate().await.unwrap();

        let file = std::env::temp_dir().join(format!("jmap-held-{}.txt", std::process::id()));
        download(
            &client,
            DownloadArgs {
                blob_id: "G1234",
                output: &file,
                account: None,
                media_type: Some("text/plain"),
                name: Some("notes.txt"),
                force: true,
            },
        )
        .await
        .unwrap();
        let saved = tokio::fs::read(&file).await.unwrap();
        let _ = std::fs::remove_file(&file);

        assert_eq!(saved, b"hello");
        let session_fetches = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/.well-known/jmap")
            .count();
        assert_eq!(session_fetches, 1);
    }

    #[tokio::test]
    async fn test_download_refuses_to_overwrite() {
        let server = mock_server().await;
        let file = std::env::temp_dir().join(format!("jmap-download-{}.bin", std::process::id()));
        tokio::fs::write(&file, b"old").await.unwrap();

        let err = download(
            &client(&server),
            DownloadArgs {
                blob_id: "G1234",
                output: &file,
                account: None,
                media_type: None,
                name: None,
                force: false,
            },
        )
        .await
        .unwrap_err();
        let _ = std::fs::remove_file(&file);

        assert!(err.downcast_ref::<SafetyRejected>().is_some());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
