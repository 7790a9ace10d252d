//! HTTP behaviour against a mock Revolt instance.

use luster::{
    api::{AuthApi, ChannelsApi, FetchMessagesOptions, MessagesApi, SessionApi, UsersApi},
    models::AnyChannel,
    types::{error_types::ErrorKind, DataMessageSend, FileTag},
    Client, ClientConfig, Credentials, HttpHandler, LusterError,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

const USER_BODY: &str = r#"{"_id":"U1","username":"ahmad","discriminator":"0001"}"#;

fn handler(server: &ServerGuard, credentials: Credentials) -> HttpHandler {
    let config = ClientConfig::new()
        .api_url(server.url())
        .autumn_url(format!("{}/autumn", server.url()));
    HttpHandler::new(config, credentials).unwrap()
}

fn client(server: &ServerGuard) -> Client {
    let config = ClientConfig::new()
        .api_url(server.url())
        .autumn_url(format!("{}/autumn", server.url()));
    Client::with_config(Credentials::Bot("bot-token".into()), config).unwrap()
}

#[tokio::test]
async fn bot_token_goes_in_bot_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/U1")
        .match_header("x-bot-token", "bot-token")
        .match_header("x-session-token", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(USER_BODY)
        .create_async()
        .await;

    let http = handler(&server, Credentials::new("bot-token", true));
    let user = http.fetch_user("U1").await.unwrap();

    assert_eq!(user.username, "ahmad");
    mock.assert_async().await;
}

#[tokio::test]
async fn session_token_goes_in_session_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/@me")
        .match_header("x-session-token", "session-token")
        .match_header("x-bot-token", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(USER_BODY)
        .create_async()
        .await;

    let http = handler(&server, Credentials::new("session-token", false));
    http.fetch_self().await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn api_errors_are_classified() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/channels/C1")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"type":"MissingPermission","permission":"ViewChannel"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/channels/C2")
        .with_status(404)
        .with_body("not here")
        .create_async()
        .await;

    let http = handler(&server, Credentials::new("t", true));

    let err = http.fetch_channel("C1").await.unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(
        err.api_error().map(|e| &e.kind),
        Some(&ErrorKind::MissingPermission {
            permission: "ViewChannel".into()
        })
    );

    let err = http.fetch_channel("C2").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, LusterError::HttpStatus { code: 404, ref body } if body == "not here"));
}

#[tokio::test]
async fn login_switches_to_the_session_token() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/auth/session/login")
        .match_body(Matcher::PartialJson(json!({
            "email": "me@example.com",
            "password": "hunter2"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result":"Success","_id":"S1","user_id":"U1","token":"fresh","name":"luster"}"#)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/users/@me")
        .match_header("x-session-token", "fresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(USER_BODY)
        .create_async()
        .await;

    let http = handler(&server, Credentials::User(String::new()));
    http.login("me@example.com", "hunter2", None).await.unwrap();
    assert_eq!(http.credentials().await.token(), "fresh");
    http.fetch_self().await.unwrap();

    login.assert_async().await;
    me.assert_async().await;
}

#[tokio::test]
async fn messages_get_a_generated_nonce() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/channels/C1/messages")
        .match_header("Idempotency-Key", "key-1")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"content": "hello"})),
            Matcher::Regex(r#""nonce":"[0-9A-Z]{26}""#.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"_id":"M1","channel":"C1","author":"U1","content":"hello"}"#)
        .create_async()
        .await;

    let http = handler(&server, Credentials::new("t", true));
    let msg = http
        .send_message("C1", &DataMessageSend::new("hello"), Some("key-1"))
        .await
        .unwrap();

    assert_eq!(msg.id, "M1");
    mock.assert_async().await;
}

#[tokio::test]
async fn fetch_channel_builds_the_typed_model() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/channels/C1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"channel_type":"TextChannel","_id":"C1","server":"S1","name":"general","last_message_id":"M9"}"#,
        )
        .create_async()
        .await;

    let client = client(&server);
    let channel = client.fetch_channel("C1").await.unwrap();

    let AnyChannel::Text(text) = channel else {
        panic!("expected a text channel");
    };
    assert_eq!(text.name(), "general");
    assert_eq!(text.last_message_id(), Some("M9"));
    assert!(client.cache().get_channel("C1").await.is_some());
}

#[tokio::test]
async fn upload_goes_to_autumn_as_multipart() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/autumn/attachments")
        .match_header("x-bot-token", "bot-token")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".into()),
        )
        .match_body(Matcher::Regex(r#"name="file"; filename="hello.txt""#.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"F1"}"#)
        .create_async()
        .await;

    let client = client(&server);
    let file = client
        .upload_file(FileTag::Attachments, "hello.txt", b"hi".to_vec(), Some("text/plain"))
        .await
        .unwrap();

    assert_eq!(file.id, "F1");
    assert_eq!(file.url(), format!("{}/autumn/attachments/F1", server.url()));
    mock.assert_async().await;
}

#[tokio::test]
async fn message_reply_references_the_original() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/channels/C1/messages")
        .match_body(Matcher::PartialJson(json!({
            "content": "pong",
            "replies": [{"id": "M1", "mention": false}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"_id":"M2","channel":"C1","author":"B1","content":"pong"}"#)
        .create_async()
        .await;

    let client = client(&server);
    let incoming: luster::Message =
        serde_json::from_str(r#"{"_id":"M1","channel":"C1","author":"U1","content":"ping"}"#)
            .unwrap();
    let reply = incoming
        .with_state(client.state().clone())
        .reply("pong")
        .await
        .unwrap();

    assert_eq!(reply.id, "M2");
    mock.assert_async().await;
}

#[tokio::test]
async fn closed_client_refuses_requests() {
    let server = Server::new_async().await;
    let client = client(&server);
    client.init().await.unwrap();
    client.close().await.unwrap();

    assert!(matches!(
        client.fetch_user("U1").await,
        Err(LusterError::Closed)
    ));
}

#[tokio::test]
async fn revoking_every_session_drops_the_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/auth/session/all")
        .match_query(Matcher::UrlEncoded("revoke_self".into(), "true".into()))
        .match_header("x-session-token", "session-token")
        .with_status(204)
        .create_async()
        .await;

    let http = handler(&server, Credentials::new("session-token", false));
    http.delete_all_sessions(true).await.unwrap();

    assert_eq!(http.credentials().await.token(), "");
    mock.assert_async().await;
}

#[tokio::test]
async fn message_history_caches_included_users() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/channels/C1/messages")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "2".into()),
            Matcher::UrlEncoded("include_users".into(), "true".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "messages": [
                    {"_id": "M1", "channel": "C1", "author": "U1", "content": "one"},
                    {"_id": "M2", "channel": "C1", "author": "U1", "content": "two"}
                ],
                "users": [{"_id": "U1", "username": "ahmad", "discriminator": "0001"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client(&server);
    let opts = FetchMessagesOptions {
        limit: Some(2),
        include_users: Some(true),
        ..Default::default()
    };
    let messages = client.fetch_messages("C1", Some(opts)).await.unwrap();

    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.state.is_some()));
    assert_eq!(
        client.cache().get_user("U1").await.map(|u| u.username),
        Some("ahmad".to_string())
    );
    mock.assert_async().await;
}
