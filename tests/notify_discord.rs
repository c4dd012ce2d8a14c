// tests/notify_discord.rs
use harvest_notifier::notify::discord::DiscordNotifier;
use harvest_notifier::{Notifier, NotifyError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notifier(server: &MockServer) -> DiscordNotifier {
    DiscordNotifier::new("test-token".into(), 42)
        .with_base_url(server.uri())
        .with_timeout(5)
}

#[tokio::test]
async fn send_posts_plain_message_with_bot_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .and(header("authorization", "Bot test-token"))
        .and(body_json(json!({
            "content": "Highest value = **PE 949**",
            "allowed_mentions": { "parse": [] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server)
        .send("Highest value = **PE 949**")
        .await
        .expect("send ok");
    server.verify().await;
}

#[tokio::test]
async fn forbidden_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = notifier(&server).send("x").await.unwrap_err();
    assert!(matches!(err, NotifyError::Forbidden), "got {err:?}");
    assert!(err.is_access_lost());
    server.verify().await;
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let err = notifier(&server)
        .with_retries(2)
        .send("x")
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::Http(502)), "got {err:?}");
    server.verify().await;
}

#[tokio::test]
async fn rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "retry_after": 0.25, "global": false })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = notifier(&server)
        .with_retries(1)
        .send("x")
        .await
        .unwrap_err();
    assert!(
        matches!(err, NotifyError::RateLimited { retry_after_ms: 250 }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn verify_checks_token_and_channel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("authorization", "Bot test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "7", "username": "harvest-bot" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "42", "name": "resources" })),
        )
        .mount(&server)
        .await;

    let bot = notifier(&server).verify().await.expect("verify ok");
    assert_eq!(bot.username, "harvest-bot");
    assert_eq!(bot.id, "7");
}

#[tokio::test]
async fn verify_rejects_bad_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = notifier(&server).verify().await.unwrap_err();
    assert!(matches!(err, NotifyError::Unauthorized), "got {err:?}");
}

#[tokio::test]
async fn verify_reports_missing_channel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "7", "username": "harvest-bot" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/channels/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = notifier(&server).verify().await.unwrap_err();
    assert!(matches!(err, NotifyError::UnknownChannel), "got {err:?}");
}
