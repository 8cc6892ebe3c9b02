//! Integration tests for the backend API client using wiremock.

use confab_client::ChatApi;
use confab_types::{ChatTransport, Message, TransportError, TurnEvent, TurnRecord};
use futures::StreamExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn short_history() -> Vec<Message> {
    vec![Message::user("hello")]
}

async fn collect_events(
    api: &ChatApi,
    model: &str,
    conversation_id: Option<&str>,
) -> Vec<TurnEvent> {
    let stream = api
        .send_turn(model, &short_history(), conversation_id)
        .await
        .expect("should open stream");
    stream.events.collect().await
}

#[tokio::test]
async fn send_turn_posts_to_chat_turn_endpoint() {
    let mock_server = MockServer::start().await;

    let ndjson_body = concat!(
        r#"{"success":true,"chunk":"Hi"}"#,
        "\n",
        r#"{"done":true,"full_content":"Hi","metrics":{"eval_count":1},"model":"llama3.2"}"#,
        "\n",
    );

    Mock::given(method("POST"))
        .and(path("/api/chat-turn"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama3.2",
            "messages": [{"role": "user", "content": "hello"}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let events = collect_events(&api, "llama3.2", None).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], TurnEvent::Chunk("Hi".into()));
    assert!(matches!(
        &events[1],
        TurnEvent::Final { content, model, .. }
            if content == "Hi" && model.as_deref() == Some("llama3.2")
    ));
}

#[tokio::test]
async fn send_turn_includes_conversation_id_when_present() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat-turn"))
        .and(body_partial_json(
            serde_json::json!({"conversation_id": "c-42"}),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"done\":true,\"full_content\":\"ok\"}\n"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let events = collect_events(&api, "llama3.2", Some("c-42")).await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn send_turn_decodes_chunks_in_arrival_order() {
    let mock_server = MockServer::start().await;

    let ndjson_body = concat!(
        r#"{"success":true,"chunk":"Hi"}"#,
        "\n",
        r#"{"success":true,"chunk":" there"}"#,
        "\n",
        r#"{"success":true,"chunk":"!"}"#,
        "\n",
    );

    Mock::given(method("POST"))
        .and(path("/api/chat-turn"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson_body))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let events = collect_events(&api, "llama3.2", None).await;

    let chunks: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            TurnEvent::Chunk(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(chunks, vec!["Hi", " there", "!"]);
}

#[tokio::test]
async fn send_turn_tolerates_malformed_lines() {
    let mock_server = MockServer::start().await;

    let ndjson_body = concat!(
        r#"{"success":true,"chunk":"a"}"#,
        "\n",
        "garbage that is not json\n",
        r#"{"success":true,"chunk":"b"}"#,
        "\n",
        r#"{"done":true,"full_content":"ab"}"#,
        "\n",
    );

    Mock::given(method("POST"))
        .and(path("/api/chat-turn"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson_body))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let events = collect_events(&api, "llama3.2", None).await;

    assert_eq!(
        events,
        vec![
            TurnEvent::Chunk("a".into()),
            TurnEvent::Chunk("b".into()),
            TurnEvent::Final {
                content: "ab".into(),
                metrics: None,
                model: None
            },
        ]
    );
}

#[tokio::test]
async fn send_turn_emits_metrics_only_updates() {
    let mock_server = MockServer::start().await;

    let ndjson_body = concat!(
        r#"{"success":true,"chunk":"Hi"}"#,
        "\n",
        r#"{"metrics":{"prompt_eval_count":20}}"#,
        "\n",
    );

    Mock::given(method("POST"))
        .and(path("/api/chat-turn"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson_body))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let events = collect_events(&api, "llama3.2", None).await;

    assert!(events.iter().any(
        |e| matches!(e, TurnEvent::Metrics(m) if m.prompt_eval_count == Some(20))
    ));
}

#[tokio::test]
async fn send_turn_fails_before_events_on_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat-turn"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal server error"))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let err = api
        .send_turn("llama3.2", &short_history(), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, TransportError::Http { status: 500, .. }),
        "expected Http 500, got: {err:?}"
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn send_turn_stream_is_cancellable() {
    let mock_server = MockServer::start().await;

    let ndjson_body = concat!(
        r#"{"success":true,"chunk":"Hi"}"#,
        "\n",
        r#"{"done":true,"full_content":"Hi"}"#,
        "\n",
    );

    Mock::given(method("POST"))
        .and(path("/api/chat-turn"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson_body))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let stream = api
        .send_turn("llama3.2", &short_history(), None)
        .await
        .expect("should open stream");

    stream.cancel();
    let events: Vec<TurnEvent> = stream.events.collect().await;
    assert!(events.is_empty(), "cancelled stream should end, got: {events:?}");
}

#[tokio::test]
async fn list_models_parses_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "models": [
                {"name": "llama3.2", "size": 2019393189_u64},
                {"name": "mistral"},
            ],
        })))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let models = api.list_models().await.expect("should succeed");

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "llama3.2");
    assert_eq!(models[0].size, Some(2019393189));
    assert_eq!(models[1].size, None);
}

#[tokio::test]
async fn list_models_surfaces_rejection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "model server unreachable",
        })))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let err = api.list_models().await.unwrap_err();

    assert!(
        matches!(err, TransportError::Rejected(ref msg) if msg == "model server unreachable"),
        "expected Rejected, got: {err:?}"
    );
}

#[tokio::test]
async fn pull_model_returns_confirmation_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/models/pull"))
        .and(body_partial_json(serde_json::json!({"model": "mistral"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "model 'mistral' downloaded",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let message = api.pull_model("mistral").await.expect("should succeed");
    assert_eq!(message, "model 'mistral' downloaded");
}

#[tokio::test]
async fn delete_model_posts_model_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/models/delete"))
        .and(body_partial_json(serde_json::json!({"model": "mistral"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "model 'mistral' deleted",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    api.delete_model("mistral").await.expect("should succeed");
}

#[tokio::test]
async fn health_reports_connection_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "connected": false,
            "message": "model server is not reachable",
        })))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let health = api.health().await.expect("should succeed");
    assert!(!health.connected);
    assert_eq!(health.message.as_deref(), Some("model server is not reachable"));
}

#[tokio::test]
async fn check_auth_parses_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "authenticated": true,
            "user": {"username": "ada", "is_admin": true},
        })))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let auth = api.check_auth().await.expect("should succeed");
    assert!(auth.authenticated);
    let user = auth.user.expect("user");
    assert_eq!(user.username, "ada");
    assert!(user.is_admin);
}

#[tokio::test]
async fn check_auth_without_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/check"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"authenticated": false})),
        )
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let auth = api.check_auth().await.expect("should succeed");
    assert!(!auth.authenticated);
    assert!(auth.user.is_none());
}

#[tokio::test]
async fn logout_checks_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "logged out",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    api.logout().await.expect("should succeed");
}

#[tokio::test]
async fn conversation_crud_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .and(body_partial_json(
            serde_json::json!({"title": "First chat", "model": "llama3.2"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "conversation": {
                "id": "c-1",
                "title": "First chat",
                "model_used": "llama3.2",
                "messages": [],
                "created_at": "2025-06-01T12:00:00Z",
            },
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "conversations": [
                {"id": "c-1", "title": "First chat", "model_used": "llama3.2"},
            ],
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "conversation": {
                "id": "c-1",
                "title": "First chat",
                "model_used": "llama3.2",
                "messages": [
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "Hi there!"},
                ],
            },
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/conversations/c-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());

    let created = api
        .create_conversation("First chat", "llama3.2")
        .await
        .expect("create should succeed");
    assert_eq!(created.id.as_deref(), Some("c-1"));

    let listed = api.list_conversations().await.expect("list should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "First chat");

    let fetched = api
        .get_conversation("c-1")
        .await
        .expect("fetch should succeed");
    assert_eq!(fetched.messages.len(), 2);

    api.delete_conversation("c-1")
        .await
        .expect("delete should succeed");
}

#[tokio::test]
async fn save_turn_posts_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/save-message"))
        .and(body_partial_json(serde_json::json!({
            "conversation_id": "c-1",
            "content": "Hi there!",
            "model": "llama3.2",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let record = TurnRecord {
        conversation_id: "c-1".into(),
        content: "Hi there!".into(),
        metrics: None,
        model: "llama3.2".into(),
    };
    api.save_turn(&record).await.expect("should succeed");
}

#[tokio::test]
async fn save_turn_surfaces_rejection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/save-message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "conversation not found",
        })))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let record = TurnRecord {
        conversation_id: "missing".into(),
        content: "text".into(),
        metrics: None,
        model: "llama3.2".into(),
    };
    let err = api.save_turn(&record).await.unwrap_err();
    assert!(matches!(err, TransportError::Rejected(_)));
}

#[tokio::test]
async fn management_rpc_maps_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let api = ChatApi::new().base_url(mock_server.uri());
    let err = api.list_models().await.unwrap_err();
    assert!(
        matches!(err, TransportError::Http { status: 502, ref body } if body == "bad gateway"),
        "expected Http 502, got: {err:?}"
    );
}

#[test]
fn from_env_always_succeeds() {
    let _api = ChatApi::from_env();
}
