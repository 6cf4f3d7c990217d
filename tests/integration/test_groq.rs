//! Integration tests for the Groq chat-completions client.
//!
//! A stub OpenAI-compatible server built with axum records each request and
//! answers from a scripted list of responses.

use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use studyai_core::{
    ArtifactGenerator, Difficulty, GenerationClient, McqQuestion, StructuredOutput,
};
use studyai_llm::{CompletionRequest, GroqClient, LlmError, LlmErrorKind, ModelClient, ModelSettings};

/// A request as seen by the stub.
#[derive(Debug, Clone)]
struct Recorded {
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Stub {
    responses: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    fn respond(self, status: StatusCode, body: Value) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back((status, body));
        self
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }
}

/// A chat-completions body whose message content is `content`.
fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

async fn chat_completions(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.requests.lock().expect("requests lock").push(Recorded {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let next = stub.responses.lock().expect("responses lock").pop_front();
    match next {
        Some((status, body)) => (status, Json(body)),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "no scripted response" } })),
        ),
    }
}

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Spawns the stub server and returns its base URL.
async fn spawn_stub(stub: Stub) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://{addr}/v1"), handle)
}

fn client(base_url: &str, max_retries: u32) -> GroqClient {
    GroqClient::new(
        ModelSettings::new("gsk_test_key")
            .with_base_url(base_url)
            .with_model("llama-test")
            .with_temperature(0.2)
            .with_max_retries(max_retries)
            .with_timeout(Duration::from_secs(5))
            .with_retry_backoff(Duration::from_millis(10)),
    )
    .expect("client builds")
}

// ============================================================================
// Request and response handling
// ============================================================================

#[tokio::test]
async fn test_completion_returns_message_content() {
    let stub = Stub::default().respond(StatusCode::OK, completion(r#"{"ok": true}"#));
    let (base_url, _handle) = spawn_stub(stub.clone()).await;

    let text = client(&base_url, 0)
        .complete(&CompletionRequest::json("Return ok"))
        .await
        .expect("completion succeeds");
    assert_eq!(text, r#"{"ok": true}"#);

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer gsk_test_key")
    );

    let body = &requests[0].body;
    assert_eq!(body["model"], "llama-test");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Return ok");
    assert_eq!(body["response_format"]["type"], "json_object");
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let stub = Stub::default()
        .respond(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": { "message": "slow down" } }),
        )
        .respond(StatusCode::OK, completion("{}"));
    let (base_url, _handle) = spawn_stub(stub.clone()).await;

    let text = client(&base_url, 2)
        .complete(&CompletionRequest::json("x"))
        .await
        .expect("second call succeeds");
    assert_eq!(text, "{}");
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn test_authentication_failure_is_not_retried() {
    let stub = Stub::default().respond(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "Invalid API Key" } }),
    );
    let (base_url, _handle) = spawn_stub(stub.clone()).await;

    let err = client(&base_url, 3)
        .complete(&CompletionRequest::json("x"))
        .await
        .expect_err("call fails");

    match err {
        LlmError::Api { kind, status, .. } => {
            assert_eq!(kind, LlmErrorKind::Authentication);
            assert_eq!(status, Some(401));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn test_server_errors_exhaust_client_retries() {
    let stub = Stub::default();
    let (base_url, _handle) = spawn_stub(stub.clone()).await;

    let err = client(&base_url, 2)
        .complete(&CompletionRequest::json("x"))
        .await
        .expect_err("call fails");

    assert!(matches!(
        err,
        LlmError::Api {
            kind: LlmErrorKind::Server,
            status: Some(500),
            ..
        }
    ));
    // One call plus two retries.
    assert_eq!(stub.requests().len(), 3);
}

#[tokio::test]
async fn test_empty_content_is_invalid_response() {
    let stub = Stub::default().respond(StatusCode::OK, completion("   "));
    let (base_url, _handle) = spawn_stub(stub).await;

    let err = client(&base_url, 0)
        .complete(&CompletionRequest::json("x"))
        .await
        .expect_err("call fails");
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

// ============================================================================
// Through the generator
// ============================================================================

#[tokio::test]
async fn test_generator_over_http_with_json_schema() {
    let mcq = r#"{"question": "Which planet is largest?", "options": ["Mars", "Jupiter", "Venus", "Earth"], "correct_answer": "Jupiter", "explanation": "Jupiter is the largest planet."}"#;
    let stub = Stub::default()
        .respond(StatusCode::OK, completion("Sorry, here is some prose."))
        .respond(StatusCode::OK, completion(mcq));
    let (base_url, _handle) = spawn_stub(stub.clone()).await;

    let generator = ArtifactGenerator::new(
        GenerationClient::new(client(&base_url, 0))
            .with_structured_output(StructuredOutput::JsonSchema),
    );
    let question: McqQuestion = generator
        .generate_mcq("Planets", Difficulty::Easy)
        .await
        .expect("second attempt is valid");
    assert_eq!(question.correct_answer, "Jupiter");

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    let format = &requests[0].body["response_format"];
    assert_eq!(format["type"], "json_schema");
    assert_eq!(format["json_schema"]["name"], "mcq");
    assert_eq!(format["json_schema"]["schema"]["type"], "object");
    assert!(requests[0].body["messages"][0]["content"]
        .as_str()
        .expect("prompt text")
        .contains("easy multiple-choice question about Planets"));
}
