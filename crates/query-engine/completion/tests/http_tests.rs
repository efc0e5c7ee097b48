//! Exercise the HTTP completion client against a local stand-in endpoint.

use std::net::TcpListener;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use query_engine_completion::http::HttpCompletionClient;
use query_engine_completion::{invoke, CompletionCapability, Error};
use query_engine_translation::translation::Prompt;

/// Serve `router` on an ephemeral port and return the completion URL.
fn serve(router: Router) -> url::Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(router.into_make_service());
    tokio::spawn(server);
    url::Url::parse(&format!("http://{address}/v1/chat/completions")).unwrap()
}

async fn echo_completion(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none")
        .to_string();
    Json(json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": format!(
                    "```sql\nSELECT '{}', '{}', '{}';\n```",
                    body["model"].as_str().unwrap_or_default(),
                    body["messages"][0]["content"].as_str().unwrap_or_default(),
                    authorization,
                )
            }
        }]
    }))
}

#[tokio::test]
async fn sends_model_prompt_and_key() {
    let endpoint = serve(Router::new().route("/v1/chat/completions", post(echo_completion)));
    let client = HttpCompletionClient::new(endpoint, Some("secret-key".to_string()));

    let raw = invoke(&client, "mistral-large", &Prompt::new("count orders"))
        .await
        .unwrap();

    assert_eq!(
        raw.as_str(),
        "```sql\nSELECT 'mistral-large', 'count orders', 'Bearer secret-key';\n```"
    );
}

#[tokio::test]
async fn null_content_is_absent() {
    let endpoint = serve(Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({ "choices": [{ "message": { "content": null } }] })) }),
    ));
    let client = HttpCompletionClient::new(endpoint, None);

    assert_eq!(client.complete("m", "p").await, Ok(None));
    assert_eq!(
        invoke(&client, "m", &Prompt::new("p")).await,
        Err(Error::Empty)
    );
}

#[tokio::test]
async fn no_choices_is_absent() {
    let endpoint = serve(Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({ "choices": [] })) }),
    ));
    let client = HttpCompletionClient::new(endpoint, None);

    assert_eq!(client.complete("m", "p").await, Ok(None));
}

#[tokio::test]
async fn error_statuses_are_transport_errors() {
    let endpoint = serve(Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    ));
    let client = HttpCompletionClient::new(endpoint, None);

    let error = invoke(&client, "m", &Prompt::new("p")).await.unwrap_err();

    match error {
        Error::Transport(transport) => {
            assert!(transport.message.contains("429"), "{}", transport.message);
            assert!(transport.message.contains("slow down"), "{}", transport.message);
        }
        Error::Empty => panic!("expected a transport error"),
    }
}
