// Streaming chat endpoint client

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use serde_json::Value;

use crate::models::{AppConfig, ChatRequest};

/// Raw response body, chunk by chunk, as the server flushes it
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response; `message` comes from the error body when there is one
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    /// The body broke off after the response started
    #[error("stream interrupted: {0}")]
    Stream(String),
}

/// Opens one streaming exchange with the chat backend
pub trait ChatTransport {
    fn open(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatStream, ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct StreamingChatClient {
    base_url: String,
    endpoint: String,
    client: Client,
}

impl StreamingChatClient {
    /// Without a timeout the client waits as long as the server keeps the stream open
    pub fn new(
        base_url: impl Into<String>,
        endpoint: impl Into<String>,
        request_timeout: Option<u64>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.endpoint.clone(),
            config.request_timeout,
        )
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}

impl ChatTransport for StreamingChatClient {
    async fn open(&self, request: &ChatRequest) -> Result<ChatStream, ApiError> {
        let url = self.url();
        tracing::debug!(%url, mode = ?request.mode, "opening chat stream");

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.ok();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status_message(status, body),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ApiError::Stream(e.to_string())));

        Ok(Box::pin(stream))
    }
}

/// Message shown for a failed response: the body's `error` when the body is
/// JSON and carries one, otherwise a generic line keyed by the status code
pub fn status_message(status: StatusCode, body: Option<Value>) -> String {
    let code = status.as_u16();
    match body {
        None => format!("HTTP error {code}"),
        Some(body) => body
            .get("error")
            .and_then(error_text)
            .unwrap_or_else(|| format!("Failed to fetch stream ({code})")),
    }
}

/// Text of an `error` field; null, false, zero and empty strings count as absent
fn error_text(error: &Value) -> Option<String> {
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMode;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collect(mut stream: ChatStream) -> Vec<u8> {
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        body
    }

    fn client_for(server: &MockServer) -> StreamingChatClient {
        StreamingChatClient::new(server.uri(), "/streaming-chat", None).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = StreamingChatClient::new("http://localhost:8050", "/streaming-chat", Some(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client =
            StreamingChatClient::new("http://localhost:8050/", "/streaming-chat", None).unwrap();
        assert_eq!(client.url(), "http://localhost:8050/streaming-chat");

        let client =
            StreamingChatClient::new("http://localhost:8050", "streaming-chat", None).unwrap();
        assert_eq!(client.url(), "http://localhost:8050/streaming-chat");
    }

    #[test]
    fn test_status_message_variants() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(status_message(status, None), "HTTP error 500");
        assert_eq!(
            status_message(status, Some(serde_json::json!({"detail": "x"}))),
            "Failed to fetch stream (500)"
        );
        assert_eq!(
            status_message(status, Some(serde_json::json!({"error": "boom"}))),
            "boom"
        );
        assert_eq!(
            status_message(status, Some(serde_json::json!({"error": ""}))),
            "Failed to fetch stream (500)"
        );
        assert_eq!(
            status_message(status, Some(serde_json::json!({"error": null}))),
            "Failed to fetch stream (500)"
        );
    }

    #[test]
    fn test_status_message_non_string_error_field() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            status_message(status, Some(serde_json::json!({"error": 42}))),
            "42"
        );
        assert_eq!(
            status_message(status, Some(serde_json::json!({"error": 0}))),
            "Failed to fetch stream (500)"
        );
    }

    #[test]
    fn test_status_message_bare_json_string() {
        assert_eq!(
            status_message(StatusCode::BAD_GATEWAY, Some(serde_json::json!("oops"))),
            "Failed to fetch stream (502)"
        );
    }

    #[tokio::test]
    async fn test_open_numeric_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": 42})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).open(&ChatRequest::new("Hi")).await;
        assert!(matches!(
            result,
            Err(ApiError::Status { status: 500, ref message }) if message == "42"
        ));
    }

    #[tokio::test]
    async fn test_open_bare_string_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!("oops")))
            .mount(&server)
            .await;

        let result = client_for(&server).open(&ChatRequest::new("Hi")).await;
        assert!(matches!(
            result,
            Err(ApiError::Status { status: 500, ref message })
                if message == "Failed to fetch stream (500)"
        ));
    }

    #[tokio::test]
    async fn test_open_streams_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/streaming-chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"prompt": "Hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Hello **world**"))
            .expect(1)
            .mount(&server)
            .await;

        let stream = client_for(&server)
            .open(&ChatRequest::new("Hello"))
            .await
            .unwrap();
        assert_eq!(collect(stream).await, b"# Hello **world**");
    }

    #[tokio::test]
    async fn test_open_sends_mode_and_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/streaming-chat"))
            .and(body_json(serde_json::json!({
                "prompt": "Summarise Q3",
                "mode": "agent",
                "session_id": "s-42"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let request = ChatRequest::new("Summarise Q3")
            .with_mode(Some(ChatMode::Agent))
            .with_session(Some("s-42".to_string()));
        let stream = client_for(&server).open(&request).await.unwrap();
        assert_eq!(collect(stream).await, b"ok");
    }

    #[tokio::test]
    async fn test_open_reports_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "boom"})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).open(&ChatRequest::new("Hi")).await;
        match result {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_open_non_json_error_uses_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).open(&ChatRequest::new("Hi")).await;
        assert!(matches!(
            result,
            Err(ApiError::Status { status: 502, ref message }) if message == "HTTP error 502"
        ));
    }

    #[tokio::test]
    async fn test_open_unreachable_server_is_transport_error() {
        // Nothing listens on port 1
        let client =
            StreamingChatClient::new("http://127.0.0.1:1", "/streaming-chat", Some(5)).unwrap();
        let result = client.open(&ChatRequest::new("Hi")).await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
