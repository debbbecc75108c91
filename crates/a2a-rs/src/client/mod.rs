//! Outbound side of the protocol: calling another A2A agent over JSON-RPC.

use futures::{Stream, StreamExt};
use http::StatusCode;
use reqwest_eventsource::{Event as SseEvent, EventSource, retry::Never};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{AgentCard, JsonrpcRequestId, MessageSendParams};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to agent: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("agent responded with HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("invalid JSON from agent: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request to agent failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("event stream from agent failed: {0}")]
    Stream(String),
}

impl ClientError {
    /// True when the agent could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ClientError::Connection(e)
        } else {
            ClientError::Request(e)
        }
    }
}

impl ClientError {
    async fn from_event_source(e: reqwest_eventsource::Error) -> Self {
        match e {
            reqwest_eventsource::Error::Transport(e) => e.into(),
            reqwest_eventsource::Error::InvalidStatusCode(status, response) => ClientError::Http {
                status,
                body: response.text().await.unwrap_or_default(),
            },
            reqwest_eventsource::Error::InvalidContentType(content_type, response) => {
                let body = response.text().await.unwrap_or_default();
                ClientError::Stream(format!(
                    "expected text/event-stream, got {content_type:?}: {body}"
                ))
            }
            other => ClientError::Stream(other.to_string()),
        }
    }
}

/// JSON-RPC client for a single remote agent.
#[derive(Debug, Clone)]
pub struct A2aClient {
    http: reqwest::Client,
    url: String,
}

impl A2aClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), url)
    }

    pub fn with_http_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the agent card, trying the current well-known path first.
    pub async fn get_agent_card(&self) -> Result<AgentCard, ClientError> {
        let base = self.url.trim_end_matches('/');
        let mut last_error = None;
        for path in ["/.well-known/agent-card.json", "/.well-known/agent.json"] {
            let response = self.http.get(format!("{base}{path}")).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                debug!("No agent card at {}{}", base, path);
                last_error = Some(ClientError::Http {
                    status: StatusCode::NOT_FOUND,
                    body: response.text().await.unwrap_or_default(),
                });
                continue;
            }
            let response = check_status(response).await?;
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }
        Err(last_error.unwrap_or(ClientError::Http {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        }))
    }

    /// Sends `message/stream` and yields each SSE payload as raw JSON.
    ///
    /// Every item is a full JSON-RPC response object (`result` or `error`);
    /// interpreting it is left to the caller. The stream ends when the agent
    /// closes the response body.
    pub async fn send_message_streaming(
        &self,
        params: MessageSendParams,
        authorization: Option<&str>,
    ) -> Result<impl Stream<Item = Result<Value, ClientError>> + Send + 'static, ClientError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": JsonrpcRequestId::String(Uuid::new_v4().to_string()),
            "method": "message/stream",
            "params": params,
        });

        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(authorization) = authorization {
            builder = builder.header(http::header::AUTHORIZATION, authorization);
        }

        let mut source =
            EventSource::new(builder).map_err(|e| ClientError::Stream(e.to_string()))?;
        source.set_retry_policy(Box::new(Never));

        // the request is only sent on first poll; surface connect and status errors here
        let first = match source.next().await {
            Some(Ok(SseEvent::Open)) => None,
            Some(Ok(SseEvent::Message(message))) => Some(decode_frame(&message.data)),
            Some(Err(e)) => {
                source.close();
                return Err(ClientError::from_event_source(e).await);
            }
            None => None,
        };
        debug!("Opened message/stream to {}", self.url);

        Ok(async_stream::stream! {
            if let Some(first) = first {
                yield first;
            }
            while let Some(event) = source.next().await {
                match event {
                    Ok(SseEvent::Open) => {}
                    Ok(SseEvent::Message(message)) => {
                        yield decode_frame(&message.data);
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        yield Err(ClientError::from_event_source(e).await);
                        break;
                    }
                }
            }
            source.close();
        })
    }
}

fn decode_frame(data: &str) -> Result<Value, ClientError> {
    serde_json::from_str(data).map_err(|e| {
        warn!("Undecodable SSE payload: {}", data);
        ClientError::Json(e)
    })
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Http { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::new_user_text_message;
    use axum::{
        Json, Router,
        http::HeaderMap,
        response::sse::{Event, Sse},
        routing::{get, post},
    };
    use futures::stream;
    use serde_json::json;
    use std::convert::Infallible;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn params() -> MessageSendParams {
        MessageSendParams {
            message: new_user_text_message("hello"),
            configuration: None,
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_streams_jsonrpc_frames_with_authorization() {
        let router = Router::new().route(
            "/",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                let frames = vec![
                    json!({"jsonrpc": "2.0", "id": body["id"], "result": {"auth": auth}}),
                    json!({"jsonrpc": "2.0", "id": body["id"], "result": {"method": body["method"]}}),
                ];
                Sse::new(stream::iter(frames.into_iter().map(|frame| {
                    Ok::<_, Infallible>(Event::default().data(frame.to_string()))
                })))
            }),
        );
        let url = serve(router).await;

        let client = A2aClient::new(url);
        let items: Vec<Value> = client
            .send_message_streaming(params(), Some("Bearer abc"))
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["result"]["auth"], "Bearer abc");
        assert_eq!(items[1]["result"]["method"], "message/stream");
    }

    #[tokio::test]
    async fn test_cr_only_line_endings_split_events() {
        let router = Router::new().route(
            "/",
            post(|| async {
                (
                    [(http::header::CONTENT_TYPE, "text/event-stream")],
                    "data: {\"a\":1}\r\rdata: {\"b\":2}\r\r: done\r\n",
                )
            }),
        );
        let client = A2aClient::new(serve(router).await);

        let items: Vec<Value> = client
            .send_message_streaming(params(), None)
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(items, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[tokio::test]
    async fn test_keep_alive_comments_are_skipped() {
        let router = Router::new().route(
            "/",
            post(|| async {
                (
                    [(http::header::CONTENT_TYPE, "text/event-stream")],
                    ": keep-alive\n\ndata: {\"c\":3}\n\n: keep-alive\n\n",
                )
            }),
        );
        let client = A2aClient::new(serve(router).await);

        let items: Vec<Value> = client
            .send_message_streaming(params(), None)
            .await
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(items, vec![json!({"c": 3})]);
    }

    #[tokio::test]
    async fn test_json_reply_instead_of_stream_is_an_error() {
        let router = Router::new().route(
            "/",
            post(|| async {
                Json(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "bad"}}))
            }),
        );
        let client = A2aClient::new(serve(router).await);

        let err = match client.send_message_streaming(params(), None).await {
            Err(e) => e,
            Ok(_) => panic!("expected a stream error"),
        };
        assert!(matches!(err, ClientError::Stream(_)));
        assert!(err.to_string().contains("-32602"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let router = Router::new().route(
            "/",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let client = A2aClient::new(serve(router).await);

        let res = client.send_message_streaming(params(), None).await;
        match res {
            Err(ClientError::Http { status, body }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "down");
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected an HTTP error"),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_classified() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = A2aClient::new(format!("http://{addr}"));
        let err = match client.send_message_streaming(params(), None).await {
            Err(e) => e,
            Ok(_) => panic!("expected a connection error"),
        };
        assert!(err.is_connection());
        assert!(err.to_string().starts_with("could not connect to agent"));
    }

    #[tokio::test]
    async fn test_agent_card_falls_back_to_legacy_path() {
        let card = json!({
            "name": "Widgets Agent",
            "description": "widgets",
            "url": "http://localhost:10020/",
            "version": "1.0.0",
            "protocolVersion": "0.3.0",
            "preferredTransport": "JSONRPC",
            "capabilities": {"streaming": true},
            "defaultInputModes": ["text"],
            "defaultOutputModes": ["text"],
            "skills": []
        });
        let router = Router::new().route(
            "/.well-known/agent.json",
            get(move || {
                let card = card.clone();
                async move { Json(card) }
            }),
        );
        let client = A2aClient::new(serve(router).await);

        let card = client.get_agent_card().await.unwrap();
        assert_eq!(card.name, "Widgets Agent");
    }
}
