use std::pin::Pin;

use a2a_rs::{
    client::A2aClient,
    types::MessageSendParams,
    utils::new_user_text_message,
};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::TransportError;

/// Raw chunk payloads of one downstream streaming call.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Value, TransportError>> + Send>>;

/// Streaming connection to one downstream agent.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn send_streaming(
        &self,
        query: &str,
        authorization: Option<&str>,
    ) -> Result<ChunkStream, TransportError>;
}

/// Talks to a downstream agent over A2A JSON-RPC.
pub struct A2aTransport {
    client: A2aClient,
}

impl A2aTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: A2aClient::new(url),
        }
    }
}

#[async_trait]
impl AgentTransport for A2aTransport {
    async fn send_streaming(
        &self,
        query: &str,
        authorization: Option<&str>,
    ) -> Result<ChunkStream, TransportError> {
        let params = MessageSendParams {
            message: new_user_text_message(query),
            configuration: None,
            metadata: Map::new(),
        };
        debug!("Streaming message to {}", self.client.url());

        let chunks = self
            .client
            .send_message_streaming(params, authorization)
            .await?;
        Ok(Box::pin(chunks.map(|chunk| chunk.map_err(TransportError::from))))
    }
}
