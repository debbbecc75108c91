use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use derive_builder::Builder;

use crate::{
    errors::A2aServerError, request_handlers::request_handler::RequestHandler, types::AgentCard,
};

/// What the transport layer knows about an inbound call.
#[derive(Debug, Clone, Default)]
pub struct ServerCallContext {
    pub request_uri: http::Uri,
    pub headers: http::HeaderMap,
}

impl ServerCallContext {
    /// The caller's `Authorization` header, if present and valid UTF-8.
    pub fn authorization(&self) -> Option<String> {
        self.headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
pub trait A2aServiceLike: Send + Sync {
    async fn agent_card(&self, context: ServerCallContext) -> Result<AgentCard, A2aServerError>;
    fn request_handler(&self, context: &ServerCallContext) -> Arc<dyn RequestHandler>;
}

#[derive(Builder, Clone)]
#[builder(pattern = "owned")]
pub struct A2aService {
    agent_card: Arc<AgentCard>,
    request_handler: Arc<dyn RequestHandler>,
}

#[async_trait]
impl A2aServiceLike for A2aService {
    async fn agent_card(&self, _context: ServerCallContext) -> Result<AgentCard, A2aServerError> {
        Ok(self.agent_card.deref().clone())
    }

    fn request_handler(&self, _context: &ServerCallContext) -> Arc<dyn RequestHandler> {
        self.request_handler.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_is_read_from_headers() {
        let mut context = ServerCallContext::default();
        assert_eq!(context.authorization(), None);

        context.headers.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_static("Bearer token-1"),
        );
        assert_eq!(context.authorization().as_deref(), Some("Bearer token-1"));
    }
}
