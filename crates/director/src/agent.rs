use std::{collections::HashMap, sync::Arc};

use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    chunk::extract_content,
    errors::DirectorError,
    selector::AgentSelector,
    settings::DirectorSettings,
    translate::StreamUpdate,
    transport::{A2aTransport, AgentTransport},
};

pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["text", "text/plain"];

/// Routes a query to one downstream agent and reports on it as stream updates.
pub struct DirectorAgent {
    selector: Arc<dyn AgentSelector>,
    /// Routable agent id -> transport of the agent it names.
    transports: HashMap<String, Arc<dyn AgentTransport>>,
}

impl DirectorAgent {
    pub fn new(
        selector: Arc<dyn AgentSelector>,
        transports: HashMap<String, Arc<dyn AgentTransport>>,
    ) -> Self {
        Self {
            selector,
            transports,
        }
    }

    /// Wires one A2A transport per configured agent, shared by the routes that name it.
    pub fn from_settings(selector: Arc<dyn AgentSelector>, settings: &DirectorSettings) -> Self {
        let by_agent: HashMap<&str, Arc<dyn AgentTransport>> = settings
            .agents
            .iter()
            .map(|(name, url)| {
                let transport: Arc<dyn AgentTransport> = Arc::new(A2aTransport::new(url.clone()));
                (name.as_str(), transport)
            })
            .collect();

        let transports = settings
            .routes
            .iter()
            .filter_map(|route| {
                by_agent
                    .get(route.agent.as_str())
                    .map(|transport| (route.agent_id.clone(), transport.clone()))
            })
            .collect();

        Self::new(selector, transports)
    }

    pub async fn invoke(&self, _query: &str, _context_id: &str) -> Result<String, DirectorError> {
        Err(DirectorError::Unsupported(
            "Please use the streaming function".to_string(),
        ))
    }

    /// Always yields a working update, then exactly one terminal update.
    pub fn stream<'a>(
        &'a self,
        query: String,
        context_id: String,
        authorization: Option<String>,
    ) -> impl Stream<Item = StreamUpdate> + Send + 'a {
        async_stream::stream! {
            info!(context_id = %context_id, "Running director agent stream");
            yield StreamUpdate::working("Processing request...");

            match self.route(&query, authorization.as_deref()).await {
                Ok(content) => {
                    yield StreamUpdate::completed(content);
                }
                Err(e) => {
                    error!(context_id = %context_id, "Error processing request: {}", e);
                    yield StreamUpdate::input_required(format!("Error processing request: {e}"));
                }
            }
        }
    }

    async fn route(
        &self,
        query: &str,
        authorization: Option<&str>,
    ) -> Result<String, DirectorError> {
        let selection = self.selector.select(query).await?;
        info!(
            agent_id = %selection.agent_id,
            reasoning = %selection.reasoning,
            "Routing query"
        );

        let transport = self
            .transports
            .get(&selection.agent_id)
            .ok_or_else(|| DirectorError::UnknownAgent(selection.agent_id.clone()))?;

        let mut chunks = transport.send_streaming(query, authorization).await?;
        let mut content = String::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if let Some(err) = chunk.get("error") {
                warn!(agent_id = %selection.agent_id, "Downstream agent returned an error: {}", err);
            }
            let extracted = extract_content(&chunk);
            if !extracted.is_empty() {
                content = extracted;
            }
        }

        Ok(format!(
            "Agent {} response: {}.",
            selection.agent_id, content
        ))
    }
}
