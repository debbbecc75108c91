use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::error::CommonError;
use tera::{Context, Tera};
use tracing::{debug, warn};

use crate::{
    errors::SelectionError,
    settings::{LlmProviderSettings, RouteSettings, UNKNOWN_AGENT_ID},
};

const ROUTER_PROMPT_TEMPLATE: &str = include_str!("templates/router_prompt.md.j2");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSelection {
    pub agent_id: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Picks the downstream agent for a user query.
#[async_trait]
pub trait AgentSelector: Send + Sync {
    async fn select(&self, query: &str) -> Result<AgentSelection, SelectionError>;
}

pub fn render_router_prompt(routes: &[RouteSettings]) -> Result<String, CommonError> {
    let mut tera = Tera::default();
    tera.add_raw_template("router_prompt", ROUTER_PROMPT_TEMPLATE)
        .map_err(|e| CommonError::Unknown(anyhow::anyhow!("Failed to add template: {e}")))?;

    let mut context = Context::new();
    context.insert("routes", routes);
    context.insert("unknown_agent_id", UNKNOWN_AGENT_ID);

    tera.render("router_prompt", &context)
        .map_err(|e| CommonError::Unknown(anyhow::anyhow!("Failed to render template: {e}")))
}

/// Reads an agent selection out of free-form model output.
///
/// Reasoning models wrap their answer in `<think>` blocks and chatty ones add
/// prose around the JSON, so only the outermost `{...}` after any thinking is
/// parsed.
pub fn parse_selection(content: &str) -> Result<AgentSelection, SelectionError> {
    let answer = match content.rfind("</think>") {
        Some(idx) => &content[idx + "</think>".len()..],
        None => content,
    };
    let start = answer.find('{');
    let end = answer.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &answer[start..=end],
        _ => {
            return Err(SelectionError::Parse(format!(
                "no JSON object in model output: {answer:?}"
            )));
        }
    };

    let mut selection: AgentSelection =
        serde_json::from_str(json).map_err(|e| SelectionError::Parse(e.to_string()))?;
    selection.agent_id = selection.agent_id.trim().to_string();
    if selection.agent_id.is_empty() {
        return Err(SelectionError::Parse("empty agent_id".to_string()));
    }
    Ok(selection)
}

/// Agent selection through an OpenAI-compatible chat-completions endpoint.
pub struct LlmAgentSelector {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    system_prompt: String,
}

impl LlmAgentSelector {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn from_settings(
        provider: &LlmProviderSettings,
        routes: &[RouteSettings],
    ) -> Result<Self, CommonError> {
        let api_key = match provider.api_key_env {
            Some(ref var) => {
                let key = std::env::var(var).ok();
                if key.is_none() {
                    warn!("{} is not set, calling the LLM provider without a key", var);
                }
                key
            }
            None => None,
        };

        Ok(Self::new(
            provider.resolved_base_url(),
            provider.model(),
            api_key,
            render_router_prompt(routes)?,
        ))
    }

    pub fn build_request_body(&self, query: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": 0,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": self.system_prompt},
                {"role": "user", "content": query}
            ]
        })
    }

    pub fn parse_response(response_body: &Value) -> Result<AgentSelection, SelectionError> {
        let content = response_body
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| {
                SelectionError::Parse("missing choices[0].message.content in response".to_string())
            })?;
        parse_selection(content)
    }
}

#[async_trait]
impl AgentSelector for LlmAgentSelector {
    async fn select(&self, query: &str) -> Result<AgentSelection, SelectionError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut request = self.client.post(url).json(&self.build_request_body(query));
        if let Some(ref api_key) = self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SelectionError::Http { status, body });
        }

        let body: Value = response.json().await?;
        let selection = Self::parse_response(&body)?;
        debug!(
            agent_id = %selection.agent_id,
            reasoning = %selection.reasoning,
            "Agent selected"
        );
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DirectorSettings;

    #[test]
    fn test_prompt_lists_routes_and_unknown() {
        let prompt = render_router_prompt(&DirectorSettings::default().routes).unwrap();
        assert!(prompt.contains(
            "- WidgetsAgent: for anything related to widgets, widget IDs, or zapping widget."
        ));
        assert!(prompt.contains("- UNKNOWN: for anything not covered"));
        assert!(prompt.contains("return \"UNKNOWN\" as the agent_id"));
    }

    #[test]
    fn test_parse_selection_tolerates_wrapping() {
        let plain = parse_selection(r#"{"agent_id": "WidgetsAgent", "reasoning": "widgets"}"#)
            .unwrap();
        assert_eq!(plain.agent_id, "WidgetsAgent");

        let wrapped = parse_selection(
            "<think>{\"agent_id\": \"nope\"}</think>\nSure! {\"agent_id\": \" UNKNOWN \"} hope that helps",
        )
        .unwrap();
        assert_eq!(wrapped.agent_id, "UNKNOWN");
        assert_eq!(wrapped.reasoning, "");
    }

    #[test]
    fn test_parse_selection_rejects_garbage() {
        assert!(matches!(
            parse_selection("I think widgets"),
            Err(SelectionError::Parse(_))
        ));
        assert!(parse_selection(r#"{"reasoning": "no id"}"#).is_err());
        assert!(parse_selection(r#"{"agent_id": ""}"#).is_err());
    }

    #[test]
    fn test_request_body_is_deterministic_json_mode() {
        let selector = LlmAgentSelector::new("http://llm/v1", "deepseek-r1:8b", None, "route!");
        let body = selector.build_request_body("What is the force of widget 1?");
        assert_eq!(body["model"], "deepseek-r1:8b");
        assert_eq!(body["temperature"], 0);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["content"], "route!");
        assert_eq!(body["messages"][1]["content"], "What is the force of widget 1?");
    }

    #[tokio::test]
    async fn test_select_against_chat_completions_endpoint() {
        use axum::{Json, Router, http::HeaderMap, routing::post};

        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let content = json!({
                    "agent_id": "WidgetsAgent",
                    "reasoning": format!("{} via {}", body["messages"][1]["content"], auth)
                })
                .to_string();
                Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let selector = LlmAgentSelector::new(
            format!("http://{addr}/v1/"),
            "m",
            Some("sk-test".to_string()),
            "prompt",
        );
        let selection = selector.select("zap widget 2").await.unwrap();
        assert_eq!(selection.agent_id, "WidgetsAgent");
        assert_eq!(selection.reasoning, "zap widget 2 via Bearer sk-test");
    }

    #[tokio::test]
    async fn test_select_reports_http_errors() {
        use axum::{Router, http::StatusCode, routing::post};

        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::BAD_GATEWAY, "model not loaded") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let selector = LlmAgentSelector::new(format!("http://{addr}"), "m", None, "prompt");
        let err = selector.select("hi").await.unwrap_err();
        assert!(matches!(err, SelectionError::Http { .. }));
        assert!(err.to_string().contains("model not loaded"));
    }
}
