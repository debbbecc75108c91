//! Application settings, read from a YAML file with built-in defaults.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};
use shared::error::CommonError;
use tracing::{debug, info};

/// Agent id the router answers with when no configured agent fits.
pub const UNKNOWN_AGENT_ID: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub version: u32,
    pub app_name: String,
    pub a2a: A2aSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: 1,
            app_name: "Director".to_string(),
            a2a: A2aSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct A2aSettings {
    pub director_url: String,
    pub director: DirectorSettings,
    pub llm_provider: LlmProviderSettings,
}

impl Default for A2aSettings {
    fn default() -> Self {
        Self {
            director_url: "http://localhost:10010".to_string(),
            director: DirectorSettings::default(),
            llm_provider: LlmProviderSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorSettings {
    pub host: String,
    pub port: u16,
    /// Downstream agent name -> A2A endpoint URL.
    pub agents: BTreeMap<String, String>,
    /// Agent ids the router may pick, and the agent each one maps to.
    pub routes: Vec<RouteSettings>,
}

impl Default for DirectorSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 10010,
            agents: BTreeMap::from([(
                "widgets".to_string(),
                "http://localhost:10020".to_string(),
            )]),
            routes: vec![RouteSettings {
                agent_id: "WidgetsAgent".to_string(),
                agent: "widgets".to_string(),
                description: "for anything related to widgets, widget IDs, or zapping widget."
                    .to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSettings {
    pub agent_id: String,
    pub agent: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmProviderSettings {
    /// `provider/model`, e.g. `ollama/deepseek-r1:8b`.
    pub name: String,
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key, if any.
    pub api_key_env: Option<String>,
}

impl Default for LlmProviderSettings {
    fn default() -> Self {
        Self {
            name: "ollama/deepseek-r1:8b".to_string(),
            base_url: Some("http://127.0.0.1:11434/v1".to_string()),
            api_key_env: None,
        }
    }
}

impl LlmProviderSettings {
    pub fn provider(&self) -> &str {
        self.name.split_once('/').map_or("", |(provider, _)| provider)
    }

    pub fn model(&self) -> &str {
        self.name.split_once('/').map_or("", |(_, model)| model)
    }

    /// The configured base URL, or the provider's usual one.
    pub fn resolved_base_url(&self) -> String {
        match (&self.base_url, self.provider()) {
            (Some(url), _) => url.clone(),
            (None, "ollama") => "http://127.0.0.1:11434/v1".to_string(),
            (None, _) => "https://api.openai.com/v1".to_string(),
        }
    }
}

impl AppSettings {
    /// Loads settings from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CommonError> {
        let settings = match path {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                let raw = std::fs::read_to_string(path)?;
                Self::from_yaml(&raw)?
            }
            None => {
                debug!("No settings file given, using defaults");
                Self::default()
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, CommonError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), CommonError> {
        let provider = &self.a2a.llm_provider;
        if provider.provider().is_empty() || provider.model().is_empty() {
            return Err(CommonError::invalid_configuration(format!(
                "llm_provider.name must look like provider/model, got {:?}",
                provider.name
            )));
        }

        let director = &self.a2a.director;
        for route in &director.routes {
            if route.agent_id == UNKNOWN_AGENT_ID {
                return Err(CommonError::invalid_configuration(format!(
                    "{UNKNOWN_AGENT_ID} is reserved and cannot be routed"
                )));
            }
            if !director.agents.contains_key(&route.agent) {
                return Err(CommonError::invalid_configuration(format!(
                    "route {} references unknown agent {}",
                    route.agent_id, route.agent
                )));
            }
        }
        Ok(())
    }
}
