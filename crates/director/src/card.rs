use a2a_rs::types::{AgentCapabilities, AgentCard, AgentSkill};

use crate::agent::SUPPORTED_CONTENT_TYPES;

/// The card the director publishes at its well-known paths.
pub fn get_agent_card(host: &str, port: u16) -> AgentCard {
    let skill = AgentSkill {
        id: "direct_user_query".to_string(),
        name: "Direct User Query".to_string(),
        description: "Route user queries to the appropriate agent.".to_string(),
        tags: vec![
            "query".to_string(),
            "routing".to_string(),
            "agent".to_string(),
        ],
        examples: vec![
            "Route this query to the appropriate agent: What is the force of widget ID 1?"
                .to_string(),
            "Route this query to the appropriate agent: Can you zap widget ID 1 for 30 seconds?"
                .to_string(),
        ],
        input_modes: vec![],
        output_modes: vec![],
    };

    let modes: Vec<String> = SUPPORTED_CONTENT_TYPES.iter().map(|t| t.to_string()).collect();

    AgentCard {
        name: "Director Agent".to_string(),
        description: "AI agent that can route user queries to the appropriate agent.".to_string(),
        url: format!("http://{host}:{port}/"),
        version: "1.0.0".to_string(),
        protocol_version: "0.3.0".to_string(),
        preferred_transport: "JSONRPC".to_string(),
        capabilities: AgentCapabilities {
            streaming: Some(true),
            push_notifications: None,
            state_transition_history: None,
        },
        default_input_modes: modes.clone(),
        default_output_modes: modes,
        skills: vec![skill],
        documentation_url: None,
    }
}
