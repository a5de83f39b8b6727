use serde::Deserialize;
use serde_json::json;
use ureq::Agent;

use crate::error::ProviderError;

use super::{NavCommand, decode_actions};

#[derive(Debug, Deserialize)]
struct InterpretResponse {
    #[serde(default)]
    actions: Vec<serde_json::Value>,
    error: Option<String>,
    method: Option<String>,
}

/// Client for the backend's natural-language command endpoint.
#[derive(Clone)]
pub struct CommandInterpreter {
    agent: Agent,
    url: String,
}

impl CommandInterpreter {
    pub fn new(agent: Agent, base_url: &str) -> Self {
        Self {
            agent,
            url: format!("{}/api/interpret-command", base_url.trim_end_matches('/')),
        }
    }

    pub fn interpret(&self, text: &str) -> Result<Vec<NavCommand>, ProviderError> {
        let mut response = self
            .agent
            .post(&self.url)
            .send_json(json!({ "text": text }))
            .map_err(ProviderError::from_ureq)?;
        let body = response.body_mut().read_to_string().map_err(ProviderError::from_ureq)?;
        parse_interpretation(&body)
    }
}

pub fn parse_interpretation(body: &str) -> Result<Vec<NavCommand>, ProviderError> {
    let response: InterpretResponse = serde_json::from_str(body)?;
    if let Some(error) = &response.error {
        bevy::log::warn!("Interpreter could not parse command: {error}");
    }
    if let Some(method) = &response.method {
        bevy::log::debug!("Interpreted via {method}");
    }
    Ok(decode_actions(&response.actions))
}

/// Console input is either raw action JSON (one object or an array) or text
/// for the interpreter. Returns `None` for text.
pub fn parse_raw_actions(line: &str) -> Option<Result<Vec<NavCommand>, ProviderError>> {
    let trimmed = line.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(e) => return Some(Err(e.into())),
    };
    let actions = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };
    Some(Ok(decode_actions(&actions)))
}
