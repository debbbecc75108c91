//! Best-effort content extraction from downstream stream chunks.
//!
//! A chunk is the JSON-RPC response object carried by one SSE frame of a
//! downstream `message/stream` call. Only a subset of its shape matters here
//! and any of it may be missing or of an unexpected type, so decoding never
//! fails: mismatched fields decode as absent.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct ChunkPayload {
    #[serde(default, deserialize_with = "lenient")]
    result: Option<ChunkResult>,
    #[serde(default, deserialize_with = "lenient")]
    artifact: Option<ChunkArtifact>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkResult {
    #[serde(rename = "lastChunk", default, deserialize_with = "lenient")]
    last_chunk: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    artifact: Option<ChunkArtifact>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkArtifact {
    #[serde(default, deserialize_with = "lenient_list")]
    parts: Vec<ChunkPart>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkPart {
    #[serde(default, deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    text: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

impl ChunkPayload {
    fn decode(chunk: &Value) -> Self {
        serde_json::from_value(chunk.clone()).unwrap_or_default()
    }
}

impl ChunkArtifact {
    fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match (&part.kind, &part.text) {
            (Some(kind), Some(text)) if kind == "text" && !text.is_empty() => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Extracts the display text of a chunk.
///
/// Non-final chunks yield an empty string. For a final chunk (`result.lastChunk`
/// true) this is the first non-empty text part of `result.artifact`, or of the
/// top-level `artifact` when the result carries none; failing that, the whole
/// chunk serialized as JSON. A final chunk therefore never yields "".
pub fn extract_content(chunk: &Value) -> String {
    let payload = ChunkPayload::decode(chunk);
    let Some(result) = payload.result else {
        return String::new();
    };
    if result.last_chunk != Some(true) {
        return String::new();
    }

    let artifact = result.artifact.as_ref().or(payload.artifact.as_ref());
    match artifact.and_then(ChunkArtifact::first_text) {
        Some(text) => text.to_string(),
        None => chunk.to_string(),
    }
}
