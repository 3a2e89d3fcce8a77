//! OpenAI API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Chat Completion
// =============================================================================

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Response format; `json_object` forces a JSON reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            messages: Vec::new(),
            temperature: None,
            response_format: None,
        }
    }
}

impl ChatRequest {
    /// Create a new chat request with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the conversation.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ask for a bare JSON object reply.
    pub fn json_mode(mut self) -> Self {
        self.response_format = Some(ResponseFormat::json_object());
        self
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// First choice of a chat completion plus billing counts.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

/// Raw chat response from API (for internal parsing).
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseRaw {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessageResponse {
    /// Null when the model refuses or only calls tools.
    pub content: Option<String>,
}

/// Token counts reported by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// =============================================================================
// Structured Output
// =============================================================================

/// Response format selector.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<JsonSchemaFormat>,
}

impl ResponseFormat {
    /// Free-form JSON object.
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
            json_schema: None,
        }
    }

    /// Strict JSON schema.
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            format_type: "json_schema".to_string(),
            json_schema: Some(JsonSchemaFormat {
                name: name.into(),
                strict: true,
                schema,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

/// Build a deterministic structured-output request.
pub fn structured_request(
    model: impl Into<String>,
    system: impl Into<String>,
    user: impl Into<String>,
    schema_name: impl Into<String>,
    schema: serde_json::Value,
) -> ChatRequest {
    ChatRequest {
        model: model.into(),
        messages: vec![Message::system(system), Message::user(user)],
        temperature: Some(0.0),
        response_format: Some(ResponseFormat::json_schema(schema_name, schema)),
    }
}

// =============================================================================
// Embeddings
// =============================================================================

/// Embedding request. The API accepts a batch of inputs in one call.
#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    /// Model to use (e.g., "text-embedding-3-small")
    pub model: &'a str,

    /// Texts to embed
    pub input: &'a [String],
}

/// Embedding response.
#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingData {
    /// Position of the input this vector belongs to
    pub index: usize,
    pub embedding: Vec<f32>,
}

// =============================================================================
// Utilities
// =============================================================================

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code fences from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_builder() {
        let req = ChatRequest::new("gpt-4o-mini")
            .message(Message::system("Extract fields"))
            .message(Message::user("<html>"))
            .temperature(0.0)
            .json_mode();

        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "system");

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body["response_format"].get("json_schema").is_none());
        assert_eq!(body["temperature"], 0.0);
    }

    #[test]
    fn test_structured_request_is_strict() {
        let schema = serde_json::json!({"type": "object"});
        let req = structured_request("m", "sys", "user", "verdict", schema);
        let body = serde_json::to_value(&req).unwrap();

        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "verdict");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "Engineer 世界";
        let truncated = truncate_to_char_boundary(text, 10);
        assert!(truncated.len() <= 10);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{\"pass\": true}\n```"), "{\"pass\": true}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }
}
