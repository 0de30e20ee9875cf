//! JSON shapes of the Gemini REST API.
//!
//! Request bodies are built from the crate's request types; responses are
//! decoded leniently since most fields are optional on the wire.

use base64::Engine;
use serde::{Deserialize, Serialize};
use vitalis_core::Turn;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    pub fn model(text: &str) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// Role-less content, as used for system instructions.
    pub fn instruction(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    FileData(FileData),
    InlineData(InlineData),
}

impl Part {
    pub fn text(text: &str) -> Self {
        Part::Text(text.to_string())
    }

    pub fn file(file: &RemoteFile) -> Self {
        Part::FileData(FileData {
            mime_type: file.mime_type.clone(),
            file_uri: file.uri.clone(),
        })
    }

    pub fn inline(mime_type: &str, data: &[u8]) -> Self {
        Part::InlineData(InlineData {
            mime_type: mime_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(data),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl From<&vitalis_core::config::GeminiConfig> for GenerationConfig {
    fn from(config: &vitalis_core::config::GeminiConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            response_mime_type: config.response_mime_type.clone(),
        }
    }
}

/// Conversation contents: prior turns alternate user/model, then the new input.
pub fn conversation_contents(history: &[Turn], input: &str) -> Vec<Content> {
    let mut contents = Vec::with_capacity(history.len() * 2 + 1);
    for turn in history {
        contents.push(Content::user(vec![Part::text(&turn.input)]));
        contents.push(Content::model(&turn.output));
    }
    contents.push(Content::user(vec![Part::text(input)]));
    contents
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let texts: Vec<&str> = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Processing state of an uploaded file as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    #[default]
    #[serde(other)]
    StateUnspecified,
}

/// A file uploaded to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc-123`.
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: FileState,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub file: RemoteFile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversation_contents_alternate_roles() {
        let history = vec![Turn::new("hi", "hello"), Turn::new("how are you", "fine")];
        let contents = conversation_contents(&history, "bye");
        let roles: Vec<_> = contents.iter().map(|c| c.role.as_deref().unwrap()).collect();
        assert_eq!(roles, ["user", "model", "user", "model", "user"]);

        let value = serde_json::to_value(&contents[4]).unwrap();
        assert_eq!(value, json!({"role": "user", "parts": [{"text": "bye"}]}));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            system_instruction: Some(Content::instruction("You are a doctor.")),
            contents: conversation_contents(&[], "my head hurts"),
            generation_config: Some(GenerationConfig::from(
                &vitalis_core::config::GeminiConfig::default(),
            )),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["systemInstruction"],
            json!({"parts": [{"text": "You are a doctor."}]})
        );
        assert_eq!(value["generationConfig"]["topK"], 64);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(value["generationConfig"]["responseMimeType"], "text/plain");
    }

    #[test]
    fn test_file_and_inline_parts() {
        let file = RemoteFile {
            name: "files/v1".to_string(),
            uri: "https://example.test/files/v1".to_string(),
            mime_type: "video/mp4".to_string(),
            state: FileState::Active,
        };
        let value = serde_json::to_value(Part::file(&file)).unwrap();
        assert_eq!(
            value,
            json!({"fileData": {"mimeType": "video/mp4", "fileUri": "https://example.test/files/v1"}})
        );

        let value = serde_json::to_value(Part::inline("audio/wav", b"abc")).unwrap();
        assert_eq!(
            value,
            json!({"inlineData": {"mimeType": "audio/wav", "data": "YWJj"}})
        );
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "there"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello there"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_file_state_decoding() {
        let file: RemoteFile = serde_json::from_value(json!({
            "name": "files/x", "uri": "u", "mimeType": "video/mp4", "state": "PROCESSING"
        }))
        .unwrap();
        assert_eq!(file.state, FileState::Processing);

        let file: RemoteFile =
            serde_json::from_value(json!({"name": "files/y", "state": "SOMETHING_NEW"})).unwrap();
        assert_eq!(file.state, FileState::StateUnspecified);

        let file: RemoteFile = serde_json::from_value(json!({"name": "files/z"})).unwrap();
        assert_eq!(file.state, FileState::StateUnspecified);
    }
}
