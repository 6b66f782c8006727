use crate::domain::model::ParsedTrack;
use crate::utils::error::{RenamerError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct AiResponse {
    #[serde(default)]
    tracks: Option<Vec<ParsedTrack>>,
}

fn build_prompt(filenames: &[String]) -> String {
    format!(
        r#"
I have a list of audio filenames that are messy. Please extract the Artist, Title, and Track Number (if present) for each.
Return the result as a JSON object with a key "tracks" containing a list of objects.
Each object should have: "original_filename", "artist", "title", "track_number".
If a field is missing, use an empty string.
Do not include any markdown formatting (like ```json) in the response, just the raw JSON string.

Filenames:
{}
"#,
        filenames.join("\n")
    )
}

/// 去掉模型偶爾加上的 markdown code fence
pub fn strip_code_fence(content: &str) -> &str {
    let content = content.trim();
    let content = content.strip_prefix("```json").unwrap_or(content);
    let content = content.strip_prefix("```").unwrap_or(content);
    let content = content.strip_suffix("```").unwrap_or(content);
    content.trim()
}

pub fn parse_ai_reply(content: &str) -> Result<Vec<ParsedTrack>> {
    let content = strip_code_fence(content);
    serde_json::from_str::<AiResponse>(content)
        .map(|reply| reply.tracks.unwrap_or_default())
        .map_err(|e| RenamerError::AiResponseError {
            message: format!("failed to parse AI response: {}. Content: {}", e, content),
        })
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// Asks the model to split each filename into artist, title and track number.
    pub async fn parse_filenames(&self, filenames: &[String]) -> Result<Vec<ParsedTrack>> {
        if self.api_key.trim().is_empty() {
            return Err(RenamerError::config("API key is required"));
        }

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: build_prompt(filenames),
                }],
            }],
        };

        tracing::info!("🤖 Sending {} filename(s) to {}", filenames.len(), self.model);
        let response = self
            .client
            .post(self.request_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("AI response status: {}", status);
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RenamerError::AiApiError {
                status: status.to_string(),
                body,
            });
        }

        let reply: GeminiResponse = response.json().await?;
        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| RenamerError::AiResponseError {
                message: "no response from AI".to_string(),
            })?;

        let tracks = parse_ai_reply(&text)?;
        tracing::info!("🤖 AI parsed {} track(s)", tracks.len());
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"tracks\":[]}\n```"), "{\"tracks\":[]}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_ai_reply_fills_missing_fields() {
        let tracks = parse_ai_reply(
            r#"```json
{"tracks": [{"original_filename": "01-a-b.mp3", "artist": "A", "title": "B"}]}
```"#,
        )
        .unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artist, "A");
        assert_eq!(tracks[0].track_number, "");
    }

    #[test]
    fn test_parse_ai_reply_tolerates_null_fields() {
        let tracks = parse_ai_reply(
            r#"{"tracks": [
                {"original_filename": "intro.mp3", "artist": null, "title": "Intro", "track_number": null},
                {"original_filename": "02 b - c.mp3", "artist": "B", "title": "C", "track_number": "02"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].artist, "");
        assert_eq!(tracks[0].title, "Intro");
        assert_eq!(tracks[0].track_number, "");
        assert_eq!(tracks[1].track_number, "02");
    }

    #[test]
    fn test_parse_ai_reply_error_includes_content() {
        let err = parse_ai_reply("sorry, I cannot").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("failed to parse AI response:"));
        assert!(message.ends_with("Content: sorry, I cannot"));
    }

    #[test]
    fn test_prompt_lists_filenames() {
        let prompt = build_prompt(&["a.mp3".to_string(), "b.flac".to_string()]);
        assert!(prompt.contains("Filenames:\na.mp3\nb.flac\n"));
    }

    #[tokio::test]
    async fn test_empty_api_key_is_rejected() {
        let client = GeminiClient::new(Client::new(), "");
        let err = client.parse_filenames(&["a.mp3".to_string()]).await.unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: API key is required");
    }
}
