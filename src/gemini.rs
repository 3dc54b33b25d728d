//! Gemini API client
//!
//! Hand-rolled client for the Google Generative Language API. Requests and
//! responses are plain serde types; retries follow the API's documented
//! transient status codes with exponential backoff.

use std::time::Duration;

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const RETRYABLE_STATUS: [u16; 4] = [429, 500, 503, 504];
const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Gemini API client
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

/// Backoff parameters for transient API failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub exp_base: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_secs(5),
            exp_base: 7,
        }
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Non-streaming `generateContent` call. Returns the first candidate.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<Candidate, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let mut delay = self.retry.initial_delay;
        let mut last_status = 0u16;

        for attempt in 0..self.retry.attempts {
            if attempt > 0 {
                tokio::time::sleep(delay).await;
                delay = (delay * self.retry.exp_base).min(MAX_BACKOFF);
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(request)
                .send()
                .await?;

            let status = response.status();
            if RETRYABLE_STATUS.contains(&status.as_u16()) {
                last_status = status.as_u16();
                warn!(status = status.as_u16(), attempt, "transient API error, retrying");
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GeminiError::Api {
                    status: status.as_u16(),
                    body: snippet(&body),
                });
            }

            let parsed: GenerateContentResponse = response.json().await?;
            return first_candidate(parsed);
        }

        Err(GeminiError::RetriesExhausted {
            attempts: self.retry.attempts,
            last_status,
        })
    }

    /// One-shot text prompt with an optional system instruction.
    pub async fn generate_text(
        &self,
        model: &str,
        system: Option<&str>,
        user: &str,
    ) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(user)],
            system_instruction: system.map(Content::system),
            tools: None,
            generation_config: None,
        };
        let candidate = self.generate(model, &request).await?;
        Ok(candidate.text())
    }

    /// Prompt for a structured response and deserialize it.
    ///
    /// Models routinely wrap JSON in markdown fences; those are stripped
    /// before deserializing.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        model: &str,
        system: Option<&str>,
        user: &str,
    ) -> Result<T, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(user)],
            system_instruction: system.map(Content::system),
            tools: None,
            generation_config: Some(GenerationConfig {
                temperature: None,
                response_mime_type: Some("application/json".to_string()),
            }),
        };
        let candidate = self.generate(model, &request).await?;
        let text = candidate.text();
        let trimmed = strip_code_fences(&text);
        serde_json::from_str(trimmed).map_err(|source| GeminiError::InvalidJson {
            source,
            raw: snippet(trimmed),
        })
    }

    /// Streaming `streamGenerateContent` over SSE. Invokes `on_delta` for
    /// each text fragment and returns the concatenated response.
    pub async fn stream_generate<F>(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        mut on_delta: F,
    ) -> Result<String, GeminiError>
    where
        F: FnMut(&str),
    {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut full = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);
                if let Some(text) = delta_from_line(&line) {
                    on_delta(&text);
                    full.push_str(&text);
                }
            }
        }

        // The stream may end without a trailing newline on the last event.
        if let Some(text) = delta_from_line(&buffer) {
            on_delta(&text);
            full.push_str(&text);
        }

        Ok(full)
    }
}

/// Text delta carried by one SSE line, if any.
fn delta_from_line(line: &str) -> Option<String> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    let parsed: GenerateContentResponse = serde_json::from_str(data).ok()?;
    let text = parsed.candidates.first()?.text();
    if text.is_empty() { None } else { Some(text) }
}

fn first_candidate(parsed: GenerateContentResponse) -> Result<Candidate, GeminiError> {
    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or(GeminiError::EmptyResponse)?;
    if candidate.finish_reason.as_deref() == Some("MALFORMED_FUNCTION_CALL") {
        return Err(GeminiError::MalformedFunctionCall);
    }
    Ok(candidate)
}

fn snippet(text: &str) -> String {
    const LIMIT: usize = 400;
    if text.len() <= LIMIT {
        return text.to_string();
    }
    let mut end = LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Remove surrounding markdown code fences from a model response.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the opening fence.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    pub fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// Tool results are sent back as user-role function responses.
    pub fn function_response(name: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: None,
                function_call: None,
                function_response: Some(FunctionResponse {
                    name: name.into(),
                    response,
                }),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "functionDeclarations")]
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl Candidate {
    /// Concatenated text parts of the candidate.
    pub fn text(&self) -> String {
        let Some(content) = &self.content else {
            return String::new();
        };
        content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect()
    }

    /// Function calls requested by the model, if any.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        let Some(content) = &self.content else {
            return Vec::new();
        };
        content
            .parts
            .iter()
            .filter_map(|part| part.function_call.as_ref())
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("retries exhausted after {attempts} attempts (last status {last_status})")]
    RetriesExhausted { attempts: u32, last_status: u16 },

    #[error("empty response: no candidates returned")]
    EmptyResponse,

    #[error("model produced a malformed function call")]
    MalformedFunctionCall,

    #[error("model returned invalid JSON ({source}): {raw}")]
    InvalidJson {
        source: serde_json::Error,
        raw: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("namaste")],
            system_instruction: Some(Content::system("be helpful")),
            tools: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                response_mime_type: Some("application/json".to_string()),
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("systemInstruction").is_some());
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(json.get("tools").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn test_candidate_text_and_calls() {
        let raw = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "hello "},
                        {"text": "world"},
                        {"functionCall": {"name": "glossary_lookup", "args": {"word": "धर्म"}}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let candidate = &parsed.candidates[0];
        assert_eq!(candidate.text(), "hello world");
        let calls = candidate.function_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "glossary_lookup");
    }

    #[test]
    fn test_malformed_function_call_finish_reason() {
        let raw = r#"{"candidates": [{"content": null, "finishReason": "MALFORMED_FUNCTION_CALL"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let result = first_candidate(parsed);
        assert!(matches!(result, Err(GeminiError::MalformedFunctionCall)));
    }

    #[test]
    fn test_empty_candidates_is_error() {
        let parsed: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(
            first_candidate(parsed),
            Err(GeminiError::EmptyResponse)
        ));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("  ```json\n{}\n```  "), "{}");
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.exp_base, 7);
        assert_eq!(policy.initial_delay, Duration::from_secs(5));
    }

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request_complete(raw: &[u8]) -> bool {
        let Some(header_end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&raw[..header_end]);
        let content_length = headers
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    /// One-shot HTTP server answering the next request with a fixed body.
    async fn serve_once(content_type: &str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let content_type = content_type.to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn sse_chunk(text: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] }
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_stream_delivers_final_unterminated_event() {
        // The second event has no trailing newline; it must still be emitted.
        let body = format!("data: {}\n\ndata: {}", sse_chunk("Hello "), sse_chunk("world"));
        let base = serve_once("text/event-stream", body).await;
        let client = GeminiClient::new("test-key").with_base_url(base);

        let request = GenerateContentRequest {
            contents: vec![Content::user("hi")],
            system_instruction: None,
            tools: None,
            generation_config: None,
        };
        let mut deltas = Vec::new();
        let full = client
            .stream_generate("gemini-2.5-flash-lite", &request, |delta| {
                deltas.push(delta.to_string())
            })
            .await
            .unwrap();

        assert_eq!(full, "Hello world");
        assert_eq!(deltas, vec!["Hello ".to_string(), "world".to_string()]);
    }
}
