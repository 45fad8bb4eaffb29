//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends requests to `POST {base}/v1beta/models/{model}:generateContent`.
//! Non-2xx responses are mapped to typed [`LlmError`] variants from the HTTP
//! status and the canonical `error.status` / `error.details` fields, never
//! from message text.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when setting the `x-goog-api-key` header.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use tutor_core::llm::provider::LlmProvider;
use tutor_types::llm::{CompletionRequest, CompletionResponse, ContentPart, LlmError, Usage};

use super::types::{
    ErrorWrapper, GeminiContent, GeminiPart, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, InlineData,
};

/// Finish reasons that mean the answer was withheld.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

/// Google Gemini LLM provider.
///
/// One instance serves every model; the model id comes from each request.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, base_url: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }
}

// GeminiProvider does not derive Debug; it holds the API key.

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = to_gemini_request(request);
        let url = self.url(&request.model);

        tracing::debug!(model = %request.model, history = request.history.len(), "Calling Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status.as_u16(), &error_body, retry_after));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        extract_response(parsed, &request.model)
    }
}

/// Convert a generic [`CompletionRequest`] into a [`GenerateContentRequest`].
pub fn to_gemini_request(request: &CompletionRequest) -> GenerateContentRequest {
    let mut contents: Vec<GeminiContent> = request
        .history
        .iter()
        .map(|entry| GeminiContent {
            role: Some(entry.role.to_string()),
            parts: entry.content.iter().map(to_gemini_part).collect(),
        })
        .collect();

    contents.push(GeminiContent {
        role: Some("user".to_string()),
        parts: request.content.iter().map(to_gemini_part).collect(),
    });

    let system_instruction = (!request.system_instruction.is_empty()).then(|| GeminiContent {
        role: None,
        parts: vec![GeminiPart::Text {
            text: request.system_instruction.clone(),
        }],
    });

    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: GenerationConfig {
            temperature: request.temperature,
        },
    }
}

fn to_gemini_part(part: &ContentPart) -> GeminiPart {
    match part {
        ContentPart::Text(text) => GeminiPart::Text { text: text.clone() },
        ContentPart::InlineData { mime_type, data } => GeminiPart::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.clone(),
                data: STANDARD.encode(data),
            },
        },
    }
}

/// Map a non-2xx response to an [`LlmError`].
///
/// `retry_after_ms` comes from the `Retry-After` header; `RetryInfo` in the
/// body is used when the header is absent.
pub fn map_http_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> LlmError {
    let parsed = serde_json::from_str::<ErrorWrapper>(body).ok().map(|w| w.error);

    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });
    let api_status = parsed.as_ref().and_then(|e| e.status.as_deref());
    let details = parsed.as_ref().map(|e| e.details.as_slice()).unwrap_or_default();
    let reason = details.iter().find_map(|d| d.reason.as_deref());
    let retry_after_ms = retry_after_ms.or_else(|| {
        details
            .iter()
            .find_map(|d| d.retry_delay.as_deref())
            .and_then(parse_retry_delay)
    });

    if reason == Some("API_KEY_INVALID")
        || matches!(status, 401 | 403)
        || matches!(api_status, Some("UNAUTHENTICATED" | "PERMISSION_DENIED"))
    {
        return LlmError::AuthenticationFailed(message);
    }

    match (status, api_status) {
        (_, Some("RESOURCE_EXHAUSTED")) => LlmError::QuotaExhausted(message),
        (429, _) => LlmError::RateLimited { retry_after_ms },
        (503, _) | (_, Some("UNAVAILABLE")) => LlmError::Overloaded(message),
        (400, _) | (_, Some("INVALID_ARGUMENT" | "FAILED_PRECONDITION")) => {
            LlmError::InvalidRequest(message)
        }
        _ => LlmError::Provider {
            status: Some(status),
            message,
        },
    }
}

/// `Retry-After` header in seconds, as milliseconds.
pub fn parse_retry_after(header: Option<&HeaderValue>) -> Option<u64> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok()?.checked_mul(1000)
}

/// Protobuf duration string (`"37s"`, `"1.5s"`) as milliseconds.
pub fn parse_retry_delay(delay: &str) -> Option<u64> {
    let seconds: f64 = delay.trim().strip_suffix('s')?.parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| (seconds * 1000.0).round() as u64)
}

/// Pull the answer text out of a successful response.
pub fn extract_response(
    response: GenerateContentResponse,
    model: &str,
) -> Result<CompletionResponse, LlmError> {
    let usage = response
        .usage_metadata
        .map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();
    let model = response.model_version.unwrap_or_else(|| model.to_string());

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => LlmError::Blocked(reason),
            None => LlmError::EmptyResponse,
        });
    };

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) => {
                LlmError::Blocked(reason)
            }
            _ => LlmError::EmptyResponse,
        });
    }

    Ok(CompletionResponse {
        text,
        model,
        finish_reason: candidate.finish_reason,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_types::chat::Role;
    use tutor_types::llm::HistoryEntry;

    fn make_provider() -> GeminiProvider {
        GeminiProvider::new(
            SecretString::from("test-key-not-real"),
            "https://generativelanguage.googleapis.com/",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_provider_name_and_url() {
        let provider = make_provider();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(
            provider.url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_to_gemini_request_shape() {
        let request = CompletionRequest {
            model: "gemini-2.5-flash".to_string(),
            system_instruction: "You are a math tutor.".to_string(),
            temperature: 0.4,
            history: vec![
                HistoryEntry {
                    role: Role::User,
                    content: vec![ContentPart::text("hi")],
                },
                HistoryEntry {
                    role: Role::Model,
                    content: vec![ContentPart::text("hello")],
                },
            ],
            content: vec![
                ContentPart::InlineData {
                    mime_type: "image/png".to_string(),
                    data: b"abc".to_vec(),
                },
                ContentPart::text("explain this image"),
            ],
        };

        let json = serde_json::to_value(to_gemini_request(&request)).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "You are a math tutor.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["generationConfig"]["temperature"], 0.4);

        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "hello");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(contents[2]["parts"][0]["inlineData"]["data"], "YWJj");
        assert_eq!(contents[2]["parts"][1]["text"], "explain this image");
    }

    #[test]
    fn test_map_quota_exhausted() {
        let body = r#"{"error":{"code":429,"message":"You exceeded your current quota","status":"RESOURCE_EXHAUSTED",
            "details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"37s"}]}}"#;
        let err = map_http_error(429, body, None);
        assert_eq!(err, LlmError::QuotaExhausted("You exceeded your current quota".into()));
    }

    #[test]
    fn test_map_bare_429_uses_retry_info() {
        let body = r#"{"error":{"code":429,"message":"slow down",
            "details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"1.5s"}]}}"#;
        assert_eq!(
            map_http_error(429, body, None),
            LlmError::RateLimited {
                retry_after_ms: Some(1500)
            }
        );
        assert_eq!(
            map_http_error(429, "", Some(2000)),
            LlmError::RateLimited {
                retry_after_ms: Some(2000)
            }
        );
    }

    #[test]
    fn test_map_overloaded() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        assert_eq!(
            map_http_error(503, body, None),
            LlmError::Overloaded("The model is overloaded.".into())
        );
        assert!(matches!(map_http_error(503, "", None), LlmError::Overloaded(_)));
    }

    #[test]
    fn test_map_invalid_key() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.",
            "status":"INVALID_ARGUMENT",
            "details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        assert!(matches!(
            map_http_error(400, body, None),
            LlmError::AuthenticationFailed(msg) if msg.contains("API key not valid")
        ));
        assert!(matches!(
            map_http_error(403, "forbidden", None),
            LlmError::AuthenticationFailed(_)
        ));
    }

    #[test]
    fn test_map_bad_request_and_unknown() {
        let body = r#"{"error":{"code":400,"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            map_http_error(400, body, None),
            LlmError::InvalidRequest("Invalid JSON payload".into())
        );
        assert_eq!(
            map_http_error(500, "<html>oops</html>", None),
            LlmError::Provider {
                status: Some(500),
                message: "<html>oops</html>".into()
            }
        );
        assert_eq!(
            map_http_error(502, "  ", None),
            LlmError::Provider {
                status: Some(502),
                message: "HTTP 502".into()
            }
        );
    }

    #[test]
    fn test_parse_retry_delay() {
        assert_eq!(parse_retry_delay("37s"), Some(37_000));
        assert_eq!(parse_retry_delay("0.25s"), Some(250));
        assert_eq!(parse_retry_delay("37"), None);
        assert_eq!(parse_retry_delay("-1s"), None);
    }

    #[test]
    fn test_parse_retry_after_header() {
        let value = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&value)), Some(12_000));
        let value = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&value)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_parse_retry_after_huge_value_is_ignored() {
        let value = HeaderValue::from_static("18446744073709552");
        assert_eq!(parse_retry_after(Some(&value)), None);
        let value = HeaderValue::from_static("18446744073709551");
        assert_eq!(parse_retry_after(Some(&value)), Some(18_446_744_073_709_551_000));
    }

    #[test]
    fn test_map_429_with_huge_retry_after_is_rate_limited() {
        let header = HeaderValue::from_static("99999999999999999999");
        assert_eq!(
            map_http_error(429, "", parse_retry_after(Some(&header))),
            LlmError::RateLimited {
                retry_after_ms: None
            }
        );
    }

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_text_skips_thoughts() {
        let response = parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[
                {"text":"thinking...","thought":true},{"text":"x="},{"text":"5"}]},
                "finishReason":"STOP"}],
              "usageMetadata":{"promptTokenCount":12,"candidatesTokenCount":3},
              "modelVersion":"gemini-2.5-flash-lite"}"#,
        );
        let out = extract_response(response, "requested").unwrap();
        assert_eq!(out.text, "x=5");
        assert_eq!(out.model, "gemini-2.5-flash-lite");
        assert_eq!(out.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(out.usage.input_tokens, 12);
        assert_eq!(out.usage.output_tokens, 3);
    }

    #[test]
    fn test_extract_blocked_prompt() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert_eq!(
            extract_response(response, "m").unwrap_err(),
            LlmError::Blocked("SAFETY".into())
        );
    }

    #[test]
    fn test_extract_blocked_or_empty_candidate() {
        let response = parse(r#"{"candidates":[{"finishReason":"RECITATION"}]}"#);
        assert_eq!(
            extract_response(response, "m").unwrap_err(),
            LlmError::Blocked("RECITATION".into())
        );

        let response = parse(r#"{"candidates":[{"content":{"parts":[]},"finishReason":"MAX_TOKENS"}]}"#);
        assert_eq!(extract_response(response, "m").unwrap_err(), LlmError::EmptyResponse);

        let response = parse(r#"{}"#);
        assert_eq!(extract_response(response, "m").unwrap_err(), LlmError::EmptyResponse);
    }

    // --- Wire tests against a local mock server ---

    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn wire_provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new(
            SecretString::from("test-key-not-real"),
            &server.base_url(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn wire_request() -> CompletionRequest {
        CompletionRequest {
            model: "gemini-2.5-flash".to_string(),
            system_instruction: "You are a math tutor.".to_string(),
            temperature: 0.4,
            history: Vec::new(),
            content: vec![ContentPart::text("2x = 10?")],
        }
    }

    #[tokio::test]
    async fn test_complete_returns_candidate_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:generateContent")
                    .header("x-goog-api-key", "test-key-not-real");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "candidates": [{
                            "content": {"role": "model", "parts": [{"text": "x = 5"}]},
                            "finishReason": "STOP"
                        }],
                        "usageMetadata": {"promptTokenCount": 9, "candidatesTokenCount": 4}
                    }));
            })
            .await;

        let response = wire_provider(&server).complete(&wire_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.text, "x = 5");
        assert_eq!(response.model, "gemini-2.5-flash");
        assert_eq!(response.usage.output_tokens, 4);
    }

    #[tokio::test]
    async fn test_complete_maps_resource_exhausted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(429)
                    .header("content-type", "application/json")
                    .header("retry-after", "30")
                    .json_body(json!({"error": {
                        "code": 429,
                        "message": "Quota exceeded for metric generate_content_free_tier_requests",
                        "status": "RESOURCE_EXHAUSTED"
                    }}));
            })
            .await;

        let err = wire_provider(&server).complete(&wire_request()).await.unwrap_err();

        assert!(matches!(err, LlmError::QuotaExhausted(msg) if msg.starts_with("Quota exceeded")));
    }

    #[tokio::test]
    async fn test_complete_bare_429_reads_retry_after_header() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(429).header("retry-after", "7").body("slow down");
            })
            .await;

        let err = wire_provider(&server).complete(&wire_request()).await.unwrap_err();

        assert_eq!(
            err,
            LlmError::RateLimited {
                retry_after_ms: Some(7_000)
            }
        );
    }

    #[tokio::test]
    async fn test_complete_huge_retry_after_still_maps() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(429).header("retry-after", "18446744073709552");
            })
            .await;

        let err = wire_provider(&server).complete(&wire_request()).await.unwrap_err();

        assert_eq!(
            err,
            LlmError::RateLimited {
                retry_after_ms: None
            }
        );
    }

    #[tokio::test]
    async fn test_complete_maps_invalid_api_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(400)
                    .header("content-type", "application/json")
                    .json_body(json!({"error": {
                        "code": 400,
                        "message": "API key not valid. Please pass a valid API key.",
                        "status": "INVALID_ARGUMENT",
                        "details": [{
                            "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                            "reason": "API_KEY_INVALID"
                        }]
                    }}));
            })
            .await;

        let err = wire_provider(&server).complete(&wire_request()).await.unwrap_err();

        assert!(matches!(err, LlmError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn test_complete_unparseable_success_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).body("not json");
            })
            .await;

        let err = wire_provider(&server).complete(&wire_request()).await.unwrap_err();

        assert!(matches!(err, LlmError::Deserialization(_)));
    }
}
