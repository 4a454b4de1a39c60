//! Chat-completions client for vision OCR requests.
//!
//! [`VisionClient`] is the seam between the OCR stage and the network. The
//! stage builds a [`ChatRequest`], hands it to the client and gets back the
//! decoded [`ChatCompletion`]. [`HttpVisionClient`] is the real
//! implementation: one HTTPS POST per call, no retry. Tests substitute a
//! stub that records requests and returns canned answers.

use crate::config::OcrConfig;
use crate::error::PdfOcrError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ── Request wire types ───────────────────────────────────────────────────

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

/// One part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatRequest {
    /// A single user turn carrying `instruction` followed by the image.
    pub fn ocr(model: &str, instruction: &str, image_data_uri: String, max_tokens: u32) -> Self {
        ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: instruction.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_uri,
                        },
                    },
                ],
            }],
            max_tokens,
        }
    }

    /// The first `image_url` in the request, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.messages
            .iter()
            .flat_map(|m| m.content.iter())
            .find_map(|part| match part {
                ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
                ContentPart::Text { .. } => None,
            })
    }
}

// ── Response wire types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Token accounting reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

/// The decoded answer: `choices[0].message.content` plus usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    pub content: String,
    pub usage: Option<Usage>,
}

/// Decode a 2xx response body.
///
/// Fails with [`PdfOcrError::MalformedResponse`] when the body is not JSON
/// or `choices[0].message.content` is missing or not a string.
pub fn parse_completion(body: &str) -> Result<ChatCompletion, PdfOcrError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| PdfOcrError::MalformedResponse {
            detail: format!("body is not a chat completion: {e}"),
        })?;

    let choice = response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or_else(|| PdfOcrError::MalformedResponse {
            detail: "response has no choices".into(),
        })?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| PdfOcrError::MalformedResponse {
            detail: "choices[0].message.content is missing".into(),
        })?;

    Ok(ChatCompletion {
        content,
        usage: response.usage,
    })
}

// ── Client seam ──────────────────────────────────────────────────────────

/// Sends one chat request and returns the decoded completion.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, PdfOcrError>;
}

/// [`VisionClient`] over HTTPS with bearer-token auth.
pub struct HttpVisionClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpVisionClient {
    /// Build a client from the run configuration.
    ///
    /// Requires `config.api_key`. Applies `api_timeout_secs` when set.
    pub fn new(config: &OcrConfig) -> Result<Self, PdfOcrError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(PdfOcrError::MissingApiKey)?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("pdf-vision-ocr/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| PdfOcrError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.completions_url(),
            api_key,
        })
    }

    /// Endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VisionClient for HttpVisionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, PdfOcrError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| PdfOcrError::Internal(format!("request serialisation: {e}")))?;
        debug!("POST {} ({} bytes)", self.url, body.len());

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| PdfOcrError::HttpFailed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| PdfOcrError::HttpFailed {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(PdfOcrError::ApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ocr_request_serialises_to_wire_shape() {
        let req = ChatRequest::ocr(
            "gpt-4o-mini",
            "Please perform OCR on this image and return only the extracted text.",
            "data:image/png;base64,AAAA".to_string(),
            8000,
        );
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-4o-mini",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "Please perform OCR on this image and return only the extracted text."},
                        {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                    ]
                }],
                "max_tokens": 8000
            })
        );
    }

    #[test]
    fn image_url_finds_data_uri() {
        let req = ChatRequest::ocr("m", "t", "data:image/png;base64,QQ==".into(), 1);
        assert_eq!(req.image_url(), Some("data:image/png;base64,QQ=="));
    }

    #[test]
    fn parse_extracts_first_choice_verbatim() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "  Line one\nLine two\n\n"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"prompt_tokens": 812, "completion_tokens": 40, "total_tokens": 852}
        }"#;
        let c = parse_completion(body).unwrap();
        assert_eq!(c.content, "  Line one\nLine two\n\n");
        assert_eq!(
            c.usage,
            Some(Usage {
                prompt_tokens: 812,
                completion_tokens: 40
            })
        );
    }

    #[test]
    fn parse_without_usage() {
        let c = parse_completion(r#"{"choices":[{"message":{"content":"x"}}]}"#).unwrap();
        assert_eq!(c.content, "x");
        assert!(c.usage.is_none());
    }

    #[test]
    fn parse_empty_choices_is_malformed() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, PdfOcrError::MalformedResponse { .. }));
    }

    #[test]
    fn parse_missing_choices_is_malformed() {
        let err = parse_completion(r#"{"id":"chatcmpl-1"}"#).unwrap_err();
        assert!(matches!(err, PdfOcrError::MalformedResponse { .. }));
    }

    #[test]
    fn parse_null_content_is_malformed() {
        let err = parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap_err();
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn parse_non_json_is_malformed() {
        let err = parse_completion("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, PdfOcrError::MalformedResponse { .. }));
    }

    #[test]
    fn http_client_requires_api_key() {
        let config = OcrConfig::default();
        assert!(matches!(
            HttpVisionClient::new(&config),
            Err(PdfOcrError::MissingApiKey)
        ));
    }

    #[test]
    fn http_client_targets_completions_url() {
        let config = OcrConfig::builder()
            .api_key("sk-test")
            .api_base_url("http://127.0.0.1:9/v1")
            .api_timeout_secs(5)
            .build()
            .unwrap();
        let client = HttpVisionClient::new(&config).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_failure() {
        // Port 9 (discard) is closed on CI hosts; the connect fails fast.
        let config = OcrConfig::builder()
            .api_key("sk-test")
            .api_base_url("http://127.0.0.1:9/v1")
            .api_timeout_secs(5)
            .build()
            .unwrap();
        let client = HttpVisionClient::new(&config).unwrap();
        let req = ChatRequest::ocr("m", "t", "data:image/png;base64,".into(), 1);
        let err = client.complete(&req).await.unwrap_err();
        assert!(matches!(err, PdfOcrError::HttpFailed { .. }), "got: {err}");
    }

    // ── Loopback server ──────────────────────────────────────────────────

    /// Answer a single HTTP request with `response` verbatim. The task yields
    /// the raw request (head and body) as received.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });

        (base, handle)
    }

    fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn client_for(base: &str, key: &str) -> HttpVisionClient {
        let config = OcrConfig::builder()
            .api_key(key)
            .api_base_url(base)
            .api_timeout_secs(10)
            .build()
            .unwrap();
        HttpVisionClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn server_error_returns_status_and_raw_body() {
        let raw_body = "raw boom body";
        let (base, server) =
            serve_once(http_response("500 Internal Server Error", "text/plain", raw_body)).await;
        let client = client_for(&base, "sk-x");
        let req = ChatRequest::ocr("gpt-4o-mini", "t", "data:image/png;base64,QQ==".into(), 8000);

        let err = client.complete(&req).await.unwrap_err();
        match err {
            PdfOcrError::ApiError { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, raw_body);
            }
            other => panic!("expected ApiError, got {other}"),
        }

        let request = server.await.unwrap();
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        let head = head.to_ascii_lowercase();
        assert!(head.starts_with("post /v1/chat/completions "), "{head}");
        assert!(head.contains("authorization: bearer sk-x"), "{head}");
        assert!(head.contains("content-type: application/json"), "{head}");
        let sent: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(sent, serde_json::to_value(&req).unwrap());
    }

    #[tokio::test]
    async fn success_returns_content_untrimmed() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" a\n"}}],"usage":{"prompt_tokens":5,"completion_tokens":2}}"#;
        let (base, server) = serve_once(http_response("200 OK", "application/json", body)).await;
        let client = client_for(&base, "sk-x");
        let req = ChatRequest::ocr("gpt-4o-mini", "t", "data:image/png;base64,QQ==".into(), 8000);

        let completion = client.complete(&req).await.unwrap();
        assert_eq!(completion.content, " a\n");
        assert_eq!(
            completion.usage,
            Some(Usage {
                prompt_tokens: 5,
                completion_tokens: 2
            })
        );
        server.await.unwrap();
    }
}
