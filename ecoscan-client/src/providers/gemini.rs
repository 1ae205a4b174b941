use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AdvisoryProvider, AdvisoryRequestError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Client for the Generative Language `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Concatenate the text parts of the first candidate.
pub fn parse_generate_content(body: &str) -> Result<String, AdvisoryRequestError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| AdvisoryRequestError::Malformed(e.to_string()))?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AdvisoryRequestError::NoText);
    }
    Ok(text)
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdvisoryRequestError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdvisoryRequestError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl AdvisoryProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AdvisoryRequestError> {
        let request = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisoryRequestError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisoryRequestError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdvisoryRequestError::Transport(e.without_url().to_string()))?;

        parse_generate_content(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    #[test]
    fn parse_joins_parts_of_first_candidate() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "1. Stay indoors. "}, {"text": "2. Wear an N95."}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }"#;
        assert_eq!(
            parse_generate_content(body).unwrap(),
            "1. Stay indoors. 2. Wear an N95."
        );
    }

    #[test]
    fn endpoint_targets_configured_model() {
        let client = GeminiClient::new(
            "http://localhost:9/",
            "k",
            "gemini-1.5-pro",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.model(), "gemini-1.5-pro");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn parse_without_text_is_an_error() {
        let blocked = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert!(matches!(
            parse_generate_content(blocked),
            Err(AdvisoryRequestError::NoText)
        ));

        let no_content = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert!(matches!(
            parse_generate_content(no_content),
            Err(AdvisoryRequestError::NoText)
        ));

        assert!(matches!(
            parse_generate_content("<html>"),
            Err(AdvisoryRequestError::Malformed(_))
        ));
    }

    async fn spawn_model(status: StatusCode) -> String {
        let router = Router::new().route(
            "/v1beta/models/:action",
            post(move |Path(action): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                if action != "gemini-1.5-flash:generateContent" {
                    return (StatusCode::NOT_FOUND, Json(json!({"error": action})));
                }
                let key_ok = headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok())
                    == Some("gemini-key");
                if !key_ok {
                    return (StatusCode::FORBIDDEN, Json(json!({"error": "key"})));
                }
                let prompt = body["contents"][0]["parts"][0]["text"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                (
                    status,
                    Json(json!({
                        "candidates": [{"content": {"parts": [{"text": format!("echo: {prompt}")}]}}]
                    })),
                )
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn generate_posts_prompt_to_model_endpoint() {
        let base = spawn_model(StatusCode::OK).await;
        let client =
            GeminiClient::new(base, "gemini-key", DEFAULT_MODEL, Duration::from_secs(5)).unwrap();

        let text = client.generate("two safety steps").await.unwrap();
        assert_eq!(text, "echo: two safety steps");
    }

    #[tokio::test]
    async fn generate_maps_rejected_key_to_status_error() {
        let base = spawn_model(StatusCode::OK).await;
        let client =
            GeminiClient::new(base, "wrong", DEFAULT_MODEL, Duration::from_secs(5)).unwrap();

        let res = client.generate("hello").await;
        assert!(matches!(res, Err(AdvisoryRequestError::Status(403))));
    }

    #[tokio::test]
    async fn generate_maps_server_error() {
        let base = spawn_model(StatusCode::SERVICE_UNAVAILABLE).await;
        let client =
            GeminiClient::new(base, "gemini-key", DEFAULT_MODEL, Duration::from_secs(5)).unwrap();

        let res = client.generate("hello").await;
        assert!(matches!(res, Err(AdvisoryRequestError::Status(503))));
    }
}
