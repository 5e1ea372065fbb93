//! Ollama HTTP client.

use super::{BackendError, CompletionBackend};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sampling options sent with every generation request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OllamaOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

impl Default for OllamaOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            num_predict: 2048,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for a local Ollama server.
///
/// Local models can take minutes per file, so no request timeout is set.
pub struct OllamaBackend {
    base_url: String,
    options: OllamaOptions,
    http_client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, options: OllamaOptions) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::Unavailable {
                url: self.base_url.clone(),
                message: e.to_string(),
            }
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Api { status, body })
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/api/tags", self.base_url);
        debug!("Listing models from {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = Self::check_status(response).await?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: self.options,
        };

        debug!("Sending {} prompt characters to {}", prompt.chars().count(), model);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = Self::check_status(response).await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        debug!("{} answered with {} characters", model, body.response.len());
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_lists_model_names() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(200).json_body(json!({
                    "models": [{"name": "llama3:8b"}, {"name": "codellama:7b"}]
                }));
            })
            .await;

        let backend = OllamaBackend::new(server.base_url(), OllamaOptions::default()).unwrap();
        let models = backend.list_models().await.unwrap();

        assert_eq!(models, vec!["llama3:8b", "codellama:7b"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_sends_non_streaming_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate").json_body(json!({
                    "model": "llama3:8b",
                    "prompt": "analyze this",
                    "stream": false,
                    "options": {"temperature": 0.1, "num_predict": 2048}
                }));
                then.status(200)
                    .json_body(json!({"response": "{\"findings\": []}", "done": true}));
            })
            .await;

        let backend = OllamaBackend::new(server.base_url(), OllamaOptions::default()).unwrap();
        let text = backend.generate("llama3:8b", "analyze this").await.unwrap();

        assert_eq!(text, "{\"findings\": []}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(404).body("model not found");
            })
            .await;

        let backend = OllamaBackend::new(server.base_url(), OllamaOptions::default()).unwrap();
        let err = backend.generate("missing", "x").await.unwrap_err();

        match err {
            BackendError::Api { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "model not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(200).body("not json");
            })
            .await;

        let backend = OllamaBackend::new(server.base_url(), OllamaOptions::default()).unwrap();
        let err = backend.list_models().await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        // Port 9 (discard) is essentially never served on loopback.
        let backend = OllamaBackend::new("http://127.0.0.1:9", OllamaOptions::default()).unwrap();
        let err = backend.list_models().await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable { .. }));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend =
            OllamaBackend::new("http://localhost:11434/", OllamaOptions::default()).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:11434");
    }
}
