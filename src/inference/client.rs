//! Ollama HTTP client
//!
//! Non-streaming access to `/api/tags`, `/api/chat` and `/api/generate`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::inference::InferenceError;
use crate::types::message::Message;
use crate::types::model::ModelInfo;

/// Timeout for the availability check
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = "Jarvis-AI-Assistant/1.0";

/// Sampling options forwarded to the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// Maximum tokens to generate
    pub num_predict: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_predict: 4096,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    message: Option<ChatMessageBody>,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponseBody {
    #[serde(default)]
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Text produced by one model call
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// `eval_count` reported by the server
    pub tokens: u64,
}

pub struct OllamaClient {
    client: reqwest::Client,
    host: String,
}

impl OllamaClient {
    /// `timeout` applies to every request except the availability check
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_connect() {
            InferenceError::Unavailable(self.host.clone())
        } else {
            InferenceError::Http(e)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, InferenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(InferenceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// True when `GET /api/tags` answers 200 within a few seconds
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(self.url("/api/tags"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Ollama server not available: {}", e);
                false
            }
        }
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, InferenceError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let tags: TagsResponse = Self::check_status(response).await?.json().await?;
        Ok(tags.models)
    }

    /// `POST /api/chat` with the full message list
    pub async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: GenerationOptions,
    ) -> Result<Completion, InferenceError> {
        let request = ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options,
        };

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body: ChatResponseBody = Self::check_status(response).await?.json().await?;

        if let Some(error) = body.error {
            return Err(InferenceError::Api(error));
        }
        let message = body
            .message
            .ok_or_else(|| InferenceError::Api("response contained no message".to_string()))?;
        Ok(Completion {
            text: message.content,
            tokens: body.eval_count.unwrap_or(0),
        })
    }

    /// `POST /api/generate`; `images` are base64-encoded
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        images: Vec<String>,
        system: Option<&str>,
        options: GenerationOptions,
    ) -> Result<Completion, InferenceError> {
        let request = GenerateRequest {
            model,
            prompt,
            system,
            images,
            stream: false,
            options,
        };

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body: GenerateResponseBody = Self::check_status(response).await?.json().await?;

        if let Some(error) = body.error {
            return Err(InferenceError::Api(error));
        }
        Ok(Completion {
            text: body.response,
            tokens: body.eval_count.unwrap_or(0),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! Single-response axum server for exercising the client without Ollama

    use std::sync::{Arc, Mutex};

    use axum::http::{header, Method, StatusCode, Uri};
    use axum::Router;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// What the client sent
    #[derive(Debug)]
    pub struct RecordedRequest {
        pub method: Method,
        pub path: String,
        pub body: String,
    }

    /// Answer every request with `status` and the JSON `body`. Returns the
    /// base URL and a receiver for the first request.
    pub async fn serve_once(status: u16, body: String) -> (String, oneshot::Receiver<RecordedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let status = StatusCode::from_u16(status).unwrap();
        let (tx, rx) = oneshot::channel();
        let first = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new().fallback(move |method: Method, uri: Uri, request_body: String| {
            let first = first.clone();
            let body = body.clone();
            async move {
                if let Some(tx) = first.lock().unwrap().take() {
                    let _ = tx.send(RecordedRequest {
                        method,
                        path: uri.path().to_string(),
                        body: request_body,
                    });
                }
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        });
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        (format!("http://{}", addr), rx)
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;

    fn client(host: &str) -> OllamaClient {
        OllamaClient::new(host, Duration::from_secs(10)).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let client = client("http://127.0.0.1:9");
        assert!(!client.is_available().await);
        assert!(matches!(
            client.list_models().await,
            Err(InferenceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_list_models() {
        let body = r#"{"models":[{"name":"llava:13b","size":7000},{"name":"qwen2.5:14b"}]}"#;
        let (host, _req) = serve_once(200, body.to_string()).await;
        let models = client(&host).list_models().await.unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["llava:13b", "qwen2.5:14b"]);
        assert_eq!(models[0].size, 7000);
    }

    #[tokio::test]
    async fn test_chat_sends_messages_and_reads_reply() {
        let body = r#"{"model":"m","message":{"role":"assistant","content":"Hello there"},"done":true,"eval_count":7}"#;
        let (host, req) = serve_once(200, body.to_string()).await;

        let messages = vec![Message::system("be nice"), Message::user("hi")];
        let reply = client(&host)
            .chat("qwen2.5:14b", &messages, GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(reply.text, "Hello there");
        assert_eq!(reply.tokens, 7);

        let seen = req.await.unwrap();
        assert_eq!(seen.method, axum::http::Method::POST);
        assert_eq!(seen.path, "/api/chat");
        let sent: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(sent["stream"], false);
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["options"]["num_predict"], 4096);
    }

    #[tokio::test]
    async fn test_generate_with_images() {
        let body = r#"{"response":"A desktop","done":true}"#;
        let (host, req) = serve_once(200, body.to_string()).await;

        let reply = client(&host)
            .generate(
                "llava:13b",
                "describe",
                vec!["aGVsbG8=".to_string()],
                None,
                GenerationOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(reply.text, "A desktop");
        assert_eq!(reply.tokens, 0);

        let seen = req.await.unwrap();
        assert_eq!(seen.path, "/api/generate");
        let sent: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(sent["images"], serde_json::json!(["aGVsbG8="]));
        assert!(sent.get("system").is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (host, _req) =
            serve_once(404, r#"{"error":"model not found"}"#.to_string()).await;
        let err = client(&host)
            .chat("missing", &[Message::user("hi")], GenerationOptions::default())
            .await
            .unwrap_err();
        match err {
            InferenceError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("model not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
