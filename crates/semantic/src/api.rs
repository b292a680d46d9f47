use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::{Embedder, SemanticConfig, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

impl ApiProviderKind {
    fn from_hint(hint: Option<&str>) -> Self {
        match hint.unwrap_or("custom").to_ascii_lowercase().as_str() {
            "hf" | "huggingface" => ApiProviderKind::HuggingFace,
            "openai" | "gpt" => ApiProviderKind::OpenAI,
            _ => ApiProviderKind::Custom,
        }
    }
}

/// Embedder backed by a remote HTTP feature-extraction endpoint.
///
/// One POST per batch. Failures are reported as-is; nothing is retried.
#[derive(Debug, Clone)]
pub struct ApiEmbedder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProviderKind,
    model_name: String,
}

impl ApiEmbedder {
    pub fn from_config(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let url = cfg
            .api_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.api_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            auth_header: cfg.api_auth_header.clone(),
            provider: ApiProviderKind::from_hint(cfg.api_provider.as_deref()),
            model_name: cfg.model_name.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, payload: Value) -> Result<Value, SemanticError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| SemanticError::Request(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Request(format!("HTTP error {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::Response(format!("invalid JSON body: {e}")))
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let payload = build_api_payload(self.provider, texts, &self.model_name);
        debug!(url = %self.url, texts = texts.len(), "embedding_request");
        let response = self.send(payload).await?;
        parse_embeddings_from_value(response)
    }
}

fn build_api_payload(provider: ApiProviderKind, texts: &[String], model_name: &str) -> Value {
    match provider {
        ApiProviderKind::HuggingFace => json!({ "inputs": texts }),
        ApiProviderKind::OpenAI => json!({ "input": texts, "model": model_name }),
        ApiProviderKind::Custom => json!({ "texts": texts }),
    }
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                // OpenAI responses carry an explicit index; order by it.
                let mut indexed = Vec::with_capacity(items.len());
                for (position, item) in items.into_iter().enumerate() {
                    let Value::Object(mut obj) = item else {
                        return Err(SemanticError::Response(
                            "unexpected entry inside `data` array".into(),
                        ));
                    };
                    let index = obj
                        .get("index")
                        .and_then(Value::as_u64)
                        .map(|i| i as usize)
                        .unwrap_or(position);
                    let embedding = obj.remove("embedding").ok_or_else(|| {
                        SemanticError::Response("missing `embedding` field in data item".into())
                    })?;
                    indexed.push((index, parse_embedding_vector(embedding)?));
                }
                indexed.sort_by_key(|(index, _)| *index);
                return Ok(indexed.into_iter().map(|(_, v)| v).collect());
            }

            if let Some(Value::String(message)) = map.remove("error") {
                return Err(SemanticError::Response(format!("service error: {message}")));
            }

            Err(SemanticError::Response("unsupported API response shape".into()))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Response("non-numeric embedding value".into())),
                other => Err(SemanticError::Response(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Response(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves a single canned HTTP response and returns the request it received.
    async fn serve_once(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}/embed"), handle)
    }

    fn api_config(url: String, provider: &str) -> SemanticConfig {
        SemanticConfig {
            api_url: Some(url),
            api_provider: Some(provider.into()),
            api_timeout_secs: 5,
            ..Default::default()
        }
    }

    #[test]
    fn provider_hint_parsing() {
        assert_eq!(ApiProviderKind::from_hint(Some("HF")), ApiProviderKind::HuggingFace);
        assert_eq!(ApiProviderKind::from_hint(Some("gpt")), ApiProviderKind::OpenAI);
        assert_eq!(ApiProviderKind::from_hint(None), ApiProviderKind::Custom);
    }

    #[test]
    fn payload_shapes_per_provider() {
        let texts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            build_api_payload(ApiProviderKind::HuggingFace, &texts, "m"),
            json!({ "inputs": ["a", "b"] })
        );
        assert_eq!(
            build_api_payload(ApiProviderKind::OpenAI, &texts, "m"),
            json!({ "input": ["a", "b"], "model": "m" })
        );
        assert_eq!(
            build_api_payload(ApiProviderKind::Custom, &texts, "m"),
            json!({ "texts": ["a", "b"] })
        );
    }

    #[test]
    fn parse_embedding_collection_various_formats() {
        let nested = parse_embedding_collection(json!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])).unwrap();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0], vec![1.0, 2.0, 3.0]);

        let single = parse_embedding_collection(json!([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(single, vec![vec![1.0, 2.0, 3.0]]);

        assert!(parse_embedding_collection(json!([])).unwrap().is_empty());
    }

    #[test]
    fn parse_openai_data_respects_index() {
        let body = json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        });
        let vectors = parse_embeddings_from_value(body).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn parse_rejects_unknown_shapes() {
        assert!(matches!(
            parse_embeddings_from_value(json!({ "vectors": [] })),
            Err(SemanticError::Response(_))
        ));
        assert!(matches!(
            parse_embeddings_from_value(json!([["x"]])),
            Err(SemanticError::Response(_))
        ));
        let err = parse_embeddings_from_value(json!({ "error": "model is loading" })).unwrap_err();
        assert!(err.to_string().contains("model is loading"));
    }

    #[test]
    fn from_config_requires_url() {
        let cfg = SemanticConfig {
            api_url: None,
            ..Default::default()
        };
        assert!(matches!(
            ApiEmbedder::from_config(&cfg),
            Err(SemanticError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn embeds_through_http_endpoint() {
        let (url, server) = serve_once("200 OK", "[[0.1, 0.2], [0.3, 0.4]]").await;
        let cfg = api_config(url, "hf").with_auth_header("Bearer test-token");
        let embedder = ApiEmbedder::from_config(&cfg).unwrap();

        let texts = vec!["first".to_string(), "second".to_string()];
        let vectors = embedder.embed(&texts).await.unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /embed"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer test-token"));
        assert!(request.contains(r#""inputs":["first","second"]"#));
    }

    #[tokio::test]
    async fn http_error_status_is_request_error() {
        let (url, server) = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#).await;
        let embedder = ApiEmbedder::from_config(&api_config(url, "custom")).unwrap();

        let err = embedder.embed(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, SemanticError::Request(_)));
        assert!(err.to_string().contains("503"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn empty_batch_skips_request() {
        let cfg = api_config("http://127.0.0.1:9/unused".into(), "hf");
        let embedder = ApiEmbedder::from_config(&cfg).unwrap();
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}
