//! Text embedding via an external embeddings API.
//!
//! `Embedder` calls a Cohere-compatible `embed` endpoint over HTTP. Callers
//! distinguish document text from query text via [`InputType`] — the same
//! vectors are comparable either way, but some providers tune their model
//! differently depending on which side of a search a piece of text is on.

use crate::error::{Result, VectraError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const EMBED_URL: &str = "https://api.cohere.ai/v1/embed";
const EMBED_MODEL: &str = "embed-english-v3.0";

/// Collaborator that turns text into vectors. Implemented by [`Embedder`]
/// for production use and by test-only fakes so the service layer can be
/// exercised without a live network call.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>>;

    /// Embed a batch of texts in input order.
    async fn embed_batch(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>>;
}

/// Which side of a search a piece of text is being embedded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// Text being stored and indexed (a chunk).
    Document,
    /// Text being searched with (a query).
    Query,
}

impl InputType {
    fn as_api_value(self) -> &'static str {
        match self {
            InputType::Document => "search_document",
            InputType::Query => "search_query",
        }
    }
}

/// Embeds text via an external API, authenticated with an API key read from
/// configuration at construction time.
pub struct Embedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl Embedder {
    /// Create an embedder from an explicit API key.
    ///
    /// Returns [`VectraError::Config`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(VectraError::Config("embedder API key must not be empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VectraError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            model: EMBED_MODEL.to_string(),
        })
    }

    /// Create an embedder reading its API key from the `COHERE_API_KEY`
    /// environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("COHERE_API_KEY")
            .map_err(|_| VectraError::Config("COHERE_API_KEY is not set".into()))?;
        Self::new(api_key)
    }

    /// Embed a single piece of text, returning its vector.
    pub async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(std::slice::from_ref(&text.to_string()), input_type).await?;
        vectors
            .pop()
            .ok_or_else(|| VectraError::Upstream("embedding API returned no vectors".into()))
    }

    /// Embed a batch of texts in a single request, preserving input order.
    pub async fn embed_batch(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "texts": texts,
            "model": self.model,
            "input_type": input_type.as_api_value(),
        });

        let response = self
            .client
            .post(EMBED_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VectraError::Upstream(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VectraError::Upstream(format!(
                "embedding API returned {status}: {text}"
            )));
        }

        let parsed: CohereEmbedResponse = response
            .json()
            .await
            .map_err(|e| VectraError::Upstream(format!("invalid embedding response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(VectraError::Upstream(format!(
                "embedding API returned {} vectors for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}

#[derive(Debug, Deserialize)]
struct CohereEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingClient for Embedder {
    async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>> {
        Embedder::embed(self, text, input_type).await
    }

    async fn embed_batch(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>> {
        Embedder::embed_batch(self, texts, input_type).await
    }
}
