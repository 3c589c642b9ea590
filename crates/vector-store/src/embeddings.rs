use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const STUB_MODEL_NAME: &str = "stub-hash";

/// Maps text to fixed-dimension vectors.
///
/// Implementations must return one vector of [`dimension`](Self::dimension)
/// floats per input, in input order, and should be deterministic for
/// identical text. The store normalizes whatever it receives.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".to_string()))
    }
}

/// Scale `vec` to unit length; zero vectors are left untouched.
pub fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

/// Offline provider producing hash-seeded unit vectors.
///
/// Identical text always maps to the identical vector, distinct texts map to
/// near-orthogonal ones. Carries no semantics beyond exact matches.
#[derive(Clone, Debug)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn model_name(&self) -> &str {
        STUB_MODEL_NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[derive(Clone, Debug)]
pub struct HttpEmbedderConfig {
    /// Base URL of an Ollama-compatible server, e.g. `http://localhost:11434`
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    /// Extra attempts after the first failed request
    pub max_retries: u32,
    pub timeout: Duration,
}

impl HttpEmbedderConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            dimension,
            max_retries: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Remote provider speaking the `POST /api/embed` protocol.
///
/// Transport errors and 5xx responses are retried with exponential backoff;
/// 4xx responses fail immediately.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VectorStoreError::EmbeddingError(format!("HTTP client: {e}")))?;
        let endpoint = format!("{}/api/embed", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    async fn request_once(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, Attempt> {
        let body = EmbedRequest {
            model: &self.config.model,
            input: texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Attempt::Retry(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(Attempt::Retry(format!("{} returned {status}", self.endpoint)));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Attempt::Fail(format!(
                "{} returned {status}: {detail}",
                self.endpoint
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Fail(format!("invalid embed response: {e}")))?;
        Ok(parsed.embeddings)
    }
}

enum Attempt {
    Retry(String),
    Fail(String),
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut attempt = 0u32;
        loop {
            match self.request_once(texts).await {
                Ok(mut embeddings) => {
                    if embeddings.len() != texts.len() {
                        return Err(VectorStoreError::EmbeddingError(format!(
                            "expected {} embeddings, got {}",
                            texts.len(),
                            embeddings.len()
                        )));
                    }
                    for vector in &mut embeddings {
                        if vector.len() != self.config.dimension {
                            return Err(VectorStoreError::EmbeddingError(format!(
                                "model '{}' returned dimension {} (expected {})",
                                self.config.model,
                                vector.len(),
                                self.config.dimension
                            )));
                        }
                        normalize(vector);
                    }
                    return Ok(embeddings);
                }
                Err(Attempt::Retry(msg)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(200 * (1u64 << attempt.min(6)));
                    log::warn!(
                        "Embedding request failed ({msg}); retry {attempt}/{} in {backoff:?}",
                        self.config.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(Attempt::Retry(msg) | Attempt::Fail(msg)) => {
                    return Err(VectorStoreError::EmbeddingError(msg));
                }
            }
        }
    }
}
