//! Embedding provider boundary.

use async_trait::async_trait;

/// Maps text to a fixed-dimension vector.
///
/// Implementations must be deterministic for a given model version and must
/// surface encoding failures as errors. Returning a zero vector in place of
/// a failed request is a contract violation: it would index garbage that
/// silently matches nothing.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Embed a batch of texts, one vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Model identifier, for logging and provenance.
    fn model_name(&self) -> &str;

    /// Output dimension of [`embed`](Self::embed).
    fn dimensions(&self) -> usize;
}
