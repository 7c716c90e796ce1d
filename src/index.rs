//! In-memory embedding index with brute-force cosine search.
//!
//! The index pairs every chunk with exactly one embedding vector and is
//! built once per process — adding or removing documents means rebuilding.
//! After construction it is read-only, so concurrent read-only queries are
//! safe wherever the caller can share a reference.

use anyhow::{bail, Result};

use crate::embedding::{cosine_similarity, Embedder};
use crate::models::Chunk;

/// Immutable collection of `(Chunk, vector)` pairs supporting
/// nearest-neighbor queries.
#[derive(Debug)]
pub struct EmbeddingIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
    dims: usize,
}

impl EmbeddingIndex {
    /// Embed `chunks` in batches and build the index.
    ///
    /// Construction is the expensive step (one embedding call per batch);
    /// queries afterwards are cheap. Every vector must match the
    /// provider's declared dimensionality.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self> {
        let dims = embedder.dims();
        let batch_size = batch_size.max(1);

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            vectors.extend(embedder.embed(batch).await?);
        }

        if vectors.len() != chunks.len() {
            bail!(
                "embedding count mismatch: {} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            );
        }

        for vector in &vectors {
            if vector.len() != dims {
                bail!(
                    "embedding dimension mismatch: expected {}, got {}",
                    dims,
                    vector.len()
                );
            }
        }

        let entries = chunks.into_iter().zip(vectors).collect();

        Ok(Self { entries, dims })
    }

    /// Return the `min(k, len)` nearest chunks to `query_vec`, most similar
    /// first. Equal scores keep ingestion order (the sort is stable), so
    /// results are reproducible across identical queries.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<(&Chunk, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, vector))| (i, cosine_similarity(query_vec, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| (&self.entries[i].0, score))
            .collect()
    }

    /// Vector dimensionality shared by every entry.
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
