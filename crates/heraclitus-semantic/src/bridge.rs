//! Similarity search and cross-domain bridge discovery

use crate::config::{check_limit, check_threshold};
use crate::{SemanticConfig, SemanticError, SimilarityIndex};
use heraclitus_batch::{
    BatchConfig, BatchCoordinator, BatchOutcome, BatchReport, CancellationToken, ClaimBatches, ItemError,
    ItemErrorKind, RetryPolicy,
};
use heraclitus_domain::traits::{ClaimQuery, ClaimStore, EmbeddingFilter, EmbeddingProvider};
use heraclitus_domain::{ClaimId, Connection, DomainSet, EmbeddingError, ValidationError};
use std::sync::Arc;

/// A ranked search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarClaim {
    /// Matching claim
    pub claim_id: ClaimId,
    /// Claim text
    pub text: String,
    /// Claim domains
    pub domains: DomainSet,
    /// Cosine similarity to the query
    pub similarity: f64,
}

/// Embedding coverage of the store
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingStats {
    /// Claims in the store
    pub total_claims: usize,
    /// Claims with a stored embedding
    pub with_embeddings: usize,
    /// Claims still waiting for one
    pub without_embeddings: usize,
    /// Provider model identifier
    pub model_name: String,
    /// Provider vector dimension
    pub dimension: usize,
}

impl EmbeddingStats {
    /// Share of claims with an embedding, in [0, 1]
    pub fn coverage(&self) -> f64 {
        if self.total_claims == 0 {
            0.0
        } else {
            self.with_embeddings as f64 / self.total_claims as f64
        }
    }
}

/// Embed a batch, retrying once when the provider is unavailable
async fn embed_batch_once_more<P>(provider: &P, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>
where
    P: EmbeddingProvider + ?Sized,
{
    match provider.embed_batch(texts).await {
        Err(e) if e.is_transient() => {
            tracing::warn!("Embedding provider failed ({}), retrying batch of {}", e, texts.len());
            provider.embed_batch(texts).await
        }
        other => other,
    }
}

/// Embed one text, retrying once when the provider is unavailable
async fn embed_once_more<P>(provider: &P, text: &str) -> Result<Vec<f32>, EmbeddingError>
where
    P: EmbeddingProvider + ?Sized,
{
    match provider.embed(text).await {
        Err(e) if e.is_transient() => {
            tracing::warn!("Embedding provider failed ({}), retrying", e);
            provider.embed(text).await
        }
        other => other,
    }
}

/// Persist one vector unless the claim already has one
///
/// Returns `Ok(false)` when the claim was embedded in the meantime.
async fn store_embedding<S>(
    store: &S,
    retry: &RetryPolicy,
    id: ClaimId,
    vector: Vec<f32>,
    dimension: usize,
) -> Result<bool, ItemError>
where
    S: ClaimStore + ?Sized,
{
    if vector.len() != dimension {
        let err = EmbeddingError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        };
        return Err(ItemError::embedding(id, &err));
    }

    let current = retry
        .run("claim read", || store.get(id))
        .await
        .map_err(|e| ItemError::from_store(id, &e))?;
    match current {
        None => return Err(ItemError::new(id, ItemErrorKind::NotFound, "claim disappeared before embedding")),
        Some(claim) if claim.has_embedding() => return Ok(false),
        Some(_) => {}
    }

    retry
        .run("embedding write", || store.put_embedding(id, vector.clone()))
        .await
        .map_err(|e| ItemError::from_store(id, &e))?;
    Ok(true)
}

/// Finds semantically close claims and cross-domain bridges
///
/// Holds one [`ClaimStore`] and one [`EmbeddingProvider`]. Each query builds a
/// [`SimilarityIndex`] from the stored embeddings; similarities are always
/// recomputed from stored vectors.
pub struct SemanticBridgeFinder<S: ClaimStore + ?Sized, P: EmbeddingProvider + ?Sized> {
    store: Arc<S>,
    provider: Arc<P>,
    config: SemanticConfig,
    batch: BatchConfig,
}

impl<S, P> SemanticBridgeFinder<S, P>
where
    S: ClaimStore + ?Sized + 'static,
    P: EmbeddingProvider + ?Sized + 'static,
{
    /// Create a finder over `store` using `provider`
    pub fn new(
        store: Arc<S>,
        provider: Arc<P>,
        config: SemanticConfig,
        batch: BatchConfig,
    ) -> Result<Self, SemanticError> {
        config.validate()?;
        batch.validate()?;
        Ok(Self {
            store,
            provider,
            config,
            batch,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SemanticConfig {
        &self.config
    }

    /// Build an index over every stored embedding
    pub async fn load_index(&self) -> Result<SimilarityIndex, SemanticError> {
        let query = ClaimQuery {
            embedding: EmbeddingFilter::Present,
            ..Default::default()
        };
        let mut batches =
            ClaimBatches::new(self.store.clone(), query, self.batch.batch_size)?.with_retry(self.batch.retry);
        let mut claims = Vec::new();
        while let Some(batch) = batches.next_batch().await? {
            claims.extend(batch);
        }

        let index = SimilarityIndex::build(self.provider.dimension(), claims, self.config.index, &self.config.hnsw);
        tracing::debug!("Loaded similarity index with {} embeddings", index.len());
        Ok(index)
    }

    /// Embed claims that have no embedding yet, in ascending id order
    ///
    /// Stops after `limit` selected claims. Claims embedded concurrently are
    /// skipped, so a second run over the same store embeds nothing.
    pub async fn embed_existing_claims(
        &self,
        batch_size: usize,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, SemanticError> {
        let query = ClaimQuery {
            embedding: EmbeddingFilter::Missing,
            ..Default::default()
        };
        let batches = ClaimBatches::new(self.store.clone(), query, batch_size)?
            .with_limit(limit)
            .with_retry(self.batch.retry);

        tracing::info!(
            "Embedding claims with {} ({} dimensions)",
            self.provider.model_name(),
            self.provider.dimension()
        );

        let report = BatchCoordinator::new(&self.batch)
            .run("embed_existing_claims", batches, cancel, |claims| {
                let store = self.store.clone();
                let provider = self.provider.clone();
                let retry = self.batch.retry;

                async move {
                    let mut outcome = BatchOutcome::new();
                    let dimension = provider.dimension();
                    let texts: Vec<String> = claims.iter().map(|c| c.text.clone()).collect();

                    let vectors: Vec<Result<Vec<f32>, EmbeddingError>> =
                        match embed_batch_once_more(provider.as_ref(), &texts).await {
                            Ok(vectors) if vectors.len() == texts.len() => vectors.into_iter().map(Ok).collect(),
                            Ok(vectors) => {
                                let err = EmbeddingError::Provider(format!(
                                    "provider returned {} vectors for {} texts",
                                    vectors.len(),
                                    texts.len()
                                ));
                                texts.iter().map(|_| Err(err.clone())).collect()
                            }
                            Err(EmbeddingError::Model(message)) => {
                                tracing::warn!("Batch rejected by model ({}), embedding claims one by one", message);
                                let mut vectors = Vec::with_capacity(texts.len());
                                for text in &texts {
                                    vectors.push(embed_once_more(provider.as_ref(), text).await);
                                }
                                vectors
                            }
                            Err(e) => texts.iter().map(|_| Err(e.clone())).collect(),
                        };

                    for (claim, vector) in claims.iter().zip(vectors) {
                        let result = match vector {
                            Ok(vector) => store_embedding(store.as_ref(), &retry, claim.id, vector, dimension).await,
                            Err(e) => Err(ItemError::embedding(claim.id, &e)),
                        };
                        match result {
                            Ok(true) => outcome.record_success(),
                            Ok(false) => outcome.record_skip(),
                            Err(item) => outcome.record_error(item),
                        }
                    }
                    outcome
                }
            })
            .await?;

        Ok(report)
    }

    /// Claims most similar to free text
    ///
    /// Keeps hits with similarity at or above `threshold` (configured default
    /// when `None`), ranked by descending similarity then ascending id.
    pub async fn semantic_search_claims(
        &self,
        query_text: &str,
        limit: Option<usize>,
        threshold: Option<f64>,
    ) -> Result<Vec<SimilarClaim>, SemanticError> {
        let limit = limit.unwrap_or(self.config.default_limit);
        let threshold = threshold.unwrap_or(self.config.search_threshold);
        check_limit(limit)?;
        check_threshold(threshold)?;
        if query_text.trim().is_empty() {
            return Err(ValidationError::InvalidArgument("query text cannot be empty".to_string()).into());
        }

        let query = embed_once_more(self.provider.as_ref(), query_text).await?;
        let index = self.load_index().await?;
        if query.len() != index.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: index.dimension(),
                actual: query.len(),
            }
            .into());
        }

        let hits = index
            .nearest(&query, limit, |_| true)
            .into_iter()
            .filter(|n| n.similarity >= threshold)
            .filter_map(|n| {
                index.get(n.id).map(|entry| SimilarClaim {
                    claim_id: n.id,
                    text: entry.text.clone(),
                    domains: entry.domains.clone(),
                    similarity: n.similarity,
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!("Search for {:?} returned {} claims", query_text, hits.len());
        Ok(hits)
    }

    /// Claims most similar to a stored claim, excluding the claim itself
    ///
    /// With `cross_domain_only`, only claims sharing no domain with the anchor
    /// are returned.
    pub async fn find_similar_claims(
        &self,
        claim_id: ClaimId,
        limit: Option<usize>,
        cross_domain_only: bool,
    ) -> Result<Vec<SimilarClaim>, SemanticError> {
        let limit = limit.unwrap_or(self.config.default_limit);
        check_limit(limit)?;

        let anchor = self
            .batch
            .retry
            .run("claim read", || self.store.get(claim_id))
            .await?
            .ok_or(SemanticError::NotFound(claim_id))?;
        let Some(embedding) = anchor.embedding.as_deref() else {
            return Err(SemanticError::MissingEmbedding(claim_id));
        };

        let index = self.load_index().await?;
        if embedding.len() != index.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: index.dimension(),
                actual: embedding.len(),
            }
            .into());
        }

        let hits = index
            .nearest(embedding, limit, |entry| {
                entry.id != claim_id && (!cross_domain_only || entry.domains.is_disjoint(&anchor.domains))
            })
            .into_iter()
            .filter_map(|n| {
                index.get(n.id).map(|entry| SimilarClaim {
                    claim_id: n.id,
                    text: entry.text.clone(),
                    domains: entry.domains.clone(),
                    similarity: n.similarity,
                })
            })
            .collect();
        Ok(hits)
    }

    /// Pairs of claims from disjoint domains with similarity at or above `threshold`
    ///
    /// Ranked by descending similarity, then ascending `(claim_a, claim_b)`.
    /// Nothing is persisted.
    pub async fn find_cross_domain_by_embedding(
        &self,
        threshold: Option<f64>,
        limit: Option<usize>,
        now: u64,
    ) -> Result<Vec<Connection>, SemanticError> {
        let threshold = threshold.unwrap_or(self.config.bridge_threshold);
        let limit = limit.unwrap_or(self.config.default_limit);
        check_threshold(threshold)?;
        check_limit(limit)?;

        let index = self.load_index().await?;
        let connections: Vec<Connection> = index
            .cross_domain_pairs(threshold, limit)
            .into_iter()
            .filter_map(|pair| {
                let a = index.get(pair.a)?;
                let b = index.get(pair.b)?;
                Some(Connection::new(
                    (a.id, a.domains.clone()),
                    (b.id, b.domains.clone()),
                    pair.similarity,
                    now,
                ))
            })
            .collect();

        tracing::info!(
            "Found {} cross-domain bridges at threshold {:.2} among {} claims",
            connections.len(),
            threshold,
            index.len()
        );
        Ok(connections)
    }

    /// Find cross-domain bridges and persist each as a connection
    pub async fn discover_bridges(
        &self,
        threshold: Option<f64>,
        limit: Option<usize>,
        now: u64,
    ) -> Result<Vec<Connection>, SemanticError> {
        let connections = self.find_cross_domain_by_embedding(threshold, limit, now).await?;
        for connection in &connections {
            self.batch
                .retry
                .run("connection insert", || self.store.insert_connection(connection.clone()))
                .await?;
            tracing::debug!(
                "Bridge {} ({}) <-> {} ({}): {:.3}",
                connection.claim_a,
                connection.domain_a,
                connection.claim_b,
                connection.domain_b,
                connection.similarity
            );
        }
        Ok(connections)
    }

    /// Embedding coverage and provider details
    pub async fn embedding_stats(&self) -> Result<EmbeddingStats, SemanticError> {
        let all = ClaimQuery::default();
        let total_claims = self
            .batch
            .retry
            .run("claim count", || self.store.count(&all))
            .await?;
        let with_query = ClaimQuery {
            embedding: EmbeddingFilter::Present,
            ..Default::default()
        };
        let with_embeddings = self
            .batch
            .retry
            .run("claim count", || self.store.count(&with_query))
            .await?;

        Ok(EmbeddingStats {
            total_claims,
            with_embeddings,
            without_embeddings: total_claims.saturating_sub(with_embeddings),
            model_name: self.provider.model_name().to_string(),
            dimension: self.provider.dimension(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage() {
        let stats = EmbeddingStats {
            total_claims: 4,
            with_embeddings: 3,
            without_embeddings: 1,
            model_name: "feature-hash-8".to_string(),
            dimension: 8,
        };
        assert_eq!(stats.coverage(), 0.75);

        let empty = EmbeddingStats {
            total_claims: 0,
            with_embeddings: 0,
            without_embeddings: 0,
            ..stats
        };
        assert_eq!(empty.coverage(), 0.0);
    }
}
