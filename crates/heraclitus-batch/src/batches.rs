//! Lazy, restartable iteration over claim batches

use crate::{ItemError, ItemErrorKind, RetryPolicy};
use heraclitus_domain::traits::{ClaimQuery, ClaimStore};
use heraclitus_domain::{Claim, ClaimId, StoreError, ValidationError};
use std::sync::Arc;

/// Keyset-paginated batches of claims matching a query
///
/// Each call to [`next_batch`](Self::next_batch) scans the store for claims with
/// an id greater than the cursor, so the iterator holds no open cursor and can be
/// resumed from any previously returned id. Claims written concurrently behind
/// the cursor are not revisited.
///
/// Rows the store cannot decode are stepped over and held as
/// [`ItemErrorKind::Malformed`] errors until [`take_malformed`](Self::take_malformed).
pub struct ClaimBatches<S: ClaimStore + ?Sized> {
    store: Arc<S>,
    query: ClaimQuery,
    batch_size: usize,
    remaining: Option<usize>,
    cursor: Option<ClaimId>,
    retry: RetryPolicy,
    exhausted: bool,
    malformed: Vec<ItemError>,
}

impl<S: ClaimStore + ?Sized> ClaimBatches<S> {
    /// Iterate claims matching `query` in batches of `batch_size`
    ///
    /// `after_id` and `limit` on the query are replaced by the iterator's own
    /// cursor and limit.
    pub fn new(store: Arc<S>, query: ClaimQuery, batch_size: usize) -> Result<Self, ValidationError> {
        if batch_size == 0 {
            return Err(ValidationError::InvalidArgument(
                "batch_size must be positive".to_string(),
            ));
        }

        let cursor = query.after_id;
        Ok(Self {
            store,
            query: ClaimQuery {
                after_id: None,
                limit: None,
                ..query
            },
            batch_size,
            remaining: None,
            cursor,
            retry: RetryPolicy::default(),
            exhausted: false,
            malformed: Vec::new(),
        })
    }

    /// Stop after `limit` claims in total
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.remaining = limit;
        self
    }

    /// Retry policy for the underlying scans
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Start after `id` (resume a previous run)
    pub fn resume_after(mut self, id: Option<ClaimId>) -> Self {
        self.cursor = id;
        self
    }

    /// Id of the last row read, decoded or not
    pub fn cursor(&self) -> Option<ClaimId> {
        self.cursor
    }

    /// Drain the rows skipped as malformed since the last call
    pub fn take_malformed(&mut self) -> Vec<ItemError> {
        std::mem::take(&mut self.malformed)
    }

    /// Fetch the next batch, or `None` when the query or limit is exhausted
    ///
    /// Malformed rows count toward the limit. A page holding only malformed rows
    /// is stepped over, so a returned batch is never empty.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Claim>>, StoreError> {
        loop {
            if self.exhausted {
                return Ok(None);
            }

            let size = match self.remaining {
                Some(0) => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Some(remaining) => remaining.min(self.batch_size),
                None => self.batch_size,
            };

            let query = ClaimQuery {
                after_id: self.cursor,
                limit: Some(size),
                ..self.query.clone()
            };

            let store = &self.store;
            let page = self.retry.run("claim batch scan", || store.scan_page(&query)).await?;
            let rows = page.rows();

            if rows < size {
                self.exhausted = true;
            }
            if let Some(last) = page.last_id() {
                self.cursor = Some(last);
            }
            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= rows;
            }

            for (id, err) in page.malformed {
                tracing::warn!("Skipping malformed claim row {}: {}", id, err);
                self.malformed
                    .push(ItemError::new(id, ItemErrorKind::Malformed, err.to_string()));
            }

            if page.claims.is_empty() {
                continue;
            }

            tracing::debug!(
                "Fetched batch of {} claims (cursor {:?})",
                page.claims.len(),
                self.cursor
            );
            return Ok(Some(page.claims));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use heraclitus_domain::traits::{EmbeddingFilter, ScanPage};
    use heraclitus_domain::{ClaimType, Connection, DomainSet, ReplicationEvent, TemporalPattern};
    use heraclitus_store::InMemoryStore;

    fn store_with(n: u64) -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::with_claims((1..=n).map(|i| {
            Claim::new(
                ClaimId::from_value(i),
                format!("claim {}", i),
                ClaimType::Observational,
                DomainSet::new(["geology"]).unwrap(),
                0.5,
                0,
            )
            .unwrap()
        })))
    }

    fn ids(batch: &[Claim]) -> Vec<u64> {
        batch.iter().map(|c| c.id.value()).collect()
    }

    #[tokio::test]
    async fn test_batches_cover_all_claims_in_order() {
        let mut batches = ClaimBatches::new(store_with(7), ClaimQuery::default(), 3).unwrap();

        assert_eq!(ids(&batches.next_batch().await.unwrap().unwrap()), vec![1, 2, 3]);
        assert_eq!(ids(&batches.next_batch().await.unwrap().unwrap()), vec![4, 5, 6]);
        assert_eq!(ids(&batches.next_batch().await.unwrap().unwrap()), vec![7]);
        assert!(batches.next_batch().await.unwrap().is_none());
        assert_eq!(batches.cursor(), Some(ClaimId::from_value(7)));
    }

    #[tokio::test]
    async fn test_limit_truncates_last_batch() {
        let mut batches = ClaimBatches::new(store_with(10), ClaimQuery::default(), 4)
            .unwrap()
            .with_limit(Some(6));

        assert_eq!(batches.next_batch().await.unwrap().unwrap().len(), 4);
        assert_eq!(batches.next_batch().await.unwrap().unwrap().len(), 2);
        assert!(batches.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resume_after_cursor() {
        let store = store_with(5);
        let mut first = ClaimBatches::new(store.clone(), ClaimQuery::default(), 2).unwrap();
        first.next_batch().await.unwrap();
        let cursor = first.cursor();

        let mut resumed = ClaimBatches::new(store, ClaimQuery::default(), 10)
            .unwrap()
            .resume_after(cursor);
        assert_eq!(ids(&resumed.next_batch().await.unwrap().unwrap()), vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_filter_is_applied() {
        let store = store_with(4);
        store.put_embedding(ClaimId::from_value(2), vec![1.0]).await.unwrap();

        let query = ClaimQuery { embedding: EmbeddingFilter::Missing, ..Default::default() };
        let mut batches = ClaimBatches::new(store, query, 10).unwrap();
        assert_eq!(ids(&batches.next_batch().await.unwrap().unwrap()), vec![1, 3, 4]);
    }

    /// Store whose rows for `corrupt` ids fail to decode
    struct CorruptRows {
        inner: Arc<InMemoryStore>,
        corrupt: Vec<u64>,
    }

    #[async_trait]
    impl ClaimStore for CorruptRows {
        async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError> {
            self.inner.get(id).await
        }
        async fn put(&self, claim: Claim) -> Result<(), StoreError> {
            self.inner.put(claim).await
        }
        async fn compare_and_put(&self, claim: Claim) -> Result<(), StoreError> {
            self.inner.compare_and_put(claim).await
        }
        async fn scan(&self, query: &ClaimQuery) -> Result<Vec<Claim>, StoreError> {
            Ok(self.scan_page(query).await?.claims)
        }
        async fn scan_page(&self, query: &ClaimQuery) -> Result<ScanPage, StoreError> {
            let mut page = ScanPage::default();
            for claim in self.inner.scan(query).await? {
                if self.corrupt.contains(&claim.id.value()) {
                    let err = StoreError::InvalidData("Unknown claim type: rumour".to_string());
                    page.malformed.push((claim.id, err));
                } else {
                    page.claims.push(claim);
                }
            }
            Ok(page)
        }
        async fn put_embedding(&self, id: ClaimId, embedding: Vec<f32>) -> Result<(), StoreError> {
            self.inner.put_embedding(id, embedding).await
        }
        async fn insert_pattern(&self, pattern: TemporalPattern) -> Result<(), StoreError> {
            self.inner.insert_pattern(pattern).await
        }
        async fn patterns(&self) -> Result<Vec<TemporalPattern>, StoreError> {
            self.inner.patterns().await
        }
        async fn insert_connection(&self, connection: Connection) -> Result<(), StoreError> {
            self.inner.insert_connection(connection).await
        }
        async fn connections(&self) -> Result<Vec<Connection>, StoreError> {
            self.inner.connections().await
        }
        async fn invalidate_connection(&self, a: ClaimId, b: ClaimId) -> Result<(), StoreError> {
            self.inner.invalidate_connection(a, b).await
        }
        async fn append_replication_event(&self, event: ReplicationEvent) -> Result<(), StoreError> {
            self.inner.append_replication_event(event).await
        }
        async fn replication_events(&self, since: u64) -> Result<Vec<ReplicationEvent>, StoreError> {
            self.inner.replication_events(since).await
        }
    }

    #[tokio::test]
    async fn test_malformed_rows_are_stepped_over() {
        let store = Arc::new(CorruptRows { inner: store_with(6), corrupt: vec![2, 3, 4] });
        let mut batches = ClaimBatches::new(store, ClaimQuery::default(), 2).unwrap();

        assert_eq!(ids(&batches.next_batch().await.unwrap().unwrap()), vec![1]);
        assert_eq!(batches.cursor(), Some(ClaimId::from_value(2)));

        // The page holding 3 and 4 decodes nothing and does not end the scan
        assert_eq!(ids(&batches.next_batch().await.unwrap().unwrap()), vec![5, 6]);
        assert!(batches.next_batch().await.unwrap().is_none());

        let malformed = batches.take_malformed();
        let skipped: Vec<u64> = malformed.iter().filter_map(|e| e.claim_id).map(|id| id.value()).collect();
        assert_eq!(skipped, vec![2, 3, 4]);
        assert!(malformed.iter().all(|e| e.kind == ItemErrorKind::Malformed));
        assert!(batches.take_malformed().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_rows_count_toward_limit() {
        let store = Arc::new(CorruptRows { inner: store_with(10), corrupt: vec![1] });
        let mut batches = ClaimBatches::new(store, ClaimQuery::default(), 10)
            .unwrap()
            .with_limit(Some(4));

        assert_eq!(ids(&batches.next_batch().await.unwrap().unwrap()), vec![2, 3, 4]);
        assert!(batches.next_batch().await.unwrap().is_none());
        assert_eq!(batches.take_malformed().len(), 1);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(ClaimBatches::new(store_with(1), ClaimQuery::default(), 0).is_err());
    }
}
