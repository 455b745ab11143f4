//! Optimistic read-modify-write of a single claim

use crate::{BatchError, RetryPolicy};
use heraclitus_domain::traits::ClaimStore;
use heraclitus_domain::{Claim, ClaimId, StoreError, ValidationError};

/// Read a claim, apply `mutate`, and write it back only if it did not change
///
/// `mutate` returns `Ok(false)` to leave the claim untouched (the function then
/// returns `Ok(None)`). On a version conflict the claim is re-read and `mutate`
/// applied again, up to `max_conflicts` times. Transient store errors on each
/// call are retried per `retry`.
///
/// Returns the claim as written, with its new version.
pub async fn update_claim<S, F>(
    store: &S,
    id: ClaimId,
    retry: &RetryPolicy,
    max_conflicts: u32,
    mut mutate: F,
) -> Result<Option<Claim>, BatchError>
where
    S: ClaimStore + ?Sized,
    F: FnMut(&mut Claim) -> Result<bool, ValidationError>,
{
    let mut conflicts = 0;

    loop {
        let mut claim = retry
            .run("claim read", || store.get(id))
            .await?
            .ok_or(StoreError::NotFound(id))?;

        if !mutate(&mut claim)? {
            return Ok(None);
        }

        match retry
            .run("claim write", || store.compare_and_put(claim.clone()))
            .await
        {
            Ok(()) => {
                claim.version += 1;
                return Ok(Some(claim));
            }
            Err(e) if e.is_conflict() && conflicts < max_conflicts => {
                conflicts += 1;
                tracing::debug!("Version conflict on claim {} (retry {}/{})", id, conflicts, max_conflicts);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use heraclitus_domain::traits::ClaimQuery;
    use heraclitus_domain::{
        ClaimType, Connection, DomainSet, ReplicationEvent, TemporalPattern,
    };
    use heraclitus_store::InMemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn claim(id: u64) -> Claim {
        Claim::new(
            ClaimId::from_value(id),
            "Plate tectonics drives continental drift",
            ClaimType::Theoretical,
            DomainSet::new(["geology"]).unwrap(),
            0.9,
            0,
        )
        .unwrap()
    }

    /// Store that interleaves a competing write before the first N writes
    struct ContendedStore {
        inner: InMemoryStore,
        interfere: AtomicU32,
    }

    #[async_trait]
    impl ClaimStore for ContendedStore {
        async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError> {
            self.inner.get(id).await
        }
        async fn put(&self, claim: Claim) -> Result<(), StoreError> {
            self.inner.put(claim).await
        }
        async fn compare_and_put(&self, claim: Claim) -> Result<(), StoreError> {
            if self.interfere.load(Ordering::SeqCst) > 0 {
                self.interfere.fetch_sub(1, Ordering::SeqCst);
                let mut rival = self.inner.get(claim.id).await?.ok_or(StoreError::NotFound(claim.id))?;
                rival.citation_count += 100;
                self.inner.put(rival).await?;
            }
            self.inner.compare_and_put(claim).await
        }
        async fn scan(&self, query: &ClaimQuery) -> Result<Vec<Claim>, StoreError> {
            self.inner.scan(query).await
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

    fn contended(interfere: u32) -> ContendedStore {
        ContendedStore {
            inner: InMemoryStore::with_claims([claim(1)]),
            interfere: AtomicU32::new(interfere),
        }
    }

    #[tokio::test]
    async fn test_update_applies_mutation() {
        let store = InMemoryStore::with_claims([claim(1)]);
        let updated = update_claim(&store, ClaimId::from_value(1), &RetryPolicy::none(), 3, |c| {
            c.current_confidence = 0.5;
            Ok(true)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.version, 2);
        let stored = store.get(ClaimId::from_value(1)).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_conflict_reapplies_on_fresh_copy() {
        let store = contended(2);
        let updated = update_claim(&store, ClaimId::from_value(1), &RetryPolicy::none(), 3, |c| {
            c.replication_count += 1;
            Ok(true)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.replication_count, 1);
        assert_eq!(updated.citation_count, 200);
    }

    #[tokio::test]
    async fn test_conflicts_past_bound_are_reported() {
        let store = contended(5);
        let err = update_claim(&store, ClaimId::from_value(1), &RetryPolicy::none(), 2, |_| Ok(true))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Store(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_skip_and_not_found() {
        let store = InMemoryStore::with_claims([claim(1)]);
        let skipped = update_claim(&store, ClaimId::from_value(1), &RetryPolicy::none(), 3, |_| Ok(false))
            .await
            .unwrap();
        assert!(skipped.is_none());

        let err = update_claim(&store, ClaimId::from_value(2), &RetryPolicy::none(), 3, |_| Ok(true))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_validation_error_propagates() {
        let store = InMemoryStore::with_claims([claim(1)]);
        let err = update_claim(&store, ClaimId::from_value(1), &RetryPolicy::none(), 3, |c| {
            Err(ValidationError::SelfSupersession(c.id))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, BatchError::Validation(_)));
    }
}
