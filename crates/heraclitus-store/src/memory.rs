//! In-memory [`ClaimStore`] implementation
//!
//! Claims live in a `BTreeMap` keyed by id (the arena); every relation is an id.
//! Each collection sits behind its own `RwLock`, and no lock is held across an
//! await point, so single-row writes are atomic.

use async_trait::async_trait;
use heraclitus_domain::traits::{ClaimQuery, ClaimStore};
use heraclitus_domain::{
    Claim, ClaimId, Connection, ReplicationEvent, StoreError, TemporalPattern,
};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{PoisonError, RwLock};

/// In-memory store for tests and short-lived runs
#[derive(Default)]
pub struct InMemoryStore {
    claims: RwLock<BTreeMap<ClaimId, Claim>>,
    patterns: RwLock<Vec<TemporalPattern>>,
    connections: RwLock<Vec<Connection>>,
    events: RwLock<Vec<ReplicationEvent>>,
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with claims
    pub fn with_claims(claims: impl IntoIterator<Item = Claim>) -> Self {
        let store = Self::new();
        if let Ok(mut table) = store.claims.write() {
            for mut claim in claims {
                claim.version = 1;
                table.insert(claim.id, claim);
            }
        }
        store
    }

    /// Number of stored claims
    pub fn len(&self) -> usize {
        self.claims.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether the store holds no claims
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ClaimStore for InMemoryStore {
    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError> {
        let claims = self.claims.read().map_err(poisoned)?;
        Ok(claims.get(&id).cloned())
    }

    async fn put(&self, mut claim: Claim) -> Result<(), StoreError> {
        let mut claims = self.claims.write().map_err(poisoned)?;
        claim.version = claims.get(&claim.id).map(|c| c.version).unwrap_or(0) + 1;
        claims.insert(claim.id, claim);
        Ok(())
    }

    async fn compare_and_put(&self, mut claim: Claim) -> Result<(), StoreError> {
        let mut claims = self.claims.write().map_err(poisoned)?;
        let stored = claims.get(&claim.id).ok_or(StoreError::NotFound(claim.id))?;

        if stored.version != claim.version {
            return Err(StoreError::Conflict {
                id: claim.id,
                expected: claim.version,
            });
        }

        claim.version += 1;
        claims.insert(claim.id, claim);
        Ok(())
    }

    async fn scan(&self, query: &ClaimQuery) -> Result<Vec<Claim>, StoreError> {
        let claims = self.claims.read().map_err(poisoned)?;
        let lower = match query.after_id {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };

        let matching = claims
            .range((lower, Bound::Unbounded))
            .map(|(_, claim)| claim)
            .filter(|claim| query.matches(claim))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(matching)
    }

    async fn put_embedding(&self, id: ClaimId, embedding: Vec<f32>) -> Result<(), StoreError> {
        let mut claims = self.claims.write().map_err(poisoned)?;
        let claim = claims.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        claim.embedding = Some(embedding);
        claim.version += 1;
        Ok(())
    }

    async fn insert_pattern(&self, pattern: TemporalPattern) -> Result<(), StoreError> {
        self.patterns.write().map_err(poisoned)?.push(pattern);
        Ok(())
    }

    async fn patterns(&self) -> Result<Vec<TemporalPattern>, StoreError> {
        Ok(self.patterns.read().map_err(poisoned)?.clone())
    }

    async fn insert_connection(&self, connection: Connection) -> Result<(), StoreError> {
        let mut connections = self.connections.write().map_err(poisoned)?;
        let exists = connections
            .iter()
            .any(|c| c.claim_a == connection.claim_a && c.claim_b == connection.claim_b);
        if !exists {
            connections.push(connection);
        }
        Ok(())
    }

    async fn connections(&self) -> Result<Vec<Connection>, StoreError> {
        Ok(self.connections.read().map_err(poisoned)?.clone())
    }

    async fn invalidate_connection(&self, a: ClaimId, b: ClaimId) -> Result<(), StoreError> {
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        let mut connections = self.connections.write().map_err(poisoned)?;
        let connection = connections
            .iter_mut()
            .find(|c| c.claim_a == a && c.claim_b == b)
            .ok_or(StoreError::ConnectionNotFound(a, b))?;
        connection.invalidated = true;
        Ok(())
    }

    async fn append_replication_event(&self, event: ReplicationEvent) -> Result<(), StoreError> {
        self.events.write().map_err(poisoned)?.push(event);
        Ok(())
    }

    async fn replication_events(&self, since: u64) -> Result<Vec<ReplicationEvent>, StoreError> {
        let mut events: Vec<_> = self
            .events
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|e| e.recorded_at >= since)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.recorded_at);
        Ok(events)
    }
}
