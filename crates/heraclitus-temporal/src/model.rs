//! Store-backed temporal confidence model

use crate::lifecycle::recompute;
use crate::paradigm::ShiftDetector;
use crate::replication::apply_outcome;
use crate::{TemporalConfig, TemporalError, TemporalState, TemporalStats};
use heraclitus_batch::{
    update_claim, BatchConfig, BatchCoordinator, BatchOutcome, BatchReport, CancellationToken, ClaimBatches,
    ItemError,
};
use heraclitus_domain::time::{day_index, days_before};
use heraclitus_domain::traits::{ClaimQuery, ClaimStore};
use heraclitus_domain::{
    Claim, ClaimId, ClaimStatus, ReplicationEvent, ReplicationOutcome, ReplicationStatus, TemporalPattern,
    ValidationError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Decays, boosts and reclassifies claims held in a [`ClaimStore`]
///
/// Every single-claim mutation is an optimistic read-modify-write, so a
/// replication recorded while `decay_all_claims` is running is never lost.
pub struct TemporalConfidenceModel<S: ClaimStore + ?Sized> {
    store: Arc<S>,
    config: Arc<TemporalConfig>,
    batch: BatchConfig,
}

impl<S: ClaimStore + ?Sized + 'static> TemporalConfidenceModel<S> {
    /// Create a model over `store`
    pub fn new(store: Arc<S>, config: TemporalConfig, batch: BatchConfig) -> Result<Self, TemporalError> {
        config.validate()?;
        batch.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
            batch,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &TemporalConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn mutate<F>(&self, id: ClaimId, mutate: F) -> Result<Claim, TemporalError>
    where
        F: FnMut(&mut Claim) -> Result<bool, ValidationError>,
    {
        update_claim(
            self.store.as_ref(),
            id,
            &self.batch.retry,
            self.batch.max_conflict_retries,
            mutate,
        )
        .await?
        .ok_or(TemporalError::NotFound(id))
    }

    async fn load(&self, id: ClaimId) -> Result<Claim, TemporalError> {
        self.batch
            .retry
            .run("claim read", || self.store.get(id))
            .await?
            .ok_or(TemporalError::NotFound(id))
    }

    async fn collect(&self, query: ClaimQuery) -> Result<Vec<Claim>, TemporalError> {
        let mut batches =
            ClaimBatches::new(self.store.clone(), query, self.batch.batch_size)?.with_retry(self.batch.retry);
        let mut claims = Vec::new();
        while let Some(batch) = batches.next_batch().await? {
            claims.extend(batch);
        }
        Ok(claims)
    }

    /// Reject supersession links that would close a cycle
    ///
    /// Reads the chain one claim at a time, so the answer can be stale by the
    /// time a link is written.
    async fn check_supersession(&self, claim: ClaimId, target: ClaimId) -> Result<(), TemporalError> {
        if claim == target {
            return Err(ValidationError::SelfSupersession(claim).into());
        }

        let mut visited = BTreeSet::new();
        let mut next = Some(target);
        while let Some(current) = next {
            if current == claim {
                return Err(ValidationError::SupersessionCycle { claim, target }.into());
            }
            if !visited.insert(current) {
                break;
            }
            next = match self.batch.retry.run("claim read", || self.store.get(current)).await? {
                Some(successor) => successor.superseded_by,
                None => None,
            };
        }
        Ok(())
    }

    /// Recompute confidence and status of every claim not yet recomputed today
    ///
    /// Idempotent within a UTC day: a second call with a `now` on the same day
    /// finds nothing to do. Per-claim failures are tallied in the report.
    pub async fn decay_all_claims(
        &self,
        now: u64,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, TemporalError> {
        let day = day_index(now);
        let query = ClaimQuery {
            not_recomputed_on_day: Some(day),
            ..Default::default()
        };
        let batches =
            ClaimBatches::new(self.store.clone(), query, self.batch.batch_size)?.with_retry(self.batch.retry);

        let report = BatchCoordinator::new(&self.batch)
            .run("decay_all_claims", batches, cancel, |claims| {
                let store = self.store.clone();
                let config = self.config.clone();
                let retry = self.batch.retry;
                let max_conflicts = self.batch.max_conflict_retries;

                async move {
                    let mut outcome = BatchOutcome::new();
                    for claim in claims {
                        let id = claim.id;
                        let result = update_claim(store.as_ref(), id, &retry, max_conflicts, |c| {
                            if c.confidence_updated_at.map(day_index) == Some(day) {
                                return Ok(false);
                            }
                            c.validate()?;
                            recompute(c, now, &config);
                            Ok(true)
                        })
                        .await;

                        match result {
                            Ok(Some(_)) => outcome.record_success(),
                            Ok(None) => outcome.record_skip(),
                            Err(e) => outcome.record_error(ItemError::from_batch(id, &e)),
                        }
                    }
                    outcome
                }
            })
            .await?;

        Ok(report)
    }

    /// Record a replication attempt and recompute the claim's confidence
    ///
    /// `partial` wins over `success`; neither flag means a failed replication.
    pub async fn record_replication(
        &self,
        id: ClaimId,
        success: bool,
        partial: bool,
        now: u64,
    ) -> Result<TemporalState, TemporalError> {
        let outcome = ReplicationOutcome::from_flags(success, partial);
        let mut previous = ReplicationStatus::Unreplicated;

        let claim = self
            .mutate(id, |c| {
                previous = c.replication_status;
                apply_outcome(c, outcome, now, &self.config);
                recompute(c, now, &self.config);
                Ok(true)
            })
            .await?;

        let event = ReplicationEvent {
            claim_id: id,
            outcome,
            resulting_status: claim.replication_status,
            recorded_at: now,
        };
        self.batch
            .retry
            .run("replication event append", || self.store.append_replication_event(event.clone()))
            .await?;

        tracing::info!(
            "Recorded {} replication for claim {}: {} -> {} (confidence {:.3})",
            outcome,
            id,
            previous,
            claim.replication_status,
            claim.current_confidence
        );
        Ok(TemporalState::project(claim, now, &self.config))
    }

    /// Set the replication status directly
    ///
    /// The only way out of `disputed`.
    pub async fn override_replication_status(
        &self,
        id: ClaimId,
        status: ReplicationStatus,
        now: u64,
    ) -> Result<TemporalState, TemporalError> {
        let claim = self
            .mutate(id, |c| {
                c.replication_status = status;
                recompute(c, now, &self.config);
                Ok(true)
            })
            .await?;

        tracing::info!("Replication status of claim {} overridden to {}", id, status);
        Ok(TemporalState::project(claim, now, &self.config))
    }

    /// Count one citation of the claim
    pub async fn record_citation(&self, id: ClaimId, now: u64) -> Result<TemporalState, TemporalError> {
        let claim = self
            .mutate(id, |c| {
                c.citation_count = c.citation_count.saturating_add(1);
                c.last_cited = Some(now);
                recompute(c, now, &self.config);
                Ok(true)
            })
            .await?;

        tracing::debug!("Citation recorded for claim {} (total {})", id, claim.citation_count);
        Ok(TemporalState::project(claim, now, &self.config))
    }

    /// Mark `id` as superseded by `successor`
    pub async fn supersede(
        &self,
        id: ClaimId,
        successor: ClaimId,
        now: u64,
    ) -> Result<TemporalState, TemporalError> {
        if id == successor {
            return Err(ValidationError::SelfSupersession(id).into());
        }
        self.load(successor).await?;
        self.check_supersession(id, successor).await?;

        let mut previous = None;
        let claim = self
            .mutate(id, |c| {
                previous = c.superseded_by;
                c.superseded_by = Some(successor);
                recompute(c, now, &self.config);
                Ok(true)
            })
            .await?;

        // The check above is not atomic with the write
        if let Err(err) = self.check_supersession(id, successor).await {
            tracing::warn!("Backing out supersession of {} by {}: {}", id, successor, err);
            update_claim(
                self.store.as_ref(),
                id,
                &self.batch.retry,
                self.batch.max_conflict_retries,
                |c| {
                    if c.superseded_by != Some(successor) {
                        return Ok(false);
                    }
                    c.superseded_by = previous;
                    recompute(c, now, &self.config);
                    Ok(true)
                },
            )
            .await?;
            return Err(err);
        }

        tracing::info!("Claim {} superseded by {}", id, successor);
        Ok(TemporalState::project(claim, now, &self.config))
    }

    /// Retract a claim; retraction is never undone by recomputation
    pub async fn retract(&self, id: ClaimId, now: u64) -> Result<TemporalState, TemporalError> {
        let claim = self
            .mutate(id, |c| {
                c.status = ClaimStatus::Retracted;
                recompute(c, now, &self.config);
                Ok(true)
            })
            .await?;

        tracing::info!("Claim {} retracted", id);
        Ok(TemporalState::project(claim, now, &self.config))
    }

    /// Validate and store a new or re-ingested claim
    ///
    /// Confidence and status are derived at `now`; a claim naming a successor is
    /// stored as superseded.
    pub async fn register_claim(&self, mut claim: Claim, now: u64) -> Result<Claim, TemporalError> {
        claim.validate()?;
        if let Some(target) = claim.superseded_by {
            self.check_supersession(claim.id, target).await?;
        }
        recompute(&mut claim, now, &self.config);

        let id = claim.id;
        self.batch
            .retry
            .run("claim write", || self.store.put(claim.clone()))
            .await?;

        tracing::debug!("Registered claim {} ({})", id, claim.claim_type);
        self.load(id).await
    }

    /// Stored fields plus derived temporal values at `now`
    pub async fn get_temporal_state(&self, id: ClaimId, now: u64) -> Result<TemporalState, TemporalError> {
        let claim = self.load(id).await?;
        Ok(TemporalState::project(claim, now, &self.config))
    }

    /// Claims at least `min_age_days` old with stored confidence below `max_confidence`
    ///
    /// Ordered by descending age, then ascending confidence, then ascending id.
    pub async fn get_aging_claims(
        &self,
        min_age_days: u64,
        max_confidence: f64,
        now: u64,
    ) -> Result<Vec<TemporalState>, TemporalError> {
        if !(0.0..=1.0).contains(&max_confidence) {
            return Err(ValidationError::ConfidenceOutOfRange {
                field: "max_confidence",
                value: max_confidence,
            }
            .into());
        }

        let query = ClaimQuery {
            first_seen_until: Some(days_before(now, min_age_days)),
            max_confidence: Some(max_confidence),
            ..Default::default()
        };
        let mut states: Vec<TemporalState> = self
            .collect(query)
            .await?
            .into_iter()
            .filter(|claim| claim.age_days(now) >= min_age_days)
            .map(|claim| TemporalState::project(claim, now, &self.config))
            .collect();

        states.sort_by(|a, b| {
            b.age_days
                .cmp(&a.age_days)
                .then(a.claim.current_confidence.total_cmp(&b.claim.current_confidence))
                .then(a.claim.id.cmp(&b.claim.id))
        });
        Ok(states)
    }

    /// Detect and persist paradigm-shift patterns in the trailing window
    pub async fn detect_paradigm_shifts(
        &self,
        window_days: u64,
        now: u64,
    ) -> Result<Vec<TemporalPattern>, TemporalError> {
        if window_days == 0 {
            return Err(ValidationError::InvalidArgument("window_days must be positive".to_string()).into());
        }

        let detector = ShiftDetector::new(&self.config, window_days, now);
        let window_claims = self
            .collect(ClaimQuery {
                first_seen_from: Some(detector.window_start()),
                first_seen_until: Some(now),
                ..Default::default()
            })
            .await?;

        let mut patterns = detector.confidence_collapses(&window_claims);

        let events = self
            .batch
            .retry
            .run("replication event scan", || self.store.replication_events(detector.window_start()))
            .await?;

        let mut claims: BTreeMap<ClaimId, Claim> = window_claims.into_iter().map(|c| (c.id, c)).collect();
        for event in &events {
            if claims.contains_key(&event.claim_id) {
                continue;
            }
            if let Some(claim) = self.batch.retry.run("claim read", || self.store.get(event.claim_id)).await? {
                claims.insert(claim.id, claim);
            }
        }

        let superseding: BTreeSet<ClaimId> = self
            .collect(ClaimQuery {
                status: Some(ClaimStatus::Superseded),
                ..Default::default()
            })
            .await?
            .into_iter()
            .filter_map(|c| c.superseded_by)
            .collect();

        patterns.extend(detector.replication_crises(&events, &claims, &superseding));

        for pattern in &patterns {
            self.batch
                .retry
                .run("pattern insert", || self.store.insert_pattern(pattern.clone()))
                .await?;
        }

        tracing::info!(
            "Paradigm-shift detection over {} days found {} patterns",
            window_days,
            patterns.len()
        );
        Ok(patterns)
    }

    /// Replication, lifecycle and age distributions of the stored corpus
    pub async fn temporal_stats(&self, now: u64) -> Result<TemporalStats, TemporalError> {
        let mut stats = TemporalStats::new();
        let mut batches = ClaimBatches::new(self.store.clone(), ClaimQuery::default(), self.batch.batch_size)?
            .with_retry(self.batch.retry);
        while let Some(batch) = batches.next_batch().await? {
            for claim in &batch {
                stats.record(claim, now);
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heraclitus_domain::time::SECONDS_PER_DAY;
    use heraclitus_domain::{ClaimType, DomainSet};
    use heraclitus_store::InMemoryStore;

    const DAY: u64 = SECONDS_PER_DAY;

    fn claim(id: u64, original: f64) -> Claim {
        Claim::new(
            ClaimId::from_value(id),
            format!("claim {}", id),
            ClaimType::Empirical,
            DomainSet::new(["biology"]).unwrap(),
            original,
            0,
        )
        .unwrap()
    }

    fn model(claims: Vec<Claim>) -> TemporalConfidenceModel<InMemoryStore> {
        TemporalConfidenceModel::new(
            Arc::new(InMemoryStore::with_claims(claims)),
            TemporalConfig::default(),
            BatchConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_supersession_rejects_self_unknown_and_cycles() {
        let model = model(vec![claim(1, 0.8), claim(2, 0.8), claim(3, 0.8)]);
        let one = ClaimId::from_value(1);
        let two = ClaimId::from_value(2);
        let three = ClaimId::from_value(3);

        assert!(matches!(
            model.supersede(one, one, DAY).await,
            Err(TemporalError::Validation(ValidationError::SelfSupersession(_)))
        ));
        assert!(matches!(
            model.supersede(one, ClaimId::from_value(99), DAY).await,
            Err(TemporalError::NotFound(id)) if id.value() == 99
        ));

        model.supersede(one, two, DAY).await.unwrap();
        model.supersede(two, three, DAY).await.unwrap();
        assert!(matches!(
            model.supersede(three, one, DAY).await,
            Err(TemporalError::Validation(ValidationError::SupersessionCycle { .. }))
        ));

        let state = model.get_temporal_state(one, DAY).await.unwrap();
        assert_eq!(state.claim.status, ClaimStatus::Superseded);
        assert_eq!(state.claim.superseded_by, Some(two));
    }

    #[tokio::test]
    async fn test_retraction_is_sticky() {
        let model = model(vec![claim(1, 0.8)]);
        let id = ClaimId::from_value(1);
        model.retract(id, DAY).await.unwrap();
        model.record_citation(id, 2 * DAY).await.unwrap();
        model.decay_all_claims(3 * DAY, &CancellationToken::new()).await.unwrap();

        let state = model.get_temporal_state(id, 3 * DAY).await.unwrap();
        assert_eq!(state.claim.status, ClaimStatus::Retracted);
        assert_eq!(state.claim.citation_count, 1);
        assert_eq!(state.claim.last_cited, Some(2 * DAY));
    }

    #[tokio::test]
    async fn test_override_leaves_disputed() {
        let model = model(vec![claim(1, 0.8)]);
        let id = ClaimId::from_value(1);
        for _ in 0..3 {
            model.record_replication(id, false, false, DAY).await.unwrap();
        }
        let state = model.get_temporal_state(id, DAY).await.unwrap();
        assert_eq!(state.claim.replication_status, ReplicationStatus::Disputed);

        let state = model
            .override_replication_status(id, ReplicationStatus::Partial, DAY)
            .await
            .unwrap();
        assert_eq!(state.claim.replication_status, ReplicationStatus::Partial);
        // Failure count still exceeds the threshold, so the ceiling holds
        assert!(state.claim.current_confidence <= 0.2);
    }

    #[tokio::test]
    async fn test_register_claim_derives_confidence() {
        let model = model(vec![]);
        let mut fresh = claim(5, 0.8);
        fresh.current_confidence = 0.1;
        let stored = model.register_claim(fresh, 730 * DAY).await.unwrap();
        assert!((stored.current_confidence - 0.4).abs() < 1e-9);
        assert_eq!(stored.confidence_updated_at, Some(730 * DAY));

        let mut self_ref = claim(6, 0.8);
        self_ref.superseded_by = Some(ClaimId::from_value(6));
        assert!(matches!(
            model.register_claim(self_ref, DAY).await,
            Err(TemporalError::Validation(ValidationError::SelfSupersession(_)))
        ));
    }

    #[tokio::test]
    async fn test_citations_slow_decay() {
        let model = model(vec![claim(1, 0.8), claim(2, 0.8)]);
        let cited = ClaimId::from_value(1);
        let now = 365 * DAY;
        for _ in 0..30 {
            model.record_citation(cited, now).await.unwrap();
        }
        model.decay_all_claims(now, &CancellationToken::new()).await.unwrap();

        let cited = model.get_temporal_state(cited, now).await.unwrap();
        let plain = model.get_temporal_state(ClaimId::from_value(2), now).await.unwrap();
        assert_eq!(cited.claim.citation_count, 30);
        assert_eq!(cited.claim.last_cited, Some(now));
        assert!(cited.citation_velocity > 0.0);
        assert!(cited.claim.current_confidence > plain.claim.current_confidence);
        assert!(cited.claim.current_confidence < 0.8);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let model = model(vec![]);
        let id = ClaimId::from_value(404);
        assert!(matches!(model.record_replication(id, true, false, DAY).await, Err(TemporalError::NotFound(_))));
        assert!(matches!(model.record_citation(id, DAY).await, Err(TemporalError::NotFound(_))));
        assert!(matches!(model.get_temporal_state(id, DAY).await, Err(TemporalError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_aging_query_rejects_bad_threshold() {
        let model = model(vec![]);
        assert!(matches!(
            model.get_aging_claims(10, 1.5, DAY).await,
            Err(TemporalError::Validation(ValidationError::ConfidenceOutOfRange { .. }))
        ));
    }
}
