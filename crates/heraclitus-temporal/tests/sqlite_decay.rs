//! Decay over the SQLite store when some rows cannot be decoded

use heraclitus_batch::{BatchConfig, CancellationToken, ItemErrorKind};
use heraclitus_domain::time::SECONDS_PER_DAY;
use heraclitus_domain::traits::ClaimStore;
use heraclitus_domain::{Claim, ClaimId, ClaimType, DomainSet};
use heraclitus_store::SqliteStore;
use heraclitus_temporal::{TemporalConfidenceModel, TemporalConfig};
use std::sync::Arc;

const DAY: u64 = SECONDS_PER_DAY;

fn claim(id: u64) -> Claim {
    Claim::new(
        ClaimId::from_value(id),
        format!("Finding number {}", id),
        ClaimType::Empirical,
        DomainSet::new(["oncology"]).unwrap(),
        0.8,
        0,
    )
    .unwrap()
}

#[tokio::test]
async fn test_decay_skips_undecodable_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claims.db");
    let store = Arc::new(SqliteStore::new(&path).unwrap());
    for id in 1..=3 {
        store.put(claim(id)).await.unwrap();
    }

    let raw = rusqlite::Connection::open(&path).unwrap();
    raw.execute("UPDATE claims SET claim_type = 'rumour' WHERE id = 2", [])
        .unwrap();
    drop(raw);

    let model =
        TemporalConfidenceModel::new(store.clone(), TemporalConfig::default(), BatchConfig::default()).unwrap();
    let report = model
        .decay_all_claims(400 * DAY, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.errors[0].claim_id, Some(ClaimId::from_value(2)));
    assert_eq!(report.errors[0].kind, ItemErrorKind::Malformed);
    assert_eq!(report.cursor, Some(ClaimId::from_value(3)));

    for id in [1, 3] {
        let stored = store.get(ClaimId::from_value(id)).await.unwrap().unwrap();
        assert_eq!(stored.confidence_updated_at, Some(400 * DAY));
        assert!(stored.current_confidence < 0.8);
    }
}

#[tokio::test]
async fn test_decay_with_only_undecodable_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claims.db");
    let store = Arc::new(SqliteStore::new(&path).unwrap());
    store.put(claim(1)).await.unwrap();

    let raw = rusqlite::Connection::open(&path).unwrap();
    raw.execute("UPDATE claims SET replication_status = 'pending' WHERE id = 1", [])
        .unwrap();
    drop(raw);

    let model = TemporalConfidenceModel::new(store, TemporalConfig::default(), BatchConfig::default()).unwrap();
    let report = model
        .decay_all_claims(30 * DAY, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.batches_completed, 0);
    assert_eq!(report.errors_by_kind()[&ItemErrorKind::Malformed], 1);
}
