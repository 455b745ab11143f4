//! SQLite-backed [`ClaimStore`]
//!
//! Claim rows carry a `version` column; every write goes through an immediate
//! transaction that reads the stored version first, so `compare_and_put` holds
//! across processes sharing the database file. Domain tags live in their own
//! table so `ClaimQuery::domain` filters in SQL. Embeddings are little-endian
//! `f32` BLOBs.

use async_trait::async_trait;
use heraclitus_domain::traits::{ClaimQuery, ClaimStore, EmbeddingFilter, ScanPage};
use heraclitus_domain::time::SECONDS_PER_DAY;
use heraclitus_domain::{
    Claim, ClaimId, ClaimStatus, ClaimType, Connection, DomainSet, PatternId, PatternType,
    ReplicationEvent, ReplicationOutcome, ReplicationStatus, StoreError, TemporalPattern,
};
use rusqlite::{params, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const CLAIM_COLUMNS: &str = "id, text, claim_type, original_confidence, current_confidence, \
     first_seen, last_confirmed, last_cited, confidence_updated_at, replication_status, \
     replication_count, partial_replication_count, failed_replication_count, citation_count, \
     status, superseded_by, embedding, version";

/// SQLite-based implementation of ClaimStore
///
/// # Thread Safety
///
/// The connection sits behind a `Mutex`; calls are serialised within a process
/// and the lock is never held across an await point.
pub struct SqliteStore {
    conn: Mutex<rusqlite::Connection>,
}

/// Map a rusqlite error onto the store error taxonomy
fn db_err(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            StoreError::Transient(err.to_string())
        }
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            StoreError::InvalidData(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn to_sql_int(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("Value {} exceeds SQLite integer range", value)))
}

fn from_sql_int(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("Negative value {} in unsigned column", value)))
}

/// Serialise an embedding as little-endian `f32` bytes
fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`vec_to_blob`]
fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>, StoreError> {
    if blob.len() % 4 != 0 {
        return Err(StoreError::InvalidData(format!(
            "Embedding blob length {} is not a multiple of 4",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn domains_to_json(domains: &DomainSet) -> Result<String, StoreError> {
    let tags: Vec<&str> = domains.iter().collect();
    serde_json::to_string(&tags).map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn domains_from_json(json: &str) -> Result<DomainSet, StoreError> {
    let tags: Vec<String> =
        serde_json::from_str(json).map_err(|e| StoreError::InvalidData(e.to_string()))?;
    DomainSet::new(tags).map_err(|e| StoreError::InvalidData(e.to_string()))
}

/// id, type, domain, description, confidence, novelty, claims json, start, detected
type PatternRow = (Vec<u8>, String, String, String, f64, f64, String, i64, i64);

/// Raw column values of a claim row, decoded after the statement completes
struct ClaimRow {
    id: i64,
    text: String,
    claim_type: String,
    original_confidence: f64,
    current_confidence: f64,
    first_seen: i64,
    last_confirmed: Option<i64>,
    last_cited: Option<i64>,
    confidence_updated_at: Option<i64>,
    replication_status: String,
    replication_count: i64,
    partial_replication_count: i64,
    failed_replication_count: i64,
    citation_count: i64,
    status: String,
    superseded_by: Option<i64>,
    embedding: Option<Vec<u8>>,
    version: i64,
}

impl ClaimRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            claim_type: row.get(2)?,
            original_confidence: row.get(3)?,
            current_confidence: row.get(4)?,
            first_seen: row.get(5)?,
            last_confirmed: row.get(6)?,
            last_cited: row.get(7)?,
            confidence_updated_at: row.get(8)?,
            replication_status: row.get(9)?,
            replication_count: row.get(10)?,
            partial_replication_count: row.get(11)?,
            failed_replication_count: row.get(12)?,
            citation_count: row.get(13)?,
            status: row.get(14)?,
            superseded_by: row.get(15)?,
            embedding: row.get(16)?,
            version: row.get(17)?,
        })
    }

    fn into_claim(self, tags: Vec<String>) -> Result<Claim, StoreError> {
        let id = ClaimId::from_value(from_sql_int(self.id)?);
        let count = |v: i64| {
            u32::try_from(v).map_err(|_| StoreError::InvalidData(format!("Bad counter {} on claim {}", v, id)))
        };
        let opt = |v: Option<i64>| v.map(from_sql_int).transpose();

        Ok(Claim {
            id,
            text: self.text,
            claim_type: ClaimType::parse(&self.claim_type).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown claim type: {}", self.claim_type))
            })?,
            domains: DomainSet::new(tags)
                .map_err(|e| StoreError::InvalidData(format!("Claim {}: {}", id, e)))?,
            original_confidence: self.original_confidence,
            current_confidence: self.current_confidence,
            first_seen: from_sql_int(self.first_seen)?,
            last_confirmed: opt(self.last_confirmed)?,
            last_cited: opt(self.last_cited)?,
            confidence_updated_at: opt(self.confidence_updated_at)?,
            replication_status: ReplicationStatus::parse(&self.replication_status).ok_or_else(
                || StoreError::InvalidData(format!("Unknown replication status: {}", self.replication_status)),
            )?,
            replication_count: count(self.replication_count)?,
            partial_replication_count: count(self.partial_replication_count)?,
            failed_replication_count: count(self.failed_replication_count)?,
            citation_count: from_sql_int(self.citation_count)?,
            status: ClaimStatus::parse(&self.status).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown claim status: {}", self.status))
            })?,
            superseded_by: opt(self.superseded_by)?.map(ClaimId::from_value),
            embedding: self.embedding.as_deref().map(blob_to_vec).transpose()?,
            version: from_sql_int(self.version)?,
        })
    }
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use heraclitus_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("heraclitus.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path).map_err(db_err)?;
        conn.busy_timeout(std::time::Duration::from_secs(5)).map_err(db_err)?;
        let store = Self { conn: Mutex::new(conn) };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.lock()?.execute_batch(schema).map_err(db_err)?;
        tracing::debug!("Claim store schema initialized");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("SQLite connection lock poisoned".to_string()))
    }

    fn load_domains(conn: &rusqlite::Connection, id: i64) -> Result<Vec<String>, StoreError> {
        let mut stmt = conn
            .prepare_cached("SELECT domain FROM claim_domains WHERE claim_id = ?1 ORDER BY domain")
            .map_err(db_err)?;
        let tags = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(tags)
    }

    fn stored_version(tx: &Transaction<'_>, id: i64) -> Result<Option<u64>, StoreError> {
        let version: Option<i64> = tx
            .query_row("SELECT version FROM claims WHERE id = ?1", params![id], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        version.map(from_sql_int).transpose()
    }

    /// Write every column of `claim` with the given version, replacing domains
    fn write_claim(tx: &Transaction<'_>, claim: &Claim, version: u64) -> Result<(), StoreError> {
        let id = to_sql_int(claim.id.value())?;
        let opt = |v: Option<u64>| v.map(to_sql_int).transpose();

        tx.execute(
            &format!(
                "INSERT INTO claims ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                 ON CONFLICT(id) DO UPDATE SET
                 text = excluded.text, claim_type = excluded.claim_type,
                 original_confidence = excluded.original_confidence,
                 current_confidence = excluded.current_confidence,
                 first_seen = excluded.first_seen, last_confirmed = excluded.last_confirmed,
                 last_cited = excluded.last_cited,
                 confidence_updated_at = excluded.confidence_updated_at,
                 replication_status = excluded.replication_status,
                 replication_count = excluded.replication_count,
                 partial_replication_count = excluded.partial_replication_count,
                 failed_replication_count = excluded.failed_replication_count,
                 citation_count = excluded.citation_count, status = excluded.status,
                 superseded_by = excluded.superseded_by, embedding = excluded.embedding,
                 version = excluded.version",
                CLAIM_COLUMNS
            ),
            params![
                id,
                &claim.text,
                claim.claim_type.as_str(),
                claim.original_confidence,
                claim.current_confidence,
                to_sql_int(claim.first_seen)?,
                opt(claim.last_confirmed)?,
                opt(claim.last_cited)?,
                opt(claim.confidence_updated_at)?,
                claim.replication_status.as_str(),
                claim.replication_count,
                claim.partial_replication_count,
                claim.failed_replication_count,
                to_sql_int(claim.citation_count)?,
                claim.status.as_str(),
                opt(claim.superseded_by.map(|s| s.value()))?,
                claim.embedding.as_deref().map(vec_to_blob),
                to_sql_int(version)?,
            ],
        )
        .map_err(db_err)?;

        tx.execute("DELETE FROM claim_domains WHERE claim_id = ?1", params![id])
            .map_err(db_err)?;
        for tag in claim.domains.iter() {
            tx.execute(
                "INSERT INTO claim_domains (claim_id, domain) VALUES (?1, ?2)",
                params![id, tag],
            )
            .map_err(db_err)?;
        }
        Ok(())
    }

    fn read_pattern(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatternRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
        ))
    }
}

#[async_trait]
impl ClaimStore for SqliteStore {
    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError> {
        let conn = self.lock()?;
        let key = to_sql_int(id.value())?;

        let row = conn
            .query_row(
                &format!("SELECT {} FROM claims WHERE id = ?1", CLAIM_COLUMNS),
                params![key],
                ClaimRow::read,
            )
            .optional()
            .map_err(db_err)?;

        match row {
            Some(row) => {
                let tags = Self::load_domains(&conn, key)?;
                Ok(Some(row.into_claim(tags)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, claim: Claim) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;
        let previous = Self::stored_version(&tx, to_sql_int(claim.id.value())?)?;
        Self::write_claim(&tx, &claim, previous.unwrap_or(0) + 1)?;
        tx.commit().map_err(db_err)
    }

    async fn compare_and_put(&self, claim: Claim) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        match Self::stored_version(&tx, to_sql_int(claim.id.value())?)? {
            None => return Err(StoreError::NotFound(claim.id)),
            Some(stored) if stored != claim.version => {
                return Err(StoreError::Conflict {
                    id: claim.id,
                    expected: claim.version,
                })
            }
            Some(_) => {}
        }

        Self::write_claim(&tx, &claim, claim.version + 1)?;
        tx.commit().map_err(db_err)
    }

    async fn scan(&self, query: &ClaimQuery) -> Result<Vec<Claim>, StoreError> {
        let page = self.scan_page(query).await?;
        for (id, err) in &page.malformed {
            tracing::warn!("Skipping malformed claim row {}: {}", id, err);
        }
        Ok(page.claims)
    }

    async fn scan_page(&self, query: &ClaimQuery) -> Result<ScanPage, StoreError> {
        let mut sql = format!("SELECT {} FROM claims WHERE 1=1", CLAIM_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(domain) = &query.domain {
            sql.push_str(" AND id IN (SELECT claim_id FROM claim_domains WHERE domain = ?)");
            params.push(Box::new(domain.clone()));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        match query.embedding {
            EmbeddingFilter::Any => {}
            EmbeddingFilter::Present => sql.push_str(" AND embedding IS NOT NULL"),
            EmbeddingFilter::Missing => sql.push_str(" AND embedding IS NULL"),
        }

        if let Some(from) = query.first_seen_from {
            sql.push_str(" AND first_seen >= ?");
            params.push(Box::new(to_sql_int(from)?));
        }

        if let Some(until) = query.first_seen_until {
            sql.push_str(" AND first_seen <= ?");
            params.push(Box::new(to_sql_int(until)?));
        }

        if let Some(max) = query.max_confidence {
            sql.push_str(" AND current_confidence < ?");
            params.push(Box::new(max));
        }

        if let Some(day) = query.not_recomputed_on_day {
            sql.push_str(" AND (confidence_updated_at IS NULL OR confidence_updated_at / ? != ?)");
            params.push(Box::new(SECONDS_PER_DAY as i64));
            params.push(Box::new(to_sql_int(day)?));
        }

        if let Some(after) = query.after_id {
            sql.push_str(" AND id > ?");
            params.push(Box::new(to_sql_int(after.value())?));
        }

        sql.push_str(" ORDER BY id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        // The id column is read on its own so a row with an undecodable column
        // is still attributable.
        let rows = stmt
            .query_map(&param_refs[..], |row| Ok((row.get::<_, i64>(0)?, ClaimRow::read(row))))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        let mut page = ScanPage::default();
        for (raw_id, row) in rows {
            let id = ClaimId::from_value(from_sql_int(raw_id)?);
            let decoded = row
                .map_err(db_err)
                .and_then(|row| {
                    let tags = Self::load_domains(&conn, raw_id)?;
                    row.into_claim(tags)
                });

            match decoded {
                Ok(claim) => page.claims.push(claim),
                Err(err @ StoreError::InvalidData(_)) => page.malformed.push((id, err)),
                Err(err) => return Err(err),
            }
        }
        Ok(page)
    }

    async fn count(&self, query: &ClaimQuery) -> Result<usize, StoreError> {
        if query.domain.is_none()
            && query.status.is_none()
            && query.first_seen_from.is_none()
            && query.first_seen_until.is_none()
            && query.max_confidence.is_none()
            && query.not_recomputed_on_day.is_none()
            && query.after_id.is_none()
            && query.limit.is_none()
        {
            let sql = match query.embedding {
                EmbeddingFilter::Any => "SELECT COUNT(*) FROM claims",
                EmbeddingFilter::Present => "SELECT COUNT(*) FROM claims WHERE embedding IS NOT NULL",
                EmbeddingFilter::Missing => "SELECT COUNT(*) FROM claims WHERE embedding IS NULL",
            };
            let count: i64 = self
                .lock()?
                .query_row(sql, [], |row| row.get(0))
                .map_err(db_err)?;
            return Ok(from_sql_int(count)? as usize);
        }
        Ok(self.scan_page(query).await?.rows())
    }

    async fn put_embedding(&self, id: ClaimId, embedding: Vec<f32>) -> Result<(), StoreError> {
        let changed = self
            .lock()?
            .execute(
                "UPDATE claims SET embedding = ?1, version = version + 1 WHERE id = ?2",
                params![vec_to_blob(&embedding), to_sql_int(id.value())?],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn insert_pattern(&self, pattern: TemporalPattern) -> Result<(), StoreError> {
        let claims: Vec<u64> = pattern.claims_involved.iter().map(|c| c.value()).collect();
        let claims_json =
            serde_json::to_string(&claims).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        self.lock()?
            .execute(
                "INSERT INTO patterns (id, pattern_type, domain, description, confidence, novelty_score,
                 claims_involved, start_date, detected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    pattern.id.value().to_be_bytes().to_vec(),
                    pattern.pattern_type.as_str(),
                    &pattern.domain,
                    &pattern.description,
                    pattern.confidence,
                    pattern.novelty_score,
                    claims_json,
                    to_sql_int(pattern.start_date)?,
                    to_sql_int(pattern.detected_at)?,
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    async fn patterns(&self) -> Result<Vec<TemporalPattern>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, pattern_type, domain, description, confidence, novelty_score,
                 claims_involved, start_date, detected_at
                 FROM patterns ORDER BY detected_at ASC, id ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], Self::read_pattern)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        rows.into_iter()
            .map(|(id, kind, domain, description, confidence, novelty, claims, start, detected)| {
                let id: [u8; 16] = id.as_slice().try_into().map_err(|_| {
                    StoreError::InvalidData(format!("Expected 16 bytes for PatternId, got {}", id.len()))
                })?;
                let claims: Vec<u64> = serde_json::from_str(&claims)
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?;

                Ok(TemporalPattern {
                    id: PatternId::from_value(u128::from_be_bytes(id)),
                    pattern_type: PatternType::parse(&kind).ok_or_else(|| {
                        StoreError::InvalidData(format!("Unknown pattern type: {}", kind))
                    })?,
                    domain,
                    description,
                    confidence,
                    novelty_score: novelty,
                    claims_involved: claims.into_iter().map(ClaimId::from_value).collect(),
                    start_date: from_sql_int(start)?,
                    detected_at: from_sql_int(detected)?,
                })
            })
            .collect()
    }

    async fn insert_connection(&self, connection: Connection) -> Result<(), StoreError> {
        self.lock()?
            .execute(
                "INSERT OR IGNORE INTO connections
                 (claim_a, claim_b, domain_a, domain_b, similarity, discovered_at, invalidated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    to_sql_int(connection.claim_a.value())?,
                    to_sql_int(connection.claim_b.value())?,
                    domains_to_json(&connection.domain_a)?,
                    domains_to_json(&connection.domain_b)?,
                    connection.similarity,
                    to_sql_int(connection.discovered_at)?,
                    connection.invalidated,
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    async fn connections(&self) -> Result<Vec<Connection>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT claim_a, claim_b, domain_a, domain_b, similarity, discovered_at, invalidated
                 FROM connections ORDER BY claim_a, claim_b",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, bool>(6)?,
                ))
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        rows.into_iter()
            .map(|(a, b, domain_a, domain_b, similarity, discovered, invalidated)| {
                Ok(Connection {
                    claim_a: ClaimId::from_value(from_sql_int(a)?),
                    claim_b: ClaimId::from_value(from_sql_int(b)?),
                    domain_a: domains_from_json(&domain_a)?,
                    domain_b: domains_from_json(&domain_b)?,
                    similarity,
                    discovered_at: from_sql_int(discovered)?,
                    invalidated,
                })
            })
            .collect()
    }

    async fn invalidate_connection(&self, a: ClaimId, b: ClaimId) -> Result<(), StoreError> {
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        let changed = self
            .lock()?
            .execute(
                "UPDATE connections SET invalidated = 1 WHERE claim_a = ?1 AND claim_b = ?2",
                params![to_sql_int(a.value())?, to_sql_int(b.value())?],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(StoreError::ConnectionNotFound(a, b));
        }
        Ok(())
    }

    async fn append_replication_event(&self, event: ReplicationEvent) -> Result<(), StoreError> {
        self.lock()?
            .execute(
                "INSERT INTO replication_events (claim_id, outcome, resulting_status, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    to_sql_int(event.claim_id.value())?,
                    event.outcome.as_str(),
                    event.resulting_status.as_str(),
                    to_sql_int(event.recorded_at)?,
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    async fn replication_events(&self, since: u64) -> Result<Vec<ReplicationEvent>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT claim_id, outcome, resulting_status, recorded_at
                 FROM replication_events WHERE recorded_at >= ?1
                 ORDER BY recorded_at ASC, seq ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![to_sql_int(since)?], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        rows.into_iter()
            .map(|(claim_id, outcome, status, recorded_at)| {
                Ok(ReplicationEvent {
                    claim_id: ClaimId::from_value(from_sql_int(claim_id)?),
                    outcome: ReplicationOutcome::parse(&outcome).ok_or_else(|| {
                        StoreError::InvalidData(format!("Unknown replication outcome: {}", outcome))
                    })?,
                    resulting_status: ReplicationStatus::parse(&status).ok_or_else(|| {
                        StoreError::InvalidData(format!("Unknown replication status: {}", status))
                    })?,
                    recorded_at: from_sql_int(recorded_at)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_blob_roundtrip() {
        let v = vec![0.5f32, -1.25, 3.0];
        assert_eq!(blob_to_vec(&vec_to_blob(&v)).unwrap(), v);
        assert!(blob_to_vec(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_integer_range_checks() {
        assert_eq!(to_sql_int(42).unwrap(), 42);
        assert!(to_sql_int(u64::MAX).is_err());
        assert!(from_sql_int(-1).is_err());
    }

    #[test]
    fn test_busy_maps_to_transient() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(db_err(err).is_transient());
    }
}
