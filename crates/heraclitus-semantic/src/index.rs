//! In-memory similarity index over claim embeddings

use crate::config::{HnswParams, IndexStrategy};
use crate::hnsw::HnswGraph;
use crate::similarity::{cosine_similarity, has_norm};
use heraclitus_domain::{Claim, ClaimId, DomainSet};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Claim fields the index needs
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedClaim {
    /// Claim id
    pub id: ClaimId,
    /// Claim text
    pub text: String,
    /// Domain tags
    pub domains: DomainSet,
    /// Stored embedding
    pub embedding: Vec<f32>,
}

/// A scored neighbour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// Neighbour claim
    pub id: ClaimId,
    /// Exact cosine similarity to the query
    pub similarity: f64,
}

/// A scored unordered pair, `a < b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPair {
    /// Lower id
    pub a: ClaimId,
    /// Higher id
    pub b: ClaimId,
    /// Exact cosine similarity
    pub similarity: f64,
}

/// Descending similarity, then ascending id
fn rank_neighbours(x: &Neighbour, y: &Neighbour) -> Ordering {
    y.similarity.total_cmp(&x.similarity).then(x.id.cmp(&y.id))
}

/// Descending similarity, then ascending `(a, b)`
fn rank_pairs(x: &ScoredPair, y: &ScoredPair) -> Ordering {
    y.similarity
        .total_cmp(&x.similarity)
        .then((x.a, x.b).cmp(&(y.a, y.b)))
}

/// Owns the vectors of one operation and answers nearest-neighbour queries
///
/// Entries are kept in ascending id order. Only vectors of the index dimension
/// are admitted. With [`IndexStrategy::Approximate`] an HNSW graph proposes
/// candidates, which are then rescored exactly and ranked by the same rule as the
/// exact strategy.
pub struct SimilarityIndex {
    dimension: usize,
    entries: Vec<IndexedClaim>,
    graph: Option<HnswGraph>,
    candidates: usize,
}

impl SimilarityIndex {
    /// Build an index from claims carrying embeddings
    ///
    /// Claims without an embedding or with a vector of another dimension are
    /// left out.
    pub fn build(
        dimension: usize,
        claims: impl IntoIterator<Item = Claim>,
        strategy: IndexStrategy,
        params: &HnswParams,
    ) -> Self {
        let mut entries: Vec<IndexedClaim> = Vec::new();
        let mut skipped = 0usize;

        for claim in claims {
            match claim.embedding {
                Some(embedding) if embedding.len() == dimension => entries.push(IndexedClaim {
                    id: claim.id,
                    text: claim.text,
                    domains: claim.domains,
                    embedding,
                }),
                Some(_) => skipped += 1,
                None => {}
            }
        }
        if skipped > 0 {
            tracing::warn!("Left {} embeddings of the wrong dimension out of the index", skipped);
        }
        entries.sort_by_key(|e| e.id);
        entries.dedup_by_key(|e| e.id);

        let graph = match strategy {
            IndexStrategy::Exact => None,
            IndexStrategy::Approximate => Some(HnswGraph::build(
                entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| has_norm(&e.embedding))
                    .map(|(position, e)| (position, &e.embedding)),
                entries.len(),
                params,
            )),
        };

        Self {
            dimension,
            entries,
            graph,
            candidates: params.candidates,
        }
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed claims
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no claims
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidate generation strategy in use
    pub fn strategy(&self) -> IndexStrategy {
        if self.graph.is_some() {
            IndexStrategy::Approximate
        } else {
            IndexStrategy::Exact
        }
    }

    /// Indexed claim by id
    pub fn get(&self, id: ClaimId) -> Option<&IndexedClaim> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|position| &self.entries[position])
    }

    /// Positions worth scoring against `query`
    fn candidate_positions(&self, query: &[f32], k: usize) -> Vec<usize> {
        match &self.graph {
            Some(graph) => graph.candidates(query, k.max(self.candidates)),
            None => (0..self.entries.len()).collect(),
        }
    }

    /// Top `k` neighbours of `query` that pass `keep`
    ///
    /// Ranked by descending similarity, then ascending id.
    pub fn nearest<F>(&self, query: &[f32], k: usize, keep: F) -> Vec<Neighbour>
    where
        F: Fn(&IndexedClaim) -> bool,
    {
        if k == 0 || query.len() != self.dimension {
            return Vec::new();
        }

        let mut scored: Vec<Neighbour> = self
            .candidate_positions(query, k)
            .into_iter()
            .filter_map(|position| self.entries.get(position))
            .filter(|entry| keep(entry))
            .map(|entry| Neighbour {
                id: entry.id,
                similarity: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(rank_neighbours);
        scored.truncate(k);
        scored
    }

    /// Top `limit` pairs with disjoint domains and similarity at least `threshold`
    ///
    /// Ranked by descending similarity, then ascending `(a, b)`.
    pub fn cross_domain_pairs(&self, threshold: f64, limit: usize) -> Vec<ScoredPair> {
        if limit == 0 {
            return Vec::new();
        }

        let mut pairs: BTreeMap<(ClaimId, ClaimId), f64> = BTreeMap::new();
        let mut consider = |x: &IndexedClaim, y: &IndexedClaim| {
            if x.id == y.id || !x.domains.is_disjoint(&y.domains) {
                return;
            }
            let key = if x.id < y.id { (x.id, y.id) } else { (y.id, x.id) };
            if pairs.contains_key(&key) {
                return;
            }
            let similarity = cosine_similarity(&x.embedding, &y.embedding);
            if similarity >= threshold {
                pairs.insert(key, similarity);
            }
        };

        match &self.graph {
            None => {
                for (i, x) in self.entries.iter().enumerate() {
                    for y in &self.entries[i + 1..] {
                        consider(x, y);
                    }
                }
            }
            Some(graph) => {
                for x in &self.entries {
                    if !has_norm(&x.embedding) {
                        continue;
                    }
                    for position in graph.candidates(&x.embedding, self.candidates) {
                        if let Some(y) = self.entries.get(position) {
                            consider(x, y);
                        }
                    }
                }
            }
        }

        let mut ranked: Vec<ScoredPair> = pairs
            .into_iter()
            .map(|((a, b), similarity)| ScoredPair { a, b, similarity })
            .collect();
        ranked.sort_by(rank_pairs);
        ranked.truncate(limit);
        ranked
    }
}
