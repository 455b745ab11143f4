//! HNSW candidate generation
//!
//! Wraps `hnsw_rs` for the approximate index strategy. The graph only proposes
//! candidates; every reported similarity is recomputed exactly by the caller,
//! so HNSW distance values never leave this module.
//!
//! # Parameters
//!
//! - **M**: bi-directional links per node. Higher M = better recall, more memory
//! - **efConstruction**: candidate list while building. Higher = better graph, slower build
//! - **efSearch**: candidate list while querying. Higher = better recall, slower queries

use crate::config::HnswParams;
use hnsw_rs::prelude::*;

const MAX_LAYERS: usize = 16;

/// HNSW graph over positions of an entry table
pub(crate) struct HnswGraph {
    hnsw: Hnsw<'static, f32, DistCosine>,
    ef_search: usize,
    len: usize,
}

impl HnswGraph {
    /// Build a graph from `(position, vector)` pairs
    ///
    /// Vectors must be non-zero; cosine distance is undefined otherwise.
    pub(crate) fn build<'v>(
        vectors: impl IntoIterator<Item = (usize, &'v Vec<f32>)>,
        capacity: usize,
        params: &HnswParams,
    ) -> Self {
        let max_elements = capacity.max(1);
        let nb_layer = MAX_LAYERS.min((max_elements as f32).ln().trunc() as usize).max(1);

        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            params.max_connections,
            max_elements,
            nb_layer,
            params.ef_construction,
            DistCosine {},
        );

        let mut len = 0;
        for (position, vector) in vectors {
            hnsw.insert((vector, position));
            len += 1;
        }
        tracing::debug!("Built HNSW graph over {} vectors ({} layers)", len, nb_layer);

        Self {
            hnsw,
            ef_search: params.ef_search,
            len,
        }
    }

    /// Positions of up to `k` approximate nearest neighbours of `query`
    pub(crate) fn candidates(&self, query: &[f32], k: usize) -> Vec<usize> {
        if self.len == 0 || k == 0 {
            return Vec::new();
        }
        self.hnsw
            .search(query, k.min(self.len), self.ef_search.max(k))
            .into_iter()
            .map(|neighbour| neighbour.d_id)
            .collect()
    }

    /// Vectors in the graph
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_candidate_is_exact_match() {
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.7071, 0.7071, 0.0],
        ];
        let graph = HnswGraph::build(vectors.iter().enumerate(), vectors.len(), &HnswParams::default());
        assert_eq!(graph.len(), 3);

        let found = graph.candidates(&[1.0, 0.0, 0.0], 3);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], 0);
        assert_eq!(found[1], 2);
    }

    #[test]
    fn test_empty_graph() {
        let graph = HnswGraph::build(std::iter::empty(), 0, &HnswParams::default());
        assert!(graph.candidates(&[1.0, 0.0], 5).is_empty());
    }
}
