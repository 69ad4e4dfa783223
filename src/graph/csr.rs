//! Compressed-sparse-row view of the co-access graph.

use super::access::AccessGraph;
use super::partition::PartitionError;

/// CSR adjacency structure handed to the k-way partitioner.
///
/// Vertices get dense indices in sorted-key order, so the same graph always
/// produces the same CSR. The adjacency is symmetric: every undirected edge
/// appears in both endpoints' rows. For vertex `i`,
/// `adjncy[xadj[i]..xadj[i + 1]]` lists neighbors in ascending index order
/// with matching weights in `adjwgt`.
#[derive(Debug)]
pub struct CsrGraph {
    xadj: Vec<usize>,
    adjncy: Vec<usize>,
    adjwgt: Vec<u64>,
    vwgt: Vec<u64>,
    idx_to_key: Vec<String>,
}

impl CsrGraph {
    /// Converts an access graph, failing on an empty one.
    pub fn from_graph(graph: &AccessGraph) -> Result<Self, PartitionError> {
        if graph.vertex_count() == 0 {
            return Err(PartitionError::GraphEmpty);
        }

        let mut idx_to_key: Vec<String> = graph.vertices().keys().cloned().collect();
        idx_to_key.sort();

        let mut key_to_idx = std::collections::HashMap::with_capacity(idx_to_key.len());
        for (idx, key) in idx_to_key.iter().enumerate() {
            key_to_idx.insert(key.as_str(), idx);
        }

        let vwgt: Vec<u64> = idx_to_key
            .iter()
            .map(|key| graph.vertex_weight(key))
            .collect();

        // Symmetric adjacency: each edge contributes to both endpoints.
        let mut neighbors: Vec<Vec<(usize, u64)>> = vec![Vec::new(); idx_to_key.len()];
        for ((a, b), weight) in graph.edges() {
            let (Some(&i), Some(&j)) = (key_to_idx.get(a.as_str()), key_to_idx.get(b.as_str()))
            else {
                continue;
            };
            neighbors[i].push((j, *weight));
            neighbors[j].push((i, *weight));
        }

        let mut xadj = Vec::with_capacity(idx_to_key.len() + 1);
        let mut adjncy = Vec::new();
        let mut adjwgt = Vec::new();
        xadj.push(0);
        for row in &mut neighbors {
            row.sort_by_key(|(idx, _)| *idx);
            for (idx, weight) in row.iter() {
                adjncy.push(*idx);
                adjwgt.push(*weight);
            }
            xadj.push(adjncy.len());
        }

        Ok(Self {
            xadj,
            adjncy,
            adjwgt,
            vwgt,
            idx_to_key,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.idx_to_key.len()
    }

    pub fn edge_entry_count(&self) -> usize {
        self.adjncy.len()
    }

    /// Key for a dense vertex index.
    pub fn key(&self, idx: usize) -> &str {
        &self.idx_to_key[idx]
    }

    pub fn vertex_weight(&self, idx: usize) -> u64 {
        self.vwgt[idx]
    }

    pub fn xadj(&self) -> &[usize] {
        &self.xadj
    }

    pub fn adjncy(&self) -> &[usize] {
        &self.adjncy
    }

    pub fn adjwgt(&self) -> &[u64] {
        &self.adjwgt
    }

    pub fn vwgt(&self) -> &[u64] {
        &self.vwgt
    }

    /// Neighbors of vertex `idx` with edge weights.
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        (self.xadj[idx]..self.xadj[idx + 1]).map(move |e| (self.adjncy[e], self.adjwgt[e]))
    }

    /// Consumes the CSR, handing back the index-to-key table.
    pub fn into_keys(self) -> Vec<String> {
        self.idx_to_key
    }
}
