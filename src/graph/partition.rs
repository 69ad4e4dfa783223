//! Balanced k-way graph partitioning.

use super::csr::CsrGraph;

/// Failures of the partitioning step. The caller keeps its old routing
/// table on any of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    #[error("co-access graph has no vertices")]
    GraphEmpty,
    #[error("cannot split {vertices} vertices into {parts} parts")]
    TooFewVertices { vertices: usize, parts: usize },
    #[error("partitioner failed: {0}")]
    PartitionerFailed(String),
}

/// Balanced k-way partitioner over a CSR graph.
///
/// Implementations must return one part id in `[0, parts)` per vertex,
/// minimizing cut edge weight subject to vertex-weight balance. The trait
/// is the seam for plugging in an external partitioning library.
pub trait Partitioner: Send + Sync {
    fn partition(&self, graph: &CsrGraph, parts: usize) -> Result<Vec<usize>, PartitionError>;
}

/// Deterministic greedy placement.
///
/// Vertices are placed heaviest first; each goes to the part holding the
/// most edge weight toward its already-placed neighbors, subject to a
/// balance cap. Ties break toward the lighter part, then the lower part id,
/// so identical graphs always partition identically.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyPartitioner;

impl Partitioner for GreedyPartitioner {
    fn partition(&self, graph: &CsrGraph, parts: usize) -> Result<Vec<usize>, PartitionError> {
        let n = graph.vertex_count();
        if n == 0 {
            return Err(PartitionError::GraphEmpty);
        }
        if parts == 0 {
            return Err(PartitionError::PartitionerFailed(
                "part count must be positive".to_string(),
            ));
        }
        if parts > n {
            return Err(PartitionError::TooFewVertices { vertices: n, parts });
        }

        let total_weight: u64 = graph.vwgt().iter().sum();
        let max_weight = graph.vwgt().iter().copied().max().unwrap_or(0);
        // The heaviest vertex must fit under the cap on its own.
        let cap = total_weight
            .div_ceil(parts as u64)
            .max(max_weight)
            .max(1);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            graph
                .vertex_weight(b)
                .cmp(&graph.vertex_weight(a))
                .then(a.cmp(&b))
        });

        const UNASSIGNED: usize = usize::MAX;
        let mut assignment = vec![UNASSIGNED; n];
        let mut loads = vec![0u64; parts];
        let mut scores = vec![0u64; parts];

        for &v in &order {
            scores.iter_mut().for_each(|s| *s = 0);
            for (u, w) in graph.neighbors(v) {
                if assignment[u] != UNASSIGNED {
                    scores[assignment[u]] += w;
                }
            }

            let weight = graph.vertex_weight(v);
            let mut best: Option<usize> = None;
            for p in 0..parts {
                if loads[p] + weight > cap {
                    continue;
                }
                best = Some(match best {
                    None => p,
                    Some(q) => {
                        if scores[p] > scores[q]
                            || (scores[p] == scores[q] && loads[p] < loads[q])
                        {
                            p
                        } else {
                            q
                        }
                    }
                });
            }
            // All parts at the cap: spill to the lightest one.
            let part = best.unwrap_or_else(|| {
                (0..parts)
                    .min_by_key(|&p| (loads[p], p))
                    .unwrap_or(0)
            });

            assignment[v] = part;
            loads[part] += weight;
        }

        Ok(assignment)
    }
}
