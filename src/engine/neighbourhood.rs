use super::topk::{top_k, SimilarUser};
use crate::config::NeighbourhoodPolicy;

/// Picks the K most similar users out of a similarity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighbourhoodSelector {
    k: usize,
    policy: NeighbourhoodPolicy,
}

impl NeighbourhoodSelector {
    /// Creates a selector keeping `k` neighbours under `policy`.
    pub fn new(k: usize, policy: NeighbourhoodPolicy) -> Self {
        Self { k, policy }
    }

    /// Selected neighbours, most similar first, or `None` when the user is
    /// excluded (short of `k` under the strict policy, or no candidates at all).
    pub fn select<I>(&self, row: I) -> Option<Vec<SimilarUser>>
    where
        I: IntoIterator<Item = SimilarUser>,
    {
        let kept = top_k(row, self.k);
        let qualifies = match self.policy {
            NeighbourhoodPolicy::Strict => kept.len() == self.k,
            NeighbourhoodPolicy::UpTo => !kept.is_empty(),
        };
        qualifies.then_some(kept)
    }
}
