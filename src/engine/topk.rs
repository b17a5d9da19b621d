use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::model::{PlaceId, UserId};

/// Another user's similarity to the row owner.
///
/// Ordering puts the most similar user first: higher Jaccard index, then the
/// lower user id. Jaccard values are compared as exact fractions.
#[derive(Debug, Clone, Copy)]
pub struct SimilarUser {
    /// The other user.
    pub user: UserId,
    /// Places both users visited.
    pub intersection: u32,
    /// Places either user visited.
    pub union: u32,
}

impl SimilarUser {
    /// Creates an entry from overlap counts; `intersection <= union`, `union > 0`.
    pub fn new(user: UserId, intersection: u32, union: u32) -> Self {
        debug_assert!(intersection <= union && union > 0);
        Self {
            user,
            intersection,
            union,
        }
    }

    /// Jaccard index `intersection / union`.
    pub fn jaccard(&self) -> f64 {
        f64::from(self.intersection) / f64::from(self.union)
    }

    fn cmp_similarity(&self, other: &Self) -> Ordering {
        let lhs = u64::from(self.intersection) * u64::from(other.union);
        let rhs = u64::from(other.intersection) * u64::from(self.union);
        rhs.cmp(&lhs)
    }
}

impl Ord for SimilarUser {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_similarity(other)
            .then_with(|| self.user.cmp(&other.user))
    }
}

impl PartialOrd for SimilarUser {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SimilarUser {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimilarUser {}

/// A place reachable through the neighbourhood, with its support.
///
/// Ordering puts the best candidate first: higher support, then lower place id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Candidate place.
    pub place: PlaceId,
    /// Distinct neighbours that visited the place.
    pub support: u32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .support
            .cmp(&self.support)
            .then_with(|| self.place.cmp(&other.place))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keeps the `k` smallest items under `Ord`, returned in ascending order.
///
/// The heap root is the worst entry kept so far and gets replaced whenever a
/// better item arrives.
pub(crate) fn top_k<T, I>(items: I, k: usize) -> Vec<T>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<T> = BinaryHeap::with_capacity(k);
    for item in items {
        if heap.len() < k {
            heap.push(item);
        } else if let Some(mut top) = heap.peek_mut() {
            if item < *top {
                *top = item;
            }
        }
    }
    heap.into_sorted_vec()
}
