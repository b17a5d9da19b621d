use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use super::topk::SimilarUser;
use crate::model::{UserId, UserPlaceSet};

/// Computes Jaccard similarity between users that share at least one place.
///
/// Rows are computed independently: for a user, every co-visitor of each of
/// its places is reached through the place index and its overlap count is
/// accumulated. Users with no shared place never appear in each other's rows.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityComputer<'a> {
    set: &'a UserPlaceSet,
}

impl<'a> SimilarityComputer<'a> {
    /// Creates a computer over a materialized check-in snapshot.
    pub fn new(set: &'a UserPlaceSet) -> Self {
        Self { set }
    }

    /// Similar users of `user`, most similar first.
    pub fn row(&self, user: UserId) -> Vec<SimilarUser> {
        let places = self.set.places(user);
        let mut overlap: FxHashMap<UserId, u32> = FxHashMap::default();
        for &place in places {
            for &other in self.set.visitors(place) {
                if other != user {
                    *overlap.entry(other).or_insert(0) += 1;
                }
            }
        }

        let own = places.len() as u32;
        let mut row: Vec<SimilarUser> = overlap
            .into_iter()
            .map(|(other, intersection)| {
                let theirs = self.set.places(other).len() as u32;
                SimilarUser::new(other, intersection, own + theirs - intersection)
            })
            .collect();
        row.sort_unstable();
        row
    }

    /// Jaccard index of two distinct users, `None` when they share no place.
    pub fn jaccard(&self, a: UserId, b: UserId) -> Option<f64> {
        if a == b {
            return None;
        }
        let left = self.set.places(a);
        let right = self.set.places(b);
        let intersection = sorted_intersection_len(left, right);
        if intersection == 0 {
            return None;
        }
        let union = left.len() + right.len() - intersection;
        Some(intersection as f64 / union as f64)
    }

    /// Computes every row. Intended for inspection and small graphs; the
    /// engine computes rows on demand.
    pub fn compute_all(&self) -> SimilarityIndex {
        let rows = self
            .set
            .users()
            .filter_map(|user| {
                let row = self.row(user);
                (!row.is_empty()).then_some((user, row))
            })
            .collect();
        SimilarityIndex { rows }
    }
}

/// All similarity rows of a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    rows: BTreeMap<UserId, Vec<SimilarUser>>,
}

impl SimilarityIndex {
    /// Row of `user`, most similar first; empty when it shares no place.
    pub fn row(&self, user: UserId) -> &[SimilarUser] {
        self.rows.get(&user).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Directed lookup of `a`'s similarity to `b`.
    pub fn jaccard(&self, a: UserId, b: UserId) -> Option<f64> {
        self.row(a)
            .iter()
            .find(|entry| entry.user == b)
            .map(SimilarUser::jaccard)
    }

    /// Each unordered pair once as `(lower id, higher id, jaccard)`.
    pub fn pairs(&self) -> impl Iterator<Item = (UserId, UserId, f64)> + '_ {
        self.rows.iter().flat_map(|(&user, row)| {
            row.iter()
                .filter(move |entry| entry.user > user)
                .map(move |entry| (user, entry.user, entry.jaccard()))
        })
    }

    /// Number of unordered pairs with a score.
    pub fn pair_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum::<usize>() / 2
    }
}

fn sorted_intersection_len<T: Ord>(left: &[T], right: &[T]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}
