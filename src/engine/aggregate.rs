use rustc_hash::FxHashMap;

use super::topk::{top_k, Candidate};
use crate::model::{PlaceId, UserId, UserPlaceSet};

/// Ranks places visited by `neighbours` but not by `user`.
///
/// Support is the number of distinct neighbours that visited a place; ties
/// break on the lower place id. At most `n` places are returned.
pub fn aggregate(
    set: &UserPlaceSet,
    user: UserId,
    neighbours: &[UserId],
    n: usize,
) -> Vec<PlaceId> {
    let mut support: FxHashMap<PlaceId, u32> = FxHashMap::default();
    for &neighbour in neighbours {
        for &place in set.places(neighbour) {
            if !set.has_visited(user, place) {
                *support.entry(place).or_insert(0) += 1;
            }
        }
    }

    let candidates = support
        .into_iter()
        .map(|(place, support)| Candidate { place, support });
    top_k(candidates, n)
        .into_iter()
        .map(|candidate| candidate.place)
        .collect()
}
