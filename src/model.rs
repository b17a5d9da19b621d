//! Identifiers, check-ins and the materialized user/place working set.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Canonical user identifier.
pub type UserId = i64;
/// Canonical place identifier.
pub type PlaceId = i64;

/// Ordered mapping from user to recommended places, best first.
pub type RecommendationSet = BTreeMap<UserId, Vec<PlaceId>>;

/// Ordered mapping from user to selected neighbours, most similar first.
pub type Neighbourhoods = BTreeMap<UserId, Vec<UserId>>;

/// A single CHECKED_IN relationship between a user and a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Checkin {
    /// Visiting user.
    pub user: UserId,
    /// Visited place.
    pub place: PlaceId,
}

impl Checkin {
    /// Creates a check-in.
    pub fn new(user: UserId, place: PlaceId) -> Self {
        Self { user, place }
    }
}

/// Visited places per user, with the inverted place to visitors index.
///
/// Both sides hold sorted, deduplicated id lists. The set is built once per run
/// and is read-only afterwards, so it can be shared across worker threads.
#[derive(Debug, Clone, Default)]
pub struct UserPlaceSet {
    places_by_user: BTreeMap<UserId, Vec<PlaceId>>,
    visitors_by_place: FxHashMap<PlaceId, Vec<UserId>>,
    checkins: usize,
}

impl UserPlaceSet {
    /// Builds the set from check-ins in any order; duplicates collapse.
    pub fn from_checkins<I>(checkins: I) -> Self
    where
        I: IntoIterator<Item = Checkin>,
    {
        let mut places_by_user: BTreeMap<UserId, Vec<PlaceId>> = BTreeMap::new();
        for Checkin { user, place } in checkins {
            places_by_user.entry(user).or_default().push(place);
        }

        let mut visitors_by_place: FxHashMap<PlaceId, Vec<UserId>> = FxHashMap::default();
        let mut total = 0;
        for (&user, places) in places_by_user.iter_mut() {
            places.sort_unstable();
            places.dedup();
            total += places.len();
            for &place in places.iter() {
                visitors_by_place.entry(place).or_default().push(user);
            }
        }
        // users are visited in ascending order, so every visitor list is already sorted

        Self {
            places_by_user,
            visitors_by_place,
            checkins: total,
        }
    }

    /// Sorted places visited by `user`; empty for unknown users.
    pub fn places(&self, user: UserId) -> &[PlaceId] {
        self.places_by_user
            .get(&user)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sorted users who visited `place`; empty for unknown places.
    pub fn visitors(&self, place: PlaceId) -> &[UserId] {
        self.visitors_by_place
            .get(&place)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `user` checked in at `place`.
    pub fn has_visited(&self, user: UserId, place: PlaceId) -> bool {
        self.places(user).binary_search(&place).is_ok()
    }

    /// Users in ascending id order.
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.places_by_user.keys().copied()
    }

    /// Number of distinct users.
    pub fn user_count(&self) -> usize {
        self.places_by_user.len()
    }

    /// Number of distinct places.
    pub fn place_count(&self) -> usize {
        self.visitors_by_place.len()
    }

    /// Number of distinct (user, place) pairs.
    pub fn checkin_count(&self) -> usize {
        self.checkins
    }

    /// Whether the set holds no check-ins at all.
    pub fn is_empty(&self) -> bool {
        self.places_by_user.is_empty()
    }
}

impl FromIterator<Checkin> for UserPlaceSet {
    fn from_iter<T: IntoIterator<Item = Checkin>>(iter: T) -> Self {
        Self::from_checkins(iter)
    }
}

/// Coerces a raw identifier field to its canonical integer form.
///
/// Accepts surrounding whitespace and integral floats such as `"12.0"`;
/// rejects empty fields, fractions and non-numeric text.
pub fn coerce_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
