#![forbid(unsafe_code)]

//! Read access to the interaction graph of users, places and check-ins.
//!
//! The engine never talks to a store directly; it materializes a
//! [`UserPlaceSet`] through [`GraphStore::load_user_places`] and computes over
//! that snapshot.

mod sqlite;

use serde::Serialize;

use crate::error::Result;
use crate::model::{Checkin, UserPlaceSet};

pub use sqlite::{ImportCounts, SqliteStore};

/// Source of CHECKED_IN relationships.
pub trait GraphStore {
    /// All distinct check-ins, ordered by user then place.
    fn checkins(&self) -> Result<Vec<Checkin>>;

    /// Entity and relationship counts.
    fn counts(&self) -> Result<StoreCounts> {
        let set = self.load_user_places()?;
        Ok(StoreCounts {
            users: set.user_count() as u64,
            places: set.place_count() as u64,
            checkins: set.checkin_count() as u64,
        })
    }

    /// Materializes the per-user place sets for one recommendation run.
    fn load_user_places(&self) -> Result<UserPlaceSet> {
        Ok(UserPlaceSet::from_checkins(self.checkins()?))
    }
}

/// Sizes of the interaction graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    /// User nodes.
    pub users: u64,
    /// Place nodes.
    pub places: u64,
    /// CHECKED_IN edges.
    pub checkins: u64,
}

/// In-memory store over a fixed list of check-ins.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    checkins: Vec<Checkin>,
}

impl MemoryStore {
    /// Creates a store holding the distinct check-ins in `checkins`.
    pub fn new<I>(checkins: I) -> Self
    where
        I: IntoIterator<Item = Checkin>,
    {
        let mut checkins: Vec<Checkin> = checkins.into_iter().collect();
        checkins.sort_unstable();
        checkins.dedup();
        Self { checkins }
    }

    /// Convenience constructor from `(user, place)` pairs.
    pub fn from_pairs(pairs: &[(i64, i64)]) -> Self {
        Self::new(pairs.iter().map(|&(user, place)| Checkin::new(user, place)))
    }
}

impl GraphStore for MemoryStore {
    fn checkins(&self) -> Result<Vec<Checkin>> {
        Ok(self.checkins.clone())
    }
}

impl<S: GraphStore + ?Sized> GraphStore for &S {
    fn checkins(&self) -> Result<Vec<Checkin>> {
        (**self).checkins()
    }

    fn counts(&self) -> Result<StoreCounts> {
        (**self).counts()
    }

    fn load_user_places(&self) -> Result<UserPlaceSet> {
        (**self).load_user_places()
    }
}
