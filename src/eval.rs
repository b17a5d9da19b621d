//! Precision, recall and F1 of recommendations against held-out check-ins.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{DegenerateMetric, Result};
use crate::model::{Checkin, PlaceId, RecommendationSet, UserId};
use crate::tsv::{read_checkins, PairColumns};

/// Held-out check-ins grouped by user.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    places_by_user: FxHashMap<UserId, FxHashSet<PlaceId>>,
}

impl GroundTruth {
    /// Groups check-ins by user; duplicates collapse.
    pub fn from_checkins<I>(checkins: I) -> Self
    where
        I: IntoIterator<Item = Checkin>,
    {
        let mut places_by_user: FxHashMap<UserId, FxHashSet<PlaceId>> = FxHashMap::default();
        for checkin in checkins {
            places_by_user
                .entry(checkin.user)
                .or_default()
                .insert(checkin.place);
        }
        Self { places_by_user }
    }

    /// Reads a tab-separated file with a header row and `(user, place)` columns.
    pub fn load_tsv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let checkins = read_checkins(path, &PairColumns::Positional)?;
        let truth = Self::from_checkins(checkins);
        info!(
            path = %path.display(),
            users = truth.user_count(),
            "loaded ground truth"
        );
        Ok(truth)
    }

    /// Actual places of `user`, if any.
    pub fn places(&self, user: UserId) -> Option<&FxHashSet<PlaceId>> {
        self.places_by_user.get(&user)
    }

    /// Users with at least one held-out check-in.
    pub fn user_count(&self) -> usize {
        self.places_by_user.len()
    }
}

/// Pooled evaluation metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    /// Users present in the recommendation set.
    pub users: usize,
    /// Recommended places that were actually visited.
    pub hit_count: usize,
    /// Recommended places.
    pub pred_count: usize,
    /// Held-out places of evaluated users.
    pub actual_count: usize,
    /// `hit_count / pred_count`.
    pub precision: f64,
    /// `hit_count / actual_count`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
}

/// Scores `records` against `truth`, pooling counts over the users in `records`.
///
/// Users absent from `records` are ignored. Undefined metrics are returned as
/// [`DegenerateMetric`] errors instead of NaN.
pub fn evaluate(records: &RecommendationSet, truth: &GroundTruth) -> Result<Metrics> {
    let mut hit_count = 0;
    let mut pred_count = 0;
    let mut actual_count = 0;

    for (&user, places) in records {
        let predicted: FxHashSet<PlaceId> = places.iter().copied().collect();
        pred_count += predicted.len();
        if let Some(actual) = truth.places(user) {
            actual_count += actual.len();
            hit_count += predicted.intersection(actual).count();
        }
    }

    if pred_count == 0 {
        warn!(users = records.len(), "no predictions to evaluate");
        return Err(DegenerateMetric::NoPredictions {
            users: records.len(),
        }
        .into());
    }
    if actual_count == 0 {
        warn!(pred_count, "evaluated users have no ground truth");
        return Err(DegenerateMetric::NoGroundTruth { pred_count }.into());
    }
    if hit_count == 0 {
        return Err(DegenerateMetric::NoHits {
            pred_count,
            actual_count,
        }
        .into());
    }

    let precision = hit_count as f64 / pred_count as f64;
    let recall = hit_count as f64 / actual_count as f64;
    let f1 = 2.0 * (precision * recall) / (precision + recall);
    Ok(Metrics {
        users: records.len(),
        hit_count,
        pred_count,
        actual_count,
        precision,
        recall,
        f1,
    })
}
