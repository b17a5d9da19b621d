#![forbid(unsafe_code)]

//! User-user collaborative filtering over a check-in snapshot.
//!
//! A run materializes the [`UserPlaceSet`] from a [`GraphStore`], then for
//! every user computes its similarity row, selects its neighbourhood and
//! aggregates neighbour check-ins into ranked places. Users are independent,
//! so the per-user work is spread over rayon workers once the user count
//! reaches the configured threshold.

mod aggregate;
mod neighbourhood;
mod similarity;
mod topk;

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{RecError, Result};
use crate::model::{Neighbourhoods, PlaceId, RecommendationSet, UserId, UserPlaceSet};
use crate::store::GraphStore;

pub use aggregate::aggregate;
pub use neighbourhood::NeighbourhoodSelector;
pub use similarity::{SimilarityComputer, SimilarityIndex};
pub use topk::{Candidate, SimilarUser};

/// Output of a complete recommendation run.
#[derive(Debug, Clone, Default)]
pub struct RecommendationRun {
    /// Ranked places per user.
    pub recommendations: RecommendationSet,
    /// Selected neighbours per user that received a neighbourhood.
    pub neighbourhoods: Neighbourhoods,
    /// Counters describing the run.
    pub summary: RunSummary,
}

/// Counters reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Users in the snapshot.
    pub users: usize,
    /// Places in the snapshot.
    pub places: usize,
    /// Distinct check-ins in the snapshot.
    pub checkins: usize,
    /// Users that received a neighbourhood.
    pub users_with_neighbourhood: usize,
    /// Users that received at least one recommendation.
    pub users_recommended: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}

struct UserResult {
    user: UserId,
    neighbours: Vec<UserId>,
    places: Vec<PlaceId>,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    start: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    fn new(limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    fn check(&self, stage: &'static str) -> Result<()> {
        if let Some(limit) = self.limit {
            let elapsed = self.start.elapsed();
            if elapsed > limit {
                return Err(RecError::Timeout { stage, elapsed });
            }
        }
        Ok(())
    }
}

/// Runs recommendation passes with a fixed configuration.
#[derive(Debug)]
pub struct Recommender {
    config: EngineConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Recommender {
    /// Validates `config` and prepares the worker pool if one is requested.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = match config.thread_pool_size {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|idx| format!("placerec-worker-{idx}"))
                    .build()
                    .map_err(|e| {
                        RecError::Configuration(format!("failed to build worker pool: {e}"))
                    })?,
            ),
            None => None,
        };
        Ok(Self { config, pool })
    }

    /// Configuration of this recommender.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recommends up to `num_records` places for every user with a neighbourhood.
    pub fn recommend<S>(&self, store: &S) -> Result<RecommendationSet>
    where
        S: GraphStore + ?Sized,
    {
        Ok(self.run(store)?.recommendations)
    }

    /// Loads the snapshot from `store` and runs the full pipeline.
    pub fn run<S>(&self, store: &S) -> Result<RecommendationRun>
    where
        S: GraphStore + ?Sized,
    {
        let deadline = Deadline::new(self.config.timeout);
        let set = store.load_user_places()?;
        info!(
            users = set.user_count(),
            places = set.place_count(),
            checkins = set.checkin_count(),
            elapsed_ms = deadline.start.elapsed().as_millis() as u64,
            "loaded check-in snapshot"
        );
        deadline.check("snapshot load")?;
        self.run_with_deadline(&set, deadline)
    }

    /// Runs the pipeline over an already materialized snapshot.
    pub fn run_on(&self, set: &UserPlaceSet) -> Result<RecommendationRun> {
        self.run_with_deadline(set, Deadline::new(self.config.timeout))
    }

    fn run_with_deadline(
        &self,
        set: &UserPlaceSet,
        deadline: Deadline,
    ) -> Result<RecommendationRun> {
        let users: Vec<UserId> = set.users().collect();
        let parallel = users.len() >= self.config.parallel_threshold;
        info!(
            users = users.len(),
            neighbourhood_size = self.config.neighbourhood_size,
            num_records = self.config.num_records,
            policy = self.config.policy.as_str(),
            parallel,
            "computing recommendations"
        );

        let similarity = SimilarityComputer::new(set);
        let selector =
            NeighbourhoodSelector::new(self.config.neighbourhood_size, self.config.policy);
        let work = |&user: &UserId| -> Result<Option<UserResult>> {
            deadline.check("similarity")?;
            let row = similarity.row(user);
            let Some(neighbours) = selector.select(row) else {
                return Ok(None);
            };
            let neighbours: Vec<UserId> = neighbours.into_iter().map(|n| n.user).collect();
            deadline.check("aggregation")?;
            let places = aggregate(set, user, &neighbours, self.config.num_records);
            Ok(Some(UserResult {
                user,
                neighbours,
                places,
            }))
        };

        let results: Vec<Option<UserResult>> = if parallel {
            match &self.pool {
                Some(pool) => {
                    pool.install(|| users.par_iter().map(&work).collect::<Result<Vec<_>>>())
                }
                None => users.par_iter().map(&work).collect::<Result<Vec<_>>>(),
            }
        } else {
            users.iter().map(&work).collect::<Result<Vec<_>>>()
        }?;

        let mut run = RecommendationRun::default();
        for result in results.into_iter().flatten() {
            if result.places.is_empty() {
                debug!(user = result.user, "neighbourhood offers no unvisited places");
            } else {
                run.recommendations.insert(result.user, result.places);
            }
            run.neighbourhoods.insert(result.user, result.neighbours);
        }

        run.summary = RunSummary {
            users: set.user_count(),
            places: set.place_count(),
            checkins: set.checkin_count(),
            users_with_neighbourhood: run.neighbourhoods.len(),
            users_recommended: run.recommendations.len(),
            elapsed_ms: deadline.start.elapsed().as_millis() as u64,
        };
        debug!(
            excluded = run.summary.users - run.summary.users_with_neighbourhood,
            "users without a qualifying neighbourhood"
        );
        info!(
            users_with_neighbourhood = run.summary.users_with_neighbourhood,
            users_recommended = run.summary.users_recommended,
            elapsed_ms = run.summary.elapsed_ms,
            "recommendation run finished"
        );
        Ok(run)
    }
}
