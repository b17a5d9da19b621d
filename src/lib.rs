//! Place recommendations from check-in history using user-user collaborative
//! filtering.
//!
//! The pipeline reads a snapshot of the User -CHECKED_IN-> Place graph from a
//! [`store::GraphStore`], scores user pairs by the Jaccard index of their
//! visited places, keeps the top-K neighbours per user, and ranks the places
//! those neighbours visited by support. [`eval`] scores the result against
//! held-out check-ins.
//!
//! ```no_run
//! use placerec::{EngineConfig, Recommender, store::SqliteStore};
//!
//! let store = SqliteStore::open_read_only("checkins.db")?;
//! let recommender = Recommender::new(EngineConfig::new(100, 10))?;
//! let records = recommender.recommend(&store)?;
//! # Ok::<(), placerec::RecError>(())
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod logging;
pub mod model;
pub mod persist;
pub mod store;
pub mod tsv;

pub use config::{EngineConfig, NeighbourhoodPolicy, StoreConfig};
pub use engine::{RecommendationRun, Recommender, RunSummary};
pub use error::{DegenerateMetric, RecError, Result};
pub use model::{Checkin, PlaceId, RecommendationSet, UserId, UserPlaceSet};
