#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::time::Duration;

use placerec::{
    engine::SimilarityComputer,
    eval::{evaluate, GroundTruth},
    store::MemoryStore,
    Checkin, DegenerateMetric, EngineConfig, NeighbourhoodPolicy, RecError, Recommender,
    UserPlaceSet,
};
use proptest::prelude::*;

const A: i64 = 100;
const B: i64 = 200;
const C: i64 = 300;
const D: i64 = 400;

fn reference_store() -> MemoryStore {
    MemoryStore::from_pairs(&[(1, A), (1, B), (2, A), (2, B), (2, C), (3, C)])
}

fn recommender(k: usize, n: usize) -> Recommender {
    Recommender::new(EngineConfig::new(k, n)).expect("valid config")
}

#[test]
fn reference_scenario_end_to_end() {
    let run = recommender(1, 2).run(&reference_store()).expect("run");

    assert_eq!(run.neighbourhoods.get(&1), Some(&vec![2]));
    assert_eq!(run.recommendations.get(&1), Some(&vec![C]));

    let truth = GroundTruth::from_checkins([Checkin::new(1, C), Checkin::new(1, D)]);
    let only_user_one = run
        .recommendations
        .iter()
        .filter(|(user, _)| **user == 1)
        .map(|(user, places)| (*user, places.clone()))
        .collect();
    let metrics = evaluate(&only_user_one, &truth).expect("metrics");
    assert_eq!(metrics.precision, 1.0);
    assert_eq!(metrics.recall, 0.5);
    assert!((metrics.f1 - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn recommend_returns_only_recommendations() {
    let store = reference_store();
    let engine = recommender(1, 2);
    let records = engine.recommend(&store).expect("recommend");
    let run = engine.run(&store).expect("run");
    assert_eq!(records, run.recommendations);
}

#[test]
fn strict_policy_drops_users_short_of_k() {
    let store = reference_store();
    let strict = recommender(2, 5).run(&store).expect("strict run");
    // user 2 is the only one overlapping with two others
    assert_eq!(strict.neighbourhoods.keys().copied().collect::<Vec<_>>(), vec![2]);

    let up_to = Recommender::new(EngineConfig::new(2, 5).policy(NeighbourhoodPolicy::UpTo))
        .expect("valid config")
        .run(&store)
        .expect("up-to run");
    assert_eq!(up_to.neighbourhoods.len(), 3);
}

#[test]
fn empty_recommendations_are_degenerate() {
    let store = MemoryStore::from_pairs(&[(1, A), (2, A)]);
    let run = recommender(1, 3).run(&store).expect("run");
    assert!(run.recommendations.is_empty());
    assert_eq!(run.summary.users_with_neighbourhood, 2);

    let truth = GroundTruth::from_checkins([Checkin::new(1, B)]);
    let err = evaluate(&run.recommendations, &truth).unwrap_err();
    assert!(matches!(
        err,
        RecError::DegenerateMetric(DegenerateMetric::NoPredictions { .. })
    ));
}

#[test]
fn empty_store_yields_empty_run() {
    let run = recommender(3, 3)
        .run(&MemoryStore::new(Vec::new()))
        .expect("run");
    assert!(run.recommendations.is_empty());
    assert_eq!(run.summary.users, 0);
}

fn crowded_store(users: i64) -> MemoryStore {
    MemoryStore::new((0..users).flat_map(|user| {
        (0..8).map(move |offset| Checkin::new(user, (user * 7 + offset * 13) % 97))
    }))
}

#[test]
fn configured_timeout_aborts_the_run() {
    let engine = Recommender::new(EngineConfig::new(5, 5).timeout(Duration::from_nanos(1)))
        .expect("valid config");
    let err = engine.recommend(&crowded_store(3000)).unwrap_err();
    assert!(matches!(err, RecError::Timeout { .. }), "{err}");
    assert!(err.to_string().contains("exceeded the run timeout"), "{err}");
}

#[test]
fn generous_timeout_leaves_results_unchanged() {
    let store = crowded_store(300);
    let bounded = Recommender::new(EngineConfig::new(5, 5).timeout(Duration::from_secs(600)))
        .expect("valid config")
        .recommend(&store)
        .expect("bounded run");
    assert_eq!(bounded, recommender(5, 5).recommend(&store).expect("unbounded run"));
}

fn arb_checkins() -> impl Strategy<Value = Vec<Checkin>> {
    prop::collection::vec((1i64..=24, 1i64..=40), 0..240)
        .prop_map(|pairs| pairs.into_iter().map(|(u, p)| Checkin::new(u, p)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_jaccard_is_symmetric_and_bounded(checkins in arb_checkins()) {
        let set = UserPlaceSet::from_checkins(checkins);
        let computer = SimilarityComputer::new(&set);
        let users: Vec<i64> = set.users().collect();
        for &a in &users {
            for &b in &users {
                let ab = computer.jaccard(a, b);
                prop_assert_eq!(ab, computer.jaccard(b, a));
                if let Some(score) = ab {
                    prop_assert!(score > 0.0 && score <= 1.0);
                }
            }
            for similar in computer.row(a) {
                prop_assert_ne!(similar.user, a);
                let direct = computer.jaccard(a, similar.user);
                prop_assert_eq!(direct, Some(similar.jaccard()));
            }
        }
    }

    #[test]
    fn prop_run_respects_neighbourhood_and_record_bounds(
        checkins in arb_checkins(),
        k in 1usize..6,
        n in 1usize..6,
    ) {
        let set = UserPlaceSet::from_checkins(checkins);
        let run = recommender(k, n).run_on(&set).expect("run");
        let computer = SimilarityComputer::new(&set);

        for (user, neighbours) in &run.neighbourhoods {
            prop_assert_eq!(neighbours.len(), k);
            prop_assert!(!neighbours.contains(user));
            let distinct: BTreeSet<_> = neighbours.iter().collect();
            prop_assert_eq!(distinct.len(), neighbours.len());
        }

        for (user, places) in &run.recommendations {
            prop_assert!(run.neighbourhoods.contains_key(user));
            prop_assert!(!places.is_empty());
            prop_assert!(places.len() <= n);
            for place in places {
                prop_assert!(!set.has_visited(*user, *place));
            }

            let candidates: BTreeSet<i64> = run.neighbourhoods[user]
                .iter()
                .flat_map(|neighbour| set.places(*neighbour).iter().copied())
                .filter(|place| !set.has_visited(*user, *place))
                .collect();
            prop_assert_eq!(places.len(), n.min(candidates.len()));
        }

        for user in set.users() {
            let qualifying = computer.row(user).len() >= k;
            prop_assert_eq!(run.neighbourhoods.contains_key(&user), qualifying);
        }
    }

    #[test]
    fn prop_parallel_matches_sequential(checkins in arb_checkins()) {
        let set = UserPlaceSet::from_checkins(checkins);
        let sequential = recommender(2, 3).run_on(&set).expect("sequential");
        let parallel = Recommender::new(
            EngineConfig::new(2, 3).parallel_threshold(1).thread_pool_size(3),
        )
        .expect("valid config")
        .run_on(&set)
        .expect("parallel");
        prop_assert_eq!(sequential.recommendations, parallel.recommendations);
        prop_assert_eq!(sequential.neighbourhoods, parallel.neighbourhoods);
    }

    #[test]
    fn prop_evaluation_is_idempotent(
        checkins in arb_checkins(),
        held_out in arb_checkins(),
    ) {
        let set = UserPlaceSet::from_checkins(checkins);
        let run = recommender(1, 4).run_on(&set).expect("run");
        let truth = GroundTruth::from_checkins(held_out);
        let first = evaluate(&run.recommendations, &truth);
        let second = evaluate(&run.recommendations, &truth);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a, b);
                prop_assert!(a.precision > 0.0 && a.precision <= 1.0);
                prop_assert!(a.recall > 0.0 && a.recall <= 1.0);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "evaluation changed between calls"),
        }
    }
}
