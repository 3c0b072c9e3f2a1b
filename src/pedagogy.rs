// src/pedagogy.rs

use crate::clock::Clock;
use crate::constants::*;
use crate::generator;
use crate::models::{Problem, SessionMode};
use crate::scoring;
use crate::store::ProblemTable;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

// --- Public Interface ---

/// Builds the working set for a new session.
///
/// Forced ids win over everything else and come back in the given order. Practice
/// is all random. Review and mixed draw from the weakest stored problems and pad
/// with random ones.
pub fn select_problems<T, R>(
    table: &T,
    clock: &dyn Clock,
    rng: &mut R,
    count: usize,
    mode: SessionMode,
    forced_ids: &[String],
) -> Vec<Problem>
where
    T: ProblemTable + ?Sized,
    R: Rng + ?Sized,
{
    let effective_count = if count == 0 { ENDLESS_SEED_BATCH } else { count };
    debug!(
        "Requesting {} problems (mode: {}, forced: {})",
        effective_count,
        mode,
        forced_ids.len()
    );

    // 1. Forced (review missed items)
    if !forced_ids.is_empty() {
        return forced_problems(forced_ids);
    }

    // 2. Practice (pure random)
    if mode == SessionMode::Practice {
        return generator::random_problems(rng, effective_count);
    }

    // 3. Review / Mixed (weakness-ranked)
    match select_weighted(table, clock.now_ms(), rng, effective_count, mode) {
        Ok(problems) => problems,
        Err(e) => {
            warn!(
                "[Selector] Could not load problem history ({}). Falling back to practice.",
                e
            );
            generator::random_problems(rng, effective_count)
        }
    }
}

pub fn review_count_for(mode: SessionMode, effective_count: usize) -> usize {
    match mode {
        SessionMode::Review => effective_count,
        SessionMode::Mixed => (effective_count as f64 * MIXED_REVIEW_RATIO).floor() as usize,
        SessionMode::Practice => 0,
    }
}

// --- Internal Selection Logic ---

fn forced_problems(ids: &[String]) -> Vec<Problem> {
    ids.iter()
        .filter_map(|id| {
            let problem = generator::parse_key(id).and_then(|(a, b)| generator::checked_pair(a, b));
            if problem.is_none() {
                warn!("[Selector] Skipping malformed problem id '{}'", id);
            }
            problem
        })
        .collect()
}

fn select_weighted<T, R>(
    table: &T,
    now: i64,
    rng: &mut R,
    effective_count: usize,
    mode: SessionMode,
) -> crate::store::StoreResult<Vec<Problem>>
where
    T: ProblemTable + ?Sized,
    R: Rng + ?Sized,
{
    let candidates = scoring::rank_candidates(table.scan_problems()?, now);
    let review_count = review_count_for(mode, effective_count);

    // Take the top 2N (at least 10) and pick N of them at random, so repeated
    // sessions don't replay the same order.
    let pool_size = (review_count * 2).max(REVIEW_POOL_MIN);
    let mut pool: Vec<_> = candidates.into_iter().take(pool_size).collect();
    pool.shuffle(rng);

    let mut problems: Vec<Problem> = pool
        .iter()
        .filter_map(|(record, _)| {
            let problem = generator::checked_pair(record.a, record.b);
            if problem.is_none() {
                warn!("[Selector] Ignoring stored problem '{}' with unusable factors", record.key);
            }
            problem
        })
        .take(review_count)
        .collect();
    let review_selected = problems.len();

    problems.extend(generator::random_problems(rng, effective_count - review_selected));
    problems.shuffle(rng);

    info!(
        "[Selector] {} session: {} review + {} random (pool {})",
        mode,
        review_selected,
        effective_count - review_selected,
        pool.len()
    );
    Ok(problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryStore;
    use crate::models::{ProblemRecord, ProblemStats};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const NOW: i64 = 1_700_000_000_000;

    fn weak_record(a: u32, b: u32) -> ProblemRecord {
        ProblemRecord {
            key: generator::problem_key(a, b),
            a,
            b,
            recent: Vec::new(),
            stats: ProblemStats {
                seen: 2,
                wrong: 2,
                streak_correct: 0,
                last_seen_at: NOW,
                last_wrong_at: Some(NOW),
                ema_time_ms: 9_000.0,
            },
            updated_at: NOW,
        }
    }

    fn store_with_weak(n: u32) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            store.put_problem(&weak_record(11 + i, 12)).unwrap();
        }
        store
    }

    #[test]
    fn practice_returns_exactly_count() {
        let store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(1);
        let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 10, SessionMode::Practice, &[]);
        assert_eq!(problems.len(), 10);
        assert!(problems
            .iter()
            .all(|p| (FACTOR_MIN..=FACTOR_MAX).contains(&p.factor_a)
                && (FACTOR_MIN..=FACTOR_MAX).contains(&p.factor_b)));
    }

    #[test]
    fn endless_seeds_twenty() {
        let store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(2);
        let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 0, SessionMode::Mixed, &[]);
        assert_eq!(problems.len(), ENDLESS_SEED_BATCH);
    }

    #[test]
    fn forced_ids_keep_order_and_ignore_mode() {
        let store = store_with_weak(3);
        let mut rng = StdRng::seed_from_u64(3);
        let ids = vec!["12x34".to_string(), "5x6".to_string()];
        let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 10, SessionMode::Review, &ids);
        assert_eq!(problems, vec![generator::from_pair(12, 34), generator::from_pair(5, 6)]);
        assert_eq!(problems[0].solution, 408);
        assert_eq!(problems[1].solution, 30);
    }

    #[test]
    fn review_draws_only_from_candidates_when_enough() {
        let store = store_with_weak(30);
        let weak: HashSet<String> = store.scan_problems().unwrap().into_iter().map(|r| r.key).collect();
        let mut rng = StdRng::seed_from_u64(4);

        let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 10, SessionMode::Review, &[]);
        assert_eq!(problems.len(), 10);
        assert!(problems.iter().all(|p| weak.contains(&p.id)));
        let unique: HashSet<&str> = problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn small_pool_is_padded_with_random() {
        let store = store_with_weak(3);
        let mut rng = StdRng::seed_from_u64(5);
        let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 10, SessionMode::Review, &[]);
        assert_eq!(problems.len(), 10);
        let review_hits = problems.iter().filter(|p| p.factor_b == 12 && p.factor_a <= 13).count();
        assert!(review_hits >= 3);
    }

    #[test]
    fn mixed_takes_thirty_percent_review() {
        assert_eq!(review_count_for(SessionMode::Mixed, 10), 3);
        assert_eq!(review_count_for(SessionMode::Mixed, 5), 1);
        assert_eq!(review_count_for(SessionMode::Mixed, 20), 6);
        assert_eq!(review_count_for(SessionMode::Review, 7), 7);

        // Candidates sit outside the drill range so random fill can't collide with them.
        let store = MemoryStore::new();
        for i in 0..30 {
            store.put_problem(&weak_record(100 + i, 3)).unwrap();
        }
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 10, SessionMode::Mixed, &[]);
            assert_eq!(problems.len(), 10);
            assert_eq!(problems.iter().filter(|p| p.factor_b == 3).count(), 3);
        }
    }

    #[test]
    fn review_never_reaches_past_the_top_pool() {
        let store = MemoryStore::new();
        let mut top = HashSet::new();
        for i in 0..10 {
            let rec = weak_record(11 + i, 12);
            top.insert(rec.key.clone());
            store.put_problem(&rec).unwrap();
        }
        // Still review candidates, just less weak than the ten above.
        for i in 0..20 {
            let mut rec = weak_record(11 + i, 50);
            rec.stats.seen = 4;
            rec.stats.wrong = 1;
            store.put_problem(&rec).unwrap();
        }
        assert_eq!(scoring::rank_candidates(store.scan_problems().unwrap(), NOW).len(), 30);

        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 3, SessionMode::Review, &[]);
            assert_eq!(problems.len(), 3);
            assert!(problems.iter().all(|p| top.contains(&p.id)), "seed {seed}: {problems:?}");
        }
    }

    #[test]
    fn stored_factors_that_overflow_are_skipped() {
        let store = MemoryStore::new();
        store.put_problem(&weak_record(u32::MAX, 2)).unwrap();
        store.put_problem(&weak_record(21, 22)).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 5, SessionMode::Review, &[]);
        assert_eq!(problems.len(), 5);
        assert!(problems.iter().any(|p| p.id == "21x22"));
        assert!(problems.iter().all(|p| p.factor_a != u32::MAX));
    }

    #[test]
    fn empty_history_gives_all_random_review() {
        let store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(7);
        let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 5, SessionMode::Review, &[]);
        assert_eq!(problems.len(), 5);
    }

    #[test]
    fn read_failure_degrades_to_practice() {
        let store = store_with_weak(30);
        store.fail_reads(true);
        let mut rng = StdRng::seed_from_u64(8);
        let problems = select_problems(&store, &FixedClock::at(NOW), &mut rng, 10, SessionMode::Review, &[]);
        assert_eq!(problems.len(), 10);
    }
}
