// src/generator.rs

use crate::constants::{FACTOR_MAX, FACTOR_MIN};
use crate::models::Problem;
use rand::Rng;

/// Canonical key for an ordered factor pair, e.g. `12x34`.
pub fn problem_key(a: u32, b: u32) -> String {
    format!("{a}x{b}")
}

/// Builds a problem from factors known to be in the drill range.
pub fn from_pair(a: u32, b: u32) -> Problem {
    Problem {
        id: problem_key(a, b),
        factor_a: a,
        factor_b: b,
        solution: a * b,
    }
}

/// Like `from_pair`, but for factors read back from storage or user input.
pub fn checked_pair(a: u32, b: u32) -> Option<Problem> {
    let solution = a.checked_mul(b)?;
    Some(Problem {
        id: problem_key(a, b),
        factor_a: a,
        factor_b: b,
        solution,
    })
}

/// Two independent factors drawn uniformly from the drill range. `a == b` is fine.
pub fn random_pair<R: Rng + ?Sized>(rng: &mut R) -> (u32, u32) {
    let a = rng.random_range(FACTOR_MIN..=FACTOR_MAX);
    let b = rng.random_range(FACTOR_MIN..=FACTOR_MAX);
    (a, b)
}

pub fn random_problem<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let (a, b) = random_pair(rng);
    from_pair(a, b)
}

pub fn random_problems<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Problem> {
    (0..count).map(|_| random_problem(rng)).collect()
}

/// Parses `"12x34"` back into its factors. Pairs whose product overflows are rejected.
pub fn parse_key(key: &str) -> Option<(u32, u32)> {
    let (a, b) = key.split_once('x')?;
    let a: u32 = a.trim().parse().ok()?;
    let b: u32 = b.trim().parse().ok()?;
    a.checked_mul(b)?;
    Some((a, b))
}
