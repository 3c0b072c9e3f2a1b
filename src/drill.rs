// src/drill.rs

use crate::constants::{ENDLESS_REPLENISH_BATCH, ENDLESS_REPLENISH_MARGIN, SLOW_ANSWER_MS};
use crate::generator;
use crate::models::{Problem, ProblemResult, SessionConfig, SessionRecord};
use crate::sessions;
use log::debug;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Right answer; the session moved on.
    Accepted(ProblemResult),
    /// Wrong answer; the problem stays up and can no longer count as correct.
    Rejected,
    /// No problem is on screen (finished, or an endless list ran dry).
    NoProblem,
}

/// State of one running session: which problem is up, how long it has been up,
/// and what has been answered so far.
#[derive(Debug, Clone)]
pub struct DrillSession {
    config: SessionConfig,
    problems: Vec<Problem>,
    index: usize,
    results: Vec<ProblemResult>,
    started_at: i64,
    presented_at: i64,
    first_keystroke_at: Option<i64>,
    mistake_made: bool,
    ended_at: Option<i64>,
}

impl DrillSession {
    pub fn new(config: SessionConfig, problems: Vec<Problem>, now: i64) -> Self {
        DrillSession {
            config,
            problems,
            index: 0,
            results: Vec::new(),
            started_at: now,
            presented_at: now,
            first_keystroke_at: None,
            mistake_made: false,
            ended_at: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn current(&self) -> Option<&Problem> {
        if self.ended_at.is_some() {
            return None;
        }
        self.problems.get(self.index)
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn results(&self) -> &[ProblemResult] {
        &self.results
    }

    /// Bounded sessions are done once every problem has a result. Endless ones
    /// only end through `finish`.
    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
            || (!self.config.is_endless() && self.index >= self.problems.len())
    }

    /// The latency clock starts at the first keystroke of a presentation.
    pub fn note_keystroke(&mut self, now: i64) {
        if self.current().is_some() && self.first_keystroke_at.is_none() {
            self.first_keystroke_at = Some(now);
        }
    }

    pub fn submit_answer(&mut self, answer: u32, now: i64) -> AnswerOutcome {
        let Some(problem) = self.current() else {
            return AnswerOutcome::NoProblem;
        };

        if answer != problem.solution {
            debug!("[Drill] {} answered {} (expected {})", problem.id, answer, problem.solution);
            self.mistake_made = true;
            return AnswerOutcome::Rejected;
        }

        let clean = !self.mistake_made;
        match self.record(Some(answer), clean, now) {
            Some(result) => AnswerOutcome::Accepted(result),
            None => AnswerOutcome::NoProblem,
        }
    }

    pub fn skip(&mut self, now: i64) -> Option<ProblemResult> {
        self.record(None, false, now)
    }

    fn record(&mut self, user_answer: Option<u32>, is_correct: bool, now: i64) -> Option<ProblemResult> {
        let problem = self.current()?.clone();
        let start = self.first_keystroke_at.unwrap_or(self.presented_at);

        let result = ProblemResult {
            problem,
            user_answer,
            is_correct,
            time_taken_ms: (now - start).max(0) as u64,
        };
        self.results.push(result.clone());

        self.index += 1;
        self.presented_at = now;
        self.first_keystroke_at = None;
        self.mistake_made = false;
        Some(result)
    }

    /// Endless sessions top up once the learner is within a few problems of the end.
    pub fn needs_replenishment(&self) -> bool {
        self.config.is_endless()
            && self.ended_at.is_none()
            && self.index + ENDLESS_REPLENISH_MARGIN >= self.problems.len()
    }

    pub fn replenish<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if !self.needs_replenishment() {
            return 0;
        }
        self.problems
            .extend(generator::random_problems(rng, ENDLESS_REPLENISH_BATCH));
        debug!("[Drill] Endless session extended to {} problems", self.problems.len());
        ENDLESS_REPLENISH_BATCH
    }

    /// Ends the session (normally or early) and summarizes what was answered.
    /// The problem currently on screen is dropped. Nothing is returned when no
    /// problem was attempted or the session was already closed.
    pub fn finish(&mut self, now: i64) -> Option<SessionRecord> {
        if self.ended_at.is_some() {
            return None;
        }
        self.ended_at = Some(now);
        sessions::build_session_record(&self.results, self.config.mode, self.started_at, now)
    }

    pub fn missed_ids(&self) -> Vec<String> {
        missed_ids(&self.results)
    }

    pub fn debrief(&self) -> SessionDebrief {
        SessionDebrief::from_results(&self.results)
    }
}

pub fn missed_ids(results: &[ProblemResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.is_correct)
        .map(|r| r.problem.id.clone())
        .collect()
}

/// Figures shown after a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDebrief {
    pub total: usize,
    pub correct_count: usize,
    pub accuracy_pct: u32,
    pub total_time_ms: u64,
    pub avg_time_ms: f64,
    pub weak_spots: Vec<ProblemResult>, // Wrong, or slower than SLOW_ANSWER_MS
    pub missed_ids: Vec<String>,
}

impl SessionDebrief {
    pub fn from_results(results: &[ProblemResult]) -> Self {
        let total = results.len();
        let correct_count = results.iter().filter(|r| r.is_correct).count();
        let total_time_ms: u64 = results.iter().map(|r| r.time_taken_ms).sum();

        let (accuracy_pct, avg_time_ms) = if total == 0 {
            (0, 0.0)
        } else {
            (
                (correct_count as f64 / total as f64 * 100.0).round() as u32,
                total_time_ms as f64 / total as f64,
            )
        };

        SessionDebrief {
            total,
            correct_count,
            accuracy_pct,
            total_time_ms,
            avg_time_ms,
            weak_spots: results
                .iter()
                .filter(|r| !r.is_correct || r.time_taken_ms > SLOW_ANSWER_MS)
                .cloned()
                .collect(),
            missed_ids: missed_ids(results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::from_pair;
    use crate::models::{SessionMode, SessionType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bounded(pairs: &[(u32, u32)]) -> DrillSession {
        let problems = pairs.iter().map(|&(a, b)| from_pair(a, b)).collect();
        DrillSession::new(SessionConfig::new(pairs.len() as u32, SessionMode::Practice), problems, 0)
    }

    #[test]
    fn clean_answer_is_correct_and_timed_from_first_keystroke() {
        let mut drill = bounded(&[(12, 12), (13, 13)]);
        drill.note_keystroke(1_500);
        drill.note_keystroke(1_800);

        let AnswerOutcome::Accepted(result) = drill.submit_answer(144, 2_000) else {
            panic!("expected acceptance");
        };
        assert!(result.is_correct);
        assert_eq!(result.time_taken_ms, 500);
        assert_eq!(drill.current().unwrap().id, "13x13");
    }

    #[test]
    fn mistake_in_same_presentation_taints_result() {
        let mut drill = bounded(&[(12, 12), (13, 13)]);
        assert_eq!(drill.submit_answer(145, 1_000), AnswerOutcome::Rejected);
        assert_eq!(drill.position(), 0);

        let AnswerOutcome::Accepted(result) = drill.submit_answer(144, 2_000) else {
            panic!("expected acceptance");
        };
        assert!(!result.is_correct);
        assert_eq!(result.user_answer, Some(144));
        assert_eq!(result.time_taken_ms, 2_000);

        // The next problem starts clean.
        let AnswerOutcome::Accepted(next) = drill.submit_answer(169, 2_600) else {
            panic!("expected acceptance");
        };
        assert!(next.is_correct);
        assert_eq!(next.time_taken_ms, 600);
        assert!(drill.is_finished());
        assert_eq!(drill.submit_answer(1, 3_000), AnswerOutcome::NoProblem);
    }

    #[test]
    fn skip_records_no_answer() {
        let mut drill = bounded(&[(20, 30)]);
        let result = drill.skip(4_000).unwrap();
        assert_eq!(result.user_answer, None);
        assert!(!result.is_correct);
        assert_eq!(drill.missed_ids(), vec!["20x30".to_string()]);
        assert!(drill.skip(5_000).is_none());
    }

    #[test]
    fn finish_early_drops_current_and_classifies_by_length() {
        let pairs: Vec<(u32, u32)> = (0..10).map(|i| (11 + i, 20)).collect();
        let mut drill = bounded(&pairs);
        for i in 0..5 {
            let p = drill.current().unwrap().clone();
            drill.submit_answer(p.solution, (i + 1) * 1_000);
        }
        drill.note_keystroke(5_500);

        let record = drill.finish(6_000).unwrap();
        assert_eq!(record.length, 5);
        assert_eq!(record.session_type, SessionType::Sprint);
        assert_eq!(record.correct_count, 5);
        assert_eq!(record.started_at, 0);
        assert_eq!(record.ended_at, 6_000);
        assert!(drill.current().is_none());
        assert!(drill.finish(7_000).is_none());
    }

    #[test]
    fn finishing_with_nothing_attempted_yields_no_record() {
        let mut drill = bounded(&[(11, 11)]);
        assert!(drill.finish(10).is_none());
    }

    #[test]
    fn endless_sessions_replenish_near_the_end() {
        let mut rng = StdRng::seed_from_u64(9);
        let seed = generator::random_problems(&mut rng, 20);
        let mut drill = DrillSession::new(SessionConfig::new(0, SessionMode::Practice), seed, 0);

        assert!(!drill.needs_replenishment());
        assert_eq!(drill.replenish(&mut rng), 0);

        for t in 0..15 {
            drill.skip(t);
        }
        assert_eq!(drill.position(), 15);
        assert!(drill.needs_replenishment());
        assert_eq!(drill.replenish(&mut rng), ENDLESS_REPLENISH_BATCH);
        assert_eq!(drill.len(), 30);
        assert!(!drill.is_finished());
    }

    #[test]
    fn debrief_flags_wrong_and_slow_answers() {
        let mut drill = bounded(&[(11, 12), (13, 14), (15, 16), (17, 18)]);
        drill.submit_answer(132, 1_000);
        drill.submit_answer(182, 13_000); // 12s: slow but correct
        drill.skip(14_000);
        drill.submit_answer(306, 16_000);

        let debrief = drill.debrief();
        assert_eq!(debrief.total, 4);
        assert_eq!(debrief.correct_count, 3);
        assert_eq!(debrief.accuracy_pct, 75);
        assert_eq!(debrief.total_time_ms, 16_000);
        assert_eq!(debrief.weak_spots.len(), 2);
        assert_eq!(debrief.missed_ids, vec!["15x16".to_string()]);
    }
}
