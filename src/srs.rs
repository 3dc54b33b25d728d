// Spaced-repetition scheduling over quiz history

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::db::quiz::WordOutcome;

/// Interval schedule parameters.
#[derive(Debug, Clone)]
pub struct SrsConfig {
    /// Interval after the first correct answer (and after any miss), in days.
    pub base_interval_days: f64,
    /// Multiplier applied per consecutive correct answer.
    pub ease: f64,
    /// Intervals never grow past this.
    pub max_interval_days: f64,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            base_interval_days: 1.0,
            ease: 2.2,
            max_interval_days: 120.0,
        }
    }
}

/// Review bookkeeping for one word, folded from its outcome history.
#[derive(Debug, Clone)]
pub struct ReviewState {
    pub word_id: i64,
    pub streak: u32,
    pub incorrect: u32,
    pub last_seen: DateTime<Utc>,
    pub interval_days: f64,
    pub due_at: DateTime<Utc>,
}

impl ReviewState {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}

/// Interval in days after a correct answer at the given streak (>= 1).
pub fn interval_for_streak(config: &SrsConfig, streak: u32) -> f64 {
    let exponent = streak.saturating_sub(1) as i32;
    (config.base_interval_days * config.ease.powi(exponent)).min(config.max_interval_days)
}

fn days(interval: f64) -> TimeDelta {
    TimeDelta::milliseconds((interval * 86_400_000.0) as i64)
}

/// Fold outcome history (oldest first) into per-word review states.
///
/// A correct answer extends the streak and grows the interval; any miss
/// resets the streak and pulls the word back to the base interval, which is
/// how past mistakes come up for retry first.
pub fn review_states(
    outcomes: &[WordOutcome],
    config: &SrsConfig,
) -> HashMap<i64, ReviewState> {
    let mut states: HashMap<i64, ReviewState> = HashMap::new();

    for outcome in outcomes {
        let Ok(taken_on) = DateTime::parse_from_rfc3339(&outcome.taken_on) else {
            continue;
        };
        let taken_on = taken_on.with_timezone(&Utc);

        let state = states.entry(outcome.word_id).or_insert(ReviewState {
            word_id: outcome.word_id,
            streak: 0,
            incorrect: 0,
            last_seen: taken_on,
            interval_days: config.base_interval_days,
            due_at: taken_on,
        });

        if outcome.is_correct {
            state.streak += 1;
            state.interval_days = interval_for_streak(config, state.streak);
        } else {
            state.streak = 0;
            state.incorrect += 1;
            state.interval_days = config.base_interval_days;
        }
        state.last_seen = taken_on;
        state.due_at = taken_on + days(state.interval_days);
    }

    states
}

/// Pick `n` word ids for a session.
///
/// Priority order: overdue words (most overdue first, more past mistakes
/// breaking ties), then never-quizzed words in random order, then words not
/// yet due. The final list is shuffled so the session does not mirror the
/// selection order.
pub fn plan_session(
    states: &HashMap<i64, ReviewState>,
    glossary_ids: &[i64],
    n: usize,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Vec<i64> {
    let mut due: Vec<&ReviewState> = states.values().filter(|s| s.is_due(now)).collect();
    due.sort_by(|a, b| {
        a.due_at
            .cmp(&b.due_at)
            .then(b.incorrect.cmp(&a.incorrect))
            .then(a.word_id.cmp(&b.word_id))
    });

    let mut fresh: Vec<i64> = glossary_ids
        .iter()
        .copied()
        .filter(|id| !states.contains_key(id))
        .collect();
    fresh.shuffle(rng);

    let mut not_due: Vec<&ReviewState> = states.values().filter(|s| !s.is_due(now)).collect();
    not_due.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.word_id.cmp(&b.word_id)));

    let mut picked: Vec<i64> = Vec::with_capacity(n);
    for id in due
        .iter()
        .map(|s| s.word_id)
        .chain(fresh)
        .chain(not_due.iter().map(|s| s.word_id))
    {
        if picked.len() == n {
            break;
        }
        if !picked.contains(&id) {
            picked.push(id);
        }
    }

    picked.shuffle(rng);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap()
    }

    fn outcome(word_id: i64, day: u32, correct: bool) -> WordOutcome {
        WordOutcome {
            word_id,
            taken_on: at(day).to_rfc3339(),
            is_correct: correct,
        }
    }

    #[test]
    fn test_intervals_grow_with_streak() {
        let config = SrsConfig::default();
        assert_eq!(interval_for_streak(&config, 1), 1.0);
        assert!(interval_for_streak(&config, 2) > interval_for_streak(&config, 1));
        assert!(interval_for_streak(&config, 3) > interval_for_streak(&config, 2));
        assert_eq!(interval_for_streak(&config, 30), config.max_interval_days);
    }

    #[test]
    fn test_miss_resets_interval() {
        let config = SrsConfig::default();
        let history = vec![
            outcome(1, 1, true),
            outcome(1, 3, true),
            outcome(1, 10, false),
        ];
        let states = review_states(&history, &config);
        let state = &states[&1];
        assert_eq!(state.streak, 0);
        assert_eq!(state.incorrect, 1);
        assert_eq!(state.interval_days, config.base_interval_days);
        // Missed on day 10, so due again on day 11.
        assert!(state.is_due(at(12)));
        assert!(!state.is_due(at(10)));
    }

    #[test]
    fn test_streak_pushes_due_date_out() {
        let config = SrsConfig::default();
        let history = vec![
            outcome(1, 1, true),
            outcome(1, 3, true),
            outcome(1, 8, true),
        ];
        let states = review_states(&history, &config);
        let state = &states[&1];
        assert_eq!(state.streak, 3);
        // streak 3 -> 1.0 * 2.2^2 = 4.84 days after day 8
        assert!(!state.is_due(at(11)));
        assert!(state.is_due(at(13)));
    }

    #[test]
    fn test_overdue_and_struggled_words_come_first() {
        let config = SrsConfig::default();
        // Word 1: missed recently. Word 2: long streak, not due. Word 3: fresh.
        let history = vec![
            outcome(1, 1, false),
            outcome(2, 1, true),
            outcome(2, 3, true),
            outcome(2, 8, true),
        ];
        let states = review_states(&history, &config);
        let mut rng = StdRng::seed_from_u64(7);
        let picked = plan_session(&states, &[1, 2, 3], 2, at(9), &mut rng);

        assert_eq!(picked.len(), 2);
        assert!(picked.contains(&1), "missed word must be selected");
        assert!(picked.contains(&3), "fresh word fills before a not-due word");
        assert!(!picked.contains(&2));
    }

    #[test]
    fn test_plan_session_unique_and_bounded() {
        let config = SrsConfig::default();
        let states = review_states(&[], &config);
        let mut rng = StdRng::seed_from_u64(42);
        let ids: Vec<i64> = (1..=20).collect();
        let picked = plan_session(&states, &ids, 5, at(9), &mut rng);
        assert_eq!(picked.len(), 5);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 5, "no duplicate words in a session");
    }

    #[test]
    fn test_plan_session_deterministic_with_seed() {
        let config = SrsConfig::default();
        let states = review_states(&[outcome(1, 1, false)], &config);
        let ids: Vec<i64> = (1..=10).collect();

        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        let a = plan_session(&states, &ids, 5, at(9), &mut rng_a);
        let b = plan_session(&states, &ids, 5, at(9), &mut rng_b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_glossary_yields_short_session() {
        let config = SrsConfig::default();
        let states = review_states(&[], &config);
        let mut rng = StdRng::seed_from_u64(1);
        let picked = plan_session(&states, &[1, 2], 5, at(9), &mut rng);
        assert_eq!(picked.len(), 2);
    }
}
