//! SM-2 review transitions
//!
//! Pure functions over [`ReviewState`]. They never touch storage; the
//! [`super::ReviewService`] loads, transitions and writes back under a
//! version check.

use chrono::{DateTime, Days, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    constants::{
        AGAIN_EASE_PENALTY, DEFAULT_EASE_FACTOR, FIRST_GOOD_INTERVAL_DAYS, HARD_EASE_PENALTY,
        HARD_INTERVAL_MULTIPLIER, MASTERY_INTERVAL_DAYS, MIN_EASE_FACTOR, SHORT_INTERVAL_DAYS,
    },
    error::SchedulingError,
    models::{Rating, ReviewState},
};

/// Apply `rating` to `state` as of `today`
pub fn rate(state: &ReviewState, rating: Rating, today: NaiveDate) -> ReviewState {
    let mut next = state.clone();
    let first_review = state.is_first_review();

    match rating {
        Rating::Again => {
            next.ease_factor = lower_ease(state.ease_factor, AGAIN_EASE_PENALTY);
            schedule(&mut next, SHORT_INTERVAL_DAYS, today);
        }
        Rating::Hard => {
            next.ease_factor = lower_ease(state.ease_factor, HARD_EASE_PENALTY);
            let interval = if first_review {
                SHORT_INTERVAL_DAYS
            } else {
                grow(state.interval_days, HARD_INTERVAL_MULTIPLIER)
            };
            schedule(&mut next, interval, today);
        }
        Rating::Good => {
            let interval = if first_review {
                FIRST_GOOD_INTERVAL_DAYS
            } else {
                grow(state.interval_days, state.ease_factor)
            };
            schedule(&mut next, interval, today);
        }
        Rating::Mastered => {
            next.is_mastered = true;
            next.next_review_date = None;
        }
    }

    next.review_count += 1;
    next.show_again = false;
    next
}

/// Put a mastered item back into rotation, due `today`
pub fn show_again(state: &ReviewState, today: NaiveDate) -> Result<ReviewState, SchedulingError> {
    if !state.is_mastered {
        return Err(SchedulingError::NotMastered);
    }

    let mut next = state.clone();
    next.is_mastered = false;
    next.show_again = true;
    next.ease_factor = DEFAULT_EASE_FACTOR;
    next.interval_days = next.interval_days.max(SHORT_INTERVAL_DAYS);
    next.next_review_date = Some(today);
    Ok(next)
}

/// Record a passing submission.
///
/// A missing row is created with a provisional one-day schedule. Existing
/// rows only have their solve counters touched; the rating that follows
/// decides the schedule.
pub fn record_solve(
    existing: Option<&ReviewState>,
    user_id: Uuid,
    problem_id: Uuid,
    now: DateTime<Utc>,
) -> ReviewState {
    let mut next = match existing {
        Some(state) => state.clone(),
        None => {
            let mut fresh = ReviewState::new(user_id, problem_id);
            fresh.interval_days = SHORT_INTERVAL_DAYS;
            fresh.next_review_date = Some(add_days(now.date_naive(), SHORT_INTERVAL_DAYS));
            fresh
        }
    };

    next.times_solved += 1;
    next.last_solved_at = Some(now);
    next
}

/// Structural invariants every persisted state satisfies
pub fn is_consistent(state: &ReviewState) -> bool {
    let ease_ok = state.ease_factor >= MIN_EASE_FACTOR;
    let schedule_ok = if state.is_mastered {
        state.next_review_date.is_none()
    } else {
        state.next_review_date.is_some() && state.interval_days >= 1
    };
    ease_ok && schedule_ok
}

fn lower_ease(ease: f64, penalty: f64) -> f64 {
    (ease - penalty).max(MIN_EASE_FACTOR)
}

/// Next interval after a successful recall; always strictly longer
fn grow(interval_days: i32, factor: f64) -> i32 {
    let scaled = (f64::from(interval_days) * factor).round() as i32;
    scaled.max(interval_days + 1)
}

fn schedule(state: &mut ReviewState, interval_days: i32, today: NaiveDate) {
    state.interval_days = interval_days;
    if interval_days >= MASTERY_INTERVAL_DAYS {
        state.is_mastered = true;
        state.next_review_date = None;
    } else {
        state.is_mastered = false;
        state.next_review_date = Some(add_days(today, interval_days));
    }
}

fn add_days(date: NaiveDate, days: i32) -> NaiveDate {
    date.checked_add_days(Days::new(days.max(0) as u64))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn fresh() -> ReviewState {
        let now = today().and_hms_opt(9, 0, 0).unwrap().and_utc();
        record_solve(None, Uuid::new_v4(), Uuid::new_v4(), now)
    }

    fn reviewed(interval_days: i32, ease_factor: f64) -> ReviewState {
        let mut state = fresh();
        state.review_count = 3;
        state.interval_days = interval_days;
        state.ease_factor = ease_factor;
        state.next_review_date = Some(today());
        state
    }

    #[test]
    fn test_record_solve_creates_provisional_schedule() {
        let state = fresh();
        assert_eq!(state.times_solved, 1);
        assert_eq!(state.review_count, 0);
        assert_eq!(state.interval_days, 1);
        assert_eq!(state.next_review_date, today().succ_opt());
        assert_eq!(state.ease_factor, DEFAULT_EASE_FACTOR);
        assert!(is_consistent(&state));
    }

    #[test]
    fn test_record_solve_keeps_existing_schedule() {
        let existing = reviewed(12, 2.2);
        let later = Utc::now();

        let next = record_solve(Some(&existing), existing.user_id, existing.problem_id, later);
        assert_eq!(next.times_solved, existing.times_solved + 1);
        assert_eq!(next.last_solved_at, Some(later));
        assert_eq!(next.interval_days, 12);
        assert_eq!(next.next_review_date, existing.next_review_date);
        assert_eq!(next.review_count, existing.review_count);
    }

    #[test]
    fn test_first_hard_rating() {
        let next = rate(&fresh(), Rating::Hard, today());
        assert_eq!(next.interval_days, 1);
        assert!((next.ease_factor - 2.35).abs() < 1e-9);
        assert_eq!(next.next_review_date, today().succ_opt());
        assert_eq!(next.review_count, 1);
    }

    #[test]
    fn test_first_good_rating() {
        let next = rate(&fresh(), Rating::Good, today());
        assert_eq!(next.interval_days, 3);
        assert_eq!(next.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(next.next_review_date, Some(add_days(today(), 3)));
    }

    #[test]
    fn test_good_past_threshold_masters() {
        let next = rate(&reviewed(20, 2.0), Rating::Good, today());
        assert!(next.is_mastered);
        assert_eq!(next.next_review_date, None);
        assert_eq!(next.interval_days, 40);
        assert!(is_consistent(&next));
    }

    #[test]
    fn test_good_and_hard_strictly_grow_interval() {
        for interval in 1..30 {
            for ease in [1.3, 1.7, 2.5, 2.9] {
                let state = reviewed(interval, ease);
                for rating in [Rating::Good, Rating::Hard] {
                    let next = rate(&state, rating, today());
                    assert!(
                        next.interval_days > interval,
                        "{rating} from {interval}d at ease {ease} gave {}d",
                        next.interval_days
                    );
                    assert!(is_consistent(&next));
                }
            }
        }
    }

    #[test]
    fn test_again_resets_interval_and_floors_ease() {
        let mut state = reviewed(15, 1.5);
        for _ in 0..5 {
            state = rate(&state, Rating::Again, today());
            assert_eq!(state.interval_days, 1);
            assert_eq!(state.next_review_date, today().succ_opt());
            assert!(state.ease_factor >= MIN_EASE_FACTOR);
        }
        assert_eq!(state.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_mastered_rating_clears_schedule() {
        let state = reviewed(8, 2.3);
        let next = rate(&state, Rating::Mastered, today());
        assert!(next.is_mastered);
        assert_eq!(next.next_review_date, None);
        assert_eq!(next.interval_days, 8);
        assert_eq!(next.ease_factor, 2.3);
        assert!(is_consistent(&next));
    }

    #[test]
    fn test_rating_a_mastered_item_unmasters_it() {
        let mastered = rate(&reviewed(8, 2.3), Rating::Mastered, today());
        let next = rate(&mastered, Rating::Again, today());
        assert!(!next.is_mastered);
        assert!(is_consistent(&next));
    }

    #[test]
    fn test_show_again_then_good() {
        let mastered = rate(&reviewed(20, 2.0), Rating::Good, today());
        let requeued = show_again(&mastered, today()).unwrap();
        assert!(!requeued.is_mastered);
        assert!(requeued.show_again);
        assert_eq!(requeued.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(requeued.next_review_date, Some(today()));
        assert!(requeued.is_due(today()));

        let next = rate(&requeued, Rating::Good, today());
        assert_eq!(next.interval_days, 3);
        assert!(!next.show_again);
    }

    #[test]
    fn test_show_again_requires_mastered() {
        assert_eq!(show_again(&fresh(), today()), Err(SchedulingError::NotMastered));
    }

    #[test]
    fn test_every_rating_counts_a_review() {
        for rating in [Rating::Again, Rating::Hard, Rating::Good, Rating::Mastered] {
            let state = reviewed(5, 2.5);
            assert_eq!(rate(&state, rating, today()).review_count, 4);
        }
    }
}
