//! Pure aggregation over already-fetched progress rows.
//!
//! Everything here is synchronous, side-effect free, and recomputed wholesale
//! on every call; per-user datasets are tens to low hundreds of rows. Missing
//! or null inputs degrade to zeroed defaults rather than erroring.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ChallengeProgress, Exercise, ExerciseProgress, ProgressStatus};

/// Sentinel group for units without a category label.
pub const UNCATEGORIZED: &str = "Uncategorized";

//
// ─── INPUTS ────────────────────────────────────────────────────────────────────
//

/// One user's progress against one learning unit, reduced to what the
/// aggregations need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub entity_id: u64,
    pub status: ProgressStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&ExerciseProgress> for CompletionRecord {
    fn from(progress: &ExerciseProgress) -> Self {
        Self {
            entity_id: progress.exercise_id.value(),
            status: progress.status,
            completed_at: progress.completed_at,
        }
    }
}

impl From<&ChallengeProgress> for CompletionRecord {
    fn from(progress: &ChallengeProgress) -> Self {
        Self {
            entity_id: progress.challenge_id.value(),
            status: progress.status,
            completed_at: progress.completed_at,
        }
    }
}

/// A learning unit with an optional grouping label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizedUnit {
    pub id: u64,
    pub category: Option<String>,
}

impl From<&Exercise> for CategorizedUnit {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.id.value(),
            category: exercise.category.clone(),
        }
    }
}

//
// ─── DERIVED SUMMARIES ─────────────────────────────────────────────────────────
//

/// Consecutive-day completion streak, recomputed from scratch each call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub best: u32,
    pub last_activity_date: Option<NaiveDate>,
}

/// Completion count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub count: u32,
}

/// Completed/total counts for one category of units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub completed: u32,
    pub total: u32,
}

//
// ─── STREAK ────────────────────────────────────────────────────────────────────
//

/// Compute the current and best consecutive-day streaks.
///
/// Timestamps are reduced to calendar days and deduplicated, so several
/// completions on one day count once. A streak lapses when the gap between
/// `today` and the most recent activity day exceeds one day: `current` is
/// forced to 0 while `best` keeps the historical maximum.
#[must_use]
pub fn completion_streak(records: &[CompletionRecord], today: NaiveDate) -> StreakState {
    let days: BTreeSet<NaiveDate> = records
        .iter()
        .filter_map(|record| record.completed_at)
        .map(|at| at.date_naive())
        .collect();

    let Some(most_recent) = days.iter().next_back().copied() else {
        return StreakState::default();
    };

    let mut current = 1_u32;
    let mut best = 1_u32;
    let mut newer = most_recent;
    for &older in days.iter().rev().skip(1) {
        if (newer - older).num_days() == 1 {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
        newer = older;
    }

    if (today - most_recent).num_days() > 1 {
        current = 0;
    }

    StreakState {
        current,
        best,
        last_activity_date: Some(most_recent),
    }
}

//
// ─── MONTHLY HISTOGRAM ─────────────────────────────────────────────────────────
//

/// Bucket completions by calendar month over a trailing window.
///
/// Returns exactly `window_months` buckets ending at the month of `reference`,
/// ordered oldest to newest; months without activity appear with a zero count
/// and completions outside the window are ignored.
#[must_use]
pub fn monthly_completions(
    records: &[CompletionRecord],
    window_months: u32,
    reference: NaiveDate,
) -> Vec<MonthlyBucket> {
    let mut keys = Vec::with_capacity(window_months as usize);
    let mut year = reference.year();
    let mut month = reference.month();
    for _ in 0..window_months {
        keys.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    keys.reverse();

    let mut counts: BTreeMap<(i32, u32), u32> = keys.iter().map(|&key| (key, 0)).collect();
    for record in records {
        let Some(at) = record.completed_at else {
            continue;
        };
        let date = at.date_naive();
        if let Some(count) = counts.get_mut(&(date.year(), date.month())) {
            *count += 1;
        }
    }

    keys.into_iter()
        .map(|(year, month)| MonthlyBucket {
            year,
            month,
            label: month_label(year, month),
            count: counts.get(&(year, month)).copied().unwrap_or(0),
        })
        .collect()
}

fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first.format("%b %Y").to_string(),
        None => format!("{month}/{year}"),
    }
}

//
// ─── CATEGORY ROLLUP ───────────────────────────────────────────────────────────
//

/// Roll units up into per-category completed/total counts.
///
/// A missing, empty, or whitespace-only category is coerced to
/// [`UNCATEGORIZED`]. Output is sorted by category name, but callers should
/// treat the order as unspecified.
#[must_use]
pub fn category_progress(
    units: &[CategorizedUnit],
    completed_ids: &BTreeSet<u64>,
) -> Vec<CategoryCount> {
    let mut groups: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for unit in units {
        let name = unit
            .category
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(UNCATEGORIZED);
        let entry = groups.entry(name).or_default();
        entry.1 += 1;
        if completed_ids.contains(&unit.id) {
            entry.0 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(name, (completed, total))| CategoryCount {
            name: name.to_owned(),
            completed,
            total,
        })
        .collect()
}

/// Whole-number completion percentage, 0 when there is nothing to complete.
#[must_use]
pub fn completion_percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let ratio = completed as f64 / total as f64;
    (ratio * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn completed_on(date: NaiveDate) -> CompletionRecord {
        let at = Utc.from_utc_datetime(&date.and_hms_opt(14, 30, 0).unwrap());
        CompletionRecord {
            entity_id: 0,
            status: ProgressStatus::Completed,
            completed_at: Some(at),
        }
    }

    fn pending() -> CompletionRecord {
        CompletionRecord {
            entity_id: 0,
            status: ProgressStatus::InProgress,
            completed_at: None,
        }
    }

    #[test]
    fn empty_records_yield_zeroed_streak() {
        let state = completion_streak(&[], day(2025, 6, 10));
        assert_eq!(state, StreakState::default());
        assert_eq!(state.last_activity_date, None);
    }

    #[test]
    fn records_without_completions_yield_zeroed_streak() {
        let state = completion_streak(&[pending(), pending()], day(2025, 6, 10));
        assert_eq!(state.current, 0);
        assert_eq!(state.best, 0);
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let today = day(2025, 6, 10);
        let records = vec![
            completed_on(day(2025, 6, 8)),
            completed_on(day(2025, 6, 9)),
            completed_on(today),
        ];
        let state = completion_streak(&records, today);
        assert_eq!(state.current, 3);
        assert_eq!(state.best, 3);
        assert_eq!(state.last_activity_date, Some(today));
    }

    #[test]
    fn gap_of_two_days_resets_the_run() {
        let today = day(2025, 6, 10);
        let records = vec![completed_on(day(2025, 6, 8)), completed_on(today)];
        let state = completion_streak(&records, today);
        assert_eq!(state.current, 1);
        assert_eq!(state.best, 1);
    }

    #[test]
    fn duplicate_days_count_once() {
        let today = day(2025, 6, 10);
        let records = vec![
            completed_on(today),
            completed_on(today),
            completed_on(day(2025, 6, 9)),
        ];
        let state = completion_streak(&records, today);
        assert_eq!(state.current, 2);
    }

    #[test]
    fn single_completion_yesterday_is_a_live_streak_of_one() {
        let state = completion_streak(&[completed_on(day(2025, 6, 9))], day(2025, 6, 10));
        assert_eq!(state.current, 1);
        assert_eq!(state.best, 1);
    }

    #[test]
    fn stale_activity_lapses_current_but_keeps_best() {
        let records = vec![
            completed_on(day(2025, 6, 1)),
            completed_on(day(2025, 6, 2)),
            completed_on(day(2025, 6, 3)),
        ];
        let state = completion_streak(&records, day(2025, 6, 10));
        assert_eq!(state.current, 0);
        assert_eq!(state.best, 3);
        assert_eq!(state.last_activity_date, Some(day(2025, 6, 3)));
    }

    #[test]
    fn streak_is_idempotent() {
        let today = day(2025, 6, 10);
        let records = vec![completed_on(today), completed_on(day(2025, 6, 9))];
        assert_eq!(
            completion_streak(&records, today),
            completion_streak(&records, today)
        );
    }

    #[test]
    fn monthly_window_is_always_fully_populated() {
        let buckets = monthly_completions(&[], 12, day(2025, 6, 15));
        assert_eq!(buckets.len(), 12);
        assert!(buckets.iter().all(|bucket| bucket.count == 0));
        assert_eq!((buckets[0].year, buckets[0].month), (2024, 7));
        assert_eq!((buckets[11].year, buckets[11].month), (2025, 6));
    }

    #[test]
    fn monthly_buckets_count_in_window_and_drop_outside() {
        let records = vec![
            completed_on(day(2025, 6, 1)),
            completed_on(day(2025, 6, 20)),
            completed_on(day(2025, 4, 3)),
            // outside a 3-month window ending June
            completed_on(day(2025, 2, 3)),
        ];
        let buckets = monthly_completions(&records, 3, day(2025, 6, 15));
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].count, 1); // April
        assert_eq!(buckets[1].count, 0); // May
        assert_eq!(buckets[2].count, 2); // June
        let total: u32 = buckets.iter().map(|bucket| bucket.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn monthly_window_crosses_year_boundary() {
        let buckets = monthly_completions(&[completed_on(day(2024, 12, 31))], 4, day(2025, 2, 1));
        let labels: Vec<&str> = buckets.iter().map(|bucket| bucket.label.as_str()).collect();
        assert_eq!(labels, ["Nov 2024", "Dec 2024", "Jan 2025", "Feb 2025"]);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn category_rollup_coerces_missing_labels() {
        let units = vec![
            CategorizedUnit {
                id: 1,
                category: Some("A".into()),
            },
            CategorizedUnit {
                id: 2,
                category: Some("A".into()),
            },
            CategorizedUnit {
                id: 3,
                category: None,
            },
        ];
        let completed: BTreeSet<u64> = [1].into_iter().collect();
        let mut counts = category_progress(&units, &completed);
        counts.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            counts,
            vec![
                CategoryCount {
                    name: "A".into(),
                    completed: 1,
                    total: 2,
                },
                CategoryCount {
                    name: UNCATEGORIZED.into(),
                    completed: 0,
                    total: 1,
                },
            ]
        );
    }

    #[test]
    fn category_rollup_treats_blank_as_uncategorized() {
        let units = vec![CategorizedUnit {
            id: 9,
            category: Some("   ".into()),
        }];
        let counts = category_progress(&units, &BTreeSet::new());
        assert_eq!(counts[0].name, UNCATEGORIZED);
        assert_eq!(counts[0].total, 1);
    }

    #[test]
    fn percentage_rounds_and_handles_zero_total() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(3, 3), 100);
    }
}
