//src/analytics.rs

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use strum_macros::{Display, EnumString};

/// One stored set together with the context analytics needs. The functions
/// below are pure over slices of these; callers pass "today" explicitly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySet {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    /// Local calendar date of the owning workout.
    pub performed_on: NaiveDate,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub is_warmup: bool,
}

impl HistorySet {
    fn volume(&self) -> Option<f64> {
        if self.is_warmup {
            return None;
        }
        match (self.weight, self.reps) {
            (Some(w), Some(r)) => Some(w * f64::from(r)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecord {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub max_weight: f64,
    pub max_weight_reps: u32,
    pub max_weight_date: NaiveDate,
    pub estimated_1rm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VolumePeriod {
    #[default]
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumePoint {
    pub period_key: String,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DashboardStats {
    pub total_workouts: usize,
    pub workouts_this_week: usize,
    pub workouts_this_month: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub volume_this_week: f64,
}

fn raw_1rm(weight: f64, reps: u32) -> Option<f64> {
    if weight > 0.0 && reps > 0 {
        Some(weight * (1.0 + f64::from(reps) / 30.0))
    } else {
        None
    }
}

/// Epley estimate, rounded to a whole number. `None` unless both weight and
/// reps are positive.
#[must_use]
pub fn estimated_1rm(weight: f64, reps: u32) -> Option<f64> {
    raw_1rm(weight, reps).map(f64::round)
}

/// Best set per exercise by estimated 1RM. On ties the set seen first wins,
/// so feed sets in a stable order (storage returns newest workout first).
/// Output is sorted by estimate, highest first.
#[must_use]
pub fn personal_records(sets: &[HistorySet]) -> Vec<PersonalRecord> {
    let mut order: Vec<i64> = Vec::new();
    let mut best: HashMap<i64, (f64, &HistorySet)> = HashMap::new();

    for set in sets.iter().filter(|s| !s.is_warmup) {
        let (Some(weight), Some(reps)) = (set.weight, set.reps) else {
            continue;
        };
        let Some(e1rm) = raw_1rm(weight, reps) else {
            continue;
        };
        match best.get(&set.exercise_id) {
            Some((current, _)) if e1rm <= *current => {}
            Some(_) => {
                best.insert(set.exercise_id, (e1rm, set));
            }
            None => {
                order.push(set.exercise_id);
                best.insert(set.exercise_id, (e1rm, set));
            }
        }
    }

    let mut records: Vec<PersonalRecord> = order
        .into_iter()
        .filter_map(|id| best.remove(&id))
        .map(|(e1rm, set)| PersonalRecord {
            exercise_id: set.exercise_id,
            exercise_name: set.exercise_name.clone(),
            max_weight: set.weight.unwrap_or_default(),
            max_weight_reps: set.reps.unwrap_or_default(),
            max_weight_date: set.performed_on,
            estimated_1rm: e1rm.round(),
        })
        .collect();
    records.sort_by(|a, b| b.estimated_1rm.total_cmp(&a.estimated_1rm));
    records
}

/// Monday of the ISO week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn period_key(date: NaiveDate, period: VolumePeriod) -> String {
    match period {
        VolumePeriod::Weekly => week_start(date).format("%Y-%m-%d").to_string(),
        VolumePeriod::Monthly => date.format("%Y-%m").to_string(),
    }
}

/// Working-set volume per week or month. Only periods with at least one
/// contributing set appear; keys ascend.
#[must_use]
pub fn volume_series(sets: &[HistorySet], period: VolumePeriod) -> Vec<VolumePoint> {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for set in sets {
        if let Some(volume) = set.volume() {
            *buckets
                .entry(period_key(set.performed_on, period))
                .or_insert(0.0) += volume;
        }
    }
    buckets
        .into_iter()
        .map(|(period_key, volume)| VolumePoint {
            period_key,
            volume: volume.round(),
        })
        .collect()
}

/// First day included in a volume chart: twelve weeks back for weekly data,
/// the first of the month a year back for monthly data.
#[must_use]
pub fn volume_window_start(period: VolumePeriod, today: NaiveDate) -> NaiveDate {
    match period {
        VolumePeriod::Weekly => today - Duration::weeks(12),
        VolumePeriod::Monthly => month_start(today)
            .checked_sub_months(Months::new(12))
            .unwrap_or(today),
    }
}

/// Total working-set volume of sets performed on or after `since`.
#[must_use]
pub fn volume_since(sets: &[HistorySet], since: NaiveDate) -> f64 {
    sets.iter()
        .filter(|s| s.performed_on >= since)
        .filter_map(HistorySet::volume)
        .sum::<f64>()
        .round()
}

/// Current and longest runs of consecutive training days.
///
/// The current streak only counts when the latest workout was today or
/// yesterday.
#[must_use]
pub fn streaks(dates: &[NaiveDate], today: NaiveDate) -> Streaks {
    let distinct: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let sorted: Vec<NaiveDate> = distinct.into_iter().rev().collect();
    let Some(&latest) = sorted.first() else {
        return Streaks::default();
    };

    let consecutive = |w: &[NaiveDate]| w[0] - w[1] == Duration::days(1);

    let current = if latest == today || latest == today - Duration::days(1) {
        1 + sorted.windows(2).take_while(|w| consecutive(w)).count()
    } else {
        0
    };

    let mut longest = 1;
    let mut run = 1;
    for w in sorted.windows(2) {
        if consecutive(w) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    Streaks {
        current: u32::try_from(current).unwrap_or(u32::MAX),
        longest: u32::try_from(longest).unwrap_or(u32::MAX),
    }
}

/// Number of workout dates within `[start, end]`.
#[must_use]
pub fn count_since(dates: &[NaiveDate], start: NaiveDate, end: NaiveDate) -> usize {
    dates.iter().filter(|d| **d >= start && **d <= end).count()
}

/// Summary numbers for the home screen. `workout_dates` holds one entry per
/// workout (duplicates allowed).
#[must_use]
pub fn dashboard(workout_dates: &[NaiveDate], sets: &[HistorySet], today: NaiveDate) -> DashboardStats {
    let week = week_start(today);
    let streaks = streaks(workout_dates, today);
    DashboardStats {
        total_workouts: workout_dates.len(),
        workouts_this_week: count_since(workout_dates, week, today),
        workouts_this_month: count_since(workout_dates, month_start(today), today),
        current_streak: streaks.current,
        longest_streak: streaks.longest,
        volume_this_week: volume_since(sets, week),
    }
}
