//src/commit.rs
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::db::{self, NewSet, WorkoutUpdate};
use crate::session::{SessionError, SessionSet, WorkoutSession};

/// The storage operations the commit sequence needs.
pub trait WorkoutStore {
    fn create_workout(
        &mut self,
        name: Option<&str>,
        started_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> anyhow::Result<i64>;

    /// Links an exercise to the workout. Returns the link id.
    fn add_exercise(
        &mut self,
        workout_id: i64,
        exercise_id: i64,
        notes: Option<&str>,
        superset_group_id: Option<u32>,
    ) -> anyhow::Result<i64>;

    /// Appends a set to a link. Returns the set id.
    fn add_set(&mut self, link_id: i64, set: &NewSet) -> anyhow::Result<i64>;

    fn update_duration(&mut self, workout_id: i64, minutes: i64) -> anyhow::Result<()>;

    /// Overwrites the name and notes of an existing workout record.
    fn update_workout(
        &mut self,
        workout_id: i64,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> anyhow::Result<()>;

    /// Deletes every exercise link (and its sets) of a workout.
    fn clear_exercises(&mut self, workout_id: i64) -> anyhow::Result<()>;
}

/// `WorkoutStore` backed by the SQLite database.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
    user_id: i64,
}

impl<'a> SqliteStore<'a> {
    pub const fn new(conn: &'a Connection, user_id: i64) -> Self {
        Self { conn, user_id }
    }
}

impl WorkoutStore for SqliteStore<'_> {
    fn create_workout(
        &mut self,
        name: Option<&str>,
        started_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> anyhow::Result<i64> {
        Ok(db::create_workout(self.conn, self.user_id, name, started_at, notes)?)
    }

    fn add_exercise(
        &mut self,
        workout_id: i64,
        exercise_id: i64,
        notes: Option<&str>,
        superset_group_id: Option<u32>,
    ) -> anyhow::Result<i64> {
        Ok(db::add_workout_exercise(
            self.conn,
            workout_id,
            exercise_id,
            notes,
            superset_group_id,
        )?)
    }

    fn add_set(&mut self, link_id: i64, set: &NewSet) -> anyhow::Result<i64> {
        Ok(db::add_set(self.conn, link_id, set)?)
    }

    fn update_duration(&mut self, workout_id: i64, minutes: i64) -> anyhow::Result<()> {
        Ok(db::set_workout_duration(self.conn, self.user_id, workout_id, minutes)?)
    }

    fn update_workout(
        &mut self,
        workout_id: i64,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> anyhow::Result<()> {
        let update = WorkoutUpdate {
            name: Some(name),
            notes: Some(notes),
            ..WorkoutUpdate::default()
        };
        db::update_workout(self.conn, self.user_id, workout_id, &update)?;
        Ok(())
    }

    fn clear_exercises(&mut self, workout_id: i64) -> anyhow::Result<()> {
        db::clear_workout_exercises(self.conn, self.user_id, workout_id)?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No workout in progress to save.")]
    NotActive,
    #[error("Could not create the workout record: {0:#}")]
    CreateWorkout(anyhow::Error),
    #[error("Could not rewrite partially saved workout {0}: {1:#}")]
    RewriteWorkout(i64, anyhow::Error),
    #[error("Could not record the duration of workout {0}: {1:#}")]
    UpdateDuration(i64, anyhow::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CommitReport {
    pub workout_id: i64,
    pub duration_minutes: i64,
    /// Exercises stored with this workout.
    pub exercises_saved: usize,
    /// Completed sets stored with this workout.
    pub sets_saved: usize,
    /// Exercises that were left out or cut short by a storage failure.
    pub skipped_exercises: Vec<String>,
}

impl From<&SessionSet> for NewSet {
    fn from(set: &SessionSet) -> Self {
        Self {
            weight: set.weight,
            reps: set.reps,
            rpe: set.rpe,
            is_warmup: set.is_warmup,
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Writes the active workout to `store` and, on success, ends the session.
///
/// The workout record comes first, then every exercise with completed sets,
/// then the duration. A failing link or set is logged and skipped. When an
/// earlier attempt already created the record, its name and notes are
/// overwritten and its exercises are written again from the current session.
/// # Errors
/// - `CommitError::NotActive` when there is nothing to save; storage is not
///   touched.
/// - `CommitError::CreateWorkout`, `CommitError::RewriteWorkout` or
///   `CommitError::UpdateDuration` when the workout record cannot be
///   written; the session stays active and remembers the record's id.
pub fn commit_session<S: WorkoutStore + ?Sized>(
    session: &mut WorkoutSession,
    store: &mut S,
    now: DateTime<Utc>,
) -> Result<CommitReport, CommitError> {
    let workout = session.workout().ok_or(CommitError::NotActive)?.clone();
    let name = non_empty(&workout.name);
    let notes = non_empty(&workout.notes);

    let workout_id = match workout.workout_id {
        Some(id) => {
            tracing::info!(workout_id = id, "rewriting partially saved workout");
            store
                .update_workout(id, name, notes)
                .and_then(|()| store.clear_exercises(id))
                .map_err(|e| CommitError::RewriteWorkout(id, e))?;
            id
        }
        None => {
            let id = store
                .create_workout(name, workout.started_at, notes)
                .map_err(CommitError::CreateWorkout)?;
            session.set_workout_id(id)?;
            id
        }
    };

    let mut report = CommitReport {
        workout_id,
        ..CommitReport::default()
    };

    for exercise in &workout.exercises {
        if !exercise.has_completed_sets() {
            tracing::debug!(exercise = %exercise.exercise_name, "no completed sets, not saved");
            continue;
        }

        let link_id = match store.add_exercise(
            workout_id,
            exercise.exercise_id,
            non_empty(&exercise.notes),
            exercise.superset_group_id,
        ) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    exercise = %exercise.exercise_name,
                    "failed to save exercise, skipping it: {e:#}"
                );
                report.skipped_exercises.push(exercise.exercise_name.clone());
                continue;
            }
        };
        report.exercises_saved += 1;

        for (set_index, set) in exercise.sets.iter().enumerate().filter(|(_, s)| s.completed) {
            if let Err(e) = store.add_set(link_id, &NewSet::from(set)) {
                tracing::warn!(
                    exercise = %exercise.exercise_name,
                    set = set_index + 1,
                    "failed to save set, skipping the rest of this exercise: {e:#}"
                );
                report.skipped_exercises.push(exercise.exercise_name.clone());
                break;
            }
            report.sets_saved += 1;
        }
    }

    let minutes = workout.elapsed_minutes(now);
    store
        .update_duration(workout_id, minutes)
        .map_err(|e| CommitError::UpdateDuration(workout_id, e))?;

    report.duration_minutes = session.finish(now)?;
    tracing::info!(
        workout_id,
        exercises = report.exercises_saved,
        sets = report.sets_saved,
        "workout saved"
    );
    Ok(report)
}
