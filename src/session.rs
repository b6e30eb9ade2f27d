//src/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

use crate::rest_timer::{RestTimer, TimerError};

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("No workout in progress. Start one with 'start'.")]
    NotActive,
    #[error("Exercise index {0} is out of range.")]
    ExerciseOutOfRange(usize),
    #[error("Set index {set} is out of range for exercise {exercise}.")]
    SetOutOfRange { exercise: usize, set: usize },
    #[error("Invalid set value: {0}")]
    InvalidSet(String),
    #[error("Cannot group exercises: {0}")]
    InvalidGroup(String),
    #[error("Superset groups are malformed: {0}")]
    MalformedSupersets(String),
    #[error(transparent)]
    Timer(#[from] TimerError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Catalog entry the session refers to when an exercise is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseRef {
    pub exercise_id: i64,
    pub name: String,
    pub muscle_group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSet {
    pub id: String,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub rpe: Option<f64>,
    pub is_warmup: bool,
    pub completed: bool,
}

impl SessionSet {
    fn empty() -> Self {
        Self {
            id: new_client_id(),
            weight: None,
            reps: None,
            rpe: None,
            is_warmup: false,
            completed: false,
        }
    }

    /// weight × reps, zero when either is missing.
    pub fn volume(&self) -> f64 {
        match (self.weight, self.reps) {
            (Some(w), Some(r)) => w * f64::from(r),
            _ => 0.0,
        }
    }
}

/// Weight/reps from the last time this exercise was done. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GhostSet {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExercise {
    pub id: String,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub muscle_group: String,
    pub notes: String,
    pub superset_group_id: Option<u32>,
    pub sets: Vec<SessionSet>,
    #[serde(skip)]
    ghosts: Vec<GhostSet>,
}

impl SessionExercise {
    fn from_ref(exercise: ExerciseRef) -> Self {
        Self {
            id: new_client_id(),
            exercise_id: exercise.exercise_id,
            exercise_name: exercise.name,
            muscle_group: exercise.muscle_group,
            notes: String::new(),
            superset_group_id: None,
            sets: vec![SessionSet::empty()],
            ghosts: Vec::new(),
        }
    }

    /// Ghost values for the set at `set_index`, if history had one there.
    pub fn ghost(&self, set_index: usize) -> Option<GhostSet> {
        self.ghosts.get(set_index).copied()
    }

    pub fn completed_sets(&self) -> impl Iterator<Item = &SessionSet> {
        self.sets.iter().filter(|s| s.completed)
    }

    pub fn has_completed_sets(&self) -> bool {
        self.sets.iter().any(|s| s.completed)
    }

    /// 1-based number among working sets; warmups are not numbered.
    pub fn working_set_number(&self, set_index: usize) -> Option<usize> {
        let set = self.sets.get(set_index)?;
        if set.is_warmup {
            return None;
        }
        Some(self.sets[..=set_index].iter().filter(|s| !s.is_warmup).count())
    }
}

/// Partial update for a set. `None` leaves the field untouched; `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetUpdate {
    pub weight: Option<Option<f64>>,
    pub reps: Option<Option<u32>>,
    pub rpe: Option<Option<f64>>,
    pub is_warmup: Option<bool>,
}

impl SetUpdate {
    pub(crate) fn validate(&self) -> SessionResult<()> {
        if let Some(Some(w)) = self.weight {
            if !w.is_finite() || w < 0.0 {
                return Err(SessionError::InvalidSet(format!(
                    "weight must be a non-negative number, got {w}"
                )));
            }
        }
        if let Some(Some(rpe)) = self.rpe {
            if !(1.0..=10.0).contains(&rpe) {
                return Err(SessionError::InvalidSet(format!(
                    "RPE must be between 1 and 10, got {rpe}"
                )));
            }
        }
        Ok(())
    }
}

/// Exercise entry of a saved template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub exercise: ExerciseRef,
    pub superset_group_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveWorkout {
    /// Storage id once a save has created the workout record. A later save
    /// rewrites that record instead of creating another.
    pub workout_id: Option<i64>,
    pub name: String,
    pub notes: String,
    pub started_at: DateTime<Utc>,
    pub exercises: Vec<SessionExercise>,
}

impl ActiveWorkout {
    /// Minutes since start, rounded to the nearest minute.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        let millis = (now - self.started_at).num_milliseconds().max(0);
        (millis + 30_000) / 60_000
    }

    pub fn completed_set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.completed_sets().count()).sum()
    }

    /// Volume of completed working sets.
    pub fn volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.completed_sets())
            .filter(|s| !s.is_warmup)
            .map(SessionSet::volume)
            .sum()
    }
}

/// The in-progress workout, owned by whoever drives it. Either inactive or
/// holding one `ActiveWorkout`; every editing operation needs an active one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutSession {
    workout: Option<ActiveWorkout>,
    #[serde(default)]
    rest_timer: RestTimer,
}

impl WorkoutSession {
    #[must_use]
    pub fn new(default_rest_seconds: u32) -> Self {
        Self {
            workout: None,
            rest_timer: RestTimer::with_default_duration(default_rest_seconds),
        }
    }

    pub const fn is_active(&self) -> bool {
        self.workout.is_some()
    }

    pub const fn workout(&self) -> Option<&ActiveWorkout> {
        self.workout.as_ref()
    }

    pub const fn rest_timer(&self) -> &RestTimer {
        &self.rest_timer
    }

    pub fn rest_timer_mut(&mut self) -> &mut RestTimer {
        &mut self.rest_timer
    }

    fn active(&self) -> SessionResult<&ActiveWorkout> {
        self.workout.as_ref().ok_or(SessionError::NotActive)
    }

    fn active_mut(&mut self) -> SessionResult<&mut ActiveWorkout> {
        self.workout.as_mut().ok_or(SessionError::NotActive)
    }

    fn exercise_mut(&mut self, index: usize) -> SessionResult<&mut SessionExercise> {
        self.active_mut()?
            .exercises
            .get_mut(index)
            .ok_or(SessionError::ExerciseOutOfRange(index))
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> SessionResult<&mut SessionSet> {
        self.exercise_mut(exercise)?
            .sets
            .get_mut(set)
            .ok_or(SessionError::SetOutOfRange { exercise, set })
    }

    /// Begins a fresh workout, replacing whatever was there.
    pub fn start(&mut self, name: Option<&str>, now: DateTime<Utc>) {
        if self.workout.is_some() {
            tracing::info!("replacing an unsaved workout session");
        }
        self.rest_timer.stop();
        self.workout = Some(ActiveWorkout {
            workout_id: None,
            name: name.map(str::trim).unwrap_or_default().to_string(),
            notes: String::new(),
            started_at: now,
            exercises: Vec::new(),
        });
    }

    /// # Errors
    /// `SessionError::NotActive` when no workout is in progress.
    pub fn set_name(&mut self, name: &str) -> SessionResult<()> {
        self.active_mut()?.name = name.trim().to_string();
        Ok(())
    }

    /// # Errors
    /// `SessionError::NotActive` when no workout is in progress.
    pub fn set_notes(&mut self, notes: &str) -> SessionResult<()> {
        self.active_mut()?.notes = notes.to_string();
        Ok(())
    }

    /// Records the storage id of the workout record.
    /// # Errors
    /// `SessionError::NotActive` when no workout is in progress.
    pub fn set_workout_id(&mut self, id: i64) -> SessionResult<()> {
        self.active_mut()?.workout_id = Some(id);
        Ok(())
    }

    /// Appends an exercise with one empty set and returns its index.
    /// # Errors
    /// `SessionError::NotActive` when no workout is in progress.
    pub fn add_exercise(&mut self, exercise: ExerciseRef) -> SessionResult<usize> {
        let workout = self.active_mut()?;
        workout.exercises.push(SessionExercise::from_ref(exercise));
        Ok(workout.exercises.len() - 1)
    }

    /// Loads a template: takes its name (if the workout has none) and
    /// appends its exercises with their superset grouping.
    /// # Errors
    /// `SessionError::NotActive` when no workout is in progress.
    pub fn apply_template(&mut self, name: &str, entries: Vec<TemplateEntry>) -> SessionResult<()> {
        let workout = self.active_mut()?;
        if workout.name.is_empty() {
            workout.name = name.trim().to_string();
        }
        let mut next_group = next_group_id(&workout.exercises);
        let mut remap: Vec<(u32, u32)> = Vec::new();
        for entry in entries {
            let mut exercise = SessionExercise::from_ref(entry.exercise);
            exercise.superset_group_id = entry.superset_group_id.map(|old| {
                if let Some(&(_, new)) = remap.iter().find(|(o, _)| *o == old) {
                    new
                } else {
                    let new = next_group;
                    next_group += 1;
                    remap.push((old, new));
                    new
                }
            });
            workout.exercises.push(exercise);
        }
        repair_supersets(&mut workout.exercises);
        Ok(())
    }

    /// Removes an exercise; superset links it leaves broken are cleared.
    /// # Errors
    /// `NotActive` or `ExerciseOutOfRange`.
    pub fn remove_exercise(&mut self, index: usize) -> SessionResult<SessionExercise> {
        let workout = self.active_mut()?;
        if index >= workout.exercises.len() {
            return Err(SessionError::ExerciseOutOfRange(index));
        }
        let removed = workout.exercises.remove(index);
        repair_supersets(&mut workout.exercises);
        Ok(removed)
    }

    /// Moves an exercise from `from` to `to`. Groups that stop being
    /// contiguous are dissolved.
    /// # Errors
    /// `NotActive` or `ExerciseOutOfRange`.
    pub fn reorder_exercise(&mut self, from: usize, to: usize) -> SessionResult<()> {
        let workout = self.active_mut()?;
        let len = workout.exercises.len();
        if from >= len {
            return Err(SessionError::ExerciseOutOfRange(from));
        }
        if to >= len {
            return Err(SessionError::ExerciseOutOfRange(to));
        }
        let moved = workout.exercises.remove(from);
        workout.exercises.insert(to, moved);
        repair_supersets(&mut workout.exercises);
        Ok(())
    }

    /// Puts consecutive, currently ungrouped exercises into a new superset.
    /// # Errors
    /// `NotActive`, `ExerciseOutOfRange` or `InvalidGroup`.
    pub fn group_exercises(&mut self, indices: &[usize]) -> SessionResult<u32> {
        let workout = self.active_mut()?;
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() < 2 {
            return Err(SessionError::InvalidGroup(
                "a superset needs at least two exercises".to_string(),
            ));
        }
        if let Some(&bad) = sorted.iter().find(|&&i| i >= workout.exercises.len()) {
            return Err(SessionError::ExerciseOutOfRange(bad));
        }
        if !is_contiguous(&sorted) {
            return Err(SessionError::InvalidGroup(
                "exercises must be next to each other".to_string(),
            ));
        }
        if let Some(&taken) = sorted
            .iter()
            .find(|&&i| workout.exercises[i].superset_group_id.is_some())
        {
            return Err(SessionError::InvalidGroup(format!(
                "exercise {taken} is already in a superset"
            )));
        }
        let group = next_group_id(&workout.exercises);
        for &i in &sorted {
            workout.exercises[i].superset_group_id = Some(group);
        }
        Ok(group)
    }

    /// Dissolves the superset containing `index`. No-op when ungrouped.
    /// # Errors
    /// `NotActive` or `ExerciseOutOfRange`.
    pub fn ungroup_exercise(&mut self, index: usize) -> SessionResult<()> {
        let workout = self.active_mut()?;
        let group = workout
            .exercises
            .get(index)
            .ok_or(SessionError::ExerciseOutOfRange(index))?
            .superset_group_id;
        if let Some(group) = group {
            for exercise in &mut workout.exercises {
                if exercise.superset_group_id == Some(group) {
                    exercise.superset_group_id = None;
                }
            }
        }
        Ok(())
    }

    /// Whether completing a set on this exercise should start rest:
    /// standalone exercises and the last member of a superset do.
    /// # Errors
    /// `NotActive` or `ExerciseOutOfRange`.
    pub fn triggers_rest(&self, index: usize) -> SessionResult<bool> {
        let exercises = &self.active()?.exercises;
        let exercise = exercises
            .get(index)
            .ok_or(SessionError::ExerciseOutOfRange(index))?;
        Ok(match exercise.superset_group_id {
            None => true,
            Some(group) => exercises
                .get(index + 1)
                .map_or(true, |next| next.superset_group_id != Some(group)),
        })
    }

    /// Checks that every group is contiguous and has at least two members.
    /// # Errors
    /// `NotActive` or `MalformedSupersets`.
    pub fn validate_supersets(&self) -> SessionResult<()> {
        match superset_problem(&self.active()?.exercises) {
            Some(problem) => Err(SessionError::MalformedSupersets(problem)),
            None => Ok(()),
        }
    }

    /// Appends a set repeating the previous set's weight and reps.
    /// # Errors
    /// `NotActive` or `ExerciseOutOfRange`.
    pub fn add_set(&mut self, exercise_index: usize) -> SessionResult<usize> {
        let exercise = self.exercise_mut(exercise_index)?;
        let mut set = SessionSet::empty();
        if let Some(last) = exercise.sets.last() {
            set.weight = last.weight;
            set.reps = last.reps;
        }
        exercise.sets.push(set);
        Ok(exercise.sets.len() - 1)
    }

    /// # Errors
    /// `NotActive`, `ExerciseOutOfRange` or `SetOutOfRange`.
    pub fn remove_set(&mut self, exercise_index: usize, set_index: usize) -> SessionResult<SessionSet> {
        let exercise = self.exercise_mut(exercise_index)?;
        if set_index >= exercise.sets.len() {
            return Err(SessionError::SetOutOfRange {
                exercise: exercise_index,
                set: set_index,
            });
        }
        if set_index < exercise.ghosts.len() {
            exercise.ghosts.remove(set_index);
        }
        Ok(exercise.sets.remove(set_index))
    }

    /// Merges `update` into the set. Never changes `completed`.
    /// # Errors
    /// `NotActive`, index errors, or `InvalidSet` (nothing is changed).
    pub fn update_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        update: &SetUpdate,
    ) -> SessionResult<()> {
        update.validate()?;
        let set = self.set_mut(exercise_index, set_index)?;
        if let Some(weight) = update.weight {
            set.weight = weight;
        }
        if let Some(reps) = update.reps {
            set.reps = reps;
        }
        if let Some(rpe) = update.rpe {
            set.rpe = rpe;
        }
        if let Some(is_warmup) = update.is_warmup {
            set.is_warmup = is_warmup;
        }
        Ok(())
    }

    /// Flips the completed flag and returns the new value.
    /// # Errors
    /// `NotActive`, `ExerciseOutOfRange` or `SetOutOfRange`.
    pub fn toggle_set_complete(&mut self, exercise_index: usize, set_index: usize) -> SessionResult<bool> {
        let set = self.set_mut(exercise_index, set_index)?;
        set.completed = !set.completed;
        Ok(set.completed)
    }

    /// Toggles a set and, when it became complete and the superset policy
    /// allows, starts the rest timer with its default duration. Returns
    /// `(completed, rest_started)`.
    /// # Errors
    /// Same as `toggle_set_complete`.
    pub fn complete_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        now: DateTime<Utc>,
    ) -> SessionResult<(bool, bool)> {
        let completed = self.toggle_set_complete(exercise_index, set_index)?;
        let rest = completed && self.triggers_rest(exercise_index)?;
        if rest {
            self.rest_timer.start_default(now);
        }
        Ok((completed, rest))
    }

    /// Starts the rest timer by hand; `None` uses the current default.
    /// # Errors
    /// `SessionError::Timer` for a zero duration.
    pub fn start_rest(&mut self, seconds: Option<u32>, now: DateTime<Utc>) -> SessionResult<()> {
        match seconds {
            Some(seconds) => self.rest_timer.start(seconds, now)?,
            None => self.rest_timer.start_default(now),
        }
        Ok(())
    }

    /// # Errors
    /// `NotActive` or `ExerciseOutOfRange`.
    pub fn set_exercise_notes(&mut self, exercise_index: usize, notes: &str) -> SessionResult<()> {
        self.exercise_mut(exercise_index)?.notes = notes.to_string();
        Ok(())
    }

    /// Attaches last-time values to the exercise's sets by position.
    /// # Errors
    /// `NotActive` or `ExerciseOutOfRange`.
    pub fn set_ghost_values(&mut self, exercise_index: usize, prior: &[GhostSet]) -> SessionResult<()> {
        self.exercise_mut(exercise_index)?.ghosts = prior.to_vec();
        Ok(())
    }

    /// Ends the workout and returns its length in whole minutes.
    /// # Errors
    /// `NotActive` if there is nothing to finish.
    pub fn finish(&mut self, now: DateTime<Utc>) -> SessionResult<i64> {
        let minutes = self.active()?.elapsed_minutes(now);
        self.clear();
        Ok(minutes)
    }

    /// Throws the workout away without saving anything.
    pub fn discard(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        self.workout = None;
        self.rest_timer.stop();
    }
}

fn new_client_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn next_group_id(exercises: &[SessionExercise]) -> u32 {
    exercises
        .iter()
        .filter_map(|e| e.superset_group_id)
        .max()
        .map_or(1, |max| max + 1)
}

/// Member indices of every superset group, in group id order.
fn group_members(exercises: &[SessionExercise]) -> Vec<(u32, Vec<usize>)> {
    let groups: BTreeSet<u32> = exercises.iter().filter_map(|e| e.superset_group_id).collect();
    groups
        .into_iter()
        .map(|group| {
            let members = exercises
                .iter()
                .enumerate()
                .filter(|(_, e)| e.superset_group_id == Some(group))
                .map(|(i, _)| i)
                .collect();
            (group, members)
        })
        .collect()
}

fn is_contiguous(members: &[usize]) -> bool {
    members.windows(2).all(|w| w[1] == w[0] + 1)
}

/// Describes the first broken group, if any.
fn superset_problem(exercises: &[SessionExercise]) -> Option<String> {
    group_members(exercises)
        .into_iter()
        .find_map(|(group, members)| {
            if members.len() < 2 {
                Some(format!("group {group} has a single exercise"))
            } else if !is_contiguous(&members) {
                Some(format!("group {group} is not contiguous"))
            } else {
                None
            }
        })
}

/// Dissolves every group that has a single member or is not contiguous.
fn repair_supersets(exercises: &mut [SessionExercise]) {
    for (group, members) in group_members(exercises) {
        if members.len() < 2 || !is_contiguous(&members) {
            tracing::debug!(group, "dissolving superset after edit");
            for i in members {
                exercises[i].superset_group_id = None;
            }
        }
    }
}
