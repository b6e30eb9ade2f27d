use anyhow::{bail, Context, Result};
// Use anyhow::Result as standard Result for service layer
use chrono::{DateTime, Duration, Local, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// --- Declare modules ---
pub mod analytics;
pub mod catalog;
pub mod commit;
mod config;
pub mod db;
pub mod rest_timer;
pub mod session;
pub mod store;

// --- Expose public types ---
pub use analytics::{DashboardStats, HistorySet, PersonalRecord, Streaks, VolumePeriod, VolumePoint};
pub use catalog::ExerciseTemplate;
pub use commit::{commit_session, CommitError, CommitReport, SqliteStore, WorkoutStore};
pub use config::{
    get_config_path as get_config_path_util, load_config as load_config_util, parse_color,
    save_config as save_config_util, Config, Error as ConfigError, StandardColor, Theme, Units,
    DEFAULT_REST_SECONDS,
};
pub use db::{
    get_db_path as get_db_path_util, DbError, ExerciseDefinition, ExerciseHistoryEntry, NewSet,
    Preferences, StoredSet, WorkoutDetail, WorkoutExerciseDetail, WorkoutRecord, WorkoutSummary,
    WorkoutTemplate, WorkoutUpdate,
};
pub use rest_timer::{RestAlert, RestTimer, Silent, TerminalBell, TimerError, TimerTick};
pub use session::{
    ActiveWorkout, ExerciseRef, GhostSet, SessionError, SessionExercise, SessionSet, SetUpdate,
    TemplateEntry, WorkoutSession,
};
pub use store::{SessionFile, StoreError};

const MAX_NAME_LEN: usize = 100;
/// How many past workouts `exercise_history` returns by default.
pub const HISTORY_LIMIT: u32 = 50;

pub struct AppService {
    pub config: Config,
    pub conn: Connection,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    /// Storage id of the configured local user.
    pub user_id: i64,
}

fn validate_name<'a>(kind: &str, name: &'a str) -> Result<&'a str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("{kind} name is required.");
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        bail!("{kind} name must be at most {MAX_NAME_LEN} characters.");
    }
    Ok(trimmed)
}

/// Start of a local calendar day as a UTC instant.
fn local_day_start(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::default());
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map_or_else(|| Utc.from_utc_datetime(&midnight), |dt| dt.with_timezone(&Utc))
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let conn = db::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        Self::with_connection(config, conn, db_path, config_path)
    }

    /// Builds the service around an already open connection: creates the
    /// schema and resolves the configured user.
    /// # Errors
    /// Returns `anyhow::Error` if the schema or user cannot be set up.
    pub fn with_connection(
        config: Config,
        conn: Connection,
        db_path: PathBuf,
        config_path: PathBuf,
    ) -> Result<Self> {
        db::init_db(&conn).context("Failed to initialize database schema")?;
        let user_name = config.user.trim();
        if user_name.is_empty() {
            return Err(ConfigError::EmptyUserName.into());
        }
        let user_id = db::ensure_user(&conn, user_name)
            .with_context(|| format!("Failed to resolve user '{user_name}'"))?;
        tracing::debug!(user = user_name, user_id, "service initialized");

        Ok(Self {
            config,
            conn,
            db_path,
            config_path,
            user_id,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save_config(&self.config_path, &self.config)
    }

    /// # Errors
    /// `ConfigError::InvalidColor` for unknown names, or a save failure.
    pub fn set_header_color(&mut self, color: &str) -> Result<(), ConfigError> {
        let parsed = parse_color(color)?;
        self.config.theme.header_color = format!("{parsed:?}");
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn set_rest_alert(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.config.rest_alert = enabled;
        self.save_config()
    }

    /// Alert used when a rest countdown runs out.
    pub fn rest_alert(&self) -> Box<dyn RestAlert> {
        if self.config.rest_alert {
            Box::new(TerminalBell)
        } else {
            Box::new(Silent)
        }
    }

    // --- Preferences ---

    /// Stored preferences, or defaults taken from the config file when the
    /// user has never saved any.
    /// # Errors
    /// Returns `anyhow::Error` on storage failure.
    pub fn preferences(&self) -> Result<Preferences> {
        let stored = db::get_preferences(&self.conn, self.user_id)
            .context("Failed to load preferences")?;
        Ok(stored.unwrap_or_else(|| Preferences {
            weight_unit: self.config.units,
            default_rest_seconds: self.config.default_rest_seconds.max(1),
            ..Preferences::default()
        }))
    }

    /// Updates the given preference fields, leaving the others as they are.
    /// # Errors
    /// `ConfigError::InvalidRestDuration` for a zero rest time, or a storage failure.
    pub fn update_preferences(
        &self,
        weight_unit: Option<Units>,
        default_rest_seconds: Option<u32>,
        theme: Option<&str>,
    ) -> Result<Preferences> {
        if default_rest_seconds == Some(0) {
            return Err(ConfigError::InvalidRestDuration.into());
        }
        let current = self.preferences()?;
        db::upsert_preferences(
            &self.conn,
            self.user_id,
            Some(weight_unit.unwrap_or(current.weight_unit)),
            Some(default_rest_seconds.unwrap_or(current.default_rest_seconds)),
            Some(theme.map_or(current.theme.as_str(), str::trim)),
        )
        .context("Failed to save preferences")
    }

    // --- Session persistence ---

    pub fn session_file(&self) -> SessionFile {
        SessionFile::beside(&self.db_path)
    }

    /// Loads the saved session (inactive if none) and attaches last-time
    /// values to its exercises.
    /// # Errors
    /// Returns `anyhow::Error` if the session file is unreadable.
    pub fn load_session(&self) -> Result<WorkoutSession> {
        let default_rest = self.preferences()?.default_rest_seconds;
        let file = self.session_file();
        let mut session = file
            .load(default_rest)
            .with_context(|| format!("Failed to load session from {:?}", file.path()))?;
        self.refresh_ghost_values(&mut session)?;
        Ok(session)
    }

    /// # Errors
    /// Returns `anyhow::Error` if the session file cannot be written.
    pub fn save_session(&self, session: &WorkoutSession) -> Result<()> {
        let file = self.session_file();
        file.save(session)
            .with_context(|| format!("Failed to save session to {:?}", file.path()))
    }

    /// Replaces the ghost values of one exercise with the sets from the most
    /// recent earlier workout containing it. History lookup failures only
    /// leave the ghosts empty.
    /// # Errors
    /// `SessionError` for an inactive session or a bad index.
    pub fn load_ghost_values(&self, session: &mut WorkoutSession, exercise_index: usize) -> Result<()> {
        let workout = session.workout().ok_or(SessionError::NotActive)?;
        let exercise = workout
            .exercises
            .get(exercise_index)
            .ok_or(SessionError::ExerciseOutOfRange(exercise_index))?;
        let prior = match db::previous_exercise_sets(
            &self.conn,
            self.user_id,
            exercise.exercise_id,
            workout.workout_id,
        ) {
            Ok(sets) => sets,
            Err(e) => {
                tracing::warn!(exercise = %exercise.exercise_name, "could not load previous sets: {e}");
                Vec::new()
            }
        };
        let ghosts: Vec<GhostSet> = prior
            .iter()
            .map(|s| GhostSet {
                weight: s.weight,
                reps: s.reps,
            })
            .collect();
        session.set_ghost_values(exercise_index, &ghosts)?;
        Ok(())
    }

    /// Reloads ghost values for every exercise. No-op when inactive.
    /// # Errors
    /// Same as `load_ghost_values`.
    pub fn refresh_ghost_values(&self, session: &mut WorkoutSession) -> Result<()> {
        let count = session.workout().map_or(0, |w| w.exercises.len());
        for index in 0..count {
            self.load_ghost_values(session, index)?;
        }
        Ok(())
    }

    // --- Session operations that need storage ---

    /// Resolves (or creates) the named exercise and appends it to the
    /// session. Returns its index.
    /// # Errors
    /// `SessionError::NotActive`, invalid names, or storage failures.
    pub fn add_exercise_to_session(
        &self,
        session: &mut WorkoutSession,
        name: &str,
        muscle_group: Option<&str>,
    ) -> Result<usize> {
        if !session.is_active() {
            return Err(SessionError::NotActive.into());
        }
        let definition = self.resolve_or_create_exercise(name, muscle_group)?;
        let index = session.add_exercise(ExerciseRef {
            exercise_id: definition.id,
            name: definition.name,
            muscle_group: definition.muscle_group.unwrap_or_default(),
        })?;
        self.load_ghost_values(session, index)?;
        Ok(index)
    }

    /// Throws the session away. A workout record left behind by a failed
    /// `finish` is deleted too, so nothing of the session stays in storage.
    /// # Errors
    /// Returns `anyhow::Error` if the partial workout cannot be deleted; the
    /// session is then left as it was.
    pub fn discard_session(&self, session: &mut WorkoutSession) -> Result<()> {
        if let Some(workout_id) = session.workout().and_then(|w| w.workout_id) {
            match db::delete_workout(&self.conn, self.user_id, workout_id) {
                Ok(_) => tracing::info!(workout_id, "deleted partially saved workout"),
                Err(DbError::WorkoutNotFound(_)) => {
                    tracing::debug!(workout_id, "partially saved workout already gone");
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to delete partially saved workout {workout_id}")
                    })
                }
            }
        }
        session.discard();
        Ok(())
    }

    /// Starts an empty session, discarding any current one.
    /// # Errors
    /// See `discard_session`.
    pub fn start_session(
        &self,
        session: &mut WorkoutSession,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.discard_session(session)?;
        session.start(name, now);
        Ok(())
    }

    /// Starts a new session pre-filled from a saved template, discarding
    /// any current one.
    /// # Errors
    /// `DbError::TemplateNotFound` or storage failures.
    pub fn start_from_template(
        &self,
        session: &mut WorkoutSession,
        template_name: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let template = db::get_template_by_name(&self.conn, self.user_id, template_name.trim())?;
        self.discard_session(session)?;
        let entries = template
            .exercises
            .into_iter()
            .map(|e| TemplateEntry {
                exercise: ExerciseRef {
                    exercise_id: e.exercise_id,
                    name: e.exercise_name,
                    muscle_group: e.muscle_group.unwrap_or_default(),
                },
                superset_group_id: e.superset_group_id,
            })
            .collect();
        session.start(None, now);
        session.apply_template(&template.name, entries)?;
        self.refresh_ghost_values(session)
    }

    /// Commits the session to the database, ending it on success.
    /// # Errors
    /// See `commit_session`; the session stays active on failure.
    pub fn finish_session(
        &self,
        session: &mut WorkoutSession,
        now: DateTime<Utc>,
    ) -> Result<CommitReport, CommitError> {
        let mut store = SqliteStore::new(&self.conn, self.user_id);
        commit_session(session, &mut store, now)
    }

    // --- Exercises ---

    /// Finds an exercise by ID or by case-insensitive name.
    /// # Errors
    /// `DbError::ExerciseNotFound` if nothing visible matches.
    pub fn resolve_exercise_identifier(&self, identifier: &str) -> Result<ExerciseDefinition> {
        let trimmed = identifier.trim();
        let found = match trimmed.parse::<i64>() {
            Ok(id) => db::get_exercise_by_id(&self.conn, self.user_id, id)?,
            Err(_) => db::find_exercise_by_name(&self.conn, self.user_id, trimmed)?,
        };
        found.ok_or_else(|| DbError::ExerciseNotFound(trimmed.to_string()).into())
    }

    /// Returns the user's or the shared exercise with this name, creating a
    /// custom one if neither exists. Missing details are filled from the
    /// catalog when the name matches a catalog entry.
    /// # Errors
    /// Invalid names or storage failures.
    pub fn resolve_or_create_exercise(
        &self,
        name: &str,
        muscle_group: Option<&str>,
    ) -> Result<ExerciseDefinition> {
        let name = validate_name("Exercise", name)?;
        if let Some(existing) = db::find_exercise_by_name(&self.conn, self.user_id, name)? {
            return Ok(existing);
        }

        self.insert_or_fetch_exercise(name, muscle_group)
    }

    /// Inserts a custom exercise; when the name is already taken (another
    /// process created it since the lookup) the stored row is returned.
    /// # Errors
    /// Storage failures.
    pub fn insert_or_fetch_exercise(
        &self,
        name: &str,
        muscle_group: Option<&str>,
    ) -> Result<ExerciseDefinition> {
        let name = validate_name("Exercise", name)?;
        let suggestion = catalog::suggestion(name);
        let muscle_group = muscle_group.or(suggestion.map(|t| t.muscle_group));
        let equipment = suggestion.map(|t| t.equipment);
        match db::create_exercise(&self.conn, self.user_id, name, muscle_group, equipment, None) {
            Ok(id) => {
                tracing::info!(exercise = name, id, "created custom exercise");
                db::get_exercise_by_id(&self.conn, self.user_id, id)?
                    .ok_or_else(|| DbError::ExerciseNotFound(name.to_string()).into())
            }
            Err(DbError::ExerciseNameNotUnique(_)) => {
                tracing::debug!(exercise = name, "exercise already exists, using stored row");
                db::find_exercise_by_name(&self.conn, self.user_id, name)?
                    .ok_or_else(|| DbError::ExerciseNotFound(name.to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a custom exercise. Returns its ID.
    /// # Errors
    /// `DbError::ExerciseNameNotUnique`, invalid names, or storage failures.
    pub fn create_exercise(
        &self,
        name: &str,
        muscle_group: Option<&str>,
        equipment: Option<&str>,
        notes: Option<&str>,
    ) -> Result<i64> {
        let name = validate_name("Exercise", name)?;
        Ok(db::create_exercise(
            &self.conn,
            self.user_id,
            name,
            muscle_group.map(str::trim).filter(|s| !s.is_empty()),
            equipment.map(str::trim).filter(|s| !s.is_empty()),
            notes.map(str::trim).filter(|s| !s.is_empty()),
        )?)
    }

    /// Edits a custom exercise owned by the user.
    /// # Errors
    /// `DbError::ExerciseNotFound` for shared or unknown exercises,
    /// `DbError::ExerciseNameNotUnique` on a clashing rename.
    pub fn edit_exercise(
        &self,
        identifier: &str,
        new_name: Option<&str>,
        new_muscle_group: Option<Option<&str>>,
        new_equipment: Option<Option<&str>>,
        new_notes: Option<Option<&str>>,
    ) -> Result<u64> {
        let exercise = self.resolve_exercise_identifier(identifier)?;
        let new_name = new_name.map(|n| validate_name("Exercise", n)).transpose()?;
        Ok(db::update_exercise(
            &self.conn,
            self.user_id,
            exercise.id,
            new_name,
            new_muscle_group,
            new_equipment,
            new_notes,
        )?)
    }

    /// Deletes a custom exercise owned by the user.
    /// # Errors
    /// `DbError::ExerciseNotFound` or `DbError::ExerciseInUse`.
    pub fn delete_exercise(&self, identifier: &str) -> Result<u64> {
        let exercise = self.resolve_exercise_identifier(identifier)?;
        Ok(db::delete_exercise(&self.conn, self.user_id, exercise.id)?)
    }

    /// # Errors
    /// Returns `anyhow::Error` on storage failure.
    pub fn list_exercises(
        &self,
        muscle_filter: Option<&str>,
        custom_only: bool,
    ) -> Result<Vec<ExerciseDefinition>> {
        Ok(db::list_exercises(&self.conn, self.user_id, muscle_filter, custom_only)?)
    }

    // --- Workouts ---

    /// # Errors
    /// Returns `anyhow::Error` on storage failure.
    pub fn list_workouts(&self, limit: Option<u32>) -> Result<Vec<WorkoutSummary>> {
        Ok(db::list_workouts(&self.conn, self.user_id, limit)?)
    }

    /// # Errors
    /// `DbError::WorkoutNotFound` if the workout does not belong to the user.
    pub fn get_workout(&self, workout_id: i64) -> Result<WorkoutDetail> {
        Ok(db::get_workout(&self.conn, self.user_id, workout_id)?)
    }

    /// # Errors
    /// `DbError::WorkoutNotFound` if the workout does not belong to the user.
    pub fn delete_workout(&self, workout_id: i64) -> Result<u64> {
        Ok(db::delete_workout(&self.conn, self.user_id, workout_id)?)
    }

    /// Edits a saved workout's name, date, notes or duration.
    /// # Errors
    /// `DbError::WorkoutNotFound`, invalid values, or storage failures.
    pub fn edit_workout(&self, workout_id: i64, update: &WorkoutUpdate) -> Result<u64> {
        if let Some(Some(name)) = update.name {
            validate_name("Workout", name)?;
        }
        if let Some(Some(minutes)) = update.duration_minutes {
            if minutes < 0 {
                bail!("Duration cannot be negative.");
            }
        }
        let update = WorkoutUpdate {
            name: update.name.map(|n| n.map(str::trim)),
            ..*update
        };
        Ok(db::update_workout(&self.conn, self.user_id, workout_id, &update)?)
    }

    /// Edits a set of a saved workout.
    /// # Errors
    /// `SessionError::InvalidSet` for bad values, `DbError::WorkoutNotFound`
    /// or `DbError::SetNotFound`.
    pub fn edit_workout_set(&self, workout_id: i64, set_id: i64, update: &SetUpdate) -> Result<u64> {
        update.validate()?;
        Ok(db::update_set(&self.conn, self.user_id, workout_id, set_id, update)?)
    }

    /// # Errors
    /// `DbError::WorkoutNotFound` or `DbError::SetNotFound`.
    pub fn delete_workout_set(&self, workout_id: i64, set_id: i64) -> Result<u64> {
        Ok(db::delete_set(&self.conn, self.user_id, workout_id, set_id)?)
    }

    /// Removes one exercise entry, with its sets, from a saved workout.
    /// # Errors
    /// `DbError::WorkoutNotFound` or `DbError::WorkoutExerciseNotFound`.
    pub fn delete_workout_exercise(&self, workout_id: i64, workout_exercise_id: i64) -> Result<u64> {
        Ok(db::delete_workout_exercise(
            &self.conn,
            self.user_id,
            workout_id,
            workout_exercise_id,
        )?)
    }

    /// Past sets of one exercise, newest workout first.
    /// # Errors
    /// `DbError::ExerciseNotFound` or storage failures.
    pub fn exercise_history(
        &self,
        identifier: &str,
        limit: u32,
    ) -> Result<(ExerciseDefinition, Vec<ExerciseHistoryEntry>)> {
        let exercise = self.resolve_exercise_identifier(identifier)?;
        let history = db::exercise_history(&self.conn, self.user_id, exercise.id, limit)?;
        Ok((exercise, history))
    }

    /// Workouts of one local calendar month, grouped by day.
    /// # Errors
    /// Invalid year/month or storage failures.
    pub fn calendar_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<NaiveDate, Vec<WorkoutSummary>>> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .with_context(|| format!("Invalid month: {year}-{month}"))?;
        let next = first
            .checked_add_months(Months::new(1))
            .with_context(|| format!("Month out of range: {year}-{month}"))?;
        let start = local_day_start(first);
        let end = local_day_start(next) - Duration::seconds(1);

        let mut days: BTreeMap<NaiveDate, Vec<WorkoutSummary>> = BTreeMap::new();
        for summary in db::list_workouts_between(&self.conn, self.user_id, start, end)? {
            days.entry(db::local_date(summary.workout.date))
                .or_default()
                .push(summary);
        }
        Ok(days)
    }

    // --- Templates ---

    /// Saves a template. Each entry is one exercise name, or several joined
    /// with `+` to form a superset.
    /// # Errors
    /// Invalid names, unknown exercises, or a duplicate template name.
    pub fn create_template(&self, name: &str, entries: &[String]) -> Result<i64> {
        let name = validate_name("Template", name)?;
        let mut rows = Vec::new();
        let mut next_group = 1;
        for entry in entries {
            let names: Vec<&str> = entry.split('+').map(str::trim).filter(|s| !s.is_empty()).collect();
            let group = (names.len() > 1).then(|| {
                next_group += 1;
                next_group - 1
            });
            for exercise_name in names {
                let exercise = self.resolve_exercise_identifier(exercise_name)?;
                rows.push((exercise.id, group));
            }
        }
        if rows.is_empty() {
            bail!("A template needs at least one exercise.");
        }
        Ok(db::create_template(&self.conn, self.user_id, name, &rows)?)
    }

    /// Saves the exercises (and superset grouping) of the active session as
    /// a template.
    /// # Errors
    /// `SessionError::NotActive`, an empty session, or storage failures.
    pub fn save_session_as_template(&self, session: &WorkoutSession, name: &str) -> Result<i64> {
        let name = validate_name("Template", name)?;
        let workout = session.workout().ok_or(SessionError::NotActive)?;
        if workout.exercises.is_empty() {
            bail!("The current workout has no exercises to save.");
        }
        let rows: Vec<(i64, Option<u32>)> = workout
            .exercises
            .iter()
            .map(|e| (e.exercise_id, e.superset_group_id))
            .collect();
        Ok(db::create_template(&self.conn, self.user_id, name, &rows)?)
    }

    /// # Errors
    /// Returns `anyhow::Error` on storage failure.
    pub fn list_templates(&self) -> Result<Vec<WorkoutTemplate>> {
        Ok(db::list_templates(&self.conn, self.user_id)?)
    }

    /// # Errors
    /// `DbError::TemplateNotFound` or storage failures.
    pub fn delete_template(&self, name: &str) -> Result<u64> {
        Ok(db::delete_template(&self.conn, self.user_id, name.trim())?)
    }

    // --- Analytics ---

    /// Local calendar date of every workout, newest first.
    /// # Errors
    /// Returns `anyhow::Error` on storage failure.
    pub fn workout_dates(&self) -> Result<Vec<NaiveDate>> {
        Ok(db::workout_dates(&self.conn, self.user_id)?
            .into_iter()
            .map(db::local_date)
            .collect())
    }

    /// # Errors
    /// Returns `anyhow::Error` on storage failure.
    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardStats> {
        let dates = self.workout_dates()?;
        let since = local_day_start(analytics::week_start(today));
        let sets = db::history_sets(&self.conn, self.user_id, Some(since))?;
        Ok(analytics::dashboard(&dates, &sets, today))
    }

    /// # Errors
    /// Returns `anyhow::Error` on storage failure.
    pub fn personal_records(&self) -> Result<Vec<PersonalRecord>> {
        let sets = db::history_sets(&self.conn, self.user_id, None)?;
        Ok(analytics::personal_records(&sets))
    }

    /// Volume per period over the chart window ending `today`.
    /// # Errors
    /// Returns `anyhow::Error` on storage failure.
    pub fn volume_series(&self, period: VolumePeriod, today: NaiveDate) -> Result<Vec<VolumePoint>> {
        let start = analytics::volume_window_start(period, today);
        let sets: Vec<HistorySet> = db::history_sets(&self.conn, self.user_id, Some(local_day_start(start)))?
            .into_iter()
            .filter(|s| s.performed_on >= start)
            .collect();
        Ok(analytics::volume_series(&sets, period))
    }
}
