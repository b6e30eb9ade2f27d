// src/db.rs
use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analytics::HistorySet;
use crate::catalog::EXERCISE_TEMPLATES;
use crate::config::{Units, APP_DIR, DEFAULT_REST_SECONDS};
use crate::session::SetUpdate;

// Custom Error type for DB operations
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),
    #[error("Workout not found: ID {0}")]
    WorkoutNotFound(i64),
    #[error("Exercise entry {0} not found in this workout")]
    WorkoutExerciseNotFound(i64),
    #[error("Set {0} not found in this workout")]
    SetNotFound(i64),
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database update failed: {0}")]
    UpdateFailed(rusqlite::Error),
    #[error("Database insert failed: {0}")]
    InsertFailed(rusqlite::Error),
    #[error("Database delete failed: {0}")]
    DeleteFailed(rusqlite::Error),
    #[error("Exercise name must be unique (case-insensitive): '{0}' already exists.")]
    ExerciseNameNotUnique(String),
    #[error("Exercise '{0}' is used by logged workouts or templates and cannot be deleted.")]
    ExerciseInUse(String),
    #[error("Template name must be unique (case-insensitive): '{0}' already exists.")]
    TemplateNameNotUnique(String),
}

const DB_FILE_NAME: &str = "fittrack.sqlite";
const DB_ENV_VAR: &str = "FITTRACK_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseDefinition {
    pub id: i64,
    /// `None` for catalog exercises shared by everyone.
    pub user_id: Option<i64>,
    pub name: String,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub notes: Option<String>,
}

impl ExerciseDefinition {
    pub const fn is_custom(&self) -> bool {
        self.user_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutRecord {
    pub id: i64,
    pub user_id: i64,
    pub name: Option<String>,
    pub date: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
}

impl WorkoutRecord {
    /// Name shown in lists; unnamed workouts are just "Workout".
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Workout")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSummary {
    pub workout: WorkoutRecord,
    pub exercise_count: usize,
    pub set_count: usize,
    /// Working-set volume.
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSet {
    pub id: i64,
    pub set_number: u32,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub rpe: Option<f64>,
    pub is_warmup: bool,
    pub notes: Option<String>,
}

/// Changes to a stored workout. `None` leaves a field as it is, `Some(None)`
/// clears it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkoutUpdate<'a> {
    pub name: Option<Option<&'a str>>,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<Option<&'a str>>,
    pub duration_minutes: Option<Option<i64>>,
}

/// Values of a set about to be stored. Storage assigns the set number.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NewSet {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub rpe: Option<f64>,
    pub is_warmup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutExerciseDetail {
    pub id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub muscle_group: Option<String>,
    pub position: i64,
    pub notes: Option<String>,
    pub superset_group_id: Option<u32>,
    pub sets: Vec<StoredSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutDetail {
    pub workout: WorkoutRecord,
    pub exercises: Vec<WorkoutExerciseDetail>,
}

/// The sets of one exercise from one earlier workout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseHistoryEntry {
    pub workout_id: i64,
    pub workout_name: Option<String>,
    pub date: DateTime<Utc>,
    pub sets: Vec<StoredSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub weight_unit: Units,
    pub default_rest_seconds: u32,
    pub theme: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            weight_unit: Units::Kg,
            default_rest_seconds: DEFAULT_REST_SECONDS,
            theme: "system".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateExercise {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub muscle_group: Option<String>,
    pub superset_group_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutTemplate {
    pub id: i64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub exercises: Vec<TemplateExercise>,
}

/// Gets the path to the SQLite database file within the app's data directory.
/// `FITTRACK_DB` overrides it.
/// Exposed at crate root as `get_db_path_util`
pub fn get_db_path() -> Result<PathBuf, DbError> {
    if let Ok(path) = std::env::var(DB_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    let data_dir = dirs::data_dir().ok_or(DbError::DataDir)?;
    let app_dir = data_dir.join(APP_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::Connection)
}

/// Creates the tables if they don't exist and seeds the shared catalog.
pub fn init_db(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER REFERENCES users(id) ON DELETE CASCADE, -- NULL for catalog entries
            name TEXT NOT NULL COLLATE NOCASE,
            muscle_group TEXT,
            equipment TEXT,
            notes TEXT
        );
        -- Unique per owner scope; the catalog scope is user 0.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_exercises_scope_name
            ON exercises(COALESCE(user_id, 0), name COLLATE NOCASE);

        CREATE TABLE IF NOT EXISTS workouts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT,
            date TEXT NOT NULL, -- RFC3339, UTC
            duration_minutes INTEGER,
            notes TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_workouts_user_date ON workouts(user_id, date);

        CREATE TABLE IF NOT EXISTS workout_exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
            exercise_id INTEGER NOT NULL REFERENCES exercises(id),
            position INTEGER NOT NULL,
            notes TEXT,
            superset_group_id INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_workout_exercises_workout ON workout_exercises(workout_id);
        CREATE INDEX IF NOT EXISTS idx_workout_exercises_exercise ON workout_exercises(exercise_id);

        CREATE TABLE IF NOT EXISTS sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            workout_exercise_id INTEGER NOT NULL REFERENCES workout_exercises(id) ON DELETE CASCADE,
            set_number INTEGER NOT NULL,
            weight REAL,
            reps INTEGER,
            rpe REAL,
            is_warmup INTEGER NOT NULL DEFAULT 0,
            notes TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_sets_workout_exercise ON sets(workout_exercise_id);

        CREATE TABLE IF NOT EXISTS user_preferences (
            user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            weight_unit TEXT NOT NULL DEFAULT 'kg',
            default_rest_seconds INTEGER NOT NULL DEFAULT 90,
            theme TEXT NOT NULL DEFAULT 'system'
        );

        CREATE TABLE IF NOT EXISTS templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL COLLATE NOCASE,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name)
        );

        CREATE TABLE IF NOT EXISTS template_exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            template_id INTEGER NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
            exercise_id INTEGER NOT NULL REFERENCES exercises(id),
            position INTEGER NOT NULL,
            superset_group_id INTEGER
        );",
    )
    .map_err(DbError::Connection)?;

    let seeded = seed_catalog(conn)?;
    if seeded > 0 {
        tracing::info!(seeded, "seeded exercise catalog");
    }
    Ok(())
}

/// Inserts catalog templates missing from the shared exercise list.
/// Returns how many rows were added.
pub fn seed_catalog(conn: &Connection) -> Result<usize, DbError> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO exercises (user_id, name, muscle_group, equipment)
             SELECT NULL, ?1, ?2, ?3
             WHERE NOT EXISTS (
                 SELECT 1 FROM exercises WHERE user_id IS NULL AND name = ?1 COLLATE NOCASE
             )",
        )?;
        for template in EXERCISE_TEMPLATES {
            inserted += stmt
                .execute(params![template.name, template.muscle_group, template.equipment])
                .map_err(DbError::InsertFailed)?;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

fn to_db_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_db_timestamp(value: &str, column: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Calendar date of a stored instant in the user's local time zone.
#[must_use]
pub fn local_date(dt: DateTime<Utc>) -> NaiveDate {
    dt.with_timezone(&Local).date_naive()
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _)
        if err.code == rusqlite::ErrorCode::ConstraintViolation
            && (err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY))
}

fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _)
        if err.code == rusqlite::ErrorCode::ConstraintViolation
            && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

// ---- Users ----

/// Returns the id of the named local user, creating the row on first use.
pub fn ensure_user(conn: &Connection, name: &str) -> Result<i64, DbError> {
    conn.execute(
        "INSERT OR IGNORE INTO users (name, created_at) VALUES (?1, ?2)",
        params![name, to_db_timestamp(Utc::now())],
    )
    .map_err(DbError::InsertFailed)?;
    conn.query_row(
        "SELECT id FROM users WHERE name = ?1 COLLATE NOCASE",
        params![name],
        |row| row.get(0),
    )
    .map_err(DbError::QueryFailed)
}

// ---- Exercise Definition Functions ----

const EXERCISE_COLUMNS: &str = "id, user_id, name, muscle_group, equipment, notes";

fn map_row_to_exercise_definition(row: &Row) -> Result<ExerciseDefinition, rusqlite::Error> {
    Ok(ExerciseDefinition {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        muscle_group: row.get(3)?,
        equipment: row.get(4)?,
        notes: row.get(5)?,
    })
}

/// Creates a custom exercise owned by `user_id`. Returns its ID.
pub fn create_exercise(
    conn: &Connection,
    user_id: i64,
    name: &str,
    muscle_group: Option<&str>,
    equipment: Option<&str>,
    notes: Option<&str>,
) -> Result<i64, DbError> {
    match conn.execute(
        "INSERT INTO exercises (user_id, name, muscle_group, equipment, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, name, muscle_group, equipment, notes],
    ) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(DbError::ExerciseNameNotUnique(name.to_string())),
        Err(e) => Err(DbError::InsertFailed(e)),
    }
}

/// Case-insensitive exact lookup among the user's own and the shared
/// exercises. The user's own exercise wins when both exist.
pub fn find_exercise_by_name(
    conn: &Connection,
    user_id: i64,
    name: &str,
) -> Result<Option<ExerciseDefinition>, DbError> {
    let sql = format!(
        "SELECT {EXERCISE_COLUMNS} FROM exercises
         WHERE name = ?1 COLLATE NOCASE AND (user_id = ?2 OR user_id IS NULL)
         ORDER BY user_id IS NULL ASC
         LIMIT 1"
    );
    conn.query_row(&sql, params![name, user_id], map_row_to_exercise_definition)
        .optional()
        .map_err(DbError::QueryFailed)
}

/// Exercise by ID if the user may see it (own or shared).
pub fn get_exercise_by_id(
    conn: &Connection,
    user_id: i64,
    id: i64,
) -> Result<Option<ExerciseDefinition>, DbError> {
    let sql = format!(
        "SELECT {EXERCISE_COLUMNS} FROM exercises
         WHERE id = ?1 AND (user_id = ?2 OR user_id IS NULL)"
    );
    conn.query_row(&sql, params![id, user_id], map_row_to_exercise_definition)
        .optional()
        .map_err(DbError::QueryFailed)
}

/// Lists the user's and shared exercises by name, optionally filtered.
pub fn list_exercises(
    conn: &Connection,
    user_id: i64,
    muscle_filter: Option<&str>,
    custom_only: bool,
) -> Result<Vec<ExerciseDefinition>, DbError> {
    let mut sql = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE ");
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(user_id)];
    if custom_only {
        sql.push_str("user_id = ?1");
    } else {
        sql.push_str("(user_id = ?1 OR user_id IS NULL)");
    }
    if let Some(m) = muscle_filter {
        sql.push_str(&format!(
            " AND muscle_group LIKE ?{}",
            params_vec.len() + 1
        ));
        params_vec.push(Box::new(format!("%{m}%")));
    }
    sql.push_str(" ORDER BY name ASC");

    let params_slice: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(params_slice.as_slice(), map_row_to_exercise_definition)
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

fn owned_exercise(conn: &Connection, user_id: i64, id: i64) -> Result<ExerciseDefinition, DbError> {
    let sql = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = ?1 AND user_id = ?2");
    conn.query_row(&sql, params![id, user_id], map_row_to_exercise_definition)
        .optional()
        .map_err(DbError::QueryFailed)?
        .ok_or_else(|| DbError::ExerciseNotFound(id.to_string()))
}

/// Edits one of the user's custom exercises. Shared exercises and other
/// users' exercises are reported as not found.
pub fn update_exercise(
    conn: &Connection,
    user_id: i64,
    id: i64,
    new_name: Option<&str>,
    new_muscle_group: Option<Option<&str>>,
    new_equipment: Option<Option<&str>>,
    new_notes: Option<Option<&str>>,
) -> Result<u64, DbError> {
    owned_exercise(conn, user_id, id)?;

    let mut updates = Vec::new();
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(name) = new_name {
        updates.push("name = ?");
        params_vec.push(Box::new(name.to_string()));
    }
    if let Some(muscle_group) = new_muscle_group {
        updates.push("muscle_group = ?");
        params_vec.push(Box::new(muscle_group.map(str::to_string)));
    }
    if let Some(equipment) = new_equipment {
        updates.push("equipment = ?");
        params_vec.push(Box::new(equipment.map(str::to_string)));
    }
    if let Some(notes) = new_notes {
        updates.push("notes = ?");
        params_vec.push(Box::new(notes.map(str::to_string)));
    }
    if updates.is_empty() {
        return Ok(0);
    }

    let sql = format!("UPDATE exercises SET {} WHERE id = ?", updates.join(", "));
    params_vec.push(Box::new(id));
    let params_slice: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

    match conn.execute(&sql, params_slice.as_slice()) {
        Ok(rows) => Ok(rows as u64),
        Err(e) if is_unique_violation(&e) => Err(DbError::ExerciseNameNotUnique(
            new_name.unwrap_or_default().to_string(),
        )),
        Err(e) => Err(DbError::UpdateFailed(e)),
    }
}

/// Deletes one of the user's custom exercises.
pub fn delete_exercise(conn: &Connection, user_id: i64, id: i64) -> Result<u64, DbError> {
    let exercise = owned_exercise(conn, user_id, id)?;
    match conn.execute("DELETE FROM exercises WHERE id = ?1", params![id]) {
        Ok(rows) => Ok(rows as u64),
        Err(e) if is_foreign_key_violation(&e) => Err(DbError::ExerciseInUse(exercise.name)),
        Err(e) => Err(DbError::DeleteFailed(e)),
    }
}

// ---- Workouts ----

fn map_row_to_workout(row: &Row) -> Result<WorkoutRecord, rusqlite::Error> {
    let date_str: String = row.get(3)?;
    Ok(WorkoutRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        date: parse_db_timestamp(&date_str, 3)?,
        duration_minutes: row.get(4)?,
        notes: row.get(5)?,
    })
}

/// Creates an empty workout record. Returns its ID.
pub fn create_workout(
    conn: &Connection,
    user_id: i64,
    name: Option<&str>,
    date: DateTime<Utc>,
    notes: Option<&str>,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO workouts (user_id, name, date, notes) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name, to_db_timestamp(date), notes],
    )
    .map_err(DbError::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

pub fn set_workout_duration(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    duration_minutes: i64,
) -> Result<(), DbError> {
    let rows = conn
        .execute(
            "UPDATE workouts SET duration_minutes = ?1 WHERE id = ?2 AND user_id = ?3",
            params![duration_minutes, workout_id, user_id],
        )
        .map_err(DbError::UpdateFailed)?;
    if rows == 0 {
        return Err(DbError::WorkoutNotFound(workout_id));
    }
    Ok(())
}

fn ensure_workout_owned(conn: &Connection, user_id: i64, workout_id: i64) -> Result<(), DbError> {
    conn.query_row(
        "SELECT 1 FROM workouts WHERE id = ?1 AND user_id = ?2",
        params![workout_id, user_id],
        |_| Ok(()),
    )
    .optional()
    .map_err(DbError::QueryFailed)?
    .ok_or(DbError::WorkoutNotFound(workout_id))
}

/// Edits a saved workout. Returns the number of rows changed.
pub fn update_workout(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    update: &WorkoutUpdate,
) -> Result<u64, DbError> {
    ensure_workout_owned(conn, user_id, workout_id)?;

    let mut updates = Vec::new();
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(name) = update.name {
        updates.push("name = ?");
        params_vec.push(Box::new(name.map(str::to_string)));
    }
    if let Some(date) = update.date {
        updates.push("date = ?");
        params_vec.push(Box::new(to_db_timestamp(date)));
    }
    if let Some(notes) = update.notes {
        updates.push("notes = ?");
        params_vec.push(Box::new(notes.map(str::to_string)));
    }
    if let Some(duration) = update.duration_minutes {
        updates.push("duration_minutes = ?");
        params_vec.push(Box::new(duration));
    }
    if updates.is_empty() {
        return Ok(0);
    }

    let sql = format!("UPDATE workouts SET {} WHERE id = ?", updates.join(", "));
    params_vec.push(Box::new(workout_id));
    let params_slice: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let rows = conn
        .execute(&sql, params_slice.as_slice())
        .map_err(DbError::UpdateFailed)?;
    Ok(rows as u64)
}

/// Removes every exercise (and its sets) from a workout, keeping the
/// workout record itself.
pub fn clear_workout_exercises(conn: &Connection, user_id: i64, workout_id: i64) -> Result<u64, DbError> {
    ensure_workout_owned(conn, user_id, workout_id)?;
    let rows = conn
        .execute(
            "DELETE FROM workout_exercises WHERE workout_id = ?1",
            params![workout_id],
        )
        .map_err(DbError::DeleteFailed)?;
    Ok(rows as u64)
}

/// Removes one exercise entry (and its sets) from a saved workout.
pub fn delete_workout_exercise(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    workout_exercise_id: i64,
) -> Result<u64, DbError> {
    ensure_workout_owned(conn, user_id, workout_id)?;
    let rows = conn
        .execute(
            "DELETE FROM workout_exercises WHERE id = ?1 AND workout_id = ?2",
            params![workout_exercise_id, workout_id],
        )
        .map_err(DbError::DeleteFailed)?;
    if rows == 0 {
        return Err(DbError::WorkoutExerciseNotFound(workout_exercise_id));
    }
    Ok(rows as u64)
}

fn ensure_set_in_workout(conn: &Connection, workout_id: i64, set_id: i64) -> Result<(), DbError> {
    conn.query_row(
        "SELECT 1 FROM sets s
         JOIN workout_exercises we ON we.id = s.workout_exercise_id
         WHERE s.id = ?1 AND we.workout_id = ?2",
        params![set_id, workout_id],
        |_| Ok(()),
    )
    .optional()
    .map_err(DbError::QueryFailed)?
    .ok_or(DbError::SetNotFound(set_id))
}

/// Edits a set of a saved workout. Callers validate the values first.
pub fn update_set(
    conn: &Connection,
    user_id: i64,
    workout_id: i64,
    set_id: i64,
    update: &SetUpdate,
) -> Result<u64, DbError> {
    ensure_workout_owned(conn, user_id, workout_id)?;
    ensure_set_in_workout(conn, workout_id, set_id)?;

    let mut updates = Vec::new();
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(weight) = update.weight {
        updates.push("weight = ?");
        params_vec.push(Box::new(weight));
    }
    if let Some(reps) = update.reps {
        updates.push("reps = ?");
        params_vec.push(Box::new(reps));
    }
    if let Some(rpe) = update.rpe {
        updates.push("rpe = ?");
        params_vec.push(Box::new(rpe));
    }
    if let Some(is_warmup) = update.is_warmup {
        updates.push("is_warmup = ?");
        params_vec.push(Box::new(is_warmup));
    }
    if updates.is_empty() {
        return Ok(0);
    }

    let sql = format!("UPDATE sets SET {} WHERE id = ?", updates.join(", "));
    params_vec.push(Box::new(set_id));
    let params_slice: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let rows = conn
        .execute(&sql, params_slice.as_slice())
        .map_err(DbError::UpdateFailed)?;
    Ok(rows as u64)
}

/// Deletes a set of a saved workout. Remaining set numbers are kept.
pub fn delete_set(conn: &Connection, user_id: i64, workout_id: i64, set_id: i64) -> Result<u64, DbError> {
    ensure_workout_owned(conn, user_id, workout_id)?;
    let rows = conn
        .execute(
            "DELETE FROM sets WHERE id = ?1
             AND workout_exercise_id IN (SELECT id FROM workout_exercises WHERE workout_id = ?2)",
            params![set_id, workout_id],
        )
        .map_err(DbError::DeleteFailed)?;
    if rows == 0 {
        return Err(DbError::SetNotFound(set_id));
    }
    Ok(rows as u64)
}

/// Links an exercise to a workout at the next position (0-based).
pub fn add_workout_exercise(
    conn: &Connection,
    workout_id: i64,
    exercise_id: i64,
    notes: Option<&str>,
    superset_group_id: Option<u32>,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO workout_exercises (workout_id, exercise_id, position, notes, superset_group_id)
         VALUES (?1, ?2,
             (SELECT COALESCE(MAX(position), -1) + 1 FROM workout_exercises WHERE workout_id = ?1),
             ?3, ?4)",
        params![workout_id, exercise_id, notes, superset_group_id],
    )
    .map_err(DbError::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

/// Appends a set to a workout-exercise link; set numbers start at 1.
pub fn add_set(conn: &Connection, workout_exercise_id: i64, set: &NewSet) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO sets (workout_exercise_id, set_number, weight, reps, rpe, is_warmup)
         VALUES (?1,
             (SELECT COALESCE(MAX(set_number), 0) + 1 FROM sets WHERE workout_exercise_id = ?1),
             ?2, ?3, ?4, ?5)",
        params![workout_exercise_id, set.weight, set.reps, set.rpe, set.is_warmup],
    )
    .map_err(DbError::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

fn map_row_to_set(row: &Row) -> Result<StoredSet, rusqlite::Error> {
    Ok(StoredSet {
        id: row.get(0)?,
        set_number: row.get(1)?,
        weight: row.get(2)?,
        reps: row.get(3)?,
        rpe: row.get(4)?,
        is_warmup: row.get(5)?,
        notes: row.get(6)?,
    })
}

fn sets_for_link(conn: &Connection, workout_exercise_id: i64) -> Result<Vec<StoredSet>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, set_number, weight, reps, rpe, is_warmup, notes
             FROM sets WHERE workout_exercise_id = ?1 ORDER BY set_number ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(params![workout_exercise_id], map_row_to_set)
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

/// Full workout with its exercises (by position) and sets (by number).
pub fn get_workout(conn: &Connection, user_id: i64, workout_id: i64) -> Result<WorkoutDetail, DbError> {
    let workout = conn
        .query_row(
            "SELECT id, user_id, name, date, duration_minutes, notes
             FROM workouts WHERE id = ?1 AND user_id = ?2",
            params![workout_id, user_id],
            map_row_to_workout,
        )
        .optional()
        .map_err(DbError::QueryFailed)?
        .ok_or(DbError::WorkoutNotFound(workout_id))?;

    let mut stmt = conn
        .prepare(
            "SELECT we.id, we.exercise_id, e.name, e.muscle_group, we.position, we.notes, we.superset_group_id
             FROM workout_exercises we
             JOIN exercises e ON e.id = we.exercise_id
             WHERE we.workout_id = ?1
             ORDER BY we.position ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let links = stmt
        .query_map(params![workout_id], |row| {
            Ok(WorkoutExerciseDetail {
                id: row.get(0)?,
                exercise_id: row.get(1)?,
                exercise_name: row.get(2)?,
                muscle_group: row.get(3)?,
                position: row.get(4)?,
                notes: row.get(5)?,
                superset_group_id: row.get(6)?,
                sets: Vec::new(),
            })
        })
        .map_err(DbError::QueryFailed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)?;

    let mut exercises = Vec::with_capacity(links.len());
    for mut link in links {
        link.sets = sets_for_link(conn, link.id)?;
        exercises.push(link);
    }
    Ok(WorkoutDetail { workout, exercises })
}

/// Workouts newest first, with per-workout counts.
pub fn list_workouts(
    conn: &Connection,
    user_id: i64,
    limit: Option<u32>,
) -> Result<Vec<WorkoutSummary>, DbError> {
    list_workout_summaries(conn, user_id, None, limit, false)
}

/// Workouts whose date falls in `[start, end]`, oldest first.
pub fn list_workouts_between(
    conn: &Connection,
    user_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<WorkoutSummary>, DbError> {
    list_workout_summaries(conn, user_id, Some((start, end)), None, true)
}

fn list_workout_summaries(
    conn: &Connection,
    user_id: i64,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    limit: Option<u32>,
    ascending: bool,
) -> Result<Vec<WorkoutSummary>, DbError> {
    let mut sql = "
        SELECT w.id, w.user_id, w.name, w.date, w.duration_minutes, w.notes,
            (SELECT COUNT(*) FROM workout_exercises we WHERE we.workout_id = w.id),
            (SELECT COUNT(*) FROM sets s JOIN workout_exercises we ON we.id = s.workout_exercise_id
                WHERE we.workout_id = w.id),
            (SELECT COALESCE(SUM(s.weight * s.reps), 0) FROM sets s
                JOIN workout_exercises we ON we.id = s.workout_exercise_id
                WHERE we.workout_id = w.id AND s.is_warmup = 0)
        FROM workouts w
        WHERE w.user_id = ?1"
        .to_string();
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(user_id)];

    if let Some((start, end)) = range {
        sql.push_str(&format!(
            " AND w.date >= ?{} AND w.date <= ?{}",
            params_vec.len() + 1,
            params_vec.len() + 2
        ));
        params_vec.push(Box::new(to_db_timestamp(start)));
        params_vec.push(Box::new(to_db_timestamp(end)));
    }
    sql.push_str(if ascending {
        " ORDER BY w.date ASC, w.id ASC"
    } else {
        " ORDER BY w.date DESC, w.id DESC"
    });
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(limit));
    }

    let params_slice: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(params_slice.as_slice(), |row| {
            let exercise_count: i64 = row.get(6)?;
            let set_count: i64 = row.get(7)?;
            Ok(WorkoutSummary {
                workout: map_row_to_workout(row)?,
                exercise_count: usize::try_from(exercise_count).unwrap_or_default(),
                set_count: usize::try_from(set_count).unwrap_or_default(),
                volume: row.get(8)?,
            })
        })
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

/// Deletes a workout with its exercises and sets.
pub fn delete_workout(conn: &Connection, user_id: i64, workout_id: i64) -> Result<u64, DbError> {
    let rows = conn
        .execute(
            "DELETE FROM workouts WHERE id = ?1 AND user_id = ?2",
            params![workout_id, user_id],
        )
        .map_err(DbError::DeleteFailed)?;
    if rows == 0 {
        return Err(DbError::WorkoutNotFound(workout_id));
    }
    Ok(rows as u64)
}

/// Date of every workout the user has logged, newest first.
pub fn workout_dates(conn: &Connection, user_id: i64) -> Result<Vec<DateTime<Utc>>, DbError> {
    let mut stmt = conn
        .prepare("SELECT date FROM workouts WHERE user_id = ?1 ORDER BY date DESC")
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(params![user_id], |row| {
            let date: String = row.get(0)?;
            parse_db_timestamp(&date, 0)
        })
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

// ---- History ----

/// Sets of the most recent workout containing `exercise_id`, skipping
/// `exclude_workout`. Empty when the exercise was never done before.
pub fn previous_exercise_sets(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
    exclude_workout: Option<i64>,
) -> Result<Vec<StoredSet>, DbError> {
    let link_id: Option<i64> = conn
        .query_row(
            "SELECT we.id FROM workout_exercises we
             JOIN workouts w ON w.id = we.workout_id
             WHERE we.exercise_id = ?1 AND w.user_id = ?2 AND (?3 IS NULL OR w.id != ?3)
             ORDER BY w.date DESC, w.id DESC, we.position ASC
             LIMIT 1",
            params![exercise_id, user_id, exclude_workout],
            |row| row.get(0),
        )
        .optional()
        .map_err(DbError::QueryFailed)?;
    match link_id {
        Some(id) => sets_for_link(conn, id),
        None => Ok(Vec::new()),
    }
}

/// Per-workout sets of one exercise, newest workout first.
pub fn exercise_history(
    conn: &Connection,
    user_id: i64,
    exercise_id: i64,
    limit: u32,
) -> Result<Vec<ExerciseHistoryEntry>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT we.id, w.id, w.name, w.date FROM workout_exercises we
             JOIN workouts w ON w.id = we.workout_id
             WHERE we.exercise_id = ?1 AND w.user_id = ?2
             ORDER BY w.date DESC, w.id DESC, we.position ASC
             LIMIT ?3",
        )
        .map_err(DbError::QueryFailed)?;
    let rows = stmt
        .query_map(params![exercise_id, user_id, limit], |row| {
            let date: String = row.get(3)?;
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
                parse_db_timestamp(&date, 3)?,
            ))
        })
        .map_err(DbError::QueryFailed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)?;

    rows.into_iter()
        .map(|(link_id, workout_id, workout_name, date)| -> Result<_, DbError> {
            Ok(ExerciseHistoryEntry {
                workout_id,
                workout_name,
                date,
                sets: sets_for_link(conn, link_id)?,
            })
        })
        .collect()
}

/// Every stored set of the user (optionally from `since` on), newest
/// workout first, then by position and set number.
pub fn history_sets(
    conn: &Connection,
    user_id: i64,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<HistorySet>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT w.id, e.id, e.name, w.date, s.weight, s.reps, s.is_warmup
             FROM sets s
             JOIN workout_exercises we ON we.id = s.workout_exercise_id
             JOIN workouts w ON w.id = we.workout_id
             JOIN exercises e ON e.id = we.exercise_id
             WHERE w.user_id = ?1 AND (?2 IS NULL OR w.date >= ?2)
             ORDER BY w.date DESC, w.id DESC, we.position ASC, s.set_number ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(params![user_id, since.map(to_db_timestamp)], |row| {
            let date: String = row.get(3)?;
            Ok(HistorySet {
                workout_id: row.get(0)?,
                exercise_id: row.get(1)?,
                exercise_name: row.get(2)?,
                performed_on: local_date(parse_db_timestamp(&date, 3)?),
                weight: row.get(4)?,
                reps: row.get(5)?,
                is_warmup: row.get(6)?,
            })
        })
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

// ---- Preferences ----

pub fn get_preferences(conn: &Connection, user_id: i64) -> Result<Option<Preferences>, DbError> {
    conn.query_row(
        "SELECT weight_unit, default_rest_seconds, theme FROM user_preferences WHERE user_id = ?1",
        params![user_id],
        |row| {
            let unit: String = row.get(0)?;
            let weight_unit = unit.parse::<Units>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })?;
            Ok(Preferences {
                weight_unit,
                default_rest_seconds: row.get(1)?,
                theme: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(DbError::QueryFailed)
}

/// Inserts or updates preferences. `None` fields keep their stored value
/// (or the default on first write).
pub fn upsert_preferences(
    conn: &Connection,
    user_id: i64,
    weight_unit: Option<Units>,
    default_rest_seconds: Option<u32>,
    theme: Option<&str>,
) -> Result<Preferences, DbError> {
    let current = get_preferences(conn, user_id)?.unwrap_or_default();
    let merged = Preferences {
        weight_unit: weight_unit.unwrap_or(current.weight_unit),
        default_rest_seconds: default_rest_seconds.unwrap_or(current.default_rest_seconds),
        theme: theme.map_or(current.theme, str::to_string),
    };
    conn.execute(
        "INSERT INTO user_preferences (user_id, weight_unit, default_rest_seconds, theme)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
             weight_unit = excluded.weight_unit,
             default_rest_seconds = excluded.default_rest_seconds,
             theme = excluded.theme",
        params![
            user_id,
            merged.weight_unit.to_string(),
            merged.default_rest_seconds,
            merged.theme
        ],
    )
    .map_err(DbError::UpdateFailed)?;
    Ok(merged)
}

// ---- Templates ----

/// Saves a named template. Entries are `(exercise_id, superset_group_id)`
/// in order.
pub fn create_template(
    conn: &Connection,
    user_id: i64,
    name: &str,
    entries: &[(i64, Option<u32>)],
) -> Result<i64, DbError> {
    let tx = conn.unchecked_transaction()?;
    match tx.execute(
        "INSERT INTO templates (user_id, name, updated_at) VALUES (?1, ?2, ?3)",
        params![user_id, name, to_db_timestamp(Utc::now())],
    ) {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(DbError::TemplateNameNotUnique(name.to_string()))
        }
        Err(e) => return Err(DbError::InsertFailed(e)),
    }
    let template_id = tx.last_insert_rowid();
    for (position, (exercise_id, group)) in entries.iter().enumerate() {
        tx.execute(
            "INSERT INTO template_exercises (template_id, exercise_id, position, superset_group_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![template_id, exercise_id, position as i64, group],
        )
        .map_err(DbError::InsertFailed)?;
    }
    tx.commit()?;
    Ok(template_id)
}

fn template_exercises(conn: &Connection, template_id: i64) -> Result<Vec<TemplateExercise>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT te.exercise_id, e.name, e.muscle_group, te.superset_group_id
             FROM template_exercises te
             JOIN exercises e ON e.id = te.exercise_id
             WHERE te.template_id = ?1
             ORDER BY te.position ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(params![template_id], |row| {
            Ok(TemplateExercise {
                exercise_id: row.get(0)?,
                exercise_name: row.get(1)?,
                muscle_group: row.get(2)?,
                superset_group_id: row.get(3)?,
            })
        })
        .map_err(DbError::QueryFailed)?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

fn map_row_to_template_header(row: &Row) -> Result<(i64, String, DateTime<Utc>), rusqlite::Error> {
    let updated: String = row.get(2)?;
    Ok((row.get(0)?, row.get(1)?, parse_db_timestamp(&updated, 2)?))
}

/// Templates most recently updated first.
pub fn list_templates(conn: &Connection, user_id: i64) -> Result<Vec<WorkoutTemplate>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, updated_at FROM templates WHERE user_id = ?1
             ORDER BY updated_at DESC, id DESC",
        )
        .map_err(DbError::QueryFailed)?;
    let headers = stmt
        .query_map(params![user_id], map_row_to_template_header)
        .map_err(DbError::QueryFailed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)?;
    headers
        .into_iter()
        .map(|(id, name, updated_at)| -> Result<_, DbError> {
            Ok(WorkoutTemplate {
                id,
                name,
                updated_at,
                exercises: template_exercises(conn, id)?,
            })
        })
        .collect()
}

pub fn get_template_by_name(
    conn: &Connection,
    user_id: i64,
    name: &str,
) -> Result<WorkoutTemplate, DbError> {
    let (id, name, updated_at) = conn
        .query_row(
            "SELECT id, name, updated_at FROM templates WHERE user_id = ?1 AND name = ?2 COLLATE NOCASE",
            params![user_id, name],
            map_row_to_template_header,
        )
        .optional()
        .map_err(DbError::QueryFailed)?
        .ok_or_else(|| DbError::TemplateNotFound(name.to_string()))?;
    Ok(WorkoutTemplate {
        id,
        name,
        updated_at,
        exercises: template_exercises(conn, id)?,
    })
}

pub fn delete_template(conn: &Connection, user_id: i64, name: &str) -> Result<u64, DbError> {
    let rows = conn
        .execute(
            "DELETE FROM templates WHERE user_id = ?1 AND name = ?2 COLLATE NOCASE",
            params![user_id, name],
        )
        .map_err(DbError::DeleteFailed)?;
    if rows == 0 {
        return Err(DbError::TemplateNotFound(name.to_string()));
    }
    Ok(rows as u64)
}
