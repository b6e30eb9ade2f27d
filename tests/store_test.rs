use anyhow::Result;
use chrono::{TimeZone, Utc};
use fittrack_lib::{ExerciseRef, GhostSet, SessionFile, StoreError, WorkoutSession};
use std::fs;

fn bench() -> ExerciseRef {
    ExerciseRef {
        exercise_id: 1,
        name: "Bench Press".to_string(),
        muscle_group: "chest".to_string(),
    }
}

#[test]
fn test_missing_file_loads_inactive_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = SessionFile::new(dir.path().join("session.json"));
    let session = file.load(120)?;
    assert!(!session.is_active());
    assert_eq!(session.rest_timer().duration_seconds(), 120);
    Ok(())
}

#[test]
fn test_session_survives_save_and_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = SessionFile::new(dir.path().join("nested").join("session.json"));
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap();

    let mut session = WorkoutSession::new(90);
    session.start(Some("Push Day"), now);
    session.add_exercise(bench())?;
    session.toggle_set_complete(0, 0)?;
    session.set_ghost_values(
        0,
        &[GhostSet {
            weight: Some(80.0),
            reps: Some(8),
        }],
    )?;
    session.start_rest(Some(150), now)?;
    file.save(&session)?;

    let loaded = file.load(90)?;
    let workout = loaded.workout().unwrap();
    assert_eq!(workout.name, "Push Day");
    assert_eq!(workout.started_at, now);
    assert_eq!(workout.exercises[0].exercise_name, "Bench Press");
    assert!(workout.exercises[0].sets[0].completed);
    assert_eq!(workout.exercises[0].id, session.workout().unwrap().exercises[0].id);

    // Ghost values and the running countdown are not persisted; the chosen duration is.
    assert_eq!(workout.exercises[0].ghost(0), None);
    assert!(!loaded.rest_timer().is_running());
    assert_eq!(loaded.rest_timer().duration_seconds(), 150);
    Ok(())
}

#[test]
fn test_corrupt_file_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    fs::write(&path, "{ not json")?;
    let result = SessionFile::new(&path).load(90);
    assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    Ok(())
}

#[test]
fn test_session_file_sits_beside_database() {
    let file = SessionFile::beside(std::path::Path::new("/data/fittrack/fittrack.sqlite"));
    assert_eq!(
        file.path(),
        std::path::Path::new("/data/fittrack/fittrack-workout.json")
    );
}
