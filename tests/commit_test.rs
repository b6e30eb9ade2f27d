use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use fittrack_lib::{
    commit_session, CommitError, ExerciseRef, NewSet, SetUpdate, WorkoutSession, WorkoutStore,
};

/// Keeps what a real store would hold and fails the calls it is told to.
#[derive(Default)]
struct FakeStore {
    next_id: i64,
    /// (id, name, notes, started_at)
    workouts: Vec<(i64, Option<String>, Option<String>, DateTime<Utc>)>,
    /// (link id, workout id, exercise id, superset group)
    links: Vec<(i64, i64, i64, Option<u32>)>,
    /// (set id, link id, values)
    sets: Vec<(i64, i64, NewSet)>,
    durations: Vec<(i64, i64)>,
    add_set_calls: usize,
    fail_create: bool,
    fail_link_for_exercise: Option<i64>,
    fail_set_call: Option<usize>,
    fail_duration: bool,
    fail_clear: bool,
}

impl FakeStore {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn stored_sets(&self) -> Vec<(Option<f64>, Option<u32>)> {
        self.sets.iter().map(|(_, _, s)| (s.weight, s.reps)).collect()
    }
}

impl WorkoutStore for FakeStore {
    fn create_workout(
        &mut self,
        name: Option<&str>,
        started_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<i64> {
        if self.fail_create {
            return Err(anyhow!("disk full"));
        }
        let id = self.id();
        self.workouts
            .push((id, name.map(str::to_string), notes.map(str::to_string), started_at));
        Ok(id)
    }

    fn add_exercise(
        &mut self,
        workout_id: i64,
        exercise_id: i64,
        _notes: Option<&str>,
        superset_group_id: Option<u32>,
    ) -> Result<i64> {
        if self.fail_link_for_exercise == Some(exercise_id) {
            return Err(anyhow!("constraint failed"));
        }
        let id = self.id();
        self.links.push((id, workout_id, exercise_id, superset_group_id));
        Ok(id)
    }

    fn add_set(&mut self, link_id: i64, set: &NewSet) -> Result<i64> {
        let call = self.add_set_calls;
        self.add_set_calls += 1;
        if self.fail_set_call == Some(call) {
            return Err(anyhow!("set rejected"));
        }
        let id = self.id();
        self.sets.push((id, link_id, *set));
        Ok(id)
    }

    fn update_duration(&mut self, workout_id: i64, minutes: i64) -> Result<()> {
        if self.fail_duration {
            return Err(anyhow!("connection lost"));
        }
        self.durations.push((workout_id, minutes));
        Ok(())
    }

    fn update_workout(
        &mut self,
        workout_id: i64,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> Result<()> {
        let workout = self
            .workouts
            .iter_mut()
            .find(|w| w.0 == workout_id)
            .ok_or_else(|| anyhow!("no workout {workout_id}"))?;
        workout.1 = name.map(str::to_string);
        workout.2 = notes.map(str::to_string);
        Ok(())
    }

    fn clear_exercises(&mut self, workout_id: i64) -> Result<()> {
        if self.fail_clear {
            return Err(anyhow!("database is locked"));
        }
        let removed: Vec<i64> = self
            .links
            .iter()
            .filter(|l| l.1 == workout_id)
            .map(|l| l.0)
            .collect();
        self.links.retain(|l| l.1 != workout_id);
        self.sets.retain(|s| !removed.contains(&s.1));
        Ok(())
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap()
}

/// Two exercises: the first with two completed sets and one open set, the
/// second with nothing completed.
fn sample_session() -> Result<WorkoutSession> {
    let mut session = WorkoutSession::new(90);
    session.start(Some("Push Day"), t0());
    for (id, name) in [(1, "Bench Press"), (2, "Cable Fly")] {
        session.add_exercise(ExerciseRef {
            exercise_id: id,
            name: name.to_string(),
            muscle_group: "chest".to_string(),
        })?;
    }
    session.update_set(
        0,
        0,
        &SetUpdate {
            weight: Some(Some(100.0)),
            reps: Some(Some(5)),
            ..SetUpdate::default()
        },
    )?;
    session.add_set(0)?;
    session.add_set(0)?;
    session.toggle_set_complete(0, 0)?;
    session.toggle_set_complete(0, 1)?;
    Ok(session)
}

#[test]
fn test_commit_saves_completed_sets_only() -> Result<()> {
    let mut session = sample_session()?;
    let mut store = FakeStore::default();
    let report = commit_session(&mut session, &mut store, t0() + Duration::minutes(45))?;

    assert_eq!(store.workouts.len(), 1);
    assert_eq!(store.workouts[0].1.as_deref(), Some("Push Day"));
    assert_eq!(store.workouts[0].3, t0());
    // Cable Fly had no completed sets
    assert_eq!(store.links.len(), 1);
    assert_eq!(store.links[0].2, 1);
    assert_eq!(store.stored_sets(), vec![(Some(100.0), Some(5)); 2]);
    assert_eq!(store.durations, vec![(report.workout_id, 45)]);

    assert_eq!(report.exercises_saved, 1);
    assert_eq!(report.sets_saved, 2);
    assert_eq!(report.duration_minutes, 45);
    assert!(report.skipped_exercises.is_empty());
    assert!(!session.is_active());
    Ok(())
}

#[test]
fn test_commit_inactive_session_touches_nothing() {
    let mut session = WorkoutSession::new(90);
    let mut store = FakeStore::default();
    let result = commit_session(&mut session, &mut store, t0());
    assert!(matches!(result, Err(CommitError::NotActive)));
    assert!(store.workouts.is_empty());
}

#[test]
fn test_create_failure_keeps_session() -> Result<()> {
    let mut session = sample_session()?;
    let mut store = FakeStore {
        fail_create: true,
        ..FakeStore::default()
    };
    let result = commit_session(&mut session, &mut store, t0());
    assert!(matches!(result, Err(CommitError::CreateWorkout(_))));
    assert!(session.is_active());
    assert_eq!(session.workout().unwrap().workout_id, None);
    assert!(store.links.is_empty());
    Ok(())
}

#[test]
fn test_link_failure_skips_exercise_and_continues() -> Result<()> {
    let mut session = sample_session()?;
    session.toggle_set_complete(1, 0)?;
    let mut store = FakeStore {
        fail_link_for_exercise: Some(1),
        ..FakeStore::default()
    };
    let report = commit_session(&mut session, &mut store, t0())?;
    assert_eq!(report.skipped_exercises, vec!["Bench Press".to_string()]);
    assert_eq!(report.exercises_saved, 1);
    assert_eq!(store.links.len(), 1);
    assert_eq!(store.links[0].2, 2);
    assert_eq!(store.sets.len(), 1);
    assert!(!session.is_active());
    Ok(())
}

#[test]
fn test_set_failure_stops_that_exercise() -> Result<()> {
    let mut session = sample_session()?;
    session.toggle_set_complete(0, 2)?;
    let mut store = FakeStore {
        fail_set_call: Some(1),
        ..FakeStore::default()
    };
    let report = commit_session(&mut session, &mut store, t0())?;
    assert_eq!(store.sets.len(), 1);
    assert_eq!(report.sets_saved, 1);
    assert_eq!(report.skipped_exercises, vec!["Bench Press".to_string()]);
    Ok(())
}

#[test]
fn test_retry_after_duration_failure_does_not_duplicate() -> Result<()> {
    let mut session = sample_session()?;
    let mut store = FakeStore {
        fail_duration: true,
        ..FakeStore::default()
    };
    let result = commit_session(&mut session, &mut store, t0() + Duration::minutes(30));
    assert!(matches!(result, Err(CommitError::UpdateDuration(_, _))));
    assert!(session.is_active());
    let workout_id = session.workout().unwrap().workout_id.unwrap();

    store.fail_duration = false;
    let report = commit_session(&mut session, &mut store, t0() + Duration::minutes(31))?;
    assert_eq!(report.workout_id, workout_id);
    assert_eq!(store.workouts.len(), 1);
    assert_eq!(store.links.len(), 1);
    assert_eq!(store.sets.len(), 2);
    assert_eq!(report.sets_saved, 2);
    assert_eq!(store.durations, vec![(workout_id, 31)]);
    assert!(!session.is_active());
    Ok(())
}

#[test]
fn test_retry_stores_edits_made_after_failure() -> Result<()> {
    let mut session = sample_session()?;
    let mut store = FakeStore {
        fail_duration: true,
        ..FakeStore::default()
    };
    assert!(commit_session(&mut session, &mut store, t0()).is_err());
    assert_eq!(store.sets.len(), 2);

    session.update_set(
        0,
        0,
        &SetUpdate {
            weight: Some(Some(120.0)),
            ..SetUpdate::default()
        },
    )?;
    session.toggle_set_complete(0, 1)?;
    session.set_name("Renamed")?;
    session.set_notes("felt strong")?;

    store.fail_duration = false;
    let report = commit_session(&mut session, &mut store, t0() + Duration::minutes(50))?;
    assert_eq!(store.workouts.len(), 1);
    assert_eq!(store.workouts[0].1.as_deref(), Some("Renamed"));
    assert_eq!(store.workouts[0].2.as_deref(), Some("felt strong"));
    assert_eq!(store.links.len(), 1);
    assert_eq!(store.stored_sets(), vec![(Some(120.0), Some(5))]);
    assert_eq!(report.sets_saved, store.sets.len());
    assert_eq!(report.exercises_saved, store.links.len());
    Ok(())
}

#[test]
fn test_retry_drops_exercises_removed_after_failure() -> Result<()> {
    let mut session = sample_session()?;
    session.toggle_set_complete(1, 0)?;
    let mut store = FakeStore {
        fail_duration: true,
        ..FakeStore::default()
    };
    assert!(commit_session(&mut session, &mut store, t0()).is_err());
    assert_eq!(store.links.len(), 2);

    session.remove_exercise(0)?;
    store.fail_duration = false;
    let report = commit_session(&mut session, &mut store, t0())?;
    assert_eq!(store.links.len(), 1);
    assert_eq!(store.links[0].2, 2);
    assert_eq!(store.sets.len(), 1);
    assert_eq!(report.exercises_saved, 1);
    assert_eq!(report.sets_saved, 1);
    Ok(())
}

#[test]
fn test_failed_rewrite_keeps_session_and_stored_rows() -> Result<()> {
    let mut session = sample_session()?;
    let mut store = FakeStore {
        fail_duration: true,
        ..FakeStore::default()
    };
    assert!(commit_session(&mut session, &mut store, t0()).is_err());

    store.fail_duration = false;
    store.fail_clear = true;
    let result = commit_session(&mut session, &mut store, t0());
    assert!(matches!(result, Err(CommitError::RewriteWorkout(_, _))));
    assert!(session.is_active());
    assert_eq!(store.sets.len(), 2);
    assert_eq!(store.workouts.len(), 1);
    Ok(())
}

#[test]
fn test_superset_group_is_stored() -> Result<()> {
    let mut session = sample_session()?;
    session.group_exercises(&[0, 1])?;
    session.toggle_set_complete(1, 0)?;
    let mut store = FakeStore::default();
    commit_session(&mut session, &mut store, t0())?;
    assert_eq!(store.links.len(), 2);
    assert!(store.links.iter().all(|(_, _, _, group)| *group == Some(1)));
    Ok(())
}
