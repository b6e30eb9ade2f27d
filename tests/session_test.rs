use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fittrack_lib::{ExerciseRef, SessionError, SetUpdate, TemplateEntry, WorkoutSession};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap()
}

fn exercise(id: i64, name: &str) -> ExerciseRef {
    ExerciseRef {
        exercise_id: id,
        name: name.to_string(),
        muscle_group: "chest".to_string(),
    }
}

/// Active session holding `count` exercises with ids 1..=count.
fn session_with(count: i64) -> Result<WorkoutSession> {
    let mut session = WorkoutSession::new(90);
    session.start(Some("Push Day"), t0());
    for id in 1..=count {
        session.add_exercise(exercise(id, &format!("Exercise {id}")))?;
    }
    Ok(session)
}

fn groups(session: &WorkoutSession) -> Vec<Option<u32>> {
    session
        .workout()
        .map(|w| w.exercises.iter().map(|e| e.superset_group_id).collect())
        .unwrap_or_default()
}

#[test]
fn test_operations_require_active_workout() {
    let mut session = WorkoutSession::new(90);
    assert!(!session.is_active());
    assert_eq!(
        session.add_exercise(exercise(1, "Bench Press")),
        Err(SessionError::NotActive)
    );
    assert_eq!(session.add_set(0), Err(SessionError::NotActive));
    assert_eq!(session.set_name("Legs"), Err(SessionError::NotActive));
    assert_eq!(session.finish(t0()), Err(SessionError::NotActive));
}

#[test]
fn test_start_and_add_exercise() -> Result<()> {
    let mut session = WorkoutSession::new(90);
    session.start(Some("  Push Day  "), t0());
    let index = session.add_exercise(exercise(7, "Bench Press"))?;
    assert_eq!(index, 0);

    let workout = session.workout().unwrap();
    assert_eq!(workout.name, "Push Day");
    assert_eq!(workout.started_at, t0());
    assert_eq!(workout.workout_id, None);
    let added = &workout.exercises[0];
    assert_eq!(added.exercise_id, 7);
    assert_eq!(added.sets.len(), 1);
    assert!(!added.sets[0].completed);
    assert_eq!(added.sets[0].weight, None);
    Ok(())
}

#[test]
fn test_add_set_copies_previous_values() -> Result<()> {
    let mut session = session_with(1)?;
    session.update_set(
        0,
        0,
        &SetUpdate {
            weight: Some(Some(80.0)),
            reps: Some(Some(8)),
            ..SetUpdate::default()
        },
    )?;
    session.toggle_set_complete(0, 0)?;

    let index = session.add_set(0)?;
    assert_eq!(index, 1);
    let set = &session.workout().unwrap().exercises[0].sets[1];
    assert_eq!(set.weight, Some(80.0));
    assert_eq!(set.reps, Some(8));
    assert!(!set.completed);
    Ok(())
}

#[test]
fn test_update_set_validation_leaves_set_unchanged() -> Result<()> {
    let mut session = session_with(1)?;
    session.update_set(
        0,
        0,
        &SetUpdate {
            weight: Some(Some(60.0)),
            ..SetUpdate::default()
        },
    )?;

    let negative = SetUpdate {
        weight: Some(Some(-5.0)),
        reps: Some(Some(5)),
        ..SetUpdate::default()
    };
    assert!(matches!(
        session.update_set(0, 0, &negative),
        Err(SessionError::InvalidSet(_))
    ));
    let bad_rpe = SetUpdate {
        rpe: Some(Some(11.0)),
        ..SetUpdate::default()
    };
    assert!(matches!(
        session.update_set(0, 0, &bad_rpe),
        Err(SessionError::InvalidSet(_))
    ));

    let set = &session.workout().unwrap().exercises[0].sets[0];
    assert_eq!(set.weight, Some(60.0));
    assert_eq!(set.reps, None);

    // Some(None) clears a field
    session.update_set(
        0,
        0,
        &SetUpdate {
            weight: Some(None),
            rpe: Some(Some(8.5)),
            ..SetUpdate::default()
        },
    )?;
    let set = &session.workout().unwrap().exercises[0].sets[0];
    assert_eq!(set.weight, None);
    assert_eq!(set.rpe, Some(8.5));
    Ok(())
}

#[test]
fn test_index_errors() -> Result<()> {
    let mut session = session_with(1)?;
    assert_eq!(session.add_set(3), Err(SessionError::ExerciseOutOfRange(3)));
    assert_eq!(
        session.toggle_set_complete(0, 4),
        Err(SessionError::SetOutOfRange { exercise: 0, set: 4 })
    );
    assert!(session.remove_set(0, 1).is_err());
    Ok(())
}

#[test]
fn test_working_set_numbers_skip_warmups() -> Result<()> {
    let mut session = session_with(1)?;
    session.add_set(0)?;
    session.add_set(0)?;
    session.update_set(
        0,
        0,
        &SetUpdate {
            is_warmup: Some(true),
            ..SetUpdate::default()
        },
    )?;
    let exercise = &session.workout().unwrap().exercises[0];
    assert_eq!(exercise.working_set_number(0), None);
    assert_eq!(exercise.working_set_number(1), Some(1));
    assert_eq!(exercise.working_set_number(2), Some(2));
    assert_eq!(exercise.working_set_number(3), None);
    Ok(())
}

#[test]
fn test_group_exercises_rules() -> Result<()> {
    let mut session = session_with(4)?;

    assert!(matches!(
        session.group_exercises(&[0]),
        Err(SessionError::InvalidGroup(_))
    ));
    assert!(matches!(
        session.group_exercises(&[0, 2]),
        Err(SessionError::InvalidGroup(_))
    ));
    assert_eq!(
        session.group_exercises(&[1, 9]),
        Err(SessionError::ExerciseOutOfRange(9))
    );

    assert_eq!(session.group_exercises(&[1, 0])?, 1);
    assert!(matches!(
        session.group_exercises(&[1, 2]),
        Err(SessionError::InvalidGroup(_))
    ));
    assert_eq!(session.group_exercises(&[2, 3])?, 2);
    assert_eq!(groups(&session), vec![Some(1), Some(1), Some(2), Some(2)]);
    session.validate_supersets()?;

    session.ungroup_exercise(3)?;
    assert_eq!(groups(&session), vec![Some(1), Some(1), None, None]);
    Ok(())
}

#[test]
fn test_rest_triggers_only_after_last_superset_member() -> Result<()> {
    let mut session = session_with(3)?;
    session.group_exercises(&[0, 1])?;

    assert!(!session.triggers_rest(0)?);
    assert!(session.triggers_rest(1)?);
    assert!(session.triggers_rest(2)?);

    let (completed, rest) = session.complete_set(0, 0, t0())?;
    assert!(completed);
    assert!(!rest);
    assert!(!session.rest_timer().is_running());

    let (completed, rest) = session.complete_set(1, 0, t0())?;
    assert!(completed);
    assert!(rest);
    assert!(session.rest_timer().is_running());
    assert_eq!(session.rest_timer().remaining(t0()), 90);

    session.rest_timer_mut().stop();
    let (completed, rest) = session.complete_set(2, 0, t0())?;
    assert!(completed && rest);

    // Un-completing never starts rest
    session.rest_timer_mut().stop();
    let (completed, rest) = session.complete_set(2, 0, t0())?;
    assert!(!completed);
    assert!(!rest);
    assert!(!session.rest_timer().is_running());
    Ok(())
}

#[test]
fn test_reorder_dissolves_broken_superset() -> Result<()> {
    let mut session = session_with(3)?;
    session.group_exercises(&[0, 1])?;

    // Swapping inside the group keeps it intact
    session.reorder_exercise(1, 0)?;
    assert_eq!(groups(&session), vec![Some(1), Some(1), None]);

    // Moving a member to the end splits the group apart
    session.reorder_exercise(0, 2)?;
    assert_eq!(groups(&session), vec![None, None, None]);
    session.validate_supersets()?;

    assert_eq!(
        session.reorder_exercise(0, 5),
        Err(SessionError::ExerciseOutOfRange(5))
    );
    Ok(())
}

#[test]
fn test_remove_exercise_dissolves_single_member_group() -> Result<()> {
    let mut session = session_with(3)?;
    session.group_exercises(&[1, 2])?;
    let removed = session.remove_exercise(2)?;
    assert_eq!(removed.exercise_id, 3);
    assert_eq!(groups(&session), vec![None, None]);
    Ok(())
}

#[test]
fn test_remove_middle_of_three_keeps_remaining_pair() -> Result<()> {
    let mut session = session_with(4)?;
    assert_eq!(session.group_exercises(&[0, 1, 2])?, 1);
    let removed = session.remove_exercise(1)?;
    assert_eq!(removed.exercise_id, 2);
    assert_eq!(groups(&session), vec![Some(1), Some(1), None]);
    assert!(session.validate_supersets().is_ok());

    // The pair still rests only after its last member
    assert!(!session.triggers_rest(0)?);
    assert!(session.triggers_rest(1)?);
    let ids: Vec<i64> = session
        .workout()
        .unwrap()
        .exercises
        .iter()
        .map(|e| e.exercise_id)
        .collect();
    assert_eq!(ids, vec![1, 3, 4]);
    Ok(())
}

#[test]
fn test_apply_template_assigns_fresh_group_ids() -> Result<()> {
    let mut session = session_with(2)?;
    session.group_exercises(&[0, 1])?;

    let entries = vec![
        TemplateEntry {
            exercise: exercise(10, "Pull Up"),
            superset_group_id: Some(1),
        },
        TemplateEntry {
            exercise: exercise(11, "Dips"),
            superset_group_id: Some(1),
        },
        TemplateEntry {
            exercise: exercise(12, "Plank"),
            superset_group_id: None,
        },
    ];
    session.apply_template("Upper", entries)?;

    let workout = session.workout().unwrap();
    // The workout already had a name
    assert_eq!(workout.name, "Push Day");
    assert_eq!(workout.exercises.len(), 5);
    assert_eq!(
        groups(&session),
        vec![Some(1), Some(1), Some(2), Some(2), None]
    );
    session.validate_supersets()?;
    Ok(())
}

#[test]
fn test_apply_template_names_unnamed_workout() -> Result<()> {
    let mut session = WorkoutSession::new(90);
    session.start(None, t0());
    session.apply_template(
        "Leg Day",
        vec![TemplateEntry {
            exercise: exercise(1, "Squat"),
            superset_group_id: None,
        }],
    )?;
    assert_eq!(session.workout().unwrap().name, "Leg Day");
    Ok(())
}

#[test]
fn test_volume_counts_completed_working_sets() -> Result<()> {
    let mut session = session_with(1)?;
    session.add_set(0)?;
    session.add_set(0)?;
    let heavy = SetUpdate {
        weight: Some(Some(100.0)),
        reps: Some(Some(5)),
        ..SetUpdate::default()
    };
    session.update_set(0, 0, &heavy)?;
    session.update_set(0, 1, &heavy)?;
    session.update_set(0, 2, &heavy)?;
    session.update_set(
        0,
        0,
        &SetUpdate {
            is_warmup: Some(true),
            ..SetUpdate::default()
        },
    )?;
    session.toggle_set_complete(0, 0)?;
    session.toggle_set_complete(0, 1)?;

    let workout = session.workout().unwrap();
    assert_eq!(workout.completed_set_count(), 2);
    assert!((workout.volume() - 500.0).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn test_finish_rounds_minutes_and_ends_session() -> Result<()> {
    let mut session = session_with(1)?;
    session.start_rest(Some(60), t0())?;
    let minutes = session.finish(t0() + Duration::seconds(89))?;
    assert_eq!(minutes, 1);
    assert!(!session.is_active());
    assert!(!session.rest_timer().is_running());

    let mut session = session_with(1)?;
    assert_eq!(session.workout().unwrap().elapsed_minutes(t0() + Duration::seconds(29)), 0);
    session.discard();
    assert!(session.workout().is_none());
    Ok(())
}

#[test]
fn test_start_rest_rejects_zero() -> Result<()> {
    let mut session = WorkoutSession::new(90);
    assert!(matches!(
        session.start_rest(Some(0), t0()),
        Err(SessionError::Timer(_))
    ));
    session.start_rest(None, t0())?;
    assert_eq!(session.rest_timer().remaining(t0()), 90);
    Ok(())
}

#[test]
fn test_set_count_tracks_adds_and_removes() -> Result<()> {
    let mut session = session_with(1)?;
    session.update_set(
        0,
        0,
        &SetUpdate {
            weight: Some(Some(40.0)),
            reps: Some(Some(12)),
            ..SetUpdate::default()
        },
    )?;
    for _ in 0..4 {
        session.add_set(0)?;
    }
    session.remove_set(0, 2)?;
    session.remove_set(0, 0)?;
    assert_eq!(session.workout().unwrap().exercises[0].sets.len(), 3);

    // Updating only reps keeps the copied weight
    session.update_set(
        0,
        1,
        &SetUpdate {
            reps: Some(Some(10)),
            ..SetUpdate::default()
        },
    )?;
    let set = &session.workout().unwrap().exercises[0].sets[1];
    assert_eq!(set.weight, Some(40.0));
    assert_eq!(set.reps, Some(10));
    assert_eq!(set.rpe, None);
    Ok(())
}

#[test]
fn test_group_then_ungroup_restores_members() -> Result<()> {
    let mut session = session_with(3)?;
    let before = groups(&session);
    session.group_exercises(&[1, 2])?;
    session.ungroup_exercise(1)?;
    assert_eq!(groups(&session), before);
    // A second ungroup is a no-op
    session.ungroup_exercise(1)?;
    assert_eq!(groups(&session), before);
    Ok(())
}
