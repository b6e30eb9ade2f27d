//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::collections::BTreeMap;
use std::io::{self, stdin, stdout, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use tracing_subscriber::EnvFilter;

use fittrack_lib::{
    catalog,
    rest_timer::{format_countdown, QUICK_TIMES, TICK_INTERVAL},
    AppService, DashboardStats, ExerciseDefinition, ExerciseHistoryEntry, ExerciseTemplate,
    PersonalRecord, Preferences, RestAlert, SetUpdate, TimerTick, Units, VolumePeriod,
    VolumePoint, WorkoutDetail, WorkoutSession, WorkoutSummary, WorkoutTemplate, WorkoutUpdate,
};

const LOG_ENV_VAR: &str = "FITTRACK_LOG";
/// Seconds added to a running rest countdown per Enter press.
const REST_EXTENSION_SECONDS: u32 = 15;

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args(); // Parse arguments once
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command(); // Get the command structure
        let bin_name = cmd.get_name().to_string(); // Get the binary name

        eprintln!("Generating completion script for {shell}..."); // Print to stderr
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout()); // Print script to stdout
        return Ok(()); // Exit after generating script
    }

    init_tracing();

    // Initialize the application service (loads config, connects to DB)
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let header_color = service.config.header_color();

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            // This case is handled above, but keep it exhaustive
            unreachable!("Completion generation should have exited already");
        }

        // --- Active workout ---
        cli::Commands::Start {
            name,
            template,
            force,
        } => {
            let mut session = service.load_session()?;
            if let Some(current) = session.workout() {
                if current.workout_id.is_some() && !force {
                    bail!("The current workout was partly saved by a failed 'finish'. Run 'finish' again, or 'start --force' to delete it.");
                }
                if !current.exercises.is_empty() && !force {
                    bail!(
                        "A workout with {} exercise(s) is already in progress. Use 'finish', 'discard', or 'start --force'.",
                        current.exercises.len()
                    );
                }
            }
            let now = Utc::now();
            match template {
                Some(template_name) => {
                    service.start_from_template(&mut session, &template_name, now)?;
                }
                None => service.start_session(&mut session, name.as_deref(), now)?,
            }
            service.save_session(&session)?;
            let workout_name = session
                .workout()
                .map(|w| w.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Workout".to_string());
            println!("Started '{workout_name}'.");
            if session.workout().is_some_and(|w| !w.exercises.is_empty()) {
                print_session(&session, header_color, service.preferences()?.weight_unit);
            }
        }
        cli::Commands::Add { exercise, muscle } => {
            let mut session = service.load_session()?;
            let index = service.add_exercise_to_session(&mut session, &exercise, muscle.as_deref())?;
            service.save_session(&session)?;
            if let Some(added) = session.workout().and_then(|w| w.exercises.get(index)) {
                println!("Added '{}' as exercise {}.", added.exercise_name, index + 1);
                if let Some(ghost) = added.ghost(0) {
                    println!("Last time: {}", format_ghost(ghost.weight, ghost.reps));
                }
            }
        }
        cli::Commands::Set { action } => {
            let mut session = service.load_session()?;
            match action {
                cli::SetCommands::Add { exercise } => {
                    let set = session.add_set(exercise)?;
                    println!("Added set {} to exercise {}.", set + 1, exercise + 1);
                }
                cli::SetCommands::Update {
                    exercise,
                    set,
                    weight,
                    reps,
                    rpe,
                    warmup,
                } => {
                    let update = SetUpdate {
                        weight: weight.map(cli::FieldValue::into_option),
                        reps: reps.map(cli::FieldValue::into_option),
                        rpe: rpe.map(cli::FieldValue::into_option),
                        is_warmup: warmup,
                    };
                    if update == SetUpdate::default() {
                        bail!("Nothing to update. Pass --weight, --reps, --rpe or --warmup.");
                    }
                    session.update_set(exercise, set, &update)?;
                    println!("Updated set {} of exercise {}.", set + 1, exercise + 1);
                }
                cli::SetCommands::Remove { exercise, set } => {
                    session.remove_set(exercise, set)?;
                    println!("Removed set {} from exercise {}.", set + 1, exercise + 1);
                }
            }
            service.save_session(&session)?;
        }
        cli::Commands::Done {
            exercise,
            set,
            no_wait,
        } => {
            let mut session = service.load_session()?;
            let (completed, rest) = session.complete_set(exercise, set, Utc::now())?;
            service.save_session(&session)?;
            if !completed {
                println!("Set {} of exercise {} marked as not done.", set + 1, exercise + 1);
            } else if rest {
                println!("Set {} of exercise {} done.", set + 1, exercise + 1);
                if no_wait {
                    println!(
                        "Rest {}",
                        format_countdown(session.rest_timer().duration_seconds())
                    );
                } else {
                    run_rest_countdown(&mut session, service.rest_alert().as_ref())?;
                    service.save_session(&session)?;
                }
            } else {
                println!(
                    "Set {} of exercise {} done. Next superset exercise, no rest.",
                    set + 1,
                    exercise + 1
                );
            }
        }
        cli::Commands::Group { exercises } => {
            let mut session = service.load_session()?;
            let group = session.group_exercises(&exercises)?;
            service.save_session(&session)?;
            println!("Created superset S{group}.");
        }
        cli::Commands::Ungroup { exercise } => {
            let mut session = service.load_session()?;
            session.ungroup_exercise(exercise)?;
            service.save_session(&session)?;
            println!("Exercise {} is no longer in a superset.", exercise + 1);
        }
        cli::Commands::Move { from, to } => {
            let mut session = service.load_session()?;
            session.reorder_exercise(from, to)?;
            service.save_session(&session)?;
            println!("Moved exercise {} to position {}.", from + 1, to + 1);
        }
        cli::Commands::Remove { exercise } => {
            let mut session = service.load_session()?;
            let removed = session.remove_exercise(exercise)?;
            service.save_session(&session)?;
            println!("Removed '{}'.", removed.exercise_name);
        }
        cli::Commands::Note { text, exercise } => {
            let mut session = service.load_session()?;
            match exercise {
                Some(index) => session.set_exercise_notes(index, &text)?,
                None => session.set_notes(&text)?,
            }
            service.save_session(&session)?;
            println!("Notes saved.");
        }
        cli::Commands::Rename { name } => {
            let mut session = service.load_session()?;
            session.set_name(&name)?;
            service.save_session(&session)?;
            println!("Workout renamed to '{}'.", name.trim());
        }
        cli::Commands::Show => {
            let session = service.load_session()?;
            if session.is_active() {
                print_session(&session, header_color, service.preferences()?.weight_unit);
            } else {
                println!("No workout in progress. Start one with 'start'.");
            }
        }
        cli::Commands::Rest { seconds } => {
            let mut session = service.load_session()?;
            session.start_rest(seconds, Utc::now())?;
            if seconds.is_none() {
                let picks: Vec<String> = QUICK_TIMES.iter().map(|s| format_countdown(*s)).collect();
                println!("Quick picks: {}", picks.join("  "));
            }
            run_rest_countdown(&mut session, service.rest_alert().as_ref())?;
            service.save_session(&session)?;
        }
        cli::Commands::Finish => {
            let mut session = service.load_session()?;
            match service.finish_session(&mut session, Utc::now()) {
                Ok(report) => {
                    service.save_session(&session)?;
                    println!(
                        "Workout saved (ID: {}). {} exercise(s), {} set(s), {} min.",
                        report.workout_id,
                        report.exercises_saved,
                        report.sets_saved,
                        report.duration_minutes
                    );
                    for name in &report.skipped_exercises {
                        eprintln!("Warning: '{name}' could not be fully saved.");
                    }
                }
                Err(e) => {
                    // The session remembers the workout record; a retry rewrites it.
                    service.save_session(&session)?;
                    bail!("Error saving workout: {e}. The workout is still in progress; run 'finish' again to retry.");
                }
            }
        }
        cli::Commands::Discard => {
            let mut session = service.load_session()?;
            if !session.is_active() {
                println!("No workout in progress.");
            } else {
                let partly_saved = session.workout().and_then(|w| w.workout_id);
                service.discard_session(&mut session)?;
                service.save_session(&session)?;
                match partly_saved {
                    Some(id) => println!("Workout discarded. Deleted its partial save (ID: {id})."),
                    None => println!("Workout discarded."),
                }
            }
        }
        cli::Commands::SaveTemplate { name } => {
            let session = service.load_session()?;
            let id = service.save_session_as_template(&session, &name)?;
            println!("Saved template '{}' (ID: {id}).", name.trim());
        }
        cli::Commands::Template { action } => match action {
            cli::TemplateCommands::Create { name, exercises } => {
                let id = service.create_template(&name, &exercises)?;
                println!("Created template '{}' (ID: {id}).", name.trim());
            }
            cli::TemplateCommands::List => {
                let templates = service.list_templates()?;
                if templates.is_empty() {
                    println!("No templates saved yet.");
                } else {
                    print_template_table(&templates, header_color);
                }
            }
            cli::TemplateCommands::Delete { name } => {
                service.delete_template(&name)?;
                println!("Deleted template '{}'.", name.trim());
            }
        },

        // --- Saved workouts ---
        cli::Commands::History { limit } => {
            let workouts = service.list_workouts(Some(limit))?;
            let units = service.preferences()?.weight_unit;
            if export_csv {
                print_workout_summary_csv(&workouts, units)?;
            } else if workouts.is_empty() {
                println!("No workouts saved yet.");
            } else {
                print_workout_summary_table(&workouts, header_color, units);
            }
        }
        cli::Commands::ShowWorkout { id } => {
            let detail = service.get_workout(id)?;
            print_workout_detail(&detail, header_color, service.preferences()?.weight_unit);
        }
        cli::Commands::DeleteWorkout { id } => {
            service.delete_workout(id)?;
            println!("Deleted workout {id}.");
        }
        cli::Commands::EditWorkout {
            id,
            name,
            date,
            notes,
            duration,
        } => {
            let update = WorkoutUpdate {
                name: clearable(name.as_deref()),
                date,
                notes: clearable(notes.as_deref()),
                duration_minutes: duration.map(cli::FieldValue::into_option),
            };
            if update == WorkoutUpdate::default() {
                bail!("Nothing to update. Pass --name, --date, --notes or --duration.");
            }
            service
                .edit_workout(id, &update)
                .with_context(|| format!("Error editing workout {id}"))?;
            println!("Updated workout {id}.");
        }
        cli::Commands::EditSet {
            workout,
            set,
            weight,
            reps,
            rpe,
            warmup,
        } => {
            let update = SetUpdate {
                weight: weight.map(cli::FieldValue::into_option),
                reps: reps.map(cli::FieldValue::into_option),
                rpe: rpe.map(cli::FieldValue::into_option),
                is_warmup: warmup,
            };
            if update == SetUpdate::default() {
                bail!("Nothing to update. Pass --weight, --reps, --rpe or --warmup.");
            }
            service
                .edit_workout_set(workout, set, &update)
                .with_context(|| format!("Error editing set {set} of workout {workout}"))?;
            println!("Updated set {set} of workout {workout}.");
        }
        cli::Commands::DeleteSet { workout, set } => {
            service
                .delete_workout_set(workout, set)
                .with_context(|| format!("Error deleting set {set} of workout {workout}"))?;
            println!("Deleted set {set} from workout {workout}.");
        }
        cli::Commands::DeleteWorkoutExercise { workout, entry } => {
            service
                .delete_workout_exercise(workout, entry)
                .with_context(|| format!("Error removing entry {entry} from workout {workout}"))?;
            println!("Removed entry {entry} from workout {workout}.");
        }
        cli::Commands::ExerciseHistory { exercise, limit } => {
            let (definition, history) = service.exercise_history(&exercise, limit)?;
            let units = service.preferences()?.weight_unit;
            if export_csv {
                print_exercise_history_csv(&history, units)?;
            } else if history.is_empty() {
                println!("No history for '{}' yet.", definition.name);
            } else {
                println!("History for '{}':", definition.name);
                print_exercise_history_table(&history, header_color, units);
            }
        }

        // --- Analytics ---
        cli::Commands::Stats => {
            let stats = service.dashboard(Local::now().date_naive())?;
            print_dashboard(&stats, service.preferences()?.weight_unit);
        }
        cli::Commands::Prs => {
            let records = service.personal_records()?;
            let units = service.preferences()?.weight_unit;
            if export_csv {
                print_pr_csv(&records, units)?;
            } else if records.is_empty() {
                println!("No personal records yet. Finish a workout with weighted sets first.");
            } else {
                print_pr_table(&records, header_color, units);
            }
        }
        cli::Commands::Volume { period } => {
            let period = VolumePeriod::from(period);
            let points = service.volume_series(period, Local::now().date_naive())?;
            let units = service.preferences()?.weight_unit;
            if export_csv {
                print_volume_csv(&points, period, units)?;
            } else if points.is_empty() {
                println!("No training volume recorded in this window.");
            } else {
                print_volume_table(&points, period, units);
            }
        }
        cli::Commands::Calendar { year, month } => {
            let today = Local::now().date_naive();
            let year = year.unwrap_or_else(|| today.year());
            let month = month.unwrap_or_else(|| today.month());
            let days = service.calendar_month(year, month)?;
            if days.is_empty() {
                println!("No workouts in {year}-{month:02}.");
            } else {
                print_calendar(&days, header_color);
            }
        }
        cli::Commands::Search { query } => {
            let results = catalog::search(&query);
            if results.is_empty() {
                println!("No catalog exercises match '{}'.", query.trim());
            } else {
                print_catalog_table(&results, header_color);
            }
        }

        // --- Exercise definitions ---
        cli::Commands::CreateExercise {
            name,
            muscle,
            equipment,
            notes,
        } => {
            let id = service.create_exercise(
                &name,
                muscle.as_deref(),
                equipment.as_deref(),
                notes.as_deref(),
            )?;
            println!(
                "Successfully defined exercise: '{}' (Muscle group: {}) ID: {id}",
                name.trim(),
                muscle.as_deref().unwrap_or("None")
            );
        }
        cli::Commands::EditExercise {
            identifier,
            name,
            muscle,
            equipment,
            notes,
        } => {
            let rows = service
                .edit_exercise(
                    &identifier,
                    name.as_deref(),
                    clearable(muscle.as_deref()),
                    clearable(equipment.as_deref()),
                    clearable(notes.as_deref()),
                )
                .with_context(|| format!("Error editing exercise '{identifier}'"))?;
            println!("Successfully updated exercise '{identifier}' ({rows} row(s) affected).");
        }
        cli::Commands::DeleteExercise { identifier } => {
            service
                .delete_exercise(&identifier)
                .with_context(|| format!("Error deleting exercise '{identifier}'"))?;
            println!("Successfully deleted exercise '{identifier}'.");
        }
        cli::Commands::ListExercises { muscle, custom } => {
            let exercises = service.list_exercises(muscle.as_deref(), custom)?;
            if export_csv {
                print_exercise_definition_csv(&exercises)?;
            } else if exercises.is_empty() {
                println!("No exercises found.");
            } else {
                print_exercise_definition_table(&exercises, header_color);
            }
        }

        // --- Settings ---
        cli::Commands::Prefs { unit, rest, theme } => {
            let prefs = if unit.is_none() && rest.is_none() && theme.is_none() {
                service.preferences()?
            } else {
                let prefs =
                    service.update_preferences(unit.map(Units::from), rest, theme.as_deref())?;
                if let Some(seconds) = rest {
                    let mut session = service.load_session()?;
                    session.rest_timer_mut().set_default_duration(seconds)?;
                    service.save_session(&session)?;
                }
                println!("Preferences updated.");
                prefs
            };
            print_preferences(&prefs);
        }
        cli::Commands::SetHeaderColor { color } => {
            service.set_header_color(&color)?;
            println!("Header colour set to {}.", service.config.theme.header_color);
        }
        cli::Commands::SetRestAlert { enabled } => {
            service.set_rest_alert(enabled)?;
            println!(
                "Rest alert {}.",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

/// Empty string clears the field, anything else sets it.
fn clearable(value: Option<&str>) -> Option<Option<&str>> {
    value.map(|s| Some(s.trim()).filter(|s| !s.is_empty()))
}

fn format_weight(weight: Option<f64>) -> String {
    weight.map_or_else(|| "-".to_string(), |w| format!("{w}"))
}

fn format_ghost(weight: Option<f64>, reps: Option<u32>) -> String {
    format!(
        "{} x {}",
        format_weight(weight),
        reps.map_or_else(|| "-".to_string(), |r| r.to_string())
    )
}

/// Counts the rest timer down in place. Enter adds time, `s` skips.
fn run_rest_countdown(session: &mut WorkoutSession, alert: &dyn RestAlert) -> Result<()> {
    let default_duration = session.rest_timer().duration_seconds();
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("Enter: +{REST_EXTENSION_SECONDS}s   s + Enter: skip");
    let mut out = stdout();
    loop {
        let now = Utc::now();
        while let Ok(line) = rx.try_recv() {
            match line.trim() {
                "s" | "q" | "skip" => {
                    session.rest_timer_mut().stop();
                    println!("\rRest skipped.        ");
                    return restore_default(session, default_duration);
                }
                _ => session.rest_timer_mut().extend(REST_EXTENSION_SECONDS, now)?,
            }
        }
        match session.rest_timer_mut().tick(now, alert) {
            TimerTick::Idle => break,
            TimerTick::Counting(left) => {
                write!(out, "\rRest {}        ", format_countdown(left))?;
                out.flush()?;
            }
            TimerTick::Expired => {
                write!(out, "\rRest complete!       ")?;
                out.flush()?;
            }
            TimerTick::Finished => {
                writeln!(out)?;
                break;
            }
        }
        thread::sleep(TICK_INTERVAL);
    }
    restore_default(session, default_duration)
}

// Extending restarts the timer with a longer duration; the preferred default stays.
fn restore_default(session: &mut WorkoutSession, duration: u32) -> Result<()> {
    session.rest_timer_mut().set_default_duration(duration)?;
    Ok(())
}

fn print_session(session: &WorkoutSession, header_color: Color, units: Units) {
    let Some(workout) = session.workout() else {
        return;
    };
    let name = if workout.name.is_empty() {
        "Workout"
    } else {
        workout.name.as_str()
    };
    let now = Utc::now();
    println!(
        "{name}  (started {}, {} min, {} set(s) done, volume {:.1} {units})",
        workout.started_at.with_timezone(&Local).format("%H:%M"),
        workout.elapsed_minutes(now),
        workout.completed_set_count(),
        workout.volume()
    );
    if !workout.notes.is_empty() {
        println!("Notes: {}", workout.notes);
    }
    if workout.exercises.is_empty() {
        println!("No exercises yet. Add one with 'add <exercise>'.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Set").fg(header_color),
            Cell::new(format!("Weight ({units})")).fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("RPE").fg(header_color),
            Cell::new("Done").fg(header_color),
            Cell::new("Last time").fg(header_color),
        ]);

    for (ex_index, exercise) in workout.exercises.iter().enumerate() {
        let label = match exercise.superset_group_id {
            Some(group) => format!("[S{group}] {}", exercise.exercise_name),
            None => exercise.exercise_name.clone(),
        };
        for (set_index, set) in exercise.sets.iter().enumerate() {
            let (position, name) = if set_index == 0 {
                ((ex_index + 1).to_string(), label.clone())
            } else {
                (String::new(), String::new())
            };
            let set_label = exercise
                .working_set_number(set_index)
                .map_or_else(|| "W".to_string(), |n| n.to_string());
            let done = if set.completed {
                Cell::new("✓").fg(Color::Green)
            } else {
                Cell::new("")
            };
            table.add_row(vec![
                Cell::new(position),
                Cell::new(name),
                Cell::new(set_label),
                Cell::new(format_weight(set.weight)),
                Cell::new(set.reps.map_or_else(|| "-".to_string(), |r| r.to_string())),
                Cell::new(set.rpe.map_or_else(|| "-".to_string(), |r| format!("{r}"))),
                done,
                Cell::new(
                    exercise
                        .ghost(set_index)
                        .map_or_else(String::new, |g| format_ghost(g.weight, g.reps)),
                )
                .fg(Color::DarkGrey),
            ]);
        }
    }
    println!("{table}");
}

fn print_workout_summary_table(workouts: &[WorkoutSummary], header_color: Color, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Date").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Duration (min)").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new(format!("Volume ({units})")).fg(header_color),
        ]);

    for summary in workouts {
        let workout = &summary.workout;
        table.add_row(vec![
            Cell::new(workout.id.to_string()),
            Cell::new(local_timestamp(workout.date)),
            Cell::new(workout.display_name()),
            Cell::new(
                workout
                    .duration_minutes
                    .map_or("-".to_string(), |v| v.to_string()),
            ),
            Cell::new(summary.exercise_count.to_string()),
            Cell::new(summary.set_count.to_string()),
            Cell::new(format!("{:.1}", summary.volume)),
        ]);
    }
    println!("{table}");
}

fn print_workout_summary_csv(workouts: &[WorkoutSummary], units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(&[
        "ID",
        "Date_UTC",
        "Workout",
        "Duration_min",
        "Exercises",
        "Sets",
        format!("Volume_{units}").as_str(),
        "Notes",
    ])?;
    for summary in workouts {
        let workout = &summary.workout;
        writer.write_record(&[
            workout.id.to_string(),
            workout.date.to_rfc3339(),
            workout.display_name().to_string(),
            workout
                .duration_minutes
                .map_or(String::new(), |v| v.to_string()),
            summary.exercise_count.to_string(),
            summary.set_count.to_string(),
            format!("{:.2}", summary.volume),
            workout.notes.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_workout_detail(detail: &WorkoutDetail, header_color: Color, units: Units) {
    let workout = &detail.workout;
    println!(
        "{} (ID: {}) on {}, {} min",
        workout.display_name(),
        workout.id,
        local_timestamp(workout.date),
        workout
            .duration_minutes
            .map_or("-".to_string(), |v| v.to_string())
    );
    if let Some(notes) = workout.notes.as_deref() {
        println!("Notes: {notes}");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Entry").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Set").fg(header_color),
            Cell::new("Set ID").fg(header_color),
            Cell::new(format!("Weight ({units})")).fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("RPE").fg(header_color),
            Cell::new("Notes").fg(header_color),
        ]);
    for exercise in &detail.exercises {
        let label = match exercise.superset_group_id {
            Some(group) => format!("[S{group}] {}", exercise.exercise_name),
            None => exercise.exercise_name.clone(),
        };
        let notes = exercise.notes.as_deref().unwrap_or("");
        if exercise.sets.is_empty() {
            table.add_row(vec![
                Cell::new(exercise.id),
                Cell::new(&label),
                Cell::new("-"),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
                Cell::new(notes),
            ]);
        }
        for (i, set) in exercise.sets.iter().enumerate() {
            let first = i == 0;
            let set_label = if set.is_warmup {
                "W".to_string()
            } else {
                set.set_number.to_string()
            };
            table.add_row(vec![
                Cell::new(if first { exercise.id.to_string() } else { String::new() }),
                Cell::new(if first { label.as_str() } else { "" }),
                Cell::new(set_label),
                Cell::new(set.id),
                Cell::new(format_weight(set.weight)),
                Cell::new(set.reps.map_or("-".to_string(), |r| r.to_string())),
                Cell::new(set.rpe.map_or("-".to_string(), |r| format!("{r}"))),
                Cell::new(if first { notes } else { "" }),
            ]);
        }
    }
    println!("{table}");
}

fn print_exercise_history_table(history: &[ExerciseHistoryEntry], header_color: Color, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new(format!("Best ({units})")).fg(header_color),
        ]);
    for entry in history {
        let sets: Vec<String> = entry
            .sets
            .iter()
            .map(|s| {
                let text = format_ghost(s.weight, s.reps);
                if s.is_warmup {
                    format!("{text} (W)")
                } else {
                    text
                }
            })
            .collect();
        let best = entry
            .sets
            .iter()
            .filter(|s| !s.is_warmup)
            .filter_map(|s| s.weight)
            .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |a| a.max(w))));
        table.add_row(vec![
            Cell::new(entry.date.with_timezone(&Local).format("%Y-%m-%d").to_string()),
            Cell::new(entry.workout_name.as_deref().unwrap_or("Workout")),
            Cell::new(sets.join(", ")),
            Cell::new(format_weight(best)),
        ]);
    }
    println!("{table}");
}

fn print_exercise_history_csv(history: &[ExerciseHistoryEntry], units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(&[
        "Workout_ID",
        "Date_UTC",
        "Workout",
        "Set",
        format!("Weight_{units}").as_str(),
        "Reps",
        "RPE",
        "Warmup",
    ])?;
    for entry in history {
        for set in &entry.sets {
            writer.write_record(&[
                entry.workout_id.to_string(),
                entry.date.to_rfc3339(),
                entry.workout_name.clone().unwrap_or_default(),
                set.set_number.to_string(),
                set.weight.map_or(String::new(), |w| format!("{w:.2}")),
                set.reps.map_or(String::new(), |r| r.to_string()),
                set.rpe.map_or(String::new(), |r| format!("{r}")),
                set.is_warmup.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn print_dashboard(stats: &DashboardStats, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic); // No headers needed for key-value

    let rows = [
        ("Total Workouts", stats.total_workouts.to_string()),
        ("This Week", stats.workouts_this_week.to_string()),
        ("This Month", stats.workouts_this_month.to_string()),
        ("Current Streak (days)", stats.current_streak.to_string()),
        ("Longest Streak (days)", stats.longest_streak.to_string()),
        (
            "Volume This Week",
            format!("{:.1} {units}", stats.volume_this_week),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(value),
        ]);
    }
    println!("{table}");
}

fn print_pr_table(records: &[PersonalRecord], header_color: Color, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new(format!("Max Weight ({units})")).fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("Date").fg(header_color),
            Cell::new(format!("Est. 1RM ({units})")).fg(header_color),
        ]);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.exercise_name),
            Cell::new(format!("{}", record.max_weight)),
            Cell::new(record.max_weight_reps.to_string()),
            Cell::new(record.max_weight_date.format("%Y-%m-%d").to_string()),
            Cell::new(format!("{}", record.estimated_1rm)).add_attribute(Attribute::Bold),
        ]);
    }
    println!("{table}");
}

fn print_pr_csv(records: &[PersonalRecord], units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(&[
        "Exercise",
        format!("Max_Weight_{units}").as_str(),
        "Reps",
        "Date",
        format!("Estimated_1RM_{units}").as_str(),
    ])?;
    for record in records {
        writer.write_record(&[
            record.exercise_name.clone(),
            format!("{:.2}", record.max_weight),
            record.max_weight_reps.to_string(),
            record.max_weight_date.format("%Y-%m-%d").to_string(),
            format!("{:.0}", record.estimated_1rm),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Prints training volume per period, with a bar scaled to the largest one.
fn print_volume_table(points: &[VolumePoint], period: VolumePeriod, units: Units) {
    const BAR_WIDTH: f64 = 30.0;
    let mut table = Table::new();
    let header_color = fittrack_lib::parse_color("Yellow") // Use a different color for volume
        .map(Color::from)
        .unwrap_or(Color::Yellow);
    let period_label = match period {
        VolumePeriod::Weekly => "Week of",
        VolumePeriod::Monthly => "Month",
    };

    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new(period_label).fg(header_color),
            Cell::new(format!("Volume ({units})")).fg(header_color),
            Cell::new("").fg(header_color),
        ]);

    let max = points.iter().map(|p| p.volume).fold(0.0_f64, f64::max);
    for point in points {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bar_len = if max > 0.0 {
            (point.volume / max * BAR_WIDTH).round() as usize
        } else {
            0
        };
        table.add_row(vec![
            Cell::new(&point.period_key),
            Cell::new(format!("{:.0}", point.volume)),
            Cell::new("█".repeat(bar_len)).fg(header_color),
        ]);
    }
    println!("{table}");
}

fn print_volume_csv(points: &[VolumePoint], period: VolumePeriod, units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(&[format!("Period_{period}"), format!("Volume_{units}")])?;
    for point in points {
        writer.write_record(&[point.period_key.clone(), format!("{:.2}", point.volume)])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_calendar(days: &BTreeMap<NaiveDate, Vec<WorkoutSummary>>, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").fg(header_color),
            Cell::new("Workouts").fg(header_color),
            Cell::new("Sets").fg(header_color),
        ]);
    for (date, workouts) in days {
        let names: Vec<String> = workouts
            .iter()
            .map(|w| format!("{} (#{})", w.workout.display_name(), w.workout.id))
            .collect();
        let sets: usize = workouts.iter().map(|w| w.set_count).sum();
        table.add_row(vec![
            Cell::new(date.format("%a %Y-%m-%d").to_string()),
            Cell::new(names.join(", ")),
            Cell::new(sets.to_string()),
        ]);
    }
    println!("{table}");
}

fn print_catalog_table(results: &[&ExerciseTemplate], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").fg(header_color),
            Cell::new("Muscle Group").fg(header_color),
            Cell::new("Equipment").fg(header_color),
        ]);
    for template in results {
        table.add_row(vec![
            Cell::new(template.name),
            Cell::new(template.muscle_group),
            Cell::new(template.equipment),
        ]);
    }
    println!("{table}");
}

fn print_template_table(templates: &[WorkoutTemplate], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Updated").fg(header_color),
        ]);
    for template in templates {
        // Superset members are joined with '+', the same way they are entered.
        let mut parts: Vec<String> = Vec::new();
        let mut previous_group = None;
        for exercise in &template.exercises {
            let joins = exercise.superset_group_id.is_some() && exercise.superset_group_id == previous_group;
            match parts.last_mut() {
                Some(last) if joins => {
                    last.push_str(" + ");
                    last.push_str(&exercise.exercise_name);
                }
                _ => parts.push(exercise.exercise_name.clone()),
            }
            previous_group = exercise.superset_group_id;
        }
        table.add_row(vec![
            Cell::new(&template.name),
            Cell::new(parts.join(", ")),
            Cell::new(local_timestamp(template.updated_at)),
        ]);
    }
    println!("{table}");
}

/// Prints exercise definitions in a formatted table.
fn print_exercise_definition_table(exercises: &[ExerciseDefinition], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Muscle Group").fg(header_color),
            Cell::new("Equipment").fg(header_color),
            Cell::new("Custom").fg(header_color),
        ]);

    for exercise in exercises {
        table.add_row(vec![
            Cell::new(exercise.id.to_string()),
            Cell::new(&exercise.name),
            Cell::new(exercise.muscle_group.as_deref().unwrap_or("-")),
            Cell::new(exercise.equipment.as_deref().unwrap_or("-")),
            Cell::new(if exercise.is_custom() { "yes" } else { "" }),
        ]);
    }
    println!("{table}");
}

fn print_exercise_definition_csv(exercises: &[ExerciseDefinition]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(&["ID", "Name", "Muscle_Group", "Equipment", "Custom", "Notes"])?;
    for exercise in exercises {
        writer.write_record(&[
            exercise.id.to_string(),
            exercise.name.clone(),
            exercise.muscle_group.clone().unwrap_or_default(),
            exercise.equipment.clone().unwrap_or_default(),
            exercise.is_custom().to_string(),
            exercise.notes.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_preferences(prefs: &Preferences) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![
        Cell::new("Weight Unit").add_attribute(Attribute::Bold),
        Cell::new(prefs.weight_unit.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Default Rest").add_attribute(Attribute::Bold),
        Cell::new(format_countdown(prefs.default_rest_seconds)),
    ]);
    table.add_row(vec![
        Cell::new("Theme").add_attribute(Attribute::Bold),
        Cell::new(&prefs.theme),
    ]);
    println!("{table}");
}

fn local_timestamp(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
