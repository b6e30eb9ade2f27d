//src/cli.rs
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use fittrack_lib::{Units, VolumePeriod, HISTORY_LIMIT};

#[derive(Parser, Debug)]
#[command(author, version, about = "Log workouts, run rest timers and track progress", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Print tables as CSV instead
    #[arg(long, global = true)]
    pub export_csv: bool,
}

/// A set field given on the command line: a value, or `none` to clear it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<T> {
    Clear,
    Set(T),
}

impl<T> FieldValue<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Clear => None,
            Self::Set(v) => Some(v),
        }
    }
}

fn parse_field<T: std::str::FromStr>(s: &str, what: &str) -> Result<FieldValue<T>, String> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("none") || trimmed == "-" {
        return Ok(FieldValue::Clear);
    }
    trimmed
        .parse::<T>()
        .map(FieldValue::Set)
        .map_err(|_| format!("Invalid {what}: '{s}'. Use a number or 'none'."))
}

pub fn parse_weight(s: &str) -> Result<FieldValue<f64>, String> {
    parse_field(s, "weight")
}

pub fn parse_reps(s: &str) -> Result<FieldValue<u32>, String> {
    parse_field(s, "reps")
}

pub fn parse_rpe(s: &str) -> Result<FieldValue<f64>, String> {
    parse_field(s, "RPE")
}

pub fn parse_duration(s: &str) -> Result<FieldValue<i64>, String> {
    parse_field(s, "duration")
}

/// Accepts RFC 3339 or a plain `YYYY-MM-DD`, which means local midnight.
pub fn parse_workout_date(s: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{s}': use YYYY-MM-DD or RFC 3339"))?;
    Local
        .from_local_datetime(&date.and_time(NaiveTime::default()))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("Invalid local date '{s}'"))
}

/// Parses a 1-based position as shown by `show` into a 0-based index.
pub fn parse_position(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Invalid position '{s}': expected a number starting at 1")),
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Kg,
    Lbs,
}

impl From<UnitsCli> for Units {
    fn from(value: UnitsCli) -> Self {
        match value {
            UnitsCli::Kg => Self::Kg,
            UnitsCli::Lbs => Self::Lbs,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodCli {
    Weekly,
    Monthly,
}

impl From<PeriodCli> for VolumePeriod {
    fn from(value: PeriodCli) -> Self {
        match value {
            PeriodCli::Weekly => Self::Weekly,
            PeriodCli::Monthly => Self::Monthly,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new workout
    Start {
        /// Optional workout name (e.g. "Push Day")
        name: Option<String>,
        /// Pre-fill the workout from a saved template
        #[arg(short, long, conflicts_with = "name")]
        template: Option<String>,
        /// Replace an unsaved workout that already has exercises
        #[arg(long)]
        force: bool,
    },
    /// Add an exercise to the current workout (created if unknown)
    Add {
        /// Exercise name, e.g. "Bench Press"
        exercise: String,
        /// Muscle group used if the exercise has to be created
        #[arg(short, long)]
        muscle: Option<String>,
    },
    /// Add, edit or remove sets in the current workout
    Set {
        #[command(subcommand)]
        action: SetCommands,
    },
    /// Mark a set as done (or not done). Starts the rest timer when appropriate
    Done {
        /// Exercise position as shown by 'show'
        #[arg(value_parser = parse_position)]
        exercise: usize,
        /// Set position within the exercise
        #[arg(value_parser = parse_position)]
        set: usize,
        /// Don't run the rest countdown
        #[arg(long)]
        no_wait: bool,
    },
    /// Put consecutive exercises into a superset
    Group {
        /// Exercise positions, e.g. `2 3`
        #[arg(value_parser = parse_position, num_args = 2.., required = true)]
        exercises: Vec<usize>,
    },
    /// Dissolve the superset an exercise belongs to
    Ungroup {
        #[arg(value_parser = parse_position)]
        exercise: usize,
    },
    /// Move an exercise to another position
    Move {
        #[arg(value_parser = parse_position)]
        from: usize,
        #[arg(value_parser = parse_position)]
        to: usize,
    },
    /// Remove an exercise from the current workout
    Remove {
        #[arg(value_parser = parse_position)]
        exercise: usize,
    },
    /// Set notes on the workout, or on one exercise with --exercise
    Note {
        text: String,
        #[arg(short, long, value_parser = parse_position)]
        exercise: Option<usize>,
    },
    /// Rename the current workout
    Rename { name: String },
    /// Show the current workout
    Show,
    /// Run a rest countdown. Press Enter to add 15s, type 's' + Enter to skip
    Rest {
        /// Seconds to rest (defaults to your rest preference)
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        seconds: Option<u32>,
    },
    /// Save the current workout
    Finish,
    /// Throw away the current workout without saving
    Discard,
    /// Save the current workout's exercises as a template
    SaveTemplate { name: String },
    /// Manage workout templates
    Template {
        #[command(subcommand)]
        action: TemplateCommands,
    },
    /// List saved workouts
    History {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: u32,
    },
    /// Show one saved workout in detail
    ShowWorkout { id: i64 },
    /// Delete a saved workout
    DeleteWorkout { id: i64 },
    /// Edit a saved workout. Pass an empty string to clear name or notes
    EditWorkout {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// YYYY-MM-DD (local midnight) or an RFC 3339 timestamp
        #[arg(long, value_parser = parse_workout_date)]
        date: Option<DateTime<Utc>>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Minutes, or 'none' to clear
        #[arg(short, long, value_parser = parse_duration)]
        duration: Option<FieldValue<i64>>,
    },
    /// Change a set of a saved workout (IDs as shown by 'show-workout')
    EditSet {
        workout: i64,
        set: i64,
        #[arg(short, long, value_parser = parse_weight)]
        weight: Option<FieldValue<f64>>,
        #[arg(short, long, value_parser = parse_reps)]
        reps: Option<FieldValue<u32>>,
        #[arg(long, value_parser = parse_rpe)]
        rpe: Option<FieldValue<f64>>,
        #[arg(long)]
        warmup: Option<bool>,
    },
    /// Delete a set from a saved workout
    DeleteSet { workout: i64, set: i64 },
    /// Remove an exercise and its sets from a saved workout
    DeleteWorkoutExercise {
        workout: i64,
        /// Entry ID as shown by 'show-workout'
        entry: i64,
    },
    /// Show past sets for one exercise
    ExerciseHistory {
        /// Exercise name or ID
        exercise: String,
        #[arg(short = 'n', long, default_value_t = HISTORY_LIMIT)]
        limit: u32,
    },
    /// Totals, this week's activity and streaks
    Stats,
    /// Personal records by estimated one-rep max
    Prs,
    /// Training volume per week or month
    Volume {
        #[arg(short, long, value_enum, default_value_t = PeriodCli::Weekly)]
        period: PeriodCli,
    },
    /// Workouts in one month, by day
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Search the built-in exercise catalog
    Search { query: String },
    /// Define a custom exercise
    CreateExercise {
        name: String,
        #[arg(short, long)]
        muscle: Option<String>,
        #[arg(short, long)]
        equipment: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Edit a custom exercise. Pass an empty string to clear a field
    EditExercise {
        /// Exercise name or ID
        identifier: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        muscle: Option<String>,
        #[arg(short, long)]
        equipment: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete a custom exercise
    DeleteExercise { identifier: String },
    /// List exercises available to you
    ListExercises {
        #[arg(short, long)]
        muscle: Option<String>,
        /// Only your own exercises
        #[arg(long)]
        custom: bool,
    },
    /// Show or change preferences
    Prefs {
        #[arg(long, value_enum)]
        unit: Option<UnitsCli>,
        /// Default rest time in seconds
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        rest: Option<u32>,
        #[arg(long)]
        theme: Option<String>,
    },
    /// Set the table header colour in the config file
    SetHeaderColor { color: String },
    /// Ring the terminal bell when rest is over (`true` or `false`)
    SetRestAlert {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum SetCommands {
    /// Add a set, copying weight and reps from the previous one
    Add {
        #[arg(value_parser = parse_position)]
        exercise: usize,
    },
    /// Change weight, reps, RPE or warmup flag of a set
    Update {
        #[arg(value_parser = parse_position)]
        exercise: usize,
        #[arg(value_parser = parse_position)]
        set: usize,
        #[arg(short, long, value_parser = parse_weight)]
        weight: Option<FieldValue<f64>>,
        #[arg(short, long, value_parser = parse_reps)]
        reps: Option<FieldValue<u32>>,
        #[arg(long, value_parser = parse_rpe)]
        rpe: Option<FieldValue<f64>>,
        #[arg(long)]
        warmup: Option<bool>,
    },
    /// Remove a set
    Remove {
        #[arg(value_parser = parse_position)]
        exercise: usize,
        #[arg(value_parser = parse_position)]
        set: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Create a template. Join exercises with '+' to make a superset
    Create {
        name: String,
        #[arg(required = true)]
        exercises: Vec<String>,
    },
    List,
    Delete { name: String },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_is_one_based() {
        assert_eq!(parse_position("1"), Ok(0));
        assert_eq!(parse_position(" 3 "), Ok(2));
        assert!(parse_position("0").is_err());
        assert!(parse_position("-1").is_err());
        assert!(parse_position("abc").is_err());
    }

    #[test]
    fn test_parse_weight_accepts_none() {
        assert_eq!(parse_weight("none"), Ok(FieldValue::Clear));
        assert_eq!(parse_weight("NONE"), Ok(FieldValue::Clear));
        assert_eq!(parse_weight("-"), Ok(FieldValue::Clear));
        assert_eq!(parse_weight("62.5"), Ok(FieldValue::Set(62.5)));
        assert_eq!(parse_weight("0"), Ok(FieldValue::Set(0.0)));
    }

    #[test]
    fn test_parse_reps_rejects_garbage() {
        let err = parse_reps("ten").unwrap_err();
        assert!(err.contains("Invalid reps"));
        assert!(parse_reps("-3").is_err());
        assert_eq!(parse_reps("8"), Ok(FieldValue::Set(8)));
    }

    #[test]
    fn test_parse_workout_date() {
        let utc = parse_workout_date("2024-06-03T18:00:00Z").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap());
        let local = parse_workout_date("2024-06-03").unwrap();
        assert_eq!(local.with_timezone(&Local).date_naive(), NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert!(parse_workout_date("03/06/2024").is_err());
        assert_eq!(parse_duration("none"), Ok(FieldValue::Clear));
        assert_eq!(parse_duration("45"), Ok(FieldValue::Set(45)));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli_command().debug_assert();
    }

    #[test]
    fn test_group_needs_two_positions() {
        assert!(Cli::try_parse_from(["fittrack", "group", "2"]).is_err());
        let cli = Cli::try_parse_from(["fittrack", "group", "2", "3"]).unwrap();
        match cli.command {
            Commands::Group { exercises } => assert_eq!(exercises, vec![1, 2]),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
