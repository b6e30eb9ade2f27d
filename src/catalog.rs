//src/catalog.rs

use serde::Serialize;

/// Maximum number of results returned by `search`.
pub const SEARCH_LIMIT: usize = 8;
const MIN_QUERY_LEN: usize = 2;
const COMMON_BOOST: u32 = 5;
const COMMON_LIFTS: [&str; 5] = [
    "bench press",
    "squat",
    "deadlift",
    "overhead press",
    "barbell row",
];

/// Built-in exercise, seeded into storage as a shared exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExerciseTemplate {
    pub name: &'static str,
    pub muscle_group: &'static str,
    pub equipment: &'static str,
    pub aliases: &'static [&'static str],
}

const fn t(
    name: &'static str,
    muscle_group: &'static str,
    equipment: &'static str,
    aliases: &'static [&'static str],
) -> ExerciseTemplate {
    ExerciseTemplate {
        name,
        muscle_group,
        equipment,
        aliases,
    }
}

/// Scores a template against an already lower-cased query. Zero means no match.
fn score(template: &ExerciseTemplate, query: &str) -> u32 {
    let name = template.name.to_lowercase();

    let base = if name == query {
        100
    } else if name.starts_with(query) {
        80
    } else if name.split(' ').any(|word| word.starts_with(query)) {
        60
    } else if name.contains(query) {
        40
    } else {
        template
            .aliases
            .iter()
            .map(|alias| {
                let alias = alias.to_lowercase();
                if alias == query {
                    90
                } else if alias.starts_with(query) {
                    70
                } else if alias.contains(query) {
                    35
                } else {
                    0
                }
            })
            .max()
            .unwrap_or(0)
    };

    if base > 0 && COMMON_LIFTS.iter().any(|lift| name.contains(lift)) {
        base + COMMON_BOOST
    } else {
        base
    }
}

/// Case-insensitive scored search over the catalog. Best matches first;
/// equal scores keep catalog order.
#[must_use]
pub fn search(query: &str) -> Vec<&'static ExerciseTemplate> {
    let query = query.trim().to_lowercase();
    if query.chars().count() < MIN_QUERY_LEN {
        return Vec::new();
    }

    let mut scored: Vec<(u32, &'static ExerciseTemplate)> = EXERCISE_TEMPLATES
        .iter()
        .map(|template| (score(template, &query), template))
        .filter(|(score, _)| *score > 0)
        .collect();
    // sort_by is stable, so ties stay in catalog order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(SEARCH_LIMIT)
        .map(|(_, template)| template)
        .collect()
}

fn name_or_alias(template: &ExerciseTemplate, pred: impl Fn(&str) -> bool) -> bool {
    pred(&template.name.to_lowercase()) || template.aliases.iter().any(|a| pred(&a.to_lowercase()))
}

/// Exact name or alias match first, then the first name/alias prefix match.
#[must_use]
pub fn suggestion(name: &str) -> Option<&'static ExerciseTemplate> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    EXERCISE_TEMPLATES
        .iter()
        .find(|template| name_or_alias(template, |candidate| candidate == wanted))
        .or_else(|| {
            EXERCISE_TEMPLATES.iter().find(|template| {
                name_or_alias(template, |candidate| candidate.starts_with(wanted.as_str()))
            })
        })
}

/// Distinct muscle groups in catalog order.
#[must_use]
pub fn muscle_groups() -> Vec<&'static str> {
    let mut groups: Vec<&'static str> = Vec::new();
    for template in EXERCISE_TEMPLATES {
        if !groups.contains(&template.muscle_group) {
            groups.push(template.muscle_group);
        }
    }
    groups
}

pub static EXERCISE_TEMPLATES: &[ExerciseTemplate] = &[
    // Chest
    t("Bench Press", "chest", "barbell", &["flat bench", "barbell bench"]),
    t("Incline Bench Press", "chest", "barbell", &["incline barbell press"]),
    t("Decline Bench Press", "chest", "barbell", &[]),
    t("Dumbbell Bench Press", "chest", "dumbbell", &["db bench press", "dumbbell press"]),
    t("Incline Dumbbell Press", "chest", "dumbbell", &["incline db press"]),
    t("Decline Dumbbell Press", "chest", "dumbbell", &[]),
    t("Dumbbell Fly", "chest", "dumbbell", &["chest fly", "db fly", "flyes"]),
    t("Incline Dumbbell Fly", "chest", "dumbbell", &[]),
    t("Cable Fly", "chest", "cable", &["cable crossover", "cable chest fly"]),
    t("Low Cable Fly", "chest", "cable", &["low to high cable fly"]),
    t("High Cable Fly", "chest", "cable", &["high to low cable fly"]),
    t("Incline Cable Fly", "chest", "cable", &["inclined cable fly", "incline cable flys"]),
    t("Decline Cable Fly", "chest", "cable", &["decline cable flys"]),
    t("Single Arm Cable Fly", "chest", "cable", &["one arm cable fly"]),
    t("Chest Press Machine", "chest", "machine", &["machine chest press"]),
    t("Pec Deck", "chest", "machine", &["pec deck fly", "butterfly"]),
    t("Push Up", "chest", "bodyweight", &["pushup", "press up"]),
    t("Diamond Push Up", "chest", "bodyweight", &["close grip push up"]),
    t("Wide Push Up", "chest", "bodyweight", &[]),
    t("Dips", "chest", "bodyweight", &["chest dips", "parallel bar dips"]),
    t("Landmine Press", "chest", "barbell", &[]),
    t("Svend Press", "chest", "dumbbell", &[]),
    t("Floor Press", "chest", "barbell", &["barbell floor press"]),
    t("Dumbbell Floor Press", "chest", "dumbbell", &["db floor press"]),
    t("Smith Machine Bench Press", "chest", "machine", &["smith bench"]),
    t("Smith Machine Incline Press", "chest", "machine", &["smith incline press"]),
    t("Machine Fly", "chest", "machine", &["fly machine"]),

    // Back
    t("Deadlift", "back", "barbell", &["conventional deadlift"]),
    t("Sumo Deadlift", "back", "barbell", &[]),
    t("Romanian Deadlift", "hamstrings", "barbell", &["rdl", "stiff leg deadlift"]),
    t("Dumbbell Romanian Deadlift", "hamstrings", "dumbbell", &["db rdl"]),
    t("Barbell Row", "back", "barbell", &["bent over row", "bb row", "barbell bent over row"]),
    t("Pendlay Row", "back", "barbell", &[]),
    t("Dumbbell Row", "back", "dumbbell", &["db row", "one arm row", "single arm row"]),
    t("Seated Cable Row", "back", "cable", &["cable row", "low row"]),
    t("T-Bar Row", "back", "barbell", &["t bar row"]),
    t("Lat Pulldown", "lats", "cable", &["wide grip pulldown", "lat pull down"]),
    t("Close Grip Lat Pulldown", "lats", "cable", &[]),
    t("Pull Up", "lats", "bodyweight", &["pullup", "chin up", "chinup"]),
    t("Wide Grip Pull Up", "lats", "bodyweight", &[]),
    t("Neutral Grip Pull Up", "lats", "bodyweight", &[]),
    t("Assisted Pull Up", "lats", "machine", &[]),
    t("Machine Row", "back", "machine", &["chest supported row"]),
    t("Face Pull", "shoulders", "cable", &["rear delt pull"]),
    t("Straight Arm Pulldown", "lats", "cable", &["straight arm pushdown"]),
    t("Hyperextension", "lower back", "bodyweight", &["back extension", "45 degree back extension"]),
    t("Good Morning", "lower back", "barbell", &[]),
    t("Rack Pull", "back", "barbell", &[]),
    t("Shrug", "traps", "barbell", &["barbell shrug", "trap shrug"]),
    t("Dumbbell Shrug", "traps", "dumbbell", &["db shrug"]),
    t("Meadows Row", "lats", "barbell", &["landmine row"]),
    t("Chest Supported Row", "back", "dumbbell", &["incline db row", "seal row"]),
    t("Single Arm Lat Pulldown", "lats", "cable", &["one arm pulldown"]),
    t("Reverse Grip Lat Pulldown", "lats", "cable", &["underhand pulldown"]),
    t("Behind Neck Lat Pulldown", "lats", "cable", &[]),
    t("Cable Shrug", "traps", "cable", &[]),
    t("Smith Machine Shrug", "traps", "machine", &[]),
    t("Trap Bar Deadlift", "back", "barbell", &["hex bar deadlift"]),
    t("Deficit Deadlift", "back", "barbell", &[]),
    t("Block Pull", "back", "barbell", &[]),
    t("Snatch Grip Deadlift", "back", "barbell", &[]),

    // Shoulders
    t("Overhead Press", "shoulders", "barbell", &["ohp", "military press", "shoulder press", "barbell press"]),
    t("Seated Overhead Press", "shoulders", "barbell", &[]),
    t("Dumbbell Shoulder Press", "shoulders", "dumbbell", &["db shoulder press", "seated dumbbell press"]),
    t("Arnold Press", "shoulders", "dumbbell", &[]),
    t("Push Press", "shoulders", "barbell", &[]),
    t("Lateral Raise", "shoulders", "dumbbell", &["side raise", "side lateral raise", "db lateral raise"]),
    t("Cable Lateral Raise", "shoulders", "cable", &[]),
    t("Front Raise", "shoulders", "dumbbell", &["front delt raise"]),
    t("Rear Delt Fly", "shoulders", "dumbbell", &["reverse fly", "bent over lateral raise", "rear delt raise"]),
    t("Cable Rear Delt Fly", "shoulders", "cable", &[]),
    t("Upright Row", "shoulders", "barbell", &["barbell upright row"]),
    t("Dumbbell Upright Row", "shoulders", "dumbbell", &[]),
    t("Machine Shoulder Press", "shoulders", "machine", &[]),
    t("Reverse Pec Deck", "shoulders", "machine", &["rear delt machine"]),
    t("Handstand Push Up", "shoulders", "bodyweight", &["hspu"]),
    t("Pike Push Up", "shoulders", "bodyweight", &[]),
    t("Lu Raise", "shoulders", "dumbbell", &[]),
    t("Y Raise", "shoulders", "dumbbell", &[]),
    t("Incline Lateral Raise", "shoulders", "dumbbell", &["leaning lateral raise"]),
    t("Machine Lateral Raise", "shoulders", "machine", &[]),
    t("Landmine Lateral Raise", "shoulders", "barbell", &[]),
    t("Smith Machine Overhead Press", "shoulders", "machine", &["smith press"]),
    t("Cable Front Raise", "shoulders", "cable", &[]),
    t("Single Arm Dumbbell Press", "shoulders", "dumbbell", &["one arm shoulder press"]),
    t("Incline Rear Delt Fly", "shoulders", "dumbbell", &["prone rear delt fly"]),

    // Biceps
    t("Barbell Curl", "biceps", "barbell", &["bb curl", "standing barbell curl"]),
    t("EZ Bar Curl", "biceps", "barbell", &["ez curl", "easy bar curl"]),
    t("Dumbbell Curl", "biceps", "dumbbell", &["db curl", "bicep curl", "standing curl"]),
    t("Hammer Curl", "biceps", "dumbbell", &["db hammer curl"]),
    t("Incline Dumbbell Curl", "biceps", "dumbbell", &["incline curl"]),
    t("Preacher Curl", "biceps", "barbell", &["scott curl"]),
    t("Dumbbell Preacher Curl", "biceps", "dumbbell", &[]),
    t("Concentration Curl", "biceps", "dumbbell", &[]),
    t("Cable Curl", "biceps", "cable", &["cable bicep curl"]),
    t("Cable Hammer Curl", "biceps", "cable", &["rope hammer curl"]),
    t("Spider Curl", "biceps", "dumbbell", &[]),
    t("Drag Curl", "biceps", "barbell", &[]),
    t("Reverse Curl", "biceps", "barbell", &["reverse barbell curl"]),
    t("Zottman Curl", "biceps", "dumbbell", &[]),
    t("Machine Curl", "biceps", "machine", &["bicep machine"]),
    t("21s", "biceps", "barbell", &["21 curls"]),
    t("Cross Body Hammer Curl", "biceps", "dumbbell", &["crossbody curl"]),
    t("Waiter Curl", "biceps", "dumbbell", &[]),
    t("Bayesian Curl", "biceps", "cable", &["behind body curl"]),
    t("Cable EZ Bar Curl", "biceps", "cable", &[]),
    t("Prone Incline Curl", "biceps", "dumbbell", &["spider curl dumbbell"]),
    t("Alternating Dumbbell Curl", "biceps", "dumbbell", &["alternating curl"]),

    // Triceps
    t("Close Grip Bench Press", "triceps", "barbell", &["cgbp", "close grip press"]),
    t("Skull Crusher", "triceps", "barbell", &["lying tricep extension", "french press", "skullcrusher"]),
    t("Dumbbell Skull Crusher", "triceps", "dumbbell", &[]),
    t("Tricep Pushdown", "triceps", "cable", &["cable pushdown", "tricep pressdown", "pushdown"]),
    t("Rope Pushdown", "triceps", "cable", &["tricep rope pushdown", "rope tricep extension"]),
    t("Overhead Tricep Extension", "triceps", "dumbbell", &["tricep extension", "french press dumbbell"]),
    t("Cable Overhead Extension", "triceps", "cable", &[]),
    t("Tricep Kickback", "triceps", "dumbbell", &["kickback", "db kickback"]),
    t("Dip", "triceps", "bodyweight", &["tricep dip", "bench dip"]),
    t("JM Press", "triceps", "barbell", &[]),
    t("Tate Press", "triceps", "dumbbell", &[]),
    t("Machine Tricep Extension", "triceps", "machine", &[]),
    t("Single Arm Pushdown", "triceps", "cable", &["one arm pushdown"]),
    t("Straight Bar Pushdown", "triceps", "cable", &["bar pushdown"]),
    t("V Bar Pushdown", "triceps", "cable", &["v-bar pushdown"]),
    t("EZ Bar Skull Crusher", "triceps", "barbell", &[]),
    t("Seated Tricep Extension", "triceps", "dumbbell", &[]),
    t("Bench Dip", "triceps", "bodyweight", &["chair dip"]),

    // Legs - Quadriceps
    t("Squat", "quadriceps", "barbell", &["back squat", "barbell squat", "bb squat"]),
    t("Front Squat", "quadriceps", "barbell", &[]),
    t("Goblet Squat", "quadriceps", "dumbbell", &["db goblet squat"]),
    t("Hack Squat", "quadriceps", "machine", &[]),
    t("Leg Press", "quadriceps", "machine", &["45 degree leg press"]),
    t("Leg Extension", "quadriceps", "machine", &["quad extension"]),
    t("Bulgarian Split Squat", "quadriceps", "dumbbell", &["bss", "rear foot elevated split squat"]),
    t("Lunge", "quadriceps", "bodyweight", &["walking lunge", "forward lunge"]),
    t("Dumbbell Lunge", "quadriceps", "dumbbell", &["db lunge"]),
    t("Barbell Lunge", "quadriceps", "barbell", &[]),
    t("Reverse Lunge", "quadriceps", "dumbbell", &[]),
    t("Step Up", "quadriceps", "dumbbell", &["box step up"]),
    t("Sissy Squat", "quadriceps", "bodyweight", &[]),
    t("Wall Sit", "quadriceps", "bodyweight", &[]),
    t("Box Squat", "quadriceps", "barbell", &[]),
    t("Pause Squat", "quadriceps", "barbell", &[]),
    t("Safety Bar Squat", "quadriceps", "barbell", &["ssb squat"]),
    t("Belt Squat", "quadriceps", "machine", &[]),
    t("Pendulum Squat", "quadriceps", "machine", &[]),
    t("V Squat", "quadriceps", "machine", &[]),
    t("Smith Machine Squat", "quadriceps", "machine", &["smith squat"]),
    t("Sumo Squat", "quadriceps", "dumbbell", &["wide stance squat", "plie squat"]),
    t("Landmine Squat", "quadriceps", "barbell", &[]),
    t("Single Leg Leg Press", "quadriceps", "machine", &["one leg press"]),
    t("Split Squat", "quadriceps", "bodyweight", &[]),
    t("Dumbbell Split Squat", "quadriceps", "dumbbell", &[]),
    t("Cyclist Squat", "quadriceps", "dumbbell", &["heel elevated squat"]),
    t("Zercher Squat", "quadriceps", "barbell", &[]),

    // Legs - Hamstrings
    t("Leg Curl", "hamstrings", "machine", &["lying leg curl", "hamstring curl"]),
    t("Seated Leg Curl", "hamstrings", "machine", &[]),
    t("Nordic Curl", "hamstrings", "bodyweight", &["nordic hamstring curl"]),
    t("Glute Ham Raise", "hamstrings", "machine", &["ghr"]),
    t("Kettlebell Swing", "hamstrings", "kettlebell", &["kb swing"]),
    t("Single Leg Romanian Deadlift", "hamstrings", "dumbbell", &["single leg rdl", "one leg rdl"]),
    t("Standing Leg Curl", "hamstrings", "machine", &[]),
    t("Cable Leg Curl", "hamstrings", "cable", &[]),
    t("Sumo Romanian Deadlift", "hamstrings", "barbell", &["sumo rdl"]),
    t("Dumbbell Swing", "hamstrings", "dumbbell", &["db swing"]),

    // Legs - Glutes
    t("Hip Thrust", "glutes", "barbell", &["barbell hip thrust", "glute bridge"]),
    t("Dumbbell Hip Thrust", "glutes", "dumbbell", &[]),
    t("Cable Pull Through", "glutes", "cable", &["pull through"]),
    t("Glute Kickback", "glutes", "cable", &["cable kickback", "donkey kick"]),
    t("Hip Abduction", "glutes", "machine", &["abductor machine"]),
    t("Hip Adduction", "glutes", "machine", &["adductor machine"]),
    t("Frog Pump", "glutes", "bodyweight", &[]),
    t("Single Leg Glute Bridge", "glutes", "bodyweight", &[]),
    t("Machine Hip Thrust", "glutes", "machine", &[]),
    t("Fire Hydrant", "glutes", "bodyweight", &[]),
    t("Clamshell", "glutes", "bodyweight", &["clam shell"]),
    t("Banded Glute Bridge", "glutes", "other", &["resistance band glute bridge"]),
    t("Cable Abduction", "glutes", "cable", &[]),
    t("Reverse Hyperextension", "glutes", "machine", &["reverse hyper"]),

    // Legs - Calves
    t("Standing Calf Raise", "calves", "machine", &["calf raise", "machine calf raise"]),
    t("Seated Calf Raise", "calves", "machine", &[]),
    t("Donkey Calf Raise", "calves", "machine", &[]),
    t("Smith Machine Calf Raise", "calves", "machine", &[]),
    t("Dumbbell Calf Raise", "calves", "dumbbell", &["db calf raise"]),
    t("Single Leg Calf Raise", "calves", "bodyweight", &[]),
    t("Leg Press Calf Raise", "calves", "machine", &["calf raise on leg press"]),
    t("Barbell Calf Raise", "calves", "barbell", &[]),

    // Core / Abs
    t("Crunch", "abs", "bodyweight", &["ab crunch", "abdominal crunch"]),
    t("Cable Crunch", "abs", "cable", &["kneeling cable crunch"]),
    t("Sit Up", "abs", "bodyweight", &["situp"]),
    t("Leg Raise", "abs", "bodyweight", &["lying leg raise"]),
    t("Hanging Leg Raise", "abs", "bodyweight", &["hanging knee raise"]),
    t("Captain Chair Leg Raise", "abs", "bodyweight", &[]),
    t("Plank", "core", "bodyweight", &["front plank"]),
    t("Side Plank", "obliques", "bodyweight", &[]),
    t("Russian Twist", "obliques", "bodyweight", &["seated twist"]),
    t("Bicycle Crunch", "obliques", "bodyweight", &[]),
    t("Mountain Climber", "core", "bodyweight", &[]),
    t("Dead Bug", "core", "bodyweight", &[]),
    t("Bird Dog", "core", "bodyweight", &[]),
    t("Ab Wheel Rollout", "abs", "other", &["ab roller", "wheel rollout"]),
    t("Pallof Press", "obliques", "cable", &["anti rotation press"]),
    t("Wood Chop", "obliques", "cable", &["cable wood chop"]),
    t("Reverse Crunch", "abs", "bodyweight", &[]),
    t("Toe Touch", "abs", "bodyweight", &["v up"]),
    t("Flutter Kick", "abs", "bodyweight", &[]),
    t("Hollow Body Hold", "abs", "bodyweight", &[]),
    t("Dragon Flag", "abs", "bodyweight", &[]),
    t("L Sit", "abs", "bodyweight", &[]),
    t("Decline Sit Up", "abs", "bodyweight", &[]),
    t("Machine Crunch", "abs", "machine", &["ab machine"]),

    // Full Body / Compound
    t("Clean", "full body", "barbell", &["power clean"]),
    t("Clean and Jerk", "full body", "barbell", &[]),
    t("Snatch", "full body", "barbell", &["power snatch"]),
    t("Thruster", "full body", "barbell", &["squat to press"]),
    t("Dumbbell Thruster", "full body", "dumbbell", &[]),
    t("Burpee", "full body", "bodyweight", &[]),
    t("Turkish Get Up", "full body", "kettlebell", &["tgu"]),
    t("Farmer Walk", "full body", "dumbbell", &["farmer carry", "farmers walk"]),
    t("Sled Push", "full body", "other", &[]),
    t("Sled Pull", "full body", "other", &[]),
    t("Battle Rope", "full body", "other", &["battle ropes"]),
    t("Box Jump", "full body", "bodyweight", &[]),
    t("Jump Squat", "full body", "bodyweight", &[]),

    // Forearms
    t("Wrist Curl", "forearms", "barbell", &["forearm curl"]),
    t("Reverse Wrist Curl", "forearms", "barbell", &[]),
    t("Farmer Hold", "forearms", "dumbbell", &["static hold"]),
    t("Plate Pinch", "forearms", "other", &[]),
    t("Dead Hang", "forearms", "bodyweight", &[]),
    t("Gripper", "forearms", "other", &["hand gripper", "grip trainer"]),
    t("Wrist Roller", "forearms", "other", &[]),
    t("Behind Back Wrist Curl", "forearms", "barbell", &[]),

    // Cardio
    t("Treadmill", "cardio", "machine", &["treadmill run", "treadmill walk"]),
    t("Running", "cardio", "bodyweight", &["run", "jogging", "jog"]),
    t("Walking", "cardio", "bodyweight", &["walk", "brisk walk"]),
    t("Incline Treadmill Walk", "cardio", "machine", &["incline walking", "12-3-30"]),
    t("Stair Climber", "cardio", "machine", &["stairmaster", "stair stepper"]),
    t("Elliptical", "cardio", "machine", &["cross trainer"]),
    t("Rowing Machine", "cardio", "machine", &["row machine", "erg", "ergometer"]),
    t("Assault Bike", "cardio", "machine", &["air bike", "airdyne", "echo bike"]),
    t("Stationary Bike", "cardio", "machine", &["bike", "cycling", "spin bike"]),
    t("Jump Rope", "cardio", "other", &["skipping", "skip rope"]),
    t("Swimming", "cardio", "other", &["swim", "laps"]),
    t("Cycling", "cardio", "other", &["biking", "outdoor bike"]),
    t("HIIT", "cardio", "bodyweight", &["high intensity interval training"]),
    t("Sprints", "cardio", "bodyweight", &["sprint intervals"]),
    t("Jumping Jacks", "cardio", "bodyweight", &["star jumps"]),
    t("High Knees", "cardio", "bodyweight", &[]),
    t("Butt Kicks", "cardio", "bodyweight", &[]),
    t("Ski Erg", "cardio", "machine", &["ski machine"]),
    t("Prowler Push", "cardio", "other", &["sled push cardio"]),
    t("Jacob's Ladder", "cardio", "machine", &[]),
];
