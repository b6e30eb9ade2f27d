use fittrack_lib::catalog::{muscle_groups, search, suggestion, EXERCISE_TEMPLATES, SEARCH_LIMIT};

#[test]
fn test_short_queries_return_nothing() {
    assert!(search("").is_empty());
    assert!(search("b").is_empty());
    assert!(search("  b  ").is_empty());
}

#[test]
fn test_exact_name_ranks_first() {
    let results = search("bench press");
    assert_eq!(results[0].name, "Bench Press");
    assert_eq!(search("BENCH PRESS")[0].name, "Bench Press");
}

#[test]
fn test_results_are_capped() {
    let results = search("press");
    assert_eq!(results.len(), SEARCH_LIMIT);
}

#[test]
fn test_alias_match() {
    let results = search("rdl");
    assert_eq!(results[0].name, "Romanian Deadlift");
    assert!(results.iter().any(|t| t.name == "Dumbbell Romanian Deadlift"));
}

#[test]
fn test_no_match() {
    assert!(search("zzzz").is_empty());
}

#[test]
fn test_suggestion_prefers_exact_alias() {
    let bench = suggestion("flat bench").unwrap();
    assert_eq!(bench.name, "Bench Press");
    assert_eq!(bench.muscle_group, "chest");
    assert_eq!(bench.equipment, "barbell");

    assert_eq!(suggestion("squat").unwrap().name, "Squat");
    assert!(suggestion("   ").is_none());
    assert!(suggestion("underwater basket weaving").is_none());
}

#[test]
fn test_muscle_groups_are_distinct() {
    let groups = muscle_groups();
    assert!(groups.contains(&"chest"));
    assert!(groups.contains(&"hamstrings"));
    let mut sorted = groups.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), groups.len());
}

#[test]
fn test_catalog_names_are_unique() {
    let mut names: Vec<String> = EXERCISE_TEMPLATES.iter().map(|t| t.name.to_lowercase()).collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total);
}
