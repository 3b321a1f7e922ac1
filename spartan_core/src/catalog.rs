//! Built-in training plan, swap alternatives and theme ids.
//!
//! The default schedule is a five-day push/pull/legs split that seeds the
//! first program of every new or migrated document.

use crate::dates::local_date_key;
use crate::types::*;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Name given to synthesized default programs
pub const DEFAULT_PROGRAM_NAME: &str = "Spartan Protocol (Classic)";

/// Length of synthesized default programs
pub const DEFAULT_PROGRAM_WEEKS: u32 = 52;

/// Theme applied to new documents and to legacy ones carrying a retired id
pub const DEFAULT_THEME: &str = "cartoon";

/// Known theme ids
pub const THEMES: &[&str] = &["cartoon", "cyberpunk", "spartan"];

/// Cached default schedule - built once and reused across all operations
static DEFAULT_SCHEDULE: Lazy<Vec<WorkoutDay>> = Lazy::new(build_default_schedule);

static ALTERNATIVES: Lazy<HashMap<ExerciseCategory, Vec<Alternative>>> =
    Lazy::new(build_alternatives);

/// Get a reference to the cached built-in schedule
pub fn default_schedule() -> &'static [WorkoutDay] {
    &DEFAULT_SCHEDULE
}

/// A replacement exercise offered when swapping
#[derive(Clone, Debug, PartialEq)]
pub struct Alternative {
    pub name: String,
    pub sets: u32,
    pub reps: String,
}

/// Swap candidates for an exercise category (empty for cardio)
pub fn alternatives_for(category: ExerciseCategory) -> &'static [Alternative] {
    ALTERNATIVES
        .get(&category)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Build a default program starting on `now`'s local date
pub fn default_program<Tz: TimeZone>(
    id: &str,
    schedule: Vec<WorkoutDay>,
    now: &DateTime<Tz>,
) -> Program {
    Program {
        id: id.to_string(),
        name: DEFAULT_PROGRAM_NAME.to_string(),
        start_date: local_date_key(now.date_naive()),
        duration_weeks: DEFAULT_PROGRAM_WEEKS,
        schedule,
        is_active: true,
        created_at: now.with_timezone(&Utc).to_rfc3339(),
    }
}

fn ex(id: &str, name: &str, sets: u32, reps: &str, category: ExerciseCategory) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        sets,
        reps: reps.into(),
        notes: None,
        category,
    }
}

fn day(
    id: &str,
    weekday: &str,
    title: &str,
    focus: &str,
    color: &str,
    exercises: Vec<Exercise>,
) -> WorkoutDay {
    WorkoutDay {
        id: id.into(),
        day: weekday.into(),
        title: title.into(),
        focus: focus.into(),
        color: color.into(),
        exercises,
    }
}

fn build_default_schedule() -> Vec<WorkoutDay> {
    use ExerciseCategory::*;

    let mut hammer = ex("tu6", "Hammer Curl", 2, "10-12", Pull);
    hammer.notes = Some("2-3 sets".into());
    let mut incline = ex("th1", "Incline Bench (Barbell or Smith)", 3, "6-10", Push);
    incline.notes = Some("3-4 sets".into());
    let mut core = ex("f6", "Core: Plank, Leg Raise, or Cable Crunch", 3, "Varied", Core);
    core.notes = Some("Choose 2 exercises".into());

    vec![
        day(
            "mon",
            "Monday",
            "PUSH 1",
            "Chest + Shoulders + Triceps",
            "red",
            vec![
                ex("m1", "Flat Bench Press (Barbell or Smith)", 4, "6-10", Push),
                ex("m2", "Incline Dumbbell Press", 3, "8-12", Push),
                ex("m3", "Cable Chest Fly", 3, "12-15", Push),
                ex("m4", "Seated Dumbbell Shoulder Press", 3, "8-12", Push),
                ex("m5", "Dumbbell Lateral Raise", 3, "12-15", Push),
                ex("m6", "Cable Triceps Pushdown", 3, "10-15", Push),
            ],
        ),
        day(
            "tue",
            "Tuesday",
            "PULL 1",
            "Back + Biceps",
            "blue",
            vec![
                ex("tu1", "Lat Pulldown or Assisted Pull-up", 4, "8-12", Pull),
                ex("tu2", "Seated Cable Row or Machine Row", 3, "8-12", Pull),
                ex("tu3", "Single-arm Dumbbell Row (Bench Supported)", 3, "10-12 each", Pull),
                ex("tu4", "Face Pulls (Rear Delts)", 3, "12-15", Pull),
                ex("tu5", "Standing Dumbbell Biceps Curl", 3, "10-15", Pull),
                hammer,
            ],
        ),
        day(
            "wed",
            "Wednesday",
            "LEGS 1 (Heavy)",
            "Quads + Hamstrings + Calves",
            "green",
            vec![
                ex("w1", "Squat (Smith, Barbell, or Goblet)", 4, "6-10", Legs),
                ex("w2", "Leg Press", 3, "8-12", Legs),
                ex("w3", "Romanian Deadlift (Barbell or DB)", 3, "8-12", Legs),
                ex("w4", "Leg Curl (Lying or Seated)", 3, "10-15", Legs),
                ex("w5", "Standing or Seated Calf Raise", 4, "12-20", Legs),
            ],
        ),
        day(
            "thu",
            "Thursday",
            "PUSH 2 (Upper Focus)",
            "Chest + Shoulders + Triceps (Angles)",
            "purple",
            vec![
                incline,
                ex("th2", "Flat Dumbbell Press or Machine Chest Press", 3, "8-12", Push),
                ex("th3", "Cable Fly (High-to-Low or Low-to-High)", 3, "12-15", Push),
                ex("th4", "Dumbbell Shoulder Press OR Arnold Press", 3, "8-12", Push),
                ex("th5", "Dumbbell Lateral Raise", 3, "12-15", Push),
                ex("th6", "Overhead Triceps Extension (DB or Cable)", 3, "10-15", Push),
            ],
        ),
        day(
            "fri",
            "Friday",
            "LEGS 2 + CORE",
            "Glutes, Hamstrings, Quads, Abs",
            "yellow",
            vec![
                ex("f1", "Walking Lunges (DB or Bodyweight)", 3, "10-12 steps/leg", Legs),
                ex("f2", "Bulgarian Split Squats", 3, "8-12 each", Legs),
                ex("f3", "Hip Thrust or Glute Bridge", 3, "10-15", Legs),
                ex("f4", "Leg Curl (Hamstring Focus)", 3, "10-15", Legs),
                ex("f5", "Calf Raises (Any Machine)", 3, "15-20", Legs),
                core,
            ],
        ),
    ]
}

fn alt(name: &str, sets: u32, reps: &str) -> Alternative {
    Alternative {
        name: name.into(),
        sets,
        reps: reps.into(),
    }
}

fn build_alternatives() -> HashMap<ExerciseCategory, Vec<Alternative>> {
    let mut map = HashMap::new();
    map.insert(
        ExerciseCategory::Push,
        vec![
            alt("Push-Ups", 3, "Failure"),
            alt("Machine Chest Press", 3, "8-12"),
            alt("Dips", 3, "8-12"),
            alt("Skullcrushers", 3, "10-12"),
        ],
    );
    map.insert(
        ExerciseCategory::Pull,
        vec![
            alt("Pull-Ups", 3, "6-10"),
            alt("T-Bar Row", 3, "8-12"),
            alt("Preacher Curl", 3, "10-12"),
        ],
    );
    map.insert(
        ExerciseCategory::Legs,
        vec![
            alt("Hack Squat", 3, "8-12"),
            alt("Front Squat", 3, "6-10"),
            alt("Sumo Deadlift", 3, "5-8"),
        ],
    );
    map.insert(
        ExerciseCategory::Core,
        vec![
            alt("Hanging Leg Raise", 3, "10-15"),
            alt("Cable Woodchoppers", 3, "12-15"),
        ],
    );
    map
}

/// Validate a schedule and return all errors found
pub fn validate_schedule(schedule: &[WorkoutDay]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut day_ids = HashSet::new();
    let mut exercise_ids = HashSet::new();

    if schedule.is_empty() {
        errors.push("Schedule has no workout days".to_string());
    }

    for day in schedule {
        if !day_ids.insert(day.id.as_str()) {
            errors.push(format!("Duplicate workout day id '{}'", day.id));
        }
        if day.title.trim().is_empty() {
            errors.push(format!("Workout day '{}' has an empty title", day.id));
        }
        for exercise in &day.exercises {
            if !exercise_ids.insert(exercise.id.as_str()) {
                errors.push(format!(
                    "Duplicate exercise id '{}' in day '{}'",
                    exercise.id, day.id
                ));
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has an empty name", exercise.id));
            }
        }
    }

    errors
}
