//! State transitions over the document.
//!
//! Every user action is a [`Command`]; [`apply`] consumes the current
//! document and returns the next one together with a [`Notice`] for the
//! front-end to show. The previous document is never mutated in place by
//! callers, and self-heal runs after every transition so an action that
//! empties the program list is corrected immediately.

use crate::activity::Dated;
use crate::catalog::{default_schedule, validate_schedule, Alternative, THEMES};
use crate::dates::{local_date_key, resolve_key, DateKey};
use crate::migration::{fresh_document, self_heal, HealReport};
use crate::types::*;
use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use uuid::Uuid;

/// A user action
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Finish today's session for a day of the active schedule
    CompleteDay { day_id: String, rating: Option<u8> },
    /// Mark a day as not trained; today is recorded as explicitly skipped
    SkipDay { day_id: String },
    /// Log mood and body weight; `date` defaults to today
    CheckIn {
        date: Option<String>,
        mood: String,
        body_weight: f64,
    },
    /// Record a workout for a past date
    LogRetroactive { date: String, day_id: String },
    DeleteWorkout { id: String },
    /// Remove a check-in by timestamp when given, otherwise by date
    DeleteCheckIn {
        timestamp: Option<String>,
        date: Option<String>,
    },
    ClearHistory,
    UpdateWeight { exercise_id: String, weight: f64 },
    StartNewWeek,
    ResetWeights,
    HardReset,
    SaveProgram(Program),
    SetActiveProgram { id: String },
    DeleteProgram { id: String },
    /// Replace an exercise of the active program
    SwapExercise {
        day_id: String,
        exercise_id: String,
        replacement: Alternative,
    },
    SetTheme { theme: String },
    SetBackground { url: Option<String>, opacity: f64 },
    /// Replace history, check-ins and loads with generated sample data
    PopulateDemo,
}

/// Feedback for the front-end after a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    DayCompleted { title: String },
    DaySkipped,
    CheckInSaved { date: String },
    WorkoutLogged { title: String, date: String },
    WorkoutDeleted,
    CheckInDeleted { removed: usize },
    HistoryCleared,
    WeightUpdated,
    /// New load beats the previous positive load
    PersonalRecord {
        exercise_id: String,
        previous: f64,
        weight: f64,
    },
    WeekStarted { finished: u32, week: u32 },
    WeightsReset,
    Reset,
    ProgramSaved { id: String },
    ProgramSwitched { id: String },
    ProgramDeleted { id: String },
    ExerciseSwapped { new_id: String },
    ThemeUpdated,
    BackgroundUpdated,
    DemoLoaded { workouts: usize, check_ins: usize },
}

/// Result of applying one command
#[derive(Clone, Debug)]
pub struct Transition {
    pub document: Document,
    pub notice: Notice,
    /// Corrections made by the post-transition self-heal
    pub heal: HealReport,
}

/// Apply `command` to `document` at `now`
pub fn apply<Tz: TimeZone>(
    mut document: Document,
    command: Command,
    now: &DateTime<Tz>,
) -> Result<Transition> {
    let today = now.date_naive();
    tracing::debug!("Applying {:?}", command);

    let notice = match command {
        Command::CompleteDay { day_id, rating } => {
            if let Some(r) = rating {
                if !(1..=10).contains(&r) {
                    return Err(Error::Command(format!("Rating {} is outside 1-10", r)));
                }
            }
            let day = find_day(&document, &day_id)?.clone();
            let entry = HistoryEntry {
                id: Uuid::new_v4().to_string(),
                date: utc_stamp(now),
                local_date: Some(local_date_key(today)),
                workout_title: day.title.clone(),
                week_number: Some(document.current_week),
                rating,
                exercises: snapshot_exercises(&document, &day),
            };
            document.history.insert(0, entry);
            document.week_status.insert(day_id, DayStatus::Completed);
            tracing::info!("Completed {} for week {}", day.title, document.current_week);
            Notice::DayCompleted { title: day.title }
        }

        Command::SkipDay { day_id } => {
            find_day(&document, &day_id)?;
            document.week_status.insert(day_id, DayStatus::Skipped);
            document.skipped_dates.insert(local_date_key(today));
            Notice::DaySkipped
        }

        Command::CheckIn {
            date,
            mood,
            body_weight,
        } => {
            if !body_weight.is_finite() || body_weight <= 0.0 {
                return Err(Error::Command(format!(
                    "Body weight {} must be a positive number",
                    body_weight
                )));
            }
            let (date, timestamp) = match date {
                Some(raw) => {
                    let day = parse_day(&raw)?;
                    if day == today {
                        (day, utc_stamp(now))
                    } else {
                        (day, noon_stamp(day, now))
                    }
                }
                None => (today, utc_stamp(now)),
            };
            let key = local_date_key(date);
            let tz = now.timezone();

            document
                .check_ins
                .retain(|c| c.date_key(&tz) != DateKey::Valid(date) && c.date != key);
            document.check_ins.insert(
                0,
                CheckIn {
                    date: key.clone(),
                    local_date: Some(key.clone()),
                    timestamp: Some(timestamp),
                    mood,
                    body_weight,
                },
            );
            Notice::CheckInSaved { date: key }
        }

        Command::LogRetroactive { date, day_id } => {
            let date = parse_day(&date)?;
            let day = find_day(&document, &day_id)?.clone();
            let key = local_date_key(date);
            let entry = HistoryEntry {
                id: format!("retro_{}", Uuid::new_v4()),
                date: utc_stamp(now),
                local_date: Some(key.clone()),
                workout_title: day.title.clone(),
                week_number: Some(document.current_week),
                rating: None,
                exercises: snapshot_exercises(&document, &day),
            };
            document.history.insert(0, entry);
            tracing::info!("Logged {} retroactively for {}", day.title, key);
            Notice::WorkoutLogged {
                title: day.title,
                date: key,
            }
        }

        Command::DeleteWorkout { id } => {
            let before = document.history.len();
            document.history.retain(|h| h.id != id);
            if document.history.len() == before {
                return Err(Error::Command(format!("No workout with id '{}'", id)));
            }
            Notice::WorkoutDeleted
        }

        Command::DeleteCheckIn { timestamp, date } => {
            let before = document.check_ins.len();
            document.check_ins.retain(|c| match (&timestamp, &c.timestamp) {
                (Some(wanted), Some(stamp)) => stamp != wanted,
                _ => Some(&c.date) != date.as_ref(),
            });
            Notice::CheckInDeleted {
                removed: before - document.check_ins.len(),
            }
        }

        Command::ClearHistory => {
            document.history.clear();
            Notice::HistoryCleared
        }

        Command::UpdateWeight {
            exercise_id,
            weight,
        } => {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Command(format!("Invalid load {}", weight)));
            }
            let previous = document.weights.get(&exercise_id).copied().unwrap_or(0.0);
            document.weights.insert(exercise_id.clone(), weight);
            if previous > 0.0 && weight > previous {
                tracing::info!("New PR on {}: {} -> {}", exercise_id, previous, weight);
                Notice::PersonalRecord {
                    exercise_id,
                    previous,
                    weight,
                }
            } else {
                Notice::WeightUpdated
            }
        }

        Command::StartNewWeek => {
            let finished = document.current_week;
            document.current_week = finished + 1;
            document.week_status.clear();
            Notice::WeekStarted {
                finished,
                week: document.current_week,
            }
        }

        Command::ResetWeights => {
            document.weights.clear();
            Notice::WeightsReset
        }

        Command::HardReset => {
            document = fresh_document(now);
            if let Some(program) = document.programs.first_mut() {
                program.id = "prog_default_reset".into();
            }
            Notice::Reset
        }

        Command::SaveProgram(program) => {
            if program.name.trim().is_empty() {
                return Err(Error::Command("Program name is empty".into()));
            }
            let errors = validate_schedule(&program.schedule);
            if !errors.is_empty() {
                return Err(Error::Command(errors.join("; ")));
            }
            let id = program.id.clone();
            save_program(&mut document, program);
            Notice::ProgramSaved { id }
        }

        Command::SetActiveProgram { id } => {
            if !document.programs.iter().any(|p| p.id == id) {
                return Err(Error::Command(format!("No program with id '{}'", id)));
            }
            for program in &mut document.programs {
                program.is_active = program.id == id;
            }
            Notice::ProgramSwitched { id }
        }

        Command::DeleteProgram { id } => {
            let before = document.programs.len();
            document.programs.retain(|p| p.id != id);
            if document.programs.len() == before {
                return Err(Error::Command(format!("No program with id '{}'", id)));
            }
            Notice::ProgramDeleted { id }
        }

        Command::SwapExercise {
            day_id,
            exercise_id,
            replacement,
        } => {
            let new_id = format!("{}_custom_{}", day_id, now.timestamp_millis());
            let mut program = document
                .active_program()
                .cloned()
                .ok_or_else(|| Error::Command("No active program".into()))?;
            let exercise = program
                .schedule
                .iter_mut()
                .find(|d| d.id == day_id)
                .ok_or_else(|| Error::Command(format!("No workout day '{}'", day_id)))?
                .exercises
                .iter_mut()
                .find(|e| e.id == exercise_id)
                .ok_or_else(|| Error::Command(format!("No exercise '{}'", exercise_id)))?;

            exercise.id = new_id.clone();
            exercise.notes = Some(format!("Swapped: {}", replacement.name));
            exercise.name = replacement.name;
            exercise.sets = replacement.sets;
            exercise.reps = replacement.reps;

            save_program(&mut document, program);
            Notice::ExerciseSwapped { new_id }
        }

        Command::SetTheme { theme } => {
            if !THEMES.contains(&theme.as_str()) {
                return Err(Error::Command(format!("Unknown theme '{}'", theme)));
            }
            document.active_theme = theme;
            Notice::ThemeUpdated
        }

        Command::SetBackground { url, opacity } => {
            document.background_image = url;
            document.bg_overlay_opacity = if opacity.is_finite() {
                opacity.clamp(0.0, 1.0)
            } else {
                0.5
            };
            Notice::BackgroundUpdated
        }

        Command::PopulateDemo => {
            populate_demo(&mut document, now);
            tracing::info!(
                "Loaded demo data: {} workouts, {} check-ins",
                document.history.len(),
                document.check_ins.len()
            );
            Notice::DemoLoaded {
                workouts: document.history.len(),
                check_ins: document.check_ins.len(),
            }
        }
    };

    let heal = self_heal(&mut document, now);
    Ok(Transition {
        document,
        notice,
        heal,
    })
}

/// Whether enough days are completed to call the week done
pub fn is_week_complete(document: &Document, required_days: usize) -> bool {
    document.completed_this_week() >= required_days
}

/// A new inactive program built on a copy of the default schedule
///
/// Without `start_date` the program starts when the active one ends, or
/// today when nothing is active. Save it with [`Command::SaveProgram`].
pub fn draft_program<Tz: TimeZone>(
    document: &Document,
    name: &str,
    duration_weeks: u32,
    start_date: Option<&str>,
    now: &DateTime<Tz>,
) -> Result<Program> {
    if duration_weeks == 0 {
        return Err(Error::Command("A program needs at least one week".into()));
    }

    let start = match start_date {
        Some(raw) => parse_day(raw)?,
        None => document
            .active_program()
            .and_then(|p| {
                let start = resolve_key(&p.start_date, &now.timezone()).valid()?;
                Some(start + Duration::weeks(i64::from(p.duration_weeks)))
            })
            .unwrap_or_else(|| now.date_naive()),
    };

    Ok(Program {
        id: format!("prog_{}", now.timestamp_millis()),
        name: name.trim().to_string(),
        start_date: local_date_key(start),
        duration_weeks,
        schedule: default_schedule().to_vec(),
        is_active: false,
        created_at: utc_stamp(now),
    })
}

/// Days of generated history ending today
const DEMO_DAYS: i64 = 60;
/// Week the demo leaves the user in
const DEMO_WEEK: u32 = 9;
const DEMO_MOODS: [&str; 6] = ["🔥", "⚡", "🧘", "🔥", "🔥", "⚡"];
/// Body-weight change applied at each demo check-in, cycled
const DEMO_WEIGHT_STEPS: [f64; 5] = [-0.2, 0.1, -0.1, 0.0, -0.15];

/// Two months of Mon/Tue/Thu/Fri sessions and check-ins every other day
///
/// Every tenth scheduled session is left out so the calendar shows misses.
fn populate_demo<Tz: TimeZone>(document: &mut Document, now: &DateTime<Tz>) {
    let today = now.date_naive();
    let tz = now.timezone();
    let schedule = document.active_schedule().to_vec();

    let mut history = Vec::new();
    let mut check_ins = Vec::new();
    let mut body_weight = 85.0;
    let mut squat = 100.0;
    let mut scheduled = 0usize;

    for back in (0..=DEMO_DAYS).rev() {
        let date = today - Duration::days(back);
        let key = local_date_key(date);
        let at = |hour: u32| {
            date.and_hms_opt(hour, 0, 0)
                .and_then(|local| tz.from_local_datetime(&local).earliest())
                .map(|dt| utc_stamp(&dt))
                .unwrap_or_else(|| utc_stamp(now))
        };

        if back % 2 == 0 {
            let n = check_ins.len();
            body_weight += DEMO_WEIGHT_STEPS[n % DEMO_WEIGHT_STEPS.len()];
            check_ins.push(CheckIn {
                date: key.clone(),
                local_date: Some(key.clone()),
                timestamp: Some(at(8)),
                mood: DEMO_MOODS[n % DEMO_MOODS.len()].to_string(),
                body_weight: (body_weight * 10.0_f64).round() / 10.0,
            });
        }

        let day_id = match date.weekday() {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            _ => continue,
        };
        scheduled += 1;
        if scheduled % 10 == 0 {
            continue;
        }
        let Some(day) = schedule.iter().find(|d| d.id == day_id) else {
            continue;
        };

        squat += 0.5;
        let elapsed = (DEMO_DAYS - back) as u32;
        history.push(HistoryEntry {
            id: format!("demo_{}", key),
            date: at(18),
            local_date: Some(key),
            workout_title: day.title.clone(),
            week_number: Some(elapsed.div_ceil(7).max(1)),
            rating: None,
            exercises: day
                .exercises
                .iter()
                .map(|ex| ExerciseResult {
                    name: ex.name.clone(),
                    weight: if ex.category == ExerciseCategory::Legs {
                        f64::floor(squat)
                    } else {
                        50.0
                    },
                    sets: ex.sets,
                    reps: ex.reps.clone(),
                })
                .collect(),
        });
    }

    // Stored lists are newest first
    history.reverse();
    check_ins.reverse();

    document.history = history;
    document.check_ins = check_ins;
    document.weights.clear();
    document.current_week = DEMO_WEEK;
}

/// Insert or replace `program`, keeping exactly one program active
fn save_program(document: &mut Document, program: Program) {
    let id = program.id.clone();
    let activate = program.is_active;

    match document.programs.iter_mut().find(|p| p.id == id) {
        Some(existing) => *existing = program,
        None => document.programs.push(program),
    }

    // Saving a draft while nothing else is active activates the draft
    if activate || !document.programs.iter().any(|p| p.is_active) {
        for p in &mut document.programs {
            p.is_active = p.id == id;
        }
    }
}

fn find_day<'a>(document: &'a Document, day_id: &str) -> Result<&'a WorkoutDay> {
    document
        .active_schedule()
        .iter()
        .find(|d| d.id == day_id)
        .ok_or_else(|| Error::Command(format!("No workout day '{}' in the active program", day_id)))
}

fn snapshot_exercises(document: &Document, day: &WorkoutDay) -> Vec<ExerciseResult> {
    day.exercises
        .iter()
        .map(|ex| ExerciseResult {
            name: ex.name.clone(),
            weight: document.weights.get(&ex.id).copied().unwrap_or(0.0),
            sets: ex.sets,
            reps: ex.reps.clone(),
        })
        .collect()
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    resolve_key(raw, &Utc)
        .valid()
        .filter(|_| crate::dates::is_canonical(raw.trim()))
        .ok_or_else(|| Error::Command(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

fn utc_stamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    now.with_timezone(&Utc).to_rfc3339()
}

/// Local noon of `day` in `now`'s timezone, as an RFC 3339 UTC stamp
fn noon_stamp<Tz: TimeZone>(day: NaiveDate, now: &DateTime<Tz>) -> String {
    day.and_hms_opt(12, 0, 0)
        .and_then(|noon| now.timezone().from_local_datetime(&noon).earliest())
        .map(|dt| utc_stamp(&dt))
        .unwrap_or_else(|| utc_stamp(now))
}
