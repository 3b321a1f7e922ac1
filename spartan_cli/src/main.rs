use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use spartan_core::activity::Dated;
use spartan_core::catalog::alternatives_for;
use spartan_core::report::{closes_cycle, cycle_report, latest_check_in, weight_log, CycleReport};
use spartan_core::store::Optimization;
use spartan_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spartan")]
#[command(about = "Spartan workout tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Show debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true, hide = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show this week's board (default)
    Week,

    /// Show the exercises of a workout day
    Day { day: String },

    /// Complete a workout day today
    Done {
        day: String,

        /// Session intensity, 1-10
        #[arg(long)]
        rating: Option<u8>,
    },

    /// Skip a workout day; today counts as skipped
    Skip { day: String },

    /// Log mood and body weight
    Checkin {
        #[arg(long)]
        mood: String,

        /// Body weight in kg
        #[arg(long)]
        weight: f64,

        /// Past date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete the check-in of a date
    DeleteCheckin { date: String },

    /// Log a workout for a past date
    Log { date: String, day: String },

    /// List recorded workouts, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Delete a recorded workout by id
    DeleteWorkout { id: String },

    /// Record the working load for an exercise
    Weight { exercise: String, kg: f64 },

    /// Finish the current week and start the next
    NextWeek,

    /// Month calendar with streak and consistency
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Streak, consistency and latest check-in
    Stats,

    /// Report on the current training cycle
    Report,

    /// Body-weight log
    Weights,

    /// Manage programs
    Programs {
        #[command(subcommand)]
        action: Option<ProgramAction>,
    },

    /// Swap an exercise of the active program; lists options without an index
    Swap {
        day: String,
        exercise: String,
        index: Option<usize>,
    },

    /// Set the theme
    Theme { theme: String },

    /// Set or clear the background image
    Background {
        #[arg(long)]
        url: Option<String>,

        #[arg(long, default_value_t = 0.5)]
        opacity: f64,
    },

    /// Export workout history as CSV
    Export { path: PathBuf },

    /// Replace history and check-ins with two months of sample data
    Demo {
        /// Confirm that existing logs may be replaced
        #[arg(long)]
        yes: bool,
    },

    /// Reset parts of the stored data
    #[command(group(ArgGroup::new("scope").required(true).args(["weights", "history", "all"])))]
    Reset {
        /// Forget all recorded loads
        #[arg(long)]
        weights: bool,

        /// Delete all recorded workouts
        #[arg(long)]
        history: bool,

        /// Start over with a fresh document
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum ProgramAction {
    /// List programs (default)
    List,
    /// Make a program the active one
    Activate { id: String },
    /// Delete a program
    Delete { id: String },
    /// Create a program from the built-in schedule
    Create {
        name: String,

        #[arg(long, default_value_t = 12)]
        weeks: u32,

        /// Start date (YYYY-MM-DD), defaults to the end of the active program
        #[arg(long)]
        start: Option<String>,

        /// Make it the active program
        #[arg(long)]
        activate: bool,
    },
    /// Save a program from a JSON file, replacing one with the same id
    Import {
        path: PathBuf,

        /// Make it the active program
        #[arg(long)]
        activate: bool,
    },
}

struct App<Tz: TimeZone> {
    store: DocumentStore,
    config: Config,
    now: DateTime<Tz>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    spartan_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }

    let store = DocumentStore::new(config.document_path()).with_optimization(Optimization {
        threshold_bytes: config.storage.optimize_threshold_bytes,
        age_days: config.storage.optimize_age_days,
    });

    let command = cli.command.unwrap_or(Commands::Week);

    // Frozen dates sit at noon UTC so no offset can move them. Real runs keep
    // the local zone so each timestamp gets the offset in force at its instant.
    match cli.today {
        Some(date) => {
            let noon = date
                .and_hms_opt(12, 0, 0)
                .ok_or_else(|| Error::Other(format!("Invalid --today {}", date)))?;
            let now = Utc.from_utc_datetime(&noon);
            dispatch(&App { store, config, now }, command)
        }
        None => {
            let now = Local::now();
            dispatch(&App { store, config, now }, command)
        }
    }
}

fn dispatch<Tz: TimeZone>(app: &App<Tz>, command: Commands) -> Result<()> {
    tracing::debug!(
        "Using document {:?} at {}",
        app.store.path(),
        app.now.with_timezone(&Utc).to_rfc3339()
    );

    match command {
        Commands::Week => cmd_week(app),
        Commands::Day { day } => cmd_day(app, &day),
        Commands::Done { day, rating } => run(
            app,
            Command::CompleteDay {
                day_id: day,
                rating,
            },
        ),
        Commands::Skip { day } => run(app, Command::SkipDay { day_id: day }),
        Commands::Checkin { mood, weight, date } => run(
            app,
            Command::CheckIn {
                date,
                mood,
                body_weight: weight,
            },
        ),
        Commands::DeleteCheckin { date } => run(
            app,
            Command::DeleteCheckIn {
                timestamp: None,
                date: Some(date),
            },
        ),
        Commands::Log { date, day } => run(app, Command::LogRetroactive { date, day_id: day }),
        Commands::History { limit } => cmd_history(app, limit),
        Commands::DeleteWorkout { id } => run(app, Command::DeleteWorkout { id }),
        Commands::Weight { exercise, kg } => cmd_weight(app, exercise, kg),
        Commands::NextWeek => cmd_next_week(app),
        Commands::Calendar { month, json } => cmd_calendar(app, month.as_deref(), json),
        Commands::Stats => cmd_stats(app),
        Commands::Report => cmd_report(app),
        Commands::Weights => cmd_weights(app),
        Commands::Programs { action } => match action.unwrap_or(ProgramAction::List) {
            ProgramAction::List => cmd_programs(app),
            ProgramAction::Activate { id } => run(app, Command::SetActiveProgram { id }),
            ProgramAction::Delete { id } => run(app, Command::DeleteProgram { id }),
            ProgramAction::Create {
                name,
                weeks,
                start,
                activate,
            } => cmd_program_create(app, &name, weeks, start.as_deref(), activate),
            ProgramAction::Import { path, activate } => cmd_program_import(app, &path, activate),
        },
        Commands::Swap {
            day,
            exercise,
            index,
        } => cmd_swap(app, day, exercise, index),
        Commands::Theme { theme } => run(app, Command::SetTheme { theme }),
        Commands::Background { url, opacity } => run(app, Command::SetBackground { url, opacity }),
        Commands::Export { path } => cmd_export(app, &path),
        Commands::Demo { yes } => cmd_demo(app, yes),
        Commands::Reset {
            weights,
            history,
            all,
        } => {
            let command = if all {
                Command::HardReset
            } else if history {
                Command::ClearHistory
            } else if weights {
                Command::ResetWeights
            } else {
                return Err(Error::Command("Nothing to reset".into()));
            };
            run(app, command)
        }
    }
}

/// Load the document, telling the user when stored data had to be replaced
fn load<Tz: TimeZone>(app: &App<Tz>) -> Result<Document> {
    let outcome = app.store.load(&app.now)?;
    if outcome.is_recovered() {
        eprintln!(
            "⚠ Stored data at {} was unreadable and has been reset; the previous contents were kept as a .bak file",
            app.store.path().display()
        );
    }
    Ok(outcome.into_document())
}

/// Load, apply one command, save, and print its notice
fn run<Tz: TimeZone>(app: &App<Tz>, command: Command) -> Result<()> {
    let _lock = app.store.lock()?;
    let document = load(app)?;
    commit(app, document, command)?;
    Ok(())
}

/// Apply and save; callers hold the store lock since loading
fn commit<Tz: TimeZone>(app: &App<Tz>, document: Document, command: Command) -> Result<Transition> {
    let transition = apply(document, command, &app.now)?;
    app.store.save(&transition.document)?;
    print_notice(&transition);
    Ok(transition)
}

fn print_notice(transition: &Transition) {
    match &transition.notice {
        Notice::DayCompleted { title } => println!("✓ {} complete", title),
        Notice::DaySkipped => println!("✓ Rest day taken"),
        Notice::CheckInSaved { date } => println!("✓ Check-in saved for {}", date),
        Notice::WorkoutLogged { title, date } => println!("✓ Logged {} on {}", title, date),
        Notice::WorkoutDeleted => println!("✓ Workout deleted"),
        Notice::CheckInDeleted { removed } => println!("✓ Removed {} check-in(s)", removed),
        Notice::HistoryCleared => println!("✓ History cleared"),
        Notice::WeightUpdated => println!("✓ Load updated"),
        Notice::PersonalRecord {
            exercise_id,
            previous,
            weight,
        } => println!("🏆 New PR on {}: {} kg → {} kg", exercise_id, previous, weight),
        Notice::WeekStarted { finished, week } => {
            println!("✓ Week {} done, starting week {}", finished, week)
        }
        Notice::WeightsReset => println!("✓ All loads reset"),
        Notice::Reset => println!("✓ Everything reset"),
        Notice::ProgramSaved { id } => println!("✓ Program {} saved", id),
        Notice::ProgramSwitched { id } => println!("✓ Switched to program {}", id),
        Notice::ProgramDeleted { id } => println!("✓ Program {} deleted", id),
        Notice::ExerciseSwapped { new_id } => println!("✓ Exercise swapped (new id {})", new_id),
        Notice::ThemeUpdated => println!("✓ Theme updated"),
        Notice::BackgroundUpdated => println!("✓ Background updated"),
        Notice::DemoLoaded {
            workouts,
            check_ins,
        } => println!(
            "✓ Demo data loaded: {} workouts, {} check-ins",
            workouts, check_ins
        ),
    }

    if transition.heal.synthesized_program {
        println!("  No programs left, restored the default program");
    }
}

fn cmd_week<Tz: TimeZone>(app: &App<Tz>) -> Result<()> {
    let document = load(app)?;
    let name = document
        .active_program()
        .map(|p| p.name.as_str())
        .unwrap_or(catalog::DEFAULT_PROGRAM_NAME);

    println!("{} · Week {}", name, document.current_week);
    println!();
    for day in document.active_schedule() {
        let (mark, label) = match document.day_status(&day.id) {
            DayStatus::Completed => ("✓", "completed"),
            DayStatus::Skipped => ("✗", "skipped"),
            DayStatus::Pending => ("·", "pending"),
        };
        println!(
            "  {} {:<4} {:<10} {:<24} {}",
            mark, day.id, day.day, day.title, label
        );
    }

    let done = document.completed_this_week();
    let required = app.config.report.week_complete_days;
    println!();
    println!("{}/{} days done", done, required);
    if commands::is_week_complete(&document, required) {
        println!("Week complete! Run `spartan next-week` to move on.");
    }
    Ok(())
}

fn cmd_day<Tz: TimeZone>(app: &App<Tz>, day_id: &str) -> Result<()> {
    let document = load(app)?;
    let day = document
        .active_schedule()
        .iter()
        .find(|d| d.id == day_id)
        .ok_or_else(|| Error::Command(format!("No workout day '{}' in the active program", day_id)))?;

    println!("{} · {} ({})", day.title, day.focus, day.day);
    println!();
    for exercise in &day.exercises {
        let load = document.weights.get(&exercise.id).copied().unwrap_or(0.0);
        println!(
            "  {:<12} {:<44} {} x {:<12} {} kg",
            exercise.id, exercise.name, exercise.sets, exercise.reps, load
        );
        if let Some(notes) = &exercise.notes {
            println!("  {:<12} {}", "", notes);
        }
    }
    Ok(())
}

fn cmd_history<Tz: TimeZone>(app: &App<Tz>, limit: usize) -> Result<()> {
    let document = load(app)?;
    if document.history.is_empty() {
        println!("No workouts recorded yet.");
        return Ok(());
    }

    let tz = app.now.timezone();
    for entry in document.history.iter().take(limit) {
        let date = entry
            .date_key(&tz)
            .valid()
            .map(local_date_key)
            .unwrap_or_else(|| "??????????".into());
        let rating = entry
            .rating
            .map(|r| format!(" · {}/10", r))
            .unwrap_or_default();
        println!("  {}  {:<24} {}{}", date, entry.workout_title, entry.id, rating);
    }
    Ok(())
}

fn cmd_weight<Tz: TimeZone>(app: &App<Tz>, exercise: String, kg: f64) -> Result<()> {
    let _lock = app.store.lock()?;
    let document = load(app)?;
    let known = document
        .active_schedule()
        .iter()
        .flat_map(|d| d.exercises.iter())
        .any(|e| e.id == exercise);
    if !known {
        return Err(Error::Command(format!(
            "No exercise '{}' in the active program",
            exercise
        )));
    }

    commit(
        app,
        document,
        Command::UpdateWeight {
            exercise_id: exercise,
            weight: kg,
        },
    )?;
    Ok(())
}

fn cmd_next_week<Tz: TimeZone>(app: &App<Tz>) -> Result<()> {
    let _lock = app.store.lock()?;
    let document = load(app)?;
    let required = app.config.report.week_complete_days;
    if !commands::is_week_complete(&document, required) {
        println!(
            "Only {}/{} days done this week, moving on anyway.",
            document.completed_this_week(),
            required
        );
    }

    let transition = commit(app, document, Command::StartNewWeek)?;

    if let Notice::WeekStarted { finished, .. } = transition.notice {
        let cycle_weeks = app.config.report.cycle_weeks;
        if closes_cycle(finished, cycle_weeks) {
            println!();
            print_cycle_report(&cycle_report(&transition.document.history, finished, cycle_weeks));
        }
    }
    Ok(())
}

fn print_cycle_report(report: &CycleReport) {
    println!(
        "Cycle complete: weeks {} - {}",
        report.first_week, report.last_week
    );
    println!("  Workouts:     {}", report.workouts);
    println!("  Total volume: {:.1}k kg", report.total_volume / 1000.0);
}

fn parse_month(month: &str) -> Result<(i32, u32)> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map(|d| (d.year(), d.month0()))
        .map_err(|_| Error::Calendar(format!("'{}' is not a YYYY-MM month", month)))
}

fn cmd_calendar<Tz: TimeZone>(app: &App<Tz>, month: Option<&str>, json: bool) -> Result<()> {
    let document = load(app)?;
    let snapshot = Snapshot::of(&document, app.now.clone());
    let insights = match month {
        Some(month) => {
            let (year, month0) = parse_month(month)?;
            Insights::derive(&snapshot, year, month0)?
        }
        None => Insights::for_current_month(&snapshot)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    println!("{:^35}", insights.grid.label());
    println!("  Mo   Tu   We   Th   Fr   Sa   Su");
    for week in insights.grid.weeks() {
        let row: String = week
            .iter()
            .map(|cell| {
                if !cell.in_month {
                    return "     ".to_string();
                }
                let open = if cell.is_today { '[' } else { ' ' };
                let close = if cell.is_today { ']' } else { ' ' };
                format!("{}{:>2}{}{}", open, cell.day_of_month, class_mark(cell.class), close)
            })
            .collect();
        println!("{}", row.trim_end());
    }
    println!();
    println!("  * workout  + check-in  ~ skipped  x missed");
    print_metrics(insights.streak, &insights.consistency);
    Ok(())
}

fn class_mark(class: DayClass) -> char {
    match class {
        DayClass::Workout => '*',
        DayClass::CheckinOnly => '+',
        DayClass::Skip => '~',
        DayClass::Missed => 'x',
        DayClass::Rest | DayClass::Future | DayClass::Empty => ' ',
    }
}

fn print_metrics(streak: u32, consistency: &ConsistencyBreakdown) {
    println!(
        "Streak: {} day{}",
        streak,
        if streak == 1 { "" } else { "s" }
    );
    println!(
        "Consistency: {}% ({} completed, {} missed)",
        consistency.score, consistency.completed, consistency.missed
    );
}

fn cmd_stats<Tz: TimeZone>(app: &App<Tz>) -> Result<()> {
    let document = load(app)?;
    let snapshot = Snapshot::of(&document, app.now.clone());
    let today = snapshot.today();
    let index = ActivityIndex::build(&snapshot);

    print_metrics(current_streak(today, &index), &consistency_breakdown(today, &index));
    println!("Workouts logged: {}", document.history.len());
    println!("Training days: {}", index.workout_day_count());
    if let Some(latest) = latest_check_in(&document.check_ins) {
        println!(
            "Latest check-in: {} {} kg on {}",
            latest.mood,
            latest.body_weight,
            latest.local_date.as_deref().unwrap_or(&latest.date)
        );
    }
    Ok(())
}

fn cmd_report<Tz: TimeZone>(app: &App<Tz>) -> Result<()> {
    let document = load(app)?;
    let report = cycle_report(
        &document.history,
        document.current_week,
        app.config.report.cycle_weeks,
    );
    println!(
        "Weeks {} - {}: {} workouts, {:.1}k kg total volume",
        report.first_week,
        report.last_week,
        report.workouts,
        report.total_volume / 1000.0
    );
    Ok(())
}

fn cmd_weights<Tz: TimeZone>(app: &App<Tz>) -> Result<()> {
    let document = load(app)?;
    let log = weight_log(&document.check_ins);
    if log.is_empty() {
        println!("No check-ins yet.");
        return Ok(());
    }

    for row in log {
        let delta = row
            .delta
            .map(|d| format!("{:+.1}", d))
            .unwrap_or_default();
        println!(
            "  {}  {}  {:>6.1} kg  {} {}",
            row.date,
            row.mood,
            row.body_weight,
            row.trend.symbol(),
            delta
        );
    }
    Ok(())
}

fn cmd_programs<Tz: TimeZone>(app: &App<Tz>) -> Result<()> {
    let document = load(app)?;
    for program in &document.programs {
        println!(
            "{} {:<24} {} ({} weeks from {})",
            if program.is_active { "*" } else { " " },
            program.id,
            program.name,
            program.duration_weeks,
            program.start_date
        );
    }
    Ok(())
}

fn cmd_program_create<Tz: TimeZone>(
    app: &App<Tz>,
    name: &str,
    weeks: u32,
    start: Option<&str>,
    activate: bool,
) -> Result<()> {
    let _lock = app.store.lock()?;
    let document = load(app)?;
    let mut program = draft_program(&document, name, weeks, start, &app.now)?;
    program.is_active = activate;
    println!(
        "{}: {} weeks from {}",
        program.name, program.duration_weeks, program.start_date
    );
    commit(app, document, Command::SaveProgram(program))?;
    Ok(())
}

fn cmd_program_import<Tz: TimeZone>(
    app: &App<Tz>,
    path: &std::path::Path,
    activate: bool,
) -> Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let mut program: Program = serde_json::from_str(&raw)?;
    if activate {
        program.is_active = true;
    }
    if program.start_date.trim().is_empty() {
        program.start_date = local_date_key(app.now.date_naive());
    }
    if program.created_at.trim().is_empty() {
        program.created_at = app.now.with_timezone(&Utc).to_rfc3339();
    }

    let _lock = app.store.lock()?;
    let document = load(app)?;
    commit(app, document, Command::SaveProgram(program))?;
    Ok(())
}

fn cmd_swap<Tz: TimeZone>(
    app: &App<Tz>,
    day_id: String,
    exercise_id: String,
    index: Option<usize>,
) -> Result<()> {
    let _lock = app.store.lock()?;
    let document = load(app)?;
    let category = document
        .active_schedule()
        .iter()
        .filter(|d| d.id == day_id)
        .flat_map(|d| d.exercises.iter())
        .find(|e| e.id == exercise_id)
        .map(|e| e.category)
        .ok_or_else(|| {
            Error::Command(format!("No exercise '{}' on day '{}'", exercise_id, day_id))
        })?;
    let options = alternatives_for(category);

    let Some(index) = index else {
        if options.is_empty() {
            println!("No alternatives for this exercise.");
        }
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {} ({} x {})", i + 1, option.name, option.sets, option.reps);
        }
        return Ok(());
    };

    let replacement = index
        .checked_sub(1)
        .and_then(|i| options.get(i))
        .cloned()
        .ok_or_else(|| Error::Command(format!("No alternative number {}", index)))?;

    commit(
        app,
        document,
        Command::SwapExercise {
            day_id,
            exercise_id,
            replacement,
        },
    )?;
    Ok(())
}

fn cmd_export<Tz: TimeZone>(app: &App<Tz>, path: &std::path::Path) -> Result<()> {
    let document = load(app)?;
    let rows = export::export_history_csv(&document.history, path, &app.now.timezone())?;
    println!("✓ Exported {} rows", rows);
    println!("  CSV: {}", path.display());
    Ok(())
}

fn cmd_demo<Tz: TimeZone>(app: &App<Tz>, confirmed: bool) -> Result<()> {
    if !confirmed {
        println!("This replaces all workouts, check-ins and loads with 60 days of demo data.");
        println!("Run `spartan demo --yes` to continue.");
        return Ok(());
    }
    run(app, Command::PopulateDemo)
}
