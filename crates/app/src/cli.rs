use std::path::PathBuf;

use chrono::NaiveTime;
use clap::{Parser, Subcommand, ValueEnum};
use engine::{Category, MeasurementState, Step};

#[derive(Debug, Parser)]
#[command(name = "exchange_planner")]
#[command(about = "Plan daily food exchanges across meals and ingredients")]
pub struct Cli {
    /// Optional settings file (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Database connection string, overrides the settings file.
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,
    /// Preference scope, e.g. one per profile.
    #[arg(long, global = true)]
    pub scope: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Food catalog
    #[command(subcommand)]
    Foods(FoodsCommand),
    /// Daily exchange budget
    #[command(subcommand)]
    Budget(BudgetCommand),
    /// Meals and their time windows
    #[command(subcommand)]
    Meals(MealsCommand),
    /// Distribution of the budget across meals
    #[command(subcommand)]
    Allocation(AllocationCommand),
    /// Foods chosen for a meal
    #[command(subcommand)]
    Ingredients(IngredientsCommand),
    /// Saved meals
    #[command(subcommand)]
    Journal(JournalCommand),
}

#[derive(Debug, Subcommand)]
pub enum FoodsCommand {
    /// Load a catalog JSON file into an empty food store.
    Seed { file: PathBuf },
    /// Insert or replace foods from a catalog JSON file.
    Import { file: PathBuf },
    List {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
    Search { query: String },
}

#[derive(Debug, Subcommand)]
pub enum BudgetCommand {
    Show,
    /// Set the daily exchanges of a category.
    Set {
        #[arg(value_parser = parse_category)]
        category: Category,
        amount: String,
        /// Snap an off-step amount to the nearest step instead of rejecting it.
        #[arg(long)]
        round: bool,
    },
    Step {
        #[arg(value_parser = parse_category)]
        category: Category,
        direction: Direction,
        #[arg(long, value_parser = parse_step)]
        step: Option<Step>,
    },
    /// Clear the budget with every meal allocation and ingredient.
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum MealsCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
    },
    /// Add a snack after a main meal. Without a window it starts one hour
    /// after the parent ends.
    AddSnack {
        #[arg(long)]
        parent: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_time, requires = "end")]
        start: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time, requires = "start")]
        end: Option<NaiveTime>,
    },
    /// Rename a meal or move its window.
    Edit {
        meal: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
    },
    /// Remove a meal together with its snacks.
    Remove { meal: String },
    /// Remove every meal.
    Clear,
    /// Current and upcoming meals.
    Status {
        #[arg(long, value_parser = parse_time)]
        at: Option<NaiveTime>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AllocationCommand {
    Show,
    Step {
        meal: String,
        #[arg(value_parser = parse_category)]
        category: Category,
        direction: Direction,
        #[arg(long, value_parser = parse_step)]
        step: Option<Step>,
    },
    /// Accept a redistributed budget after meals or the budget changed.
    Confirm,
}

#[derive(Debug, Subcommand)]
pub enum IngredientsCommand {
    Show {
        meal: String,
    },
    /// Add a food with its default measurement.
    Add {
        meal: String,
        food: String,
    },
    /// Set the exchanges of a food, adding it when missing. Zero removes it.
    Set {
        meal: String,
        food: String,
        amount: String,
        #[arg(long)]
        round: bool,
    },
    Remove {
        meal: String,
        food: String,
    },
    /// Convert a measured quantity, in the ingredient's unit, to exchanges.
    Measure {
        meal: String,
        food: String,
        quantity: f64,
        #[arg(long, value_parser = parse_step)]
        step: Option<Step>,
    },
    /// Change the measurement state and unit of an ingredient.
    Unit {
        meal: String,
        food: String,
        #[arg(value_parser = parse_state)]
        state: MeasurementState,
        unit: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum JournalCommand {
    /// Record a complete meal for today.
    Save { meal: String },
    List,
    Export { file: PathBuf },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::from_label(raw).ok_or_else(|| format!("unknown category: {raw}"))
}

fn parse_step(raw: &str) -> Result<Step, String> {
    raw.parse().map_err(|err: engine::EngineError| err.to_string())
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| format!("expected HH:MM, got {raw}"))
}

fn parse_state(raw: &str) -> Result<MeasurementState, String> {
    MeasurementState::try_from(raw).map_err(|err| err.to_string())
}
