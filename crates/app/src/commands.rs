//! Runs parsed commands against the engine and prints the outcome.
use chrono::{Local, NaiveDateTime, NaiveTime};
use engine::{
    AllocationLedger, Category, DailyBudget, Engine, EngineError, Food, FoodCatalog,
    IngredientKey, Meal, SelectedIngredient, Step, parse_exchange_input, schedule,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    cli::{
        AllocationCommand, BudgetCommand, Command, Direction, FoodsCommand, IngredientsCommand,
        JournalCommand, MealsCommand,
    },
    error::Result,
    export,
};

pub struct Planner {
    engine: Engine,
    step: Step,
    upcoming: usize,
}

impl Planner {
    pub fn new(engine: Engine, step: Step, upcoming: usize) -> Self {
        Self {
            engine,
            step,
            upcoming,
        }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Foods(command) => self.foods(command).await,
            Command::Budget(command) => self.budget(command).await,
            Command::Meals(command) => self.meals(command).await,
            Command::Allocation(command) => self.allocation(command).await,
            Command::Ingredients(command) => self.ingredients(command).await,
            Command::Journal(command) => self.journal(command).await,
        }
    }

    async fn foods(&self, command: FoodsCommand) -> Result<()> {
        match command {
            FoodsCommand::Seed { file } => {
                let json = std::fs::read_to_string(&file)?;
                let catalog = FoodCatalog::from_json(&json)?;
                match self.engine.seed_foods(&catalog).await? {
                    0 => println!("foods already loaded, use `foods import` to update them"),
                    inserted => println!("seeded {inserted} foods from {}", file.display()),
                }
            }
            FoodsCommand::Import { file } => {
                let json = std::fs::read_to_string(&file)?;
                let catalog = FoodCatalog::from_json(&json)?;
                let written = self.engine.import_foods(&catalog).await?;
                println!("imported {written} foods from {}", file.display());
            }
            FoodsCommand::List { category } => {
                let catalog = self.engine.catalog().await?;
                let foods: Vec<&Food> = match category {
                    Some(category) => catalog.in_category(category),
                    None => catalog.foods().collect(),
                };
                print_foods(&foods);
            }
            FoodsCommand::Search { query } => {
                let catalog = self.engine.catalog().await?;
                print_foods(&catalog.search(&query));
            }
        }
        Ok(())
    }

    async fn budget(&self, command: BudgetCommand) -> Result<()> {
        match command {
            BudgetCommand::Show => {
                let ledger = self.engine.load_ledger(None).await?;
                println!("{:<20} {:>8} {:>10} {:>10}", "category", "daily", "allocated", "remaining");
                for (category, amount) in ledger.budget().all() {
                    println!(
                        "{:<20} {:>8} {:>10} {:>10}",
                        category.label(),
                        amount,
                        ledger.allocated(category),
                        ledger.remaining(category)
                    );
                }
                println!("planned: {:.2} kcal", ledger.budget().total_calories());
            }
            BudgetCommand::Set {
                category,
                amount,
                round,
            } => {
                let amount = parse_exchange_input(&amount, self.step, round)?;
                let mut budget = self.engine.daily_budget().await?;
                budget.set(category, amount);
                self.store_budget(&budget).await?;
                println!("{category}: {amount}");
            }
            BudgetCommand::Step {
                category,
                direction,
                step,
            } => {
                let step = step.unwrap_or(self.step);
                let mut budget = self.engine.daily_budget().await?;
                let amount = match direction {
                    Direction::Up => budget.increment(category, step),
                    Direction::Down => budget.decrement(category, step),
                };
                self.store_budget(&budget).await?;
                println!("{category}: {amount}");
            }
            BudgetCommand::Reset => {
                self.engine.reset_daily_budget(DailyBudget::new()).await?;
                println!("budget, meal allocations and ingredients cleared");
            }
        }
        Ok(())
    }

    async fn store_budget(&self, budget: &DailyBudget) -> Result<()> {
        if self.engine.save_daily_budget(budget).await? {
            println!("meal allocations were cleared, distribute the new budget again");
        }
        Ok(())
    }

    /// Loads the ledger for today, stepping by the configured step unless a
    /// command names another.
    async fn ledger(&self) -> Result<AllocationLedger> {
        let mut ledger = self.engine.load_ledger(Some(today())).await?;
        ledger.set_step(self.step);
        Ok(ledger)
    }

    async fn meals(&self, command: MealsCommand) -> Result<()> {
        match command {
            MealsCommand::List => {
                let meals = self.engine.meals().await?;
                for meal in &meals {
                    print_meal(meal, &meals);
                }
            }
            MealsCommand::Add { name, start, end } => {
                let meal = Meal::main(&name, start, end)?;
                self.engine.new_meal(&meal).await?;
                println!("added {} ({})", meal.name, meal.id);
            }
            MealsCommand::AddSnack {
                parent,
                name,
                start,
                end,
            } => {
                let meals = self.engine.meals().await?;
                let parent = find_meal(&meals, &parent)?;
                let snack = Meal::snack(&name, parent, start.zip(end))?;
                self.engine.new_meal(&snack).await?;
                println!(
                    "added {} {}-{} after {} ({})",
                    snack.name,
                    hhmm(snack.start),
                    hhmm(snack.end),
                    parent.name,
                    snack.id
                );
            }
            MealsCommand::Edit {
                meal,
                name,
                start,
                end,
            } => {
                let meals = self.engine.meals().await?;
                let mut edited = find_meal(&meals, &meal)?.clone();
                if let Some(name) = name {
                    edited.name = name.trim().to_string();
                }
                edited.start = start.unwrap_or(edited.start);
                edited.end = end.unwrap_or(edited.end);
                self.engine.update_meal(&edited).await?;
                print_meal(&edited, &meals);
            }
            MealsCommand::Remove { meal } => {
                let meals = self.engine.meals().await?;
                let meal = find_meal(&meals, &meal)?;
                let removed = self.engine.delete_meal(meal.id).await?;
                println!("removed {} meal(s)", removed.len());
                if self.engine.setup_status().await?.reallocation_required {
                    println!("the budget has to be redistributed across the remaining meals");
                }
            }
            MealsCommand::Clear => {
                let removed = self.engine.meals().await?.len();
                self.engine.clear_meals().await?;
                println!("removed {removed} meal(s)");
            }
            MealsCommand::Status { at } => {
                let now = at.unwrap_or_else(|| Local::now().time());
                let meals = self.engine.meals().await?;
                let schedule = schedule(&meals, now, self.upcoming);
                println!("at {}", hhmm(now));
                println!("current:");
                for meal in &schedule.current {
                    print_meal(meal, &meals);
                }
                println!("upcoming:");
                for meal in &schedule.upcoming {
                    print_meal(meal, &meals);
                }

                let status = self.engine.setup_status().await?;
                if !status.is_ready() {
                    println!(
                        "setup: budget {}, meals {}, distribution {}{}",
                        done(status.budget_set),
                        done(status.meals_set),
                        done(status.distribution_set),
                        if status.reallocation_required {
                            ", reallocation required"
                        } else {
                            ""
                        }
                    );
                }
            }
        }
        Ok(())
    }

    async fn allocation(&self, command: AllocationCommand) -> Result<()> {
        match command {
            AllocationCommand::Show => {
                let meals = self.engine.meals().await?;
                let ledger = self.ledger().await?;
                for meal in &meals {
                    println!("{} ({:.2} kcal)", meal.name, ledger.meal_calories(meal.id));
                    if let Some(allocation) = ledger.allocation(meal.id) {
                        for (category, amount) in allocation.iter() {
                            println!("  {:<20} {:>6}", category.label(), amount);
                        }
                    }
                }
                let left: Vec<String> = Category::ALL
                    .into_iter()
                    .filter(|category| ledger.remaining(*category).is_positive())
                    .map(|category| format!("{category} {}", ledger.remaining(category)))
                    .collect();
                if left.is_empty() {
                    println!("budget fully distributed");
                } else {
                    println!("left: {}", left.join(", "));
                }
                if ledger.reallocation_required() {
                    println!("reallocation required, run `allocation confirm` when done");
                }
            }
            AllocationCommand::Step {
                meal,
                category,
                direction,
                step,
            } => {
                let meals = self.engine.meals().await?;
                let meal = find_meal(&meals, &meal)?;
                let mut ledger = self.ledger().await?;
                let step = step.unwrap_or(ledger.step());
                let amount = match direction {
                    Direction::Up => ledger.increment_meal_allocation(meal.id, category, step),
                    Direction::Down => ledger.decrement_meal_allocation(meal.id, category, step),
                };
                self.engine.save_ledger(&mut ledger).await?;
                if let Some(amount) = amount {
                    println!(
                        "{} {category}: {amount} ({} left)",
                        meal.name,
                        ledger.remaining(category)
                    );
                }
            }
            AllocationCommand::Confirm => {
                let mut ledger = self.ledger().await?;
                ledger.acknowledge_reallocation()?;
                self.engine.save_ledger(&mut ledger).await?;
                info!("reallocation confirmed");
                println!("distribution confirmed");
            }
        }
        Ok(())
    }

    async fn ingredients(&self, command: IngredientsCommand) -> Result<()> {
        let meals = self.engine.meals().await?;
        let mut ledger = self.ledger().await?;

        let meal_id = match command {
            IngredientsCommand::Show { meal } => {
                let meal = find_meal(&meals, &meal)?;
                print_ingredients(&ledger, meal);
                return Ok(());
            }
            IngredientsCommand::Add { meal, food } => {
                let meal = find_meal(&meals, &meal)?;
                let catalog = self.engine.catalog().await?;
                let food = find_food(&catalog, &food)?;
                ledger.add_food(meal.id, food.id, &catalog)?;
                meal.id
            }
            IngredientsCommand::Set {
                meal,
                food,
                amount,
                round,
            } => {
                let meal = find_meal(&meals, &meal)?;
                let catalog = self.engine.catalog().await?;
                let food = find_food(&catalog, &food)?;
                let amount = parse_exchange_input(&amount, ledger.step(), round)?;
                let key = key_of(food);
                if ledger.ingredient(meal.id, key).is_some() {
                    ledger.adjust_ingredient_amount(meal.id, key, amount)?;
                } else if amount.is_positive() {
                    ledger.allocate_ingredient(meal.id, SelectedIngredient::from_food(food, amount)?)?;
                }
                meal.id
            }
            IngredientsCommand::Remove { meal, food } => {
                let meal = find_meal(&meals, &meal)?;
                let catalog = self.engine.catalog().await?;
                ledger.remove_ingredient(meal.id, key_of(find_food(&catalog, &food)?));
                meal.id
            }
            IngredientsCommand::Measure {
                meal,
                food,
                quantity,
                step,
            } => {
                let meal = find_meal(&meals, &meal)?;
                let catalog = self.engine.catalog().await?;
                let food = find_food(&catalog, &food)?;
                let step = step.unwrap_or(ledger.step());
                match ledger.apply_measured_quantity(meal.id, key_of(food), quantity, step)? {
                    Some(amount) => println!("{}: {amount} exchanges", food.name),
                    None => println!("{} is not part of {}", food.name, meal.name),
                }
                meal.id
            }
            IngredientsCommand::Unit {
                meal,
                food,
                state,
                unit,
            } => {
                let meal = find_meal(&meals, &meal)?;
                let catalog = self.engine.catalog().await?;
                let food = find_food(&catalog, &food)?;
                ledger.change_measurement(meal.id, key_of(food), state, &unit, &catalog)?;
                meal.id
            }
        };

        self.engine.save_ledger(&mut ledger).await?;
        if let Some(meal) = meals.iter().find(|meal| meal.id == meal_id) {
            print_ingredients(&ledger, meal);
        }
        Ok(())
    }

    async fn journal(&self, command: JournalCommand) -> Result<()> {
        match command {
            JournalCommand::Save { meal } => {
                let meals = self.engine.meals().await?;
                let meal = find_meal(&meals, &meal)?;
                let ledger = self.ledger().await?;
                let entry = ledger.journal_entry(meal, now())?;
                let stored = self.engine.save_journal(&entry).await?;
                println!(
                    "saved {} on {} ({:.2} kcal)",
                    stored.meal_name,
                    stored.recorded_on(),
                    stored.total_calories
                );
            }
            JournalCommand::List => {
                for entry in self.engine.journal_entries().await? {
                    let foods: Vec<&str> = entry
                        .ingredients
                        .iter()
                        .map(|ingredient| ingredient.name.as_str())
                        .collect();
                    println!(
                        "{} {:<16} {:>8.2} kcal  {}",
                        entry.recorded_at.format("%Y-%m-%d %H:%M"),
                        entry.meal_name,
                        entry.total_calories,
                        foods.join(", ")
                    );
                }
            }
            JournalCommand::Export { file } => {
                let entries = self.engine.journal_entries().await?;
                let rows = export::export_journal(&entries, &file)?;
                println!("exported {rows} rows to {}", file.display());
            }
        }
        Ok(())
    }
}

/// Looks a meal up by id, then by case-insensitive name.
fn find_meal<'a>(meals: &'a [Meal], query: &str) -> Result<&'a Meal> {
    let query = query.trim();
    let found = match Uuid::parse_str(query) {
        Ok(id) => meals.iter().find(|meal| meal.id == id),
        Err(_) => meals
            .iter()
            .find(|meal| meal.name.to_lowercase() == query.to_lowercase()),
    };
    found.ok_or_else(|| EngineError::KeyNotFound(format!("meal {query}")).into())
}

/// Looks a food up by id, exact name or a search with a single match.
fn find_food<'a>(catalog: &'a FoodCatalog, query: &str) -> Result<&'a Food> {
    let query = query.trim();
    if let Ok(id) = query.parse::<i32>() {
        return Ok(catalog.food(id)?);
    }
    let matches = catalog.search(query);
    if let Some(exact) = matches
        .iter()
        .find(|food| food.name.to_lowercase() == query.to_lowercase())
    {
        return Ok(*exact);
    }
    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(EngineError::KeyNotFound(format!("food {query}")).into()),
        _ => Err(EngineError::KeyNotFound(format!(
            "food {query}: {} matches, use the id",
            matches.len()
        ))
        .into()),
    }
}

fn key_of(food: &Food) -> IngredientKey {
    IngredientKey {
        food_id: food.id,
        category: food.category,
    }
}

fn print_foods(foods: &[&Food]) {
    for food in foods {
        let default = &food.default_measurement;
        println!(
            "{:>5}  {:<28} {:<20} {} {}",
            food.id,
            food.name,
            food.category.label(),
            default.state,
            default.unit
        );
    }
}

fn print_meal(meal: &Meal, meals: &[Meal]) {
    let parent = meal
        .parent_id
        .and_then(|id| meals.iter().find(|other| other.id == id))
        .map(|parent| format!(" after {}", parent.name))
        .unwrap_or_default();
    println!(
        "{} {:<16} {}-{} {}{parent}",
        meal.id,
        meal.name,
        hhmm(meal.start),
        hhmm(meal.end),
        meal.kind.as_str()
    );
}

fn print_ingredients(ledger: &AllocationLedger, meal: &Meal) {
    println!("{}", meal.name);
    for ingredient in ledger.ingredients(meal.id) {
        println!(
            "  {:<24} {:>6} x  {} {} ({}, {:.2} kcal)",
            ingredient.name,
            ingredient.amount,
            ingredient.quantity(),
            ingredient.unit,
            ingredient.state,
            ingredient.calories()
        );
    }
    if let Some(allocation) = ledger.allocation(meal.id) {
        for (category, allowed) in allocation.iter() {
            println!(
                "  {:<24} {} of {}",
                category.label(),
                ledger.used_in_category(meal.id, category),
                allowed
            );
        }
    }
    if ledger.is_meal_complete(meal.id) {
        println!("  complete, {:.2} kcal", ledger.ingredient_calories(meal.id));
    }
}

fn hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn done(flag: bool) -> &'static str {
    if flag { "done" } else { "missing" }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn today() -> chrono::NaiveDate {
    now().date()
}
