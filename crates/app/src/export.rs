//! CSV export of the food journal, one row per ingredient.
use std::{fs::File, io::Write, path::Path};

use csv::Writer;
use engine::JournalEntry;
use serde::Serialize;

use crate::error::Result;

#[derive(Serialize)]
struct JournalRow<'a> {
    recorded_at: String,
    meal: &'a str,
    food: &'a str,
    category: &'static str,
    state: &'static str,
    unit: &'a str,
    exchanges: f64,
    quantity: f64,
    calories: f64,
    meal_calories: f64,
}

/// Writes `entries` to `path` and returns the number of rows.
pub fn export_journal(entries: &[JournalEntry], path: &Path) -> Result<usize> {
    let rows = write_journal(entries, File::create(path)?)?;
    tracing::info!(rows, path = %path.display(), "journal exported");
    Ok(rows)
}

pub fn write_journal<W: Write>(entries: &[JournalEntry], out: W) -> Result<usize> {
    let mut writer = Writer::from_writer(out);
    let mut rows = 0;
    for entry in entries {
        let recorded_at = entry.recorded_at.format("%Y-%m-%d %H:%M").to_string();
        for ingredient in &entry.ingredients {
            writer.serialize(JournalRow {
                recorded_at: recorded_at.clone(),
                meal: &entry.meal_name,
                food: &ingredient.name,
                category: ingredient.category.label(),
                state: ingredient.state.as_str(),
                unit: &ingredient.unit,
                exchanges: ingredient.amount.as_f64(),
                quantity: ingredient.quantity(),
                calories: ingredient.calories(),
                meal_calories: entry.total_calories,
            })?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}
