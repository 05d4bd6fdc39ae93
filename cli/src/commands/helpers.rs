use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutri_core::models::{DayKey, FoodItem, LogEntry};

/// Resolve the day the ledger should treat as "today".
pub(crate) fn parse_day(date_str: Option<&str>) -> Result<DayKey> {
    let today = Local::now().date_naive();
    let date = match date_str {
        None | Some("today") => today,
        Some("yesterday") => today - chrono::Duration::days(1),
        Some("tomorrow") => today + chrono::Duration::days(1),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| {
            format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
        })?,
    };
    Ok(DayKey::new(date))
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

/// Ask a yes/no question on stderr. Anything but `y`/`yes` is a no.
pub(crate) fn prompt_confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N]: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let Some(line) = stdin.lock().lines().next() else {
        return Ok(false);
    };
    Ok(is_yes(&line?))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub(crate) fn print_food_table(foods: &[&FoodItem]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Kcal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
        #[tabled(rename = "Weight")]
        weight_class: String,
        #[tabled(rename = "Digestion")]
        digestion: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.id,
            name: truncate(&f.name, 30),
            calories: format!("{:.0}", f.calories_kcal),
            protein: format!("{:.1}", f.protein_g),
            carbs: format!("{:.1}", f.carbs_g),
            fat: format!("{:.1}", f.fat_g),
            weight_class: f.weight_class.to_string(),
            digestion: truncate(&f.digestion_estimate, 15),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_entry_table(entries: &[LogEntry]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Kcal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            time: e.logged_at.clone(),
            name: truncate(&e.food.name, 30),
            calories: format!("{:.0}", e.food.calories_kcal),
            protein: format!("{:.1}g", e.food.protein_g),
            carbs: format!("{:.1}g", e.food.carbs_g),
            fat: format!("{:.1}g", e.food.fat_g),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Fixed-width text bar for a 0..=100 percentage.
pub(crate) fn progress_bar(percent: f64, width: usize) -> String {
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
