use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;
use std::process;

use nutri_core::models::{DayKey, FoodItem, LogEntry};
use nutri_core::service::{FoodDetector, NutriService};

use super::helpers::{json_error, print_food_table, prompt_choice, prompt_confirm};

pub(crate) fn cmd_log(
    svc: &mut NutriService,
    today: DayKey,
    query: &str,
    first: bool,
    json: bool,
) -> Result<()> {
    let matches = svc.search_foods(query);

    let item: FoodItem = match matches.len() {
        0 => {
            let msg = format!("No food found for '{}'", query.trim());
            if json {
                println!("{}", json_error(&msg));
            } else {
                eprintln!("{msg}");
            }
            process::exit(2);
        }
        1 => matches.into_iter().next().context("No food found")?,
        _ if first || json => matches.into_iter().next().context("No food found")?,
        n => {
            let refs: Vec<&FoodItem> = matches.iter().collect();
            print_food_table(&refs);
            let idx = prompt_choice(n)?;
            matches.into_iter().nth(idx).context("Selection out of range")?
        }
    };

    let entry = svc.log_food(today, &item, Local::now().time())?;
    print_logged(&entry, json)
}

pub(crate) fn cmd_scan(
    svc: &mut NutriService,
    detector: &dyn FoodDetector,
    today: DayKey,
    image: &Path,
    json: bool,
) -> Result<()> {
    let bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read image: {}", image.display()))?;
    let entry = svc.log_detected(detector, &bytes, today, Local::now().time())?;
    if !json {
        let name = &entry.food.name;
        println!("Detected: {name}");
    }
    print_logged(&entry, json)
}

fn print_logged(entry: &LogEntry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }
    let f = &entry.food;
    let (name, time) = (&f.name, &entry.logged_at);
    let (cal, p, c, fat) = (f.calories_kcal, f.protein_g, f.carbs_g, f.fat_g);
    println!("Logged {name} at {time}: {cal:.0} kcal | P:{p:.1}g C:{c:.1}g F:{fat:.1}g");
    let (class, digestion) = (f.weight_class, &f.digestion_estimate);
    if !digestion.is_empty() {
        println!("  {class} meal, digests in about {digestion}");
    }
    Ok(())
}

pub(crate) fn cmd_clear(svc: &mut NutriService, yes: bool, json: bool) -> Result<()> {
    let count = svc.ledger().entries().len();
    if !yes && !prompt_confirm(&format!("Clear all {count} entries logged today?"))? {
        eprintln!("Aborted.");
        return Ok(());
    }
    svc.clear_log()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": count }));
    } else {
        println!("Cleared {count} entries.");
    }
    Ok(())
}

pub(crate) fn cmd_reset(
    svc: &mut NutriService,
    today: DayKey,
    yes: bool,
    json: bool,
) -> Result<()> {
    if !yes && !prompt_confirm("Delete your profile and today's log?")? {
        eprintln!("Aborted.");
        return Ok(());
    }
    svc.reset_all(today)?;

    if json {
        println!("{}", serde_json::json!({ "reset": true, "day": today }));
    } else {
        println!("All data reset.");
    }
    Ok(())
}
