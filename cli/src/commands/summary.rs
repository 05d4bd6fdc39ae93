use anyhow::Result;
use std::process;

use nutri_core::dashboard::MacroProgress;
use nutri_core::models::{DayKey, EntryOrder};
use nutri_core::service::NutriService;

use super::helpers::{no_neg_zero, print_entry_table, progress_bar};

const BAR_WIDTH: usize = 30;

pub(crate) fn cmd_summary(svc: &mut NutriService, today: DayKey, json: bool) -> Result<()> {
    let view = svc.dashboard(today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let day = view.day_key;
    println!("=== {day} ===\n");
    if !view.has_profile {
        eprintln!("No profile set, showing default goals.\n");
    }

    let remaining = no_neg_zero(view.remaining_calories);
    let eaten = no_neg_zero(view.totals.calories_kcal);
    let goal = view.goals.calories_kcal;
    let bar = progress_bar(view.progress_percent, BAR_WIDTH);
    let pct = view.progress_percent;
    println!("  {remaining:.0} kcal remaining ({eaten:.0} / {goal:.0})");
    println!("  {bar} {pct:.0}%");
    if view.exceeded_goal {
        let raw = view.raw_progress_percent;
        println!("  Over goal: {raw:.0}% of target eaten");
    }
    println!();

    print_macro("Protein", &view.macros.protein);
    print_macro("Carbs", &view.macros.carbs);
    print_macro("Fat", &view.macros.fat);
    println!();

    if view.recent_entries.is_empty() {
        println!("  Nothing logged yet today.");
    } else {
        let shown = view.recent_entries.len();
        let total = view.entry_count;
        println!("  Recent ({shown} of {total}):");
        print_entry_table(&view.recent_entries);
    }
    Ok(())
}

fn print_macro(label: &str, progress: &MacroProgress) {
    let eaten = no_neg_zero(progress.eaten_g);
    let goal = progress.goal_g;
    let bar = progress_bar(progress.percent, BAR_WIDTH / 2);
    println!("  {label:<8} {bar} {eaten:.0} / {goal:.0} g");
}

pub(crate) fn cmd_entries(
    svc: &mut NutriService,
    today: DayKey,
    oldest_first: bool,
    json: bool,
) -> Result<()> {
    let entries = if oldest_first {
        svc.entries(today, EntryOrder::Chronological)?
    } else {
        svc.full_log(today)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No entries for {today}");
        process::exit(2);
    }

    print_entry_table(&entries);
    let totals = svc.totals(today)?;
    let (cal, p, c, f) = (
        no_neg_zero(totals.calories_kcal),
        no_neg_zero(totals.protein_g),
        no_neg_zero(totals.carbs_g),
        no_neg_zero(totals.fat_g),
    );
    println!("  TOTAL: {cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
    Ok(())
}
