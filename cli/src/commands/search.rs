use anyhow::Result;
use std::process;

use nutri_core::models::FoodItem;
use nutri_core::service::NutriService;

use super::helpers::print_food_table;

pub(crate) fn cmd_search(svc: &NutriService, query: &str, json: bool) -> Result<()> {
    let results = svc.search_foods(query);

    if results.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No results found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        let refs: Vec<&FoodItem> = results.iter().collect();
        print_food_table(&refs);
    }
    Ok(())
}

pub(crate) fn cmd_catalog(svc: &NutriService, json: bool) -> Result<()> {
    let items = svc.catalog().items();

    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let refs: Vec<&FoodItem> = items.iter().collect();
        print_food_table(&refs);
    }
    Ok(())
}
