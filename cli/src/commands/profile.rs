use anyhow::Result;
use serde::Serialize;

use nutri_core::models::{GoalTargets, Sex, UserProfile};
use nutri_core::service::NutriService;

#[derive(Serialize)]
struct ProfileOutput<'a> {
    profile: Option<&'a UserProfile>,
    goals: GoalTargets,
}

pub(crate) fn cmd_profile_set(
    svc: &mut NutriService,
    weight_kg: f64,
    height_cm: f64,
    age_years: i64,
    sex: &str,
    json: bool,
) -> Result<()> {
    let profile = UserProfile {
        weight_kg,
        height_cm,
        age_years,
        sex: sex.parse::<Sex>()?,
    };
    let goals = svc.set_profile(profile)?;

    if json {
        let out = ProfileOutput {
            profile: svc.profile(),
            goals,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Profile saved.");
        print_goals(&goals);
    }
    Ok(())
}

pub(crate) fn cmd_profile_show(svc: &NutriService, json: bool) -> Result<()> {
    let goals = svc.goals();

    if json {
        let out = ProfileOutput {
            profile: svc.profile(),
            goals,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match svc.profile() {
        Some(p) => {
            let (weight, height, age, sex) = (p.weight_kg, p.height_cm, p.age_years, p.sex);
            println!("Weight: {weight} kg | Height: {height} cm | Age: {age} | Sex: {sex}");
        }
        None => {
            eprintln!("No profile set. Run `nutri profile set` to personalise your goals.");
            println!("Default goals:");
        }
    }
    print_goals(&goals);
    Ok(())
}

fn print_goals(goals: &GoalTargets) {
    let GoalTargets {
        calories_kcal,
        protein_g,
        carbs_g,
        fat_g,
    } = goals;
    println!("  {calories_kcal:.0} kcal/day | P:{protein_g:.0}g C:{carbs_g:.0}g F:{fat_g:.0}g");
}
