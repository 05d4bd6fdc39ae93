//! Daily energy and macro targets from a user profile.
//!
//! Basal metabolic rate uses the Mifflin–St Jeor equation, scaled by a fixed
//! sedentary activity factor. There is no activity-level input.

use crate::error::{LedgerError, Result};
use crate::models::{GoalTargets, Sex, UserProfile, validate_profile};

pub const SEDENTARY_ACTIVITY_FACTOR: f64 = 1.2;

pub const PROTEIN_SHARE: f64 = 0.30;
pub const CARBS_SHARE: f64 = 0.40;
pub const FAT_SHARE: f64 = 0.30;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Basal metabolic rate in kcal/day.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn basal_metabolic_rate(profile: &UserProfile) -> f64 {
    let sex_offset = match profile.sex {
        Sex::Male => 5.0,
        Sex::Female => -161.0,
    };
    10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * profile.age_years as f64
        + sex_offset
}

/// Derive daily targets. Pure: the same profile always yields the same targets.
pub fn derive_goals(profile: &UserProfile) -> Result<GoalTargets> {
    validate_profile(profile)?;

    let calories = (basal_metabolic_rate(profile) * SEDENTARY_ACTIVITY_FACTOR).round();
    if calories <= 0.0 {
        return Err(LedgerError::InvalidProfile(format!(
            "profile yields a non-positive calorie target ({calories} kcal)"
        )));
    }

    Ok(GoalTargets {
        calories_kcal: calories,
        protein_g: (calories * PROTEIN_SHARE / KCAL_PER_G_PROTEIN).round(),
        carbs_g: (calories * CARBS_SHARE / KCAL_PER_G_CARBS).round(),
        fat_g: (calories * FAT_SHARE / KCAL_PER_G_FAT).round(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn male_70kg() -> UserProfile {
        UserProfile {
            weight_kg: 70.0,
            height_cm: 175.0,
            age_years: 30,
            sex: Sex::Male,
        }
    }

    #[test]
    fn test_bmr_male() {
        // 700 + 1093.75 - 150 + 5
        assert!((basal_metabolic_rate(&male_70kg()) - 1648.75).abs() < 1e-9);
    }

    #[test]
    fn test_bmr_female_offset() {
        let female = UserProfile {
            sex: Sex::Female,
            ..male_70kg()
        };
        // Same as male minus 166
        assert!((basal_metabolic_rate(&female) - 1482.75).abs() < 1e-9);
    }

    #[test]
    fn test_derive_goals_worked_example() {
        let goals = derive_goals(&male_70kg()).unwrap();
        // round(1648.75 * 1.2) = 1979
        assert!((goals.calories_kcal - 1979.0).abs() < f64::EPSILON);
        // round(1979 * 0.3 / 4) = 148
        assert!((goals.protein_g - 148.0).abs() < f64::EPSILON);
        // round(1979 * 0.4 / 4) = 198
        assert!((goals.carbs_g - 198.0).abs() < f64::EPSILON);
        // round(1979 * 0.3 / 9) = 66
        assert!((goals.fat_g - 66.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_derive_goals_female() {
        let female = UserProfile {
            weight_kg: 60.0,
            height_cm: 165.0,
            age_years: 25,
            sex: Sex::Female,
        };
        // bmr = 600 + 1031.25 - 125 - 161 = 1345.25; * 1.2 = 1614.3 -> 1614
        let goals = derive_goals(&female).unwrap();
        assert!((goals.calories_kcal - 1614.0).abs() < f64::EPSILON);
        // 1614 * 0.3 / 4 = 121.05 -> 121
        assert!((goals.protein_g - 121.0).abs() < f64::EPSILON);
        // 1614 * 0.4 / 4 = 161.4 -> 161
        assert!((goals.carbs_g - 161.0).abs() < f64::EPSILON);
        // 1614 * 0.3 / 9 = 53.8 -> 54
        assert!((goals.fat_g - 54.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_derive_goals_is_deterministic() {
        let first = derive_goals(&male_70kg()).unwrap();
        for _ in 0..10 {
            assert_eq!(derive_goals(&male_70kg()).unwrap(), first);
        }
    }

    #[test]
    fn test_derive_goals_rejects_non_positive_fields() {
        let bad = UserProfile {
            weight_kg: -5.0,
            ..male_70kg()
        };
        assert!(matches!(
            derive_goals(&bad).unwrap_err(),
            LedgerError::InvalidProfile(_)
        ));

        let bad_age = UserProfile {
            age_years: -1,
            ..male_70kg()
        };
        assert!(derive_goals(&bad_age).is_err());
    }

    #[test]
    fn test_derive_goals_rejects_non_positive_energy() {
        let implausible = UserProfile {
            weight_kg: 1.0,
            height_cm: 1.0,
            age_years: 120,
            sex: Sex::Female,
        };
        assert!(matches!(
            derive_goals(&implausible).unwrap_err(),
            LedgerError::InvalidProfile(_)
        ));
    }
}
