use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

// --- Profile ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => Err(LedgerError::InvalidProfile(format!(
                "Invalid sex '{s}'. Must be one of: male, female"
            ))),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: i64,
    pub sex: Sex,
}

/// Validate onboarding input: every numeric field must be finite and positive.
pub fn validate_profile(profile: &UserProfile) -> Result<()> {
    if !profile.weight_kg.is_finite() || profile.weight_kg <= 0.0 {
        return Err(LedgerError::InvalidProfile(
            "weight_kg must be greater than 0".to_string(),
        ));
    }
    if !profile.height_cm.is_finite() || profile.height_cm <= 0.0 {
        return Err(LedgerError::InvalidProfile(
            "height_cm must be greater than 0".to_string(),
        ));
    }
    if profile.age_years <= 0 {
        return Err(LedgerError::InvalidProfile(
            "age_years must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

// --- Food ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightClass {
    Light,
    Medium,
    Heavy,
}

impl WeightClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
        }
    }
}

impl FromStr for WeightClass {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "medium" => Ok(Self::Medium),
            "heavy" => Ok(Self::Heavy),
            _ => Err(LedgerError::InvalidFoodItem(format!(
                "Invalid weight class '{s}'. Must be one of: light, medium, heavy"
            ))),
        }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub name: String,
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub weight_class: WeightClass,
    pub digestion_estimate: String,
}

/// Validate a food item before it is logged: name must not be empty,
/// nutrient values must be finite and not negative.
pub fn validate_food_item(food: &FoodItem) -> Result<()> {
    if food.name.trim().is_empty() {
        return Err(LedgerError::InvalidFoodItem(
            "Food name must not be empty".to_string(),
        ));
    }
    let fields = [
        ("calories_kcal", food.calories_kcal),
        ("protein_g", food.protein_g),
        ("carbs_g", food.carbs_g),
        ("fat_g", food.fat_g),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(LedgerError::InvalidFoodItem(format!(
                "{field} must be a finite number"
            )));
        }
        if value < 0.0 {
            return Err(LedgerError::InvalidFoodItem(format!(
                "{field} must not be negative"
            )));
        }
    }
    Ok(())
}

// --- Log ---

/// A food item copied into the log at the moment it was eaten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub entry_id: String,
    /// Local wall-clock time, `HH:MM`.
    pub logged_at: String,
    #[serde(flatten)]
    pub food: FoodItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryOrder {
    #[default]
    Chronological,
    MostRecentFirst,
}

// --- Targets and totals ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalTargets {
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl GoalTargets {
    /// Targets reported before a profile exists.
    pub const DEFAULT: Self = Self {
        calories_kcal: 2000.0,
        protein_g: 150.0,
        carbs_g: 250.0,
        fat_g: 70.0,
    };
}

impl Default for GoalTargets {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl NutrientTotals {
    #[must_use]
    pub fn sum<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |acc, e| Self {
                calories_kcal: acc.calories_kcal + e.food.calories_kcal,
                protein_g: acc.protein_g + e.food.protein_g,
                carbs_g: acc.carbs_g + e.food.carbs_g,
                fat_g: acc.fat_g + e.food.fat_g,
            })
    }
}

/// Calorie progress against the goal. `percent` is clamped to 0..=100;
/// `raw_percent` and `exceeded` keep the over-goal information.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalorieProgress {
    pub percent: f64,
    pub raw_percent: f64,
    pub exceeded: bool,
}

impl CalorieProgress {
    #[must_use]
    pub fn compute(eaten_kcal: f64, goal_kcal: f64) -> Self {
        if goal_kcal <= 0.0 {
            return Self {
                percent: 0.0,
                raw_percent: 0.0,
                exceeded: false,
            };
        }
        let raw_percent = eaten_kcal / goal_kcal * 100.0;
        Self {
            percent: raw_percent.clamp(0.0, 100.0),
            raw_percent,
            exceeded: eaten_kcal > goal_kcal,
        }
    }
}

// --- Day key ---

/// Calendar day, in local time, that the current log belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    #[must_use]
    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

// --- Snapshot ---

/// Everything the store needs to rebuild a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub profile: Option<UserProfile>,
    pub day_key: DayKey,
    pub entries: Vec<LogEntry>,
}

impl LedgerSnapshot {
    #[must_use]
    pub fn empty(day_key: DayKey) -> Self {
        Self {
            profile: None,
            day_key,
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> UserProfile {
        UserProfile {
            weight_kg: 70.0,
            height_cm: 175.0,
            age_years: 30,
            sex: Sex::Male,
        }
    }

    fn sample_food() -> FoodItem {
        FoodItem {
            id: 6,
            name: "Grilled Chicken".to_string(),
            calories_kcal: 165.0,
            protein_g: 31.0,
            carbs_g: 0.0,
            fat_g: 3.6,
            weight_class: WeightClass::Medium,
            digestion_estimate: "2.5 hours".to_string(),
        }
    }

    fn entry(cal: f64, p: f64, c: f64, f: f64) -> LogEntry {
        LogEntry {
            entry_id: "e".to_string(),
            logged_at: "12:00".to_string(),
            food: FoodItem {
                calories_kcal: cal,
                protein_g: p,
                carbs_g: c,
                fat_g: f,
                ..sample_food()
            },
        }
    }

    #[test]
    fn test_sex_parse() {
        assert_eq!("male".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("Female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(" F ".parse::<Sex>().unwrap(), Sex::Female);
    }

    #[test]
    fn test_sex_parse_unknown_is_invalid_profile() {
        let err = "other".parse::<Sex>().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidProfile(_)));
    }

    #[test]
    fn test_weight_class_parse() {
        assert_eq!("HEAVY".parse::<WeightClass>().unwrap(), WeightClass::Heavy);
        assert!(matches!(
            "huge".parse::<WeightClass>().unwrap_err(),
            LedgerError::InvalidFoodItem(_)
        ));
    }

    #[test]
    fn test_validate_profile_valid() {
        assert!(validate_profile(&sample_profile()).is_ok());
    }

    #[test]
    fn test_validate_profile_non_positive_fields() {
        let zero_weight = UserProfile {
            weight_kg: 0.0,
            ..sample_profile()
        };
        assert!(validate_profile(&zero_weight).is_err());

        let negative_height = UserProfile {
            height_cm: -170.0,
            ..sample_profile()
        };
        assert!(validate_profile(&negative_height).is_err());

        let zero_age = UserProfile {
            age_years: 0,
            ..sample_profile()
        };
        assert!(validate_profile(&zero_age).is_err());

        let nan_weight = UserProfile {
            weight_kg: f64::NAN,
            ..sample_profile()
        };
        assert!(validate_profile(&nan_weight).is_err());
    }

    #[test]
    fn test_validate_food_item() {
        assert!(validate_food_item(&sample_food()).is_ok());

        let negative_fat = FoodItem {
            fat_g: -1.0,
            ..sample_food()
        };
        let err = validate_food_item(&negative_fat).unwrap_err();
        assert!(err.to_string().contains("fat_g"));

        let blank = FoodItem {
            name: "  ".to_string(),
            ..sample_food()
        };
        assert!(validate_food_item(&blank).is_err());

        let infinite = FoodItem {
            calories_kcal: f64::INFINITY,
            ..sample_food()
        };
        assert!(validate_food_item(&infinite).is_err());
    }

    #[test]
    fn test_zero_nutrients_are_valid() {
        let water = FoodItem {
            name: "Water".to_string(),
            calories_kcal: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            ..sample_food()
        };
        assert!(validate_food_item(&water).is_ok());
    }

    #[test]
    fn test_totals_sum() {
        let entries = vec![entry(100.0, 10.0, 20.0, 5.0), entry(52.0, 0.3, 14.0, 0.2)];
        let totals = NutrientTotals::sum(&entries);
        assert!((totals.calories_kcal - 152.0).abs() < 1e-9);
        assert!((totals.protein_g - 10.3).abs() < 1e-9);
        assert!((totals.carbs_g - 34.0).abs() < 1e-9);
        assert!((totals.fat_g - 5.2).abs() < 1e-9);
    }

    #[test]
    fn test_totals_sum_empty() {
        let totals = NutrientTotals::sum(&[]);
        assert_eq!(totals, NutrientTotals::default());
    }

    #[test]
    fn test_progress_under_goal() {
        let p = CalorieProgress::compute(500.0, 2000.0);
        assert!((p.percent - 25.0).abs() < f64::EPSILON);
        assert!((p.raw_percent - 25.0).abs() < f64::EPSILON);
        assert!(!p.exceeded);
    }

    #[test]
    fn test_progress_clamped_over_goal() {
        let p = CalorieProgress::compute(2500.0, 2000.0);
        assert!((p.percent - 100.0).abs() < f64::EPSILON);
        assert!((p.raw_percent - 125.0).abs() < f64::EPSILON);
        assert!(p.exceeded);
    }

    #[test]
    fn test_progress_exactly_at_goal_not_exceeded() {
        let p = CalorieProgress::compute(2000.0, 2000.0);
        assert!((p.percent - 100.0).abs() < f64::EPSILON);
        assert!(!p.exceeded);
    }

    #[test]
    fn test_progress_zero_goal() {
        let p = CalorieProgress::compute(300.0, 0.0);
        assert!((p.percent - 0.0).abs() < f64::EPSILON);
        assert!(!p.exceeded);
    }

    #[test]
    fn test_day_key_parse_and_display() {
        let day: DayKey = "2024-05-01".parse().unwrap();
        assert_eq!(day.to_string(), "2024-05-01");
        assert_eq!(day.date(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!("05/01/2024".parse::<DayKey>().is_err());
    }

    #[test]
    fn test_day_key_serializes_as_date_string() {
        let day: DayKey = "2024-05-01".parse().unwrap();
        assert_eq!(serde_json::to_string(&day).unwrap(), "\"2024-05-01\"");
    }

    #[test]
    fn test_log_entry_flattens_food_fields() {
        let e = LogEntry {
            entry_id: "abc".to_string(),
            logged_at: "08:30".to_string(),
            food: sample_food(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["entry_id"], "abc");
        assert_eq!(json["name"], "Grilled Chicken");
        assert_eq!(json["weight_class"], "medium");

        let back: LogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
    }
}
