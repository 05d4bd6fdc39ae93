//! Read-only views for whatever renders the ledger.

use serde::Serialize;

use crate::db::LedgerStore;
use crate::error::Result;
use crate::ledger::{NutritionLedger, Rollover};
use crate::models::{CalorieProgress, DayKey, EntryOrder, GoalTargets, LogEntry, NutrientTotals};

/// Number of entries shown in the dashboard's recent list.
pub const RECENT_PREVIEW_LIMIT: usize = 3;

/// Eaten vs. target for a single macro.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroProgress {
    pub eaten_g: f64,
    pub goal_g: f64,
    /// Clamped to 0..=100.
    pub percent: f64,
}

impl MacroProgress {
    #[must_use]
    pub fn compute(eaten_g: f64, goal_g: f64) -> Self {
        Self {
            eaten_g,
            goal_g,
            percent: CalorieProgress::compute(eaten_g, goal_g).percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroBreakdown {
    pub protein: MacroProgress,
    pub carbs: MacroProgress,
    pub fat: MacroProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub day_key: DayKey,
    pub has_profile: bool,
    pub remaining_calories: f64,
    pub progress_percent: f64,
    pub raw_progress_percent: f64,
    pub exceeded_goal: bool,
    pub totals: NutrientTotals,
    pub goals: GoalTargets,
    pub macros: MacroBreakdown,
    /// Newest first, at most [`RECENT_PREVIEW_LIMIT`] entries.
    pub recent_entries: Vec<LogEntry>,
    pub entry_count: usize,
    /// Set once, on the first view after the log was reset for a new day.
    pub rollover: Option<Rollover>,
}

impl DashboardView {
    /// Assemble a view from a day's entries (oldest first) and the active goals.
    #[must_use]
    pub fn build(
        day_key: DayKey,
        has_profile: bool,
        goals: GoalTargets,
        entries: &[LogEntry],
    ) -> Self {
        let totals = NutrientTotals::sum(entries);
        let progress = CalorieProgress::compute(totals.calories_kcal, goals.calories_kcal);
        Self {
            day_key,
            has_profile,
            remaining_calories: (goals.calories_kcal - totals.calories_kcal).max(0.0),
            progress_percent: progress.percent,
            raw_progress_percent: progress.raw_percent,
            exceeded_goal: progress.exceeded,
            totals,
            goals,
            macros: MacroBreakdown {
                protein: MacroProgress::compute(totals.protein_g, goals.protein_g),
                carbs: MacroProgress::compute(totals.carbs_g, goals.carbs_g),
                fat: MacroProgress::compute(totals.fat_g, goals.fat_g),
            },
            recent_entries: entries
                .iter()
                .rev()
                .take(RECENT_PREVIEW_LIMIT)
                .cloned()
                .collect(),
            entry_count: entries.len(),
            rollover: None,
        }
    }
}

/// What a dashboard needs from the ledger. Both calls apply the day check first.
pub trait PresentationPort {
    fn dashboard_view(&mut self, today: DayKey) -> Result<DashboardView>;

    /// Every entry for the day, newest first.
    fn full_log(&mut self, today: DayKey) -> Result<Vec<LogEntry>>;
}

impl<S: LedgerStore> PresentationPort for NutritionLedger<S> {
    fn dashboard_view(&mut self, today: DayKey) -> Result<DashboardView> {
        let entries = self.list_entries(today, EntryOrder::Chronological)?;
        let mut view = DashboardView::build(
            self.day_key(),
            self.profile().is_some(),
            self.goals(),
            &entries,
        );
        view.rollover = self.take_rollover();
        Ok(view)
    }

    fn full_log(&mut self, today: DayKey) -> Result<Vec<LogEntry>> {
        self.list_entries(today, EntryOrder::MostRecentFirst)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::catalog::FoodCatalog;
    use crate::db::MemoryStore;
    use crate::models::{Sex, UserProfile};

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn ledger_with(names: &[&str]) -> NutritionLedger<MemoryStore> {
        let catalog = FoodCatalog::builtin();
        let mut ledger = NutritionLedger::hydrate(MemoryStore::new(), day("2024-05-01")).unwrap();
        for (i, name) in names.iter().enumerate() {
            let at = NaiveTime::from_hms_opt(8 + i as u32, 0, 0).unwrap();
            ledger
                .log_food(day("2024-05-01"), catalog.find_by_name(name).unwrap(), at)
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_empty_dashboard() {
        let mut ledger = ledger_with(&[]);
        let view = ledger.dashboard_view(day("2024-05-01")).unwrap();
        assert!(!view.has_profile);
        assert_eq!(view.goals, GoalTargets::DEFAULT);
        assert!((view.remaining_calories - 2000.0).abs() < f64::EPSILON);
        assert!((view.progress_percent - 0.0).abs() < f64::EPSILON);
        assert!(view.recent_entries.is_empty());
        assert_eq!(view.entry_count, 0);
        assert!(view.rollover.is_none());
    }

    #[test]
    fn test_recent_preview_is_newest_first_and_limited() {
        let mut ledger = ledger_with(&["apple", "banana", "chapati", "oatmeal", "egg"]);
        let view = ledger.dashboard_view(day("2024-05-01")).unwrap();
        let names: Vec<&str> = view
            .recent_entries
            .iter()
            .map(|e| e.food.name.as_str())
            .collect();
        assert_eq!(names, vec!["Egg (Boiled)", "Oatmeal", "Chapati"]);
        assert_eq!(view.entry_count, 5);
    }

    #[test]
    fn test_dashboard_numbers() {
        let mut ledger = ledger_with(&["biryani", "dal", "paneer"]);
        ledger
            .set_profile(UserProfile {
                weight_kg: 70.0,
                height_cm: 175.0,
                age_years: 30,
                sex: Sex::Male,
            })
            .unwrap();
        let view = ledger.dashboard_view(day("2024-05-01")).unwrap();

        assert!(view.has_profile);
        // 292 + 300 + 260 = 852 of 1979
        assert!((view.totals.calories_kcal - 852.0).abs() < 1e-9);
        assert!((view.remaining_calories - 1127.0).abs() < 1e-9);
        assert!((view.progress_percent - 852.0 / 1979.0 * 100.0).abs() < 1e-9);
        assert!(!view.exceeded_goal);
        // 12 + 10 + 18 = 40 of 148
        assert!((view.macros.protein.eaten_g - 40.0).abs() < 1e-9);
        assert!((view.macros.protein.goal_g - 148.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dashboard_over_goal() {
        let entries: Vec<LogEntry> = ledger_with(&["dal"]).entries().to_vec();
        let goals = GoalTargets {
            calories_kcal: 200.0,
            protein_g: 5.0,
            carbs_g: 100.0,
            fat_g: 10.0,
        };
        let view = DashboardView::build(day("2024-05-01"), true, goals, &entries);
        assert!((view.progress_percent - 100.0).abs() < f64::EPSILON);
        assert!((view.raw_progress_percent - 150.0).abs() < 1e-9);
        assert!(view.exceeded_goal);
        assert!((view.remaining_calories - 0.0).abs() < f64::EPSILON);
        assert!((view.macros.protein.percent - 100.0).abs() < f64::EPSILON);
        assert!((view.macros.carbs.percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_log_newest_first() {
        let mut ledger = ledger_with(&["apple", "banana", "chapati", "oatmeal"]);
        let log = ledger.full_log(day("2024-05-01")).unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log[0].food.name, "Oatmeal");
        assert_eq!(log[3].food.name, "Apple");
        assert_eq!(log[3].logged_at, "08:00");
    }

    #[test]
    fn test_dashboard_applies_rollover() {
        let mut ledger = ledger_with(&["apple", "banana"]);
        let view = ledger.dashboard_view(day("2024-05-02")).unwrap();
        assert_eq!(view.day_key, day("2024-05-02"));
        assert_eq!(view.entry_count, 0);
        let rollover = view.rollover.unwrap();
        assert_eq!(rollover.from, day("2024-05-01"));
        assert_eq!(rollover.cleared_entries, 2);

        // Reported once.
        let again = ledger.dashboard_view(day("2024-05-02")).unwrap();
        assert!(again.rollover.is_none());
        assert!(ledger.full_log(day("2024-05-02")).unwrap().is_empty());
    }
}
