//! The daily nutrition ledger.
//!
//! A ledger is bound to one [`DayKey`]. Every operation that looks at the log
//! first compares that key to the caller's current day; when they differ the
//! log is emptied and the new day adopted before anything else happens.
//! Mutations are written through to the [`LedgerStore`] immediately.

use chrono::NaiveTime;
use serde::Serialize;
use uuid::Uuid;

use crate::db::LedgerStore;
use crate::error::Result;
use crate::goals::derive_goals;
use crate::models::{
    CalorieProgress, DayKey, EntryOrder, FoodItem, GoalTargets, LedgerSnapshot, LogEntry,
    NutrientTotals, UserProfile, validate_food_item,
};

/// A day change observed by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rollover {
    pub from: DayKey,
    pub to: DayKey,
    pub cleared_entries: usize,
}

pub struct NutritionLedger<S: LedgerStore> {
    store: S,
    profile: Option<UserProfile>,
    goals: GoalTargets,
    day_key: DayKey,
    entries: Vec<LogEntry>,
    last_rollover: Option<Rollover>,
}

impl<S: LedgerStore> NutritionLedger<S> {
    /// Build a ledger from whatever the store holds, then apply the day check.
    ///
    /// An empty store yields an empty ledger bound to `today`. A stored
    /// profile that no longer validates is dropped so onboarding can run again.
    pub fn hydrate(store: S, today: DayKey) -> Result<Self> {
        let snapshot = store.load()?;
        let Some(snapshot) = snapshot else {
            tracing::debug!(day = %today, "no stored ledger, starting fresh");
            return Ok(Self::empty(store, today));
        };

        let (profile, goals) = match snapshot.profile {
            Some(profile) => match derive_goals(&profile) {
                Ok(goals) => (Some(profile), goals),
                Err(err) => {
                    tracing::warn!(error = %err, "discarding stored profile");
                    (None, GoalTargets::DEFAULT)
                }
            },
            None => (None, GoalTargets::DEFAULT),
        };

        let mut ledger = Self {
            store,
            profile,
            goals,
            day_key: snapshot.day_key,
            entries: snapshot.entries,
            last_rollover: None,
        };
        ledger.ensure_day(today)?;
        Ok(ledger)
    }

    fn empty(store: S, day_key: DayKey) -> Self {
        Self {
            store,
            profile: None,
            goals: GoalTargets::DEFAULT,
            day_key,
            entries: Vec::new(),
            last_rollover: None,
        }
    }

    // --- Day boundary ---

    /// Clear the log and adopt `today` if it differs from the bound day.
    /// Returns whether a rollover happened.
    fn roll_over(&mut self, today: DayKey) -> bool {
        if today == self.day_key {
            return false;
        }
        if today < self.day_key {
            tracing::warn!(
                stored = %self.day_key,
                today = %today,
                "current day is before stored day"
            );
        }
        let rollover = Rollover {
            from: self.day_key,
            to: today,
            cleared_entries: self.entries.len(),
        };
        self.entries.clear();
        self.day_key = today;
        self.last_rollover = Some(rollover);
        tracing::info!(
            from = %rollover.from,
            to = %rollover.to,
            cleared = rollover.cleared_entries,
            "new day, log reset"
        );
        true
    }

    fn ensure_day(&mut self, today: DayKey) -> Result<()> {
        if self.roll_over(today) {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.snapshot()).inspect_err(|err| {
            tracing::warn!(error = %err, "ledger write failed, in-memory state kept");
        })
    }

    // --- Mutations ---

    /// Store a new or edited profile and recompute goals from it.
    ///
    /// An invalid profile leaves the ledger untouched.
    pub fn set_profile(&mut self, profile: UserProfile) -> Result<GoalTargets> {
        let goals = derive_goals(&profile)?;
        tracing::info!(
            sex = %profile.sex,
            calories = goals.calories_kcal,
            "profile updated"
        );
        self.profile = Some(profile);
        self.goals = goals;
        self.persist()?;
        Ok(goals)
    }

    /// Append a copy of `item` to today's log.
    ///
    /// The item does not have to come from a catalog; any well-formed item is
    /// accepted. Validation happens before the day check, so a rejected item
    /// never causes a rollover.
    pub fn log_food(
        &mut self,
        today: DayKey,
        item: &FoodItem,
        logged_at: NaiveTime,
    ) -> Result<LogEntry> {
        validate_food_item(item)?;
        self.roll_over(today);

        let entry = LogEntry {
            entry_id: Uuid::new_v4().to_string(),
            logged_at: logged_at.format("%H:%M").to_string(),
            food: item.clone(),
        };
        self.entries.push(entry.clone());
        tracing::debug!(name = %entry.food.name, entries = self.entries.len(), "food logged");
        self.persist()?;
        Ok(entry)
    }

    /// Empty today's log without touching the bound day.
    pub fn clear_log(&mut self) -> Result<()> {
        let cleared = self.entries.len();
        self.entries.clear();
        tracing::info!(cleared, "log cleared");
        self.persist()
    }

    /// Drop profile and log, restore default goals, and bind to `today`.
    pub fn reset_all(&mut self, today: DayKey) -> Result<()> {
        self.profile = None;
        self.goals = GoalTargets::DEFAULT;
        self.entries.clear();
        self.day_key = today;
        self.last_rollover = None;
        tracing::info!(day = %today, "ledger reset");
        self.persist()
    }

    // --- Reads (after the day check) ---

    pub fn totals(&mut self, today: DayKey) -> Result<NutrientTotals> {
        self.ensure_day(today)?;
        Ok(NutrientTotals::sum(&self.entries))
    }

    /// Calories left for the day; never negative.
    pub fn remaining_calories(&mut self, today: DayKey) -> Result<f64> {
        let totals = self.totals(today)?;
        Ok((self.goals.calories_kcal - totals.calories_kcal).max(0.0))
    }

    pub fn progress(&mut self, today: DayKey) -> Result<CalorieProgress> {
        let totals = self.totals(today)?;
        Ok(CalorieProgress::compute(
            totals.calories_kcal,
            self.goals.calories_kcal,
        ))
    }

    /// Clamped to 100. Use [`Self::progress`] to tell whether the goal was exceeded.
    pub fn progress_percent(&mut self, today: DayKey) -> Result<f64> {
        Ok(self.progress(today)?.percent)
    }

    /// Today's entries in the requested order. The stored order is untouched.
    pub fn list_entries(&mut self, today: DayKey, order: EntryOrder) -> Result<Vec<LogEntry>> {
        self.ensure_day(today)?;
        let entries = match order {
            EntryOrder::Chronological => self.entries.clone(),
            EntryOrder::MostRecentFirst => self.entries.iter().rev().cloned().collect(),
        };
        Ok(entries)
    }

    // --- Plain accessors (no day check) ---

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn goals(&self) -> GoalTargets {
        self.goals
    }

    #[must_use]
    pub fn day_key(&self) -> DayKey {
        self.day_key
    }

    /// Entries as stored, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The most recent rollover, if one happened since the last call.
    pub fn take_rollover(&mut self) -> Option<Rollover> {
        self.last_rollover.take()
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            profile: self.profile.clone(),
            day_key: self.day_key,
            entries: self.entries.clone(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}
