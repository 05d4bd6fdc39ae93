use std::path::Path;

use chrono::NaiveTime;

use crate::catalog::FoodCatalog;
use crate::dashboard::{DashboardView, PresentationPort};
use crate::db::{LedgerStore, MemoryStore, SqliteStore};
use crate::error::{LedgerError, Result};
use crate::ledger::{NutritionLedger, Rollover};
use crate::models::{
    DayKey, EntryOrder, FoodItem, GoalTargets, LogEntry, NutrientTotals, UserProfile,
};

/// Turns a captured image into a food item.
///
/// The CLI ships a simulated detector that picks from the catalog; a real
/// recognizer can be plugged in without touching the ledger. Called
/// synchronously, so slow implementations belong on a blocking thread.
pub trait FoodDetector: Send + Sync {
    fn detect(&self, image: &[u8]) -> Result<FoodItem>;
}

pub struct NutriService {
    ledger: NutritionLedger<Box<dyn LedgerStore>>,
    catalog: FoodCatalog,
}

impl NutriService {
    pub fn new(db_path: &Path, catalog: FoodCatalog, today: DayKey) -> Result<Self> {
        let store = SqliteStore::open(db_path).map_err(LedgerError::Persistence)?;
        Self::with_store(Box::new(store), catalog, today)
    }

    /// Nothing survives the process.
    pub fn new_in_memory(catalog: FoodCatalog, today: DayKey) -> Result<Self> {
        Self::with_store(Box::new(MemoryStore::new()), catalog, today)
    }

    pub fn with_store(
        store: Box<dyn LedgerStore>,
        catalog: FoodCatalog,
        today: DayKey,
    ) -> Result<Self> {
        let ledger = NutritionLedger::hydrate(store, today)?;
        Ok(Self { ledger, catalog })
    }

    #[must_use]
    pub fn catalog(&self) -> &FoodCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn ledger(&self) -> &NutritionLedger<Box<dyn LedgerStore>> {
        &self.ledger
    }

    // --- Profile ---

    pub fn set_profile(&mut self, profile: UserProfile) -> Result<GoalTargets> {
        self.ledger.set_profile(profile)
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.ledger.profile()
    }

    #[must_use]
    pub fn goals(&self) -> GoalTargets {
        self.ledger.goals()
    }

    // --- Catalog ---

    #[must_use]
    pub fn search_foods(&self, query: &str) -> Vec<FoodItem> {
        self.catalog.search(query).into_iter().cloned().collect()
    }

    // --- Logging ---

    pub fn log_food(
        &mut self,
        today: DayKey,
        item: &FoodItem,
        logged_at: NaiveTime,
    ) -> Result<LogEntry> {
        self.ledger.log_food(today, item, logged_at)
    }

    /// Log the first catalog match for `query`. A miss leaves the ledger untouched.
    pub fn log_by_name(
        &mut self,
        today: DayKey,
        query: &str,
        logged_at: NaiveTime,
    ) -> Result<LogEntry> {
        let item = self.catalog.find_by_name(query)?.clone();
        self.ledger.log_food(today, &item, logged_at)
    }

    pub fn log_detected(
        &mut self,
        detector: &dyn FoodDetector,
        image: &[u8],
        today: DayKey,
        logged_at: NaiveTime,
    ) -> Result<LogEntry> {
        let item = detector.detect(image)?;
        tracing::debug!(name = %item.name, "detector matched food");
        self.ledger.log_food(today, &item, logged_at)
    }

    pub fn clear_log(&mut self) -> Result<()> {
        self.ledger.clear_log()
    }

    pub fn reset_all(&mut self, today: DayKey) -> Result<()> {
        self.ledger.reset_all(today)
    }

    // --- Reads ---

    pub fn totals(&mut self, today: DayKey) -> Result<NutrientTotals> {
        self.ledger.totals(today)
    }

    pub fn entries(&mut self, today: DayKey, order: EntryOrder) -> Result<Vec<LogEntry>> {
        self.ledger.list_entries(today, order)
    }

    pub fn dashboard(&mut self, today: DayKey) -> Result<DashboardView> {
        self.ledger.dashboard_view(today)
    }

    pub fn full_log(&mut self, today: DayKey) -> Result<Vec<LogEntry>> {
        self.ledger.full_log(today)
    }

    pub fn take_rollover(&mut self) -> Option<Rollover> {
        self.ledger.take_rollover()
    }
}
