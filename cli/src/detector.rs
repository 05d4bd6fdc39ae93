use nutri_core::catalog::FoodCatalog;
use nutri_core::models::FoodItem;
use nutri_core::service::FoodDetector;
use nutri_core::{LedgerError, Result};

/// Stand-in recognizer: any non-empty image "contains" a random catalog food.
pub struct SimulatedDetector {
    catalog: FoodCatalog,
}

impl SimulatedDetector {
    pub fn new(catalog: FoodCatalog) -> Self {
        Self { catalog }
    }
}

impl FoodDetector for SimulatedDetector {
    fn detect(&self, image: &[u8]) -> Result<FoodItem> {
        if image.is_empty() {
            return Err(LedgerError::InvalidFoodItem("image is empty".to_string()));
        }
        let item = self
            .catalog
            .random_item(&mut rand::rng())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound("catalog has no foods".to_string()))?;
        tracing::debug!(bytes = image.len(), name = %item.name, "simulated detection");
        Ok(item)
    }
}
