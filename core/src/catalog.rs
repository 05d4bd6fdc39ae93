use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::{LedgerError, Result};
use crate::models::{FoodItem, WeightClass, validate_food_item};

/// Read-only set of foods the user can pick from. The ledger never holds a
/// reference into it; logged items are copies.
#[derive(Debug, Clone)]
pub struct FoodCatalog {
    items: Vec<FoodItem>,
}

#[allow(clippy::too_many_arguments)]
fn item(
    id: i64,
    name: &str,
    calories_kcal: f64,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    weight_class: WeightClass,
    digestion_estimate: &str,
) -> FoodItem {
    FoodItem {
        id,
        name: name.to_string(),
        calories_kcal,
        protein_g,
        carbs_g,
        fat_g,
        weight_class,
        digestion_estimate: digestion_estimate.to_string(),
    }
}

impl FoodCatalog {
    /// The bundled ten-item catalog.
    #[must_use]
    pub fn builtin() -> Self {
        use WeightClass::{Heavy, Light, Medium};
        Self {
            items: vec![
                item(1, "Apple", 52.0, 0.3, 14.0, 0.2, Light, "45 mins"),
                item(2, "Banana", 89.0, 1.1, 22.8, 0.3, Light, "45 mins"),
                item(3, "Chicken Biryani", 292.0, 12.0, 35.0, 11.0, Heavy, "3-4 hours"),
                item(4, "Dal Makhani", 300.0, 10.0, 25.0, 18.0, Heavy, "4 hours"),
                item(5, "Oatmeal", 68.0, 2.4, 12.0, 1.4, Medium, "2 hours"),
                item(6, "Grilled Chicken", 165.0, 31.0, 0.0, 3.6, Medium, "2.5 hours"),
                item(7, "Paneer Tikka", 260.0, 18.0, 6.0, 19.0, Heavy, "4 hours"),
                item(8, "Rice (White)", 130.0, 2.7, 28.0, 0.3, Medium, "2 hours"),
                item(9, "Chapati", 120.0, 3.0, 18.0, 4.0, Medium, "2 hours"),
                item(10, "Egg (Boiled)", 155.0, 13.0, 1.1, 11.0, Light, "1.5 hours"),
            ],
        }
    }

    /// Build a catalog from explicit items, validating each one.
    pub fn from_items(items: Vec<FoodItem>) -> Result<Self> {
        for food in &items {
            validate_food_item(food)?;
        }
        Ok(Self { items })
    }

    /// Load a catalog from a CSV file.
    pub fn from_csv_path(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open catalog: {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("Failed to load catalog: {}", path.display()))
    }

    /// Parse a catalog from CSV.
    ///
    /// Expected header:
    /// `id,name,calories,protein,carbs,fat,weight_class,digestion`
    ///
    /// `weight_class` defaults to `medium` and `digestion` to an empty string
    /// when the column is missing or blank.
    pub fn from_csv_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

        let required = ["id", "name", "calories", "protein", "carbs", "fat"];
        for name in &required {
            if !headers.iter().any(|h| h.eq_ignore_ascii_case(name)) {
                bail!("Missing required column: {name}");
            }
        }

        let col = |name: &str| -> Option<usize> {
            headers.iter().position(|h| h.eq_ignore_ascii_case(name))
        };

        let idx_id = col("id").context("Missing 'id' column")?;
        let idx_name = col("name").context("Missing 'name' column")?;
        let idx_cal = col("calories").context("Missing 'calories' column")?;
        let idx_protein = col("protein").context("Missing 'protein' column")?;
        let idx_carbs = col("carbs").context("Missing 'carbs' column")?;
        let idx_fat = col("fat").context("Missing 'fat' column")?;
        let idx_class = col("weight_class");
        let idx_digest = col("digestion");

        let mut items = Vec::new();

        for (line_num, result) in rdr.records().enumerate() {
            let line = line_num + 2;
            let record = result.with_context(|| format!("Failed to parse CSV row {line}"))?;

            let name = record.get(idx_name).unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }

            let parse_f64 = |idx: usize, column: &str| -> anyhow::Result<f64> {
                let raw = record.get(idx).unwrap_or("");
                raw.parse::<f64>()
                    .with_context(|| format!("Row {line}: invalid {column} '{raw}'"))
            };

            let id: i64 = record
                .get(idx_id)
                .unwrap_or("")
                .parse()
                .with_context(|| format!("Row {line}: invalid id"))?;

            let weight_class = match idx_class.and_then(|i| record.get(i)) {
                Some(v) if !v.is_empty() => v
                    .parse::<WeightClass>()
                    .with_context(|| format!("Row {line}"))?,
                _ => WeightClass::Medium,
            };

            let food = FoodItem {
                id,
                name,
                calories_kcal: parse_f64(idx_cal, "calories")?,
                protein_g: parse_f64(idx_protein, "protein")?,
                carbs_g: parse_f64(idx_carbs, "carbs")?,
                fat_g: parse_f64(idx_fat, "fat")?,
                weight_class,
                digestion_estimate: idx_digest
                    .and_then(|i| record.get(i))
                    .unwrap_or("")
                    .to_string(),
            };
            validate_food_item(&food).with_context(|| format!("Row {line}"))?;
            items.push(food);
        }

        if items.is_empty() {
            bail!("Catalog contains no foods");
        }

        tracing::debug!(count = items.len(), "loaded food catalog from csv");
        Ok(Self { items })
    }

    #[must_use]
    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get_by_id(&self, id: i64) -> Option<&FoodItem> {
        self.items.iter().find(|f| f.id == id)
    }

    /// A uniformly chosen food; `None` only for an empty catalog.
    pub fn random_item<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&FoodItem> {
        self.items.choose(rng)
    }

    /// All foods whose name contains `query`, case-insensitively, in catalog order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&FoodItem> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// First food whose name contains `query`, case-insensitively.
    pub fn find_by_name(&self, query: &str) -> Result<&FoodItem> {
        self.search(query)
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::NotFound(format!("No food found for '{}'", query.trim())))
    }
}

impl Default for FoodCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = FoodCatalog::builtin();
        assert_eq!(catalog.len(), 10);
        for food in catalog.items() {
            assert!(validate_food_item(food).is_ok(), "{} invalid", food.name);
        }
    }

    #[test]
    fn test_find_rice() {
        let catalog = FoodCatalog::builtin();
        let rice = catalog.find_by_name("rice").unwrap();
        assert_eq!(rice.name, "Rice (White)");
        assert!((rice.calories_kcal - 130.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_find_case_insensitive() {
        let catalog = FoodCatalog::builtin();
        assert_eq!(catalog.find_by_name("PANEER").unwrap().id, 7);
        assert_eq!(catalog.find_by_name("  egg ").unwrap().id, 10);
    }

    #[test]
    fn test_find_not_found() {
        let catalog = FoodCatalog::builtin();
        let err = catalog.find_by_name("zzz").unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn test_find_blank_query_not_found() {
        let catalog = FoodCatalog::builtin();
        assert!(catalog.find_by_name("   ").is_err());
        assert!(catalog.search("").is_empty());
    }

    #[test]
    fn test_search_returns_all_matches_in_order() {
        let catalog = FoodCatalog::builtin();
        let names: Vec<&str> = catalog
            .search("chicken")
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["Chicken Biryani", "Grilled Chicken"]);
    }

    #[test]
    fn test_random_item_is_from_catalog() {
        use rand::SeedableRng;
        let catalog = FoodCatalog::builtin();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..25 {
            let food = catalog.random_item(&mut rng).unwrap();
            assert_eq!(catalog.get_by_id(food.id), Some(food));
        }
    }

    #[test]
    fn test_random_item_empty_catalog() {
        let catalog = FoodCatalog::from_items(Vec::new()).unwrap();
        assert!(catalog.random_item(&mut rand::rng()).is_none());
    }

    #[test]
    fn test_get_by_id() {
        let catalog = FoodCatalog::builtin();
        assert_eq!(catalog.get_by_id(2).unwrap().name, "Banana");
        assert!(catalog.get_by_id(99).is_none());
    }

    #[test]
    fn test_from_items_rejects_negative() {
        let mut bad = FoodCatalog::builtin().items()[0].clone();
        bad.protein_g = -1.0;
        assert!(matches!(
            FoodCatalog::from_items(vec![bad]).unwrap_err(),
            LedgerError::InvalidFoodItem(_)
        ));
    }

    #[test]
    fn test_from_csv() {
        let csv = "id,name,calories,protein,carbs,fat,weight_class,digestion\n\
                   1,Idli,58,2,12,0.4,light,1 hour\n\
                   2,Masala Dosa,168,3.9,29,3.7,heavy,3 hours\n";
        let catalog = FoodCatalog::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        let dosa = catalog.find_by_name("dosa").unwrap();
        assert_eq!(dosa.weight_class, WeightClass::Heavy);
        assert_eq!(dosa.digestion_estimate, "3 hours");
    }

    #[test]
    fn test_from_csv_optional_columns() {
        let csv = "ID,Name,Calories,Protein,Carbs,Fat\n3,Curd,98,11,3.4,4.3\n";
        let catalog = FoodCatalog::from_csv_reader(csv.as_bytes()).unwrap();
        let curd = catalog.find_by_name("curd").unwrap();
        assert_eq!(curd.weight_class, WeightClass::Medium);
        assert!(curd.digestion_estimate.is_empty());
    }

    #[test]
    fn test_from_csv_missing_column() {
        let csv = "id,name,calories\n1,Apple,52\n";
        let err = FoodCatalog::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Missing required column"));
    }

    #[test]
    fn test_from_csv_negative_value() {
        let csv = "id,name,calories,protein,carbs,fat\n1,Bad,-5,0,0,0\n";
        assert!(FoodCatalog::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_from_csv_unparseable_number() {
        let csv = "id,name,calories,protein,carbs,fat\n1,Bad,lots,0,0,0\n";
        let err = FoodCatalog::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid calories"));
    }

    #[test]
    fn test_from_csv_empty() {
        let csv = "id,name,calories,protein,carbs,fat\n";
        assert!(FoodCatalog::from_csv_reader(csv.as_bytes()).is_err());
    }
}
