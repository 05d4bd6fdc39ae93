use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "NUTRI_DATA_DIR";
pub const CATALOG_ENV: &str = "NUTRI_CATALOG";

pub struct Config {
    pub db_path: PathBuf,
    pub catalog_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "nutri")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        let catalog_override = std::env::var_os(CATALOG_ENV).map(PathBuf::from);
        Self::in_dir(&data_dir, catalog_override)
    }

    pub fn in_dir(data_dir: &Path, catalog_override: Option<PathBuf>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("nutri.db"),
            catalog_path: catalog_override.unwrap_or_else(|| data_dir.join("catalog.csv")),
        })
    }
}
