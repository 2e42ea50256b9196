use crate::infrastructure::{DuckDbStorage, LocalStorage, StorageAdapter};
use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::path::PathBuf;

/// Which storage adapter a session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// DuckDB database file (`journal.db`)
    #[default]
    Duckdb,
    /// Single JSON blob (`wawata-data.json`)
    Local,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Duckdb => "duckdb",
            Backend::Local => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub journal_dir: PathBuf,
    pub backend: Backend,
    pub log_level: String,
    pub log_to_file: bool,
    pub seed_defaults: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let journal_dir = lookup("WAWATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("wawata")
            });

        let backend = match lookup("WAWATA_BACKEND") {
            Some(raw) => match Backend::from_str(raw.trim(), true) {
                Ok(backend) => backend,
                Err(_) => bail!("WAWATA_BACKEND must be `duckdb` or `local`, got `{raw}`"),
            },
            None => Backend::default(),
        };

        let log_level = lookup("WAWATA_LOG").unwrap_or_else(|| "warn".to_string());
        let log_to_file = lookup("WAWATA_LOG_TO_FILE").is_some_and(|raw| parse_flag(&raw));
        let seed_defaults = lookup("WAWATA_SEED").is_none_or(|raw| parse_flag(&raw));

        Ok(Self {
            journal_dir,
            backend,
            log_level,
            log_to_file,
            seed_defaults,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.journal_dir.join("journal.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.journal_dir.join("logs")
    }

    /// Builds the configured storage adapter.
    pub fn open_storage(&self) -> Result<Box<dyn StorageAdapter>> {
        std::fs::create_dir_all(&self.journal_dir).with_context(|| {
            format!(
                "Failed to create journal directory {}",
                self.journal_dir.display()
            )
        })?;

        let storage: Box<dyn StorageAdapter> = match self.backend {
            Backend::Duckdb => Box::new(
                DuckDbStorage::new(self.db_path()).context("Failed to initialize DuckDB storage")?,
            ),
            Backend::Local => Box::new(
                LocalStorage::open(&self.journal_dir, self.seed_defaults)
                    .context("Failed to initialize local storage")?,
            ),
        };
        Ok(storage)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("WAWATA_DIR", "/tmp/wawata-test")])).unwrap();

        assert_eq!(config.backend, Backend::Duckdb);
        assert_eq!(config.log_level, "warn");
        assert!(!config.log_to_file);
        assert!(config.seed_defaults);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/wawata-test/journal.db"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("WAWATA_DIR", "/srv/journal"),
            ("WAWATA_BACKEND", "Local"),
            ("WAWATA_LOG", "debug"),
            ("WAWATA_LOG_TO_FILE", "true"),
            ("WAWATA_SEED", "0"),
        ]))
        .unwrap();

        assert_eq!(config.backend, Backend::Local);
        assert_eq!(config.log_level, "debug");
        assert!(config.log_to_file);
        assert!(!config.seed_defaults);
        assert_eq!(config.log_dir(), PathBuf::from("/srv/journal/logs"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("WAWATA_BACKEND", "supabase")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_storage_builds_selected_backend() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().join("journal");
        let dir = dir.to_str().unwrap();

        let local = Config::from_lookup(lookup_from(&[("WAWATA_DIR", dir), ("WAWATA_BACKEND", "local")]))
            .unwrap()
            .open_storage()
            .unwrap();
        assert_eq!(local.backend_info(), "Local JSON Storage Backend v1.0");
        assert_eq!(local.load().unwrap().sites.len(), 4);

        let duckdb = Config::from_lookup(lookup_from(&[("WAWATA_DIR", dir)]))
            .unwrap()
            .open_storage()
            .unwrap();
        assert_eq!(duckdb.backend_info(), "DuckDB Storage Backend v1.0");
        assert!(temp_dir.path().join("journal").join("journal.db").exists());
    }
}
