use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistence mode value that selects the relational backend.
pub const RELATIONAL_MODE: &str = "sqlite";

/// Store file name used when the config does not name one.
pub const DEFAULT_STORE_NAME: &str = "eavbase.db";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EavbaseConfig {
    /// Persistence mode; only [`RELATIONAL_MODE`] enables the store.
    pub persistence: Option<String>,
    pub base_dir: Option<String>,
    pub store_name: Option<String>,
}

impl EavbaseConfig {
    /// Config that enables the relational backend under `base_dir`.
    pub fn relational(base_dir: impl Into<String>) -> Self {
        Self {
            persistence: Some(RELATIONAL_MODE.to_string()),
            base_dir: Some(base_dir.into()),
            store_name: None,
        }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn store_name(&self) -> &str {
        self.store_name.as_deref().unwrap_or(DEFAULT_STORE_NAME)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("eavbase.toml")
}

/// `<base>/var/db/<store_name>`, shared by every class.
pub fn database_path_in(base: &Path, store_name: &str) -> PathBuf {
    base.join("var").join("db").join(store_name)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<EavbaseConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: EavbaseConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &EavbaseConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
