//! # Config - Store Locations
//!
//! Resolves where a symbol's data file and index file live.
//!
//! ```text
//! <data_dir>/<symbol>         raw fixed-size records, one block per date
//! <index_dir>/<symbol>.csv    "date,offset,count" lines
//! ```
//!
//! Settings come from the environment when running the CLI:
//!
//! ```text
//! BARSTORE_DATA_DIR   data file directory   (default: "data/bars")
//! BARSTORE_INDEX_DIR  index file directory  (default: "data/index")
//! ```

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

pub const DATA_DIR_VAR: &str = "BARSTORE_DATA_DIR";
pub const INDEX_DIR_VAR: &str = "BARSTORE_INDEX_DIR";

pub const DEFAULT_DATA_DIR: &str = "data/bars";
pub const DEFAULT_INDEX_DIR: &str = "data/index";

/// Extension of per-symbol index files.
pub const INDEX_EXTENSION: &str = "csv";

/// Directory layout of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub index_dir: PathBuf,
}

impl StoreConfig {
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(data_dir: P1, index_dir: P2) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            index_dir: index_dir.as_ref().to_path_buf(),
        }
    }

    /// Places the data and index directories side by side under `root`.
    pub fn under<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self::new(root.join("bars"), root.join("index"))
    }

    /// Reads the layout from `BARSTORE_DATA_DIR` / `BARSTORE_INDEX_DIR`,
    /// falling back to the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but empty or not valid unicode.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            env_or(DATA_DIR_VAR, DEFAULT_DATA_DIR)?,
            env_or(INDEX_DIR_VAR, DEFAULT_INDEX_DIR)?,
        ))
    }

    /// Path of `symbol`'s binary data file.
    pub fn data_file(&self, symbol: &str) -> Result<PathBuf> {
        validate_symbol(symbol)?;
        Ok(self.data_dir.join(symbol))
    }

    /// Path of `symbol`'s index file.
    pub fn index_file(&self, symbol: &str) -> Result<PathBuf> {
        index_file_in(&self.index_dir, symbol)
    }

    /// Creates both directories if they do not exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        std::fs::create_dir_all(&self.index_dir)
            .with_context(|| format!("failed to create {}", self.index_dir.display()))?;
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR, DEFAULT_INDEX_DIR)
    }
}

/// Rejects symbols that would escape the store directories when joined
/// onto them.
pub fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.is_empty() {
        bail!("symbol must not be empty");
    }
    if symbol == "." || symbol == ".." {
        bail!("invalid symbol '{}'", symbol);
    }
    if symbol.contains(['/', '\\']) || symbol.contains('\0') {
        bail!("symbol '{}' must not contain path separators", symbol);
    }
    Ok(())
}

/// Path of `symbol`'s index file inside `index_dir`, after validating the
/// symbol.
pub fn index_file_in(index_dir: &Path, symbol: &str) -> Result<PathBuf> {
    validate_symbol(symbol)?;
    Ok(index_dir.join(format!("{}.{}", symbol, INDEX_EXTENSION)))
}

fn env_or(key: &str, default: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(v) if v.trim().is_empty() => bail!("{} is set but empty", key),
        Ok(v) => Ok(v),
        Err(std::env::VarError::NotPresent) => Ok(default.to_string()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", key)),
    }
}
