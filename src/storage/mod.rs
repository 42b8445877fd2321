//! Persistence layer.
//!
//! Flat JSON-file storage: each store keeps its full record set in
//! memory and rewrites its file after every mutation. Repositories sit
//! behind traits so the server can be tested against in-memory doubles;
//! the computation core has no dependency on any of this.

pub mod history;
pub mod users;

pub use history::{AnalysisRepository, JsonAnalysisStore};
pub use users::{JsonUserStore, UserRepository};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Save a serializable value to a JSON file, creating parent directories
/// as needed.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise record set")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), "Records saved");
    Ok(())
}

/// Load a value from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        info!(path = %path.display(), "No saved records found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let value: T = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
