//! Uploader identity storage.
//!
//! The backend attributes uploads to an opaque owner token. The token is
//! resolved from the `SEEDSCOPE_OWNER_ID` environment variable when set,
//! otherwise from `~/.seedscope/identity.json`, and is generated and
//! persisted on first use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identity data structure stored in identity.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityData {
    owner_id: String,
}

/// Persistent uploader identity store
pub struct IdentityStore {
    identity_path: PathBuf,
}

impl IdentityStore {
    /// Create a new identity store
    ///
    /// # Arguments
    /// * `cache_dir` - Optional custom cache directory. Defaults to ~/.seedscope
    pub fn new(cache_dir: Option<String>) -> Result<Self> {
        let base_dir = match cache_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".seedscope"),
        };

        std::fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", base_dir))?;

        Ok(Self {
            identity_path: base_dir.join("identity.json"),
        })
    }

    /// Get the identity file path
    pub fn identity_path(&self) -> &PathBuf {
        &self.identity_path
    }

    /// Resolve the owner id.
    ///
    /// Priority:
    /// 1. SEEDSCOPE_OWNER_ID environment variable
    /// 2. identity.json file
    /// 3. freshly generated id, persisted for later runs
    pub fn owner_id(&self) -> Result<String> {
        if let Ok(id) = std::env::var("SEEDSCOPE_OWNER_ID") {
            if !id.is_empty() {
                debug!("Using owner id from SEEDSCOPE_OWNER_ID environment variable");
                return Ok(id);
            }
        }

        if self.identity_path.exists() {
            let content = std::fs::read_to_string(&self.identity_path).with_context(|| {
                format!("Failed to read identity file: {:?}", self.identity_path)
            })?;
            match serde_json::from_str::<IdentityData>(&content) {
                Ok(data) if !data.owner_id.is_empty() => return Ok(data.owner_id),
                Ok(_) => warn!("Identity file has an empty owner id, regenerating"),
                Err(e) => warn!("Failed to parse identity file, regenerating: {}", e),
            }
        }

        let owner_id = Uuid::new_v4().to_string();
        self.save(&owner_id)?;
        info!("Generated new uploader identity");
        Ok(owner_id)
    }

    fn save(&self, owner_id: &str) -> Result<()> {
        let data = IdentityData {
            owner_id: owner_id.to_string(),
        };
        let content =
            serde_json::to_string_pretty(&data).context("Failed to serialize identity data")?;

        std::fs::write(&self.identity_path, content)
            .with_context(|| format!("Failed to write identity file: {:?}", self.identity_path))?;

        debug!("Identity saved to {:?}", self.identity_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Helper to temporarily clear the owner-id environment variable
    struct EnvGuard {
        owner_id: Option<String>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let guard = Self {
                owner_id: std::env::var("SEEDSCOPE_OWNER_ID").ok(),
            };
            std::env::remove_var("SEEDSCOPE_OWNER_ID");
            guard
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(v) = &self.owner_id {
                std::env::set_var("SEEDSCOPE_OWNER_ID", v);
            }
        }
    }

    #[test]
    fn test_owner_id_generated_and_stable() {
        let _guard = EnvGuard::new();
        let tmp = tempdir().unwrap();
        let store = IdentityStore::new(Some(tmp.path().to_string_lossy().to_string())).unwrap();

        let first = store.owner_id().unwrap();
        assert!(!first.is_empty());
        assert!(store.identity_path().exists());

        let second = store.owner_id().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_identity_file_regenerated() {
        let _guard = EnvGuard::new();
        let tmp = tempdir().unwrap();
        let store = IdentityStore::new(Some(tmp.path().to_string_lossy().to_string())).unwrap();

        std::fs::write(store.identity_path(), "not json").unwrap();
        let id = store.owner_id().unwrap();
        assert!(!id.is_empty());

        // The regenerated id was persisted over the invalid file.
        let reread = store.owner_id().unwrap();
        assert_eq!(id, reread);
    }
}
