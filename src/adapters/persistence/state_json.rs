//! Implements UsageStorePort using a JSON file.
//!
//! Whole-store snapshot rewritten on every record. The write lock is held across
//! mutation and save, so records (for any user) are strictly serialized.

use crate::domain::{DomainError, ShortResult, UserId, UserStats};
use crate::ports::UsageStorePort;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StatsFile {
    users: Vec<UserStats>,
}

/// JSON file-based usage store.
pub struct JsonUsageStore {
    path: PathBuf,
    capacity: usize,
    cache: tokio::sync::RwLock<HashMap<UserId, UserStats>>,
}

impl JsonUsageStore {
    pub fn new(path: impl AsRef<Path>, capacity: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            capacity,
            cache: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    /// Load stats from disk. A missing file starts an empty store; an unparsable
    /// one is moved aside to `<name>.corrupt` first. Other read errors fail.
    pub async fn load(&self) -> Result<(), DomainError> {
        let data: StatsFile = match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    let backup = self.corrupt_path();
                    fs::rename(&self.path, &backup)
                        .await
                        .map_err(|e| DomainError::Store(format!("move corrupt stats file: {}", e)))?;
                    warn!(
                        path = %self.path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "corrupt stats file moved aside, starting empty"
                    );
                    StatsFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatsFile::default(),
            Err(e) => {
                return Err(DomainError::Store(format!(
                    "read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        let users: HashMap<UserId, UserStats> =
            data.users.into_iter().map(|s| (s.user_id, s)).collect();
        info!(path = %self.path.display(), users = users.len(), "usage stats loaded");
        *self.cache.write().await = users;
        Ok(())
    }

    fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Atomic save: temp file, sync_all, rename over the target.
    async fn save(&self, users: &HashMap<UserId, UserStats>) -> Result<(), DomainError> {
        let mut snapshot: Vec<UserStats> = users.values().cloned().collect();
        snapshot.sort_by_key(|s| s.user_id.0);
        let json = serde_json::to_string_pretty(&StatsFile { users: snapshot })
            .map_err(|e| DomainError::Store(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Store(format!("create stats dir: {}", e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Store(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Store(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Store(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::Store(format!("atomic rename failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UsageStorePort for JsonUsageStore {
    async fn record(&self, user_id: UserId, results: &[ShortResult]) -> Result<(), DomainError> {
        if !results.iter().any(ShortResult::is_success) {
            return Ok(());
        }
        let mut cache = self.cache.write().await;
        let stats = cache
            .entry(user_id)
            .or_insert_with(|| UserStats::empty(user_id));
        let counted = stats.apply(results, self.capacity, Utc::now());
        debug!(%user_id, counted, total = stats.total_shortened, "usage recorded");
        self.save(&cache).await
    }

    async fn read(&self, user_id: UserId) -> Result<UserStats, DomainError> {
        let cache = self.cache.read().await;
        Ok(cache
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserStats::empty(user_id)))
    }
}
