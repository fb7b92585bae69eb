use crate::errors::StorageError;
use crate::models::{default_habits, Habit};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

pub const HABITS_KEY: &str = "habits";
pub const LOCATION_KEY: &str = "location";

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Write {
                path: self.dir.clone(),
                source,
            })
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.slot_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    pub async fn set(&self, key: &str, payload: &[u8]) -> Result<(), StorageError> {
        let path = self.slot_path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, payload)
            .await
            .map_err(|source| StorageError::Write {
                path: tmp.clone(),
                source,
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| StorageError::Write { path, source })
    }

    pub async fn quarantine(&self, key: &str) -> Result<PathBuf, StorageError> {
        let path = self.slot_path(key);
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let aside = self.dir.join(format!("{key}.json.corrupt-{stamp}"));
        fs::rename(&path, &aside)
            .await
            .map_err(|source| StorageError::Write {
                path: aside.clone(),
                source,
            })?;
        Ok(aside)
    }
}

pub fn decode_habits(bytes: &[u8]) -> Result<Vec<Habit>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

pub async fn load_habits(store: &FileStore, seed_defaults: bool) -> Vec<Habit> {
    match store.get(HABITS_KEY).await {
        Ok(Some(bytes)) => match decode_habits(&bytes) {
            Ok(habits) => habits,
            Err(err) => {
                error!("failed to parse habits: {err}");
                match store.quarantine(HABITS_KEY).await {
                    Ok(aside) => warn!("moved unreadable habits to {}", aside.display()),
                    Err(err) => error!("failed to move unreadable habits aside: {err}"),
                }
                Vec::new()
            }
        },
        Ok(None) if seed_defaults => {
            let habits = default_habits();
            info!(count = habits.len(), "seeding sample habits");
            if let Err(err) = save_habits(store, &habits).await {
                error!("failed to write sample habits: {err}");
            }
            habits
        }
        Ok(None) => Vec::new(),
        Err(err) => {
            error!("failed to read habits: {err}");
            Vec::new()
        }
    }
}

pub async fn save_habits(store: &FileStore, habits: &[Habit]) -> Result<(), StorageError> {
    let payload = serde_json::to_vec_pretty(habits).map_err(|source| StorageError::Serialize {
        key: HABITS_KEY.to_string(),
        source,
    })?;
    store.set(HABITS_KEY, &payload).await
}

pub async fn load_location(store: &FileStore) -> Option<String> {
    match store.get(LOCATION_KEY).await {
        Ok(Some(bytes)) => serde_json::from_slice::<String>(&bytes)
            .map_err(|err| warn!("ignoring unreadable location: {err}"))
            .ok(),
        Ok(None) => None,
        Err(err) => {
            warn!("failed to read location: {err}");
            None
        }
    }
}

pub async fn save_location(store: &FileStore, fragment: &str) -> Result<(), StorageError> {
    let payload = serde_json::to_vec(fragment).map_err(|source| StorageError::Serialize {
        key: LOCATION_KEY.to_string(),
        source,
    })?;
    store.set(LOCATION_KEY, &payload).await
}
