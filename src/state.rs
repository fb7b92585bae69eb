use crate::config::Config;
use crate::errors::StorageError;
use crate::forms::Forms;
use crate::routing;
use crate::storage::{self, FileStore};
use crate::store::HabitStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Default)]
pub struct Session {
    pub store: HabitStore,
    pub forms: Forms,
}

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<FileStore>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(storage: FileStore, session: Session) -> Self {
        Self {
            storage: Arc::new(storage),
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn bootstrap(config: &Config) -> Result<Self, StorageError> {
        let storage = FileStore::new(config.data_dir.clone());
        storage.ensure_dir().await?;

        let habits = storage::load_habits(&storage, config.seed_defaults).await;
        let mut store = HabitStore::new(habits);
        let saved = storage::load_location(&storage).await;
        let active = routing::restore(&mut store, saved.as_deref());
        storage::save_location(&storage, &routing::fragment(active)).await?;

        info!(
            habits = store.habits().len(),
            active = ?active,
            dir = %storage.dir().display(),
            "state loaded"
        );

        Ok(Self::new(
            storage,
            Session {
                store,
                forms: Forms::new(),
            },
        ))
    }
}
