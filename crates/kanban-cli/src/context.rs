use kanban_core::AppConfig;
use kanban_persistence::BoardStore;
use std::path::PathBuf;

pub struct CliContext {
    pub config: AppConfig,
    pub store: BoardStore,
}

impl CliContext {
    /// Load configuration; an explicit boards directory wins over file and env.
    pub fn load(boards_dir: Option<PathBuf>) -> Self {
        let mut config = AppConfig::load();
        if let Some(dir) = boards_dir {
            config = config.with_boards_dir(dir);
        }
        let store = BoardStore::from_config(&config);
        tracing::debug!("Using boards directory {}", store.root().display());
        Self { config, store }
    }
}
