// Application state shared by every HTTP handler

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::LedgerResult;
use crate::snapshot::SnapshotError;

pub type SharedState = Arc<Mutex<AppState>>;

pub struct AppState {
    pub engine: Engine,
    pub config: Config,
}

impl AppState {
    /// Resume from the configured snapshot, or start an empty ledger
    pub fn new(config: Config) -> LedgerResult<Self> {
        let engine = match Engine::load_snapshot(&config.state_path, &config) {
            Ok(engine) => engine,
            Err(SnapshotError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    path = %config.state_path.display(),
                    "🆕 No saved state, starting fresh ledger"
                );
                Engine::new(&config)?
            }
            Err(e) => {
                warn!(error = %e, "⚠️ Could not load saved state, starting fresh ledger");
                Engine::new(&config)?
            }
        };
        Ok(Self { engine, config })
    }

    /// Empty ledger that ignores any snapshot on disk
    pub fn fresh(config: Config) -> LedgerResult<Self> {
        let engine = Engine::new(&config)?;
        Ok(Self { engine, config })
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn save_to_disk(&self) -> Result<(), SnapshotError> {
        self.engine.save_snapshot(&self.config.state_path)
    }
}

/// Lock the shared state. A handler that panicked mid-request never left a
/// half-applied instruction behind, so a poisoned lock is safe to reuse.
pub fn lock(state: &SharedState) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
