// Engine persistence: the whole ledger as one pretty-printed JSON file

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::address::Address;
use crate::config::Config;
use crate::engine::Engine;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot belongs to program {found}, configured program is {expected}")]
    ProgramMismatch { expected: Address, found: Address },
}

impl Engine {
    /// Write the engine to `path`, creating parent directories
    pub fn save_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), slot = self.slot(), "💾 State saved to disk");
        Ok(())
    }

    /// Restore an engine saved under the configured program id. The journal
    /// bound always comes from `config`, not from the file.
    pub fn load_snapshot(path: &Path, config: &Config) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path)?;
        let mut engine: Engine = serde_json::from_str(&json)?;
        if engine.program_id() != config.program_id {
            return Err(SnapshotError::ProgramMismatch {
                expected: config.program_id,
                found: engine.program_id(),
            });
        }
        engine.set_journal_capacity(config.journal_capacity);
        info!(
            path = %path.display(),
            slot = engine.slot(),
            accounts = engine.store().account_count(),
            "📂 State loaded from disk"
        );
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("blackbook-settlement-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_snapshot_restores_ledger() {
        let config = Config::default();
        let mut engine = Engine::new(&config).unwrap();
        let alice = Address::new_unique();
        let mint = Address::new_unique();
        engine.airdrop(&alice, 500).unwrap();
        engine
            .process(&[alice], &Instruction::CreateMint { mint, decimals: 6, authority: alice })
            .unwrap();

        let path = temp_path("state.json");
        engine.save_snapshot(&path).unwrap();
        let restored = Engine::load_snapshot(&path, &config).unwrap();

        assert_eq!(restored.slot(), 2);
        assert_eq!(restored.base_mint(), engine.base_mint());
        let account = restored.associated_account(&alice, &engine.base_mint()).unwrap();
        assert_eq!(account.amount, 500);
        assert_eq!(restored.store().mint(&mint).unwrap().decimals, 6);
        assert_eq!(restored.journal().len(), 2);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_snapshot_rejects_other_program() {
        let engine = Engine::new(&Config::default()).unwrap();
        let path = temp_path("state.json");
        engine.save_snapshot(&path).unwrap();

        let other = Config { program_id: Address::new([3; 32]), ..Config::default() };
        let err = Engine::load_snapshot(&path, &other).unwrap_err();
        assert!(matches!(err, SnapshotError::ProgramMismatch { .. }));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_configured_journal_capacity_wins_on_load() {
        let mut engine = Engine::new(&Config::default()).unwrap();
        let alice = Address::new_unique();
        for _ in 0..5 {
            engine.airdrop(&alice, 10).unwrap();
        }
        let path = temp_path("state.json");
        engine.save_snapshot(&path).unwrap();

        let tight = Config { journal_capacity: 2, ..Config::default() };
        let mut restored = Engine::load_snapshot(&path, &tight).unwrap();
        assert_eq!(restored.journal().len(), 2);
        assert_eq!(restored.journal().capacity(), 2);

        restored.airdrop(&alice, 10).unwrap();
        assert_eq!(restored.journal().len(), 2);
        assert_eq!(restored.journal().recent(1)[0].slot, 6);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_snapshot_with_invalid_fee_is_rejected() {
        let engine = Engine::new(&Config::default()).unwrap();
        let path = temp_path("state.json");
        engine.save_snapshot(&path).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        let with_fee = |numerator: u64, denominator: u64| {
            let mut state = saved.clone();
            let market = serde_json::json!({
                "beneficiary": Address::new_unique(),
                "token_mint": Address::new_unique(),
                "base_mint": engine.base_mint(),
                "fee": { "numerator": numerator, "denominator": denominator },
                "token_reserve": Address::new_unique(),
                "base_reserve": Address::new_unique(),
                "state_bump": 255,
                "token_reserve_bump": 255,
                "base_reserve_bump": 255
            });
            state["store"]["markets"][Address::new_unique().to_string()] = market;
            fs::write(&path, serde_json::to_string(&state).unwrap()).unwrap();
        };

        with_fee(3, 1000);
        let restored = Engine::load_snapshot(&path, &Config::default()).unwrap();
        assert_eq!(restored.store().market_count(), 1);

        with_fee(0, 0);
        let err = Engine::load_snapshot(&path, &Config::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));

        with_fee(9, 4);
        let err = Engine::load_snapshot(&path, &Config::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let path = temp_path("absent.json");
        let err = Engine::load_snapshot(&path, &Config::default()).unwrap_err();
        assert!(matches!(err, SnapshotError::Io(_)));
    }
}
