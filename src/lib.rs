/// BlackBook Settlement Engine
///
/// Two-party escrows and a constant-product token market over an in-memory
/// ledger with derived program accounts. Every instruction is atomic.

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod escrow;
pub mod instruction;
pub mod ledger;
pub mod market;
pub mod snapshot;
pub mod token;

pub mod app_state;
pub mod handlers;
pub mod routes;

pub use address::{associated_account_address, derive_address, Address};
pub use config::Config;
pub use engine::{Engine, EscrowView, MarketView};
pub use error::{LedgerError, LedgerResult};
pub use escrow::{EscrowStage, EscrowState};
pub use instruction::{Instruction, Receipt, ReceiptDetail, Signers};
pub use ledger::{Account, AccountKind, LedgerEntry, LedgerStore, Mint, Transfer};
pub use market::{FeeRatio, MarketState, SwapDirection, SwapQuote};
pub use snapshot::SnapshotError;
