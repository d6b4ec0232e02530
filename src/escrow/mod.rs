// ============================================================================
// Escrow Module - Two-Party Conditional Payments
// ============================================================================
//
// One escrow per (payer, counterparty, mint) triple:
//   - setup:     payer opens the escrow state and an empty vault
//   - deposit:   both parties fund the vault in one co-signed call
//   - resolve:   the whole vault goes to the winner, accounts close
//   - pullback:  each party gets back exactly its own deposit, accounts close
//
// Flow: Uninitialized → AwaitingDeposits → Funded → Resolved
//                                            ↓
//                                         Refunded
//
// ============================================================================

pub mod deposit;
pub mod pullback;
pub mod resolve;
pub mod setup;

pub use deposit::deposit;
pub use pullback::{pull_back, Refund};
pub use resolve::{resolve, Payout};
pub use setup::setup;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::{create_derived_address, derive_address, tags, Address};
use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// STAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStage {
    /// No state record exists for the triple yet
    Uninitialized,
    /// Setup done, vault empty
    AwaitingDeposits,
    /// Both deposits sit in the vault
    Funded,
    /// Vault paid out to one party; state and vault are closed
    Resolved,
    /// Each party got its own deposit back; state and vault are closed
    Refunded,
}

impl EscrowStage {
    /// The only legal transitions
    pub fn can_advance_to(self, next: EscrowStage) -> bool {
        matches!(
            (self, next),
            (EscrowStage::Uninitialized, EscrowStage::AwaitingDeposits)
                | (EscrowStage::AwaitingDeposits, EscrowStage::Funded)
                | (EscrowStage::Funded, EscrowStage::Resolved)
                | (EscrowStage::Funded, EscrowStage::Refunded)
        )
    }
}

impl fmt::Display for EscrowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            EscrowStage::Uninitialized => "uninitialized",
            EscrowStage::AwaitingDeposits => "awaiting_deposits",
            EscrowStage::Funded => "funded",
            EscrowStage::Resolved => "resolved",
            EscrowStage::Refunded => "refunded",
        };
        write!(f, "{}", stage)
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowState {
    pub payer: Address,
    pub counterparty: Address,
    pub mint: Address,
    pub vault: Address,
    pub payer_deposit: u64,
    pub counterparty_deposit: u64,
    pub stage: EscrowStage,
    pub state_bump: u8,
    pub vault_bump: u8,
}

impl EscrowState {
    pub fn is_party(&self, address: &Address) -> bool {
        *address == self.payer || *address == self.counterparty
    }

    /// What the vault must hold once funded
    pub fn total_deposits(&self) -> LedgerResult<u64> {
        self.payer_deposit
            .checked_add(self.counterparty_deposit)
            .ok_or_else(|| LedgerError::overflow("escrow deposits"))
    }

    /// Move to `next`, failing with `InvalidStage` on an illegal transition
    pub fn advance(&mut self, next: EscrowStage) -> LedgerResult<()> {
        if !self.stage.can_advance_to(next) {
            return Err(LedgerError::InvalidStage(format!(
                "escrow cannot go from {} to {}",
                self.stage, next
            )));
        }
        self.stage = next;
        Ok(())
    }

    /// Recompute the vault from its stored bump and make sure it matches
    pub(crate) fn check_vault_address(&self, program_id: &Address) -> LedgerResult<()> {
        let expected = create_derived_address(
            &[
                tags::ESCROW_VAULT,
                self.payer.as_ref(),
                self.counterparty.as_ref(),
                self.mint.as_ref(),
            ],
            self.vault_bump,
            program_id,
        )?;
        if expected != self.vault {
            return Err(LedgerError::InvariantViolation(format!(
                "escrow vault {} does not match its seeds",
                self.vault.short()
            )));
        }
        Ok(())
    }

    pub(crate) fn check_vault(&self, vault_balance: u64) -> LedgerResult<()> {
        let expected = self.total_deposits()?;
        if vault_balance != expected {
            return Err(LedgerError::InvariantViolation(format!(
                "escrow vault holds {} but deposits sum to {}",
                vault_balance, expected
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ADDRESSES
// ============================================================================

/// Derived addresses for one escrow triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAddresses {
    pub state: Address,
    pub state_bump: u8,
    pub vault: Address,
    pub vault_bump: u8,
}

/// Recompute the escrow state and vault addresses from public inputs
pub fn escrow_addresses(
    program_id: &Address,
    payer: &Address,
    counterparty: &Address,
    mint: &Address,
) -> LedgerResult<EscrowAddresses> {
    let (state, state_bump) = derive_address(
        &[tags::ESCROW_STATE, payer.as_ref(), counterparty.as_ref(), mint.as_ref()],
        program_id,
    )?;
    let (vault, vault_bump) = derive_address(
        &[tags::ESCROW_VAULT, payer.as_ref(), counterparty.as_ref(), mint.as_ref()],
        program_id,
    )?;
    Ok(EscrowAddresses { state, state_bump, vault, vault_bump })
}
