// ============================================================================
// Instructions - the engine's external contract
// ============================================================================
//
// A caller submits one named instruction plus the set of addresses that
// signed it. Each instruction is all-or-nothing; the receipt lists every
// transfer it made and the resulting balance of each touched account.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::escrow::{EscrowStage, Payout, Refund};
use crate::ledger::Transfer;
use crate::market::{Reserves, SwapDirection, SwapQuote};

// ============================================================================
// SIGNERS
// ============================================================================

/// Addresses that authorized the current instruction
#[derive(Debug, Clone, Copy)]
pub struct Signers<'a>(&'a [Address]);

impl<'a> Signers<'a> {
    pub fn new(addresses: &'a [Address]) -> Self {
        Self(addresses)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    /// Fail with `NotAuthorized` unless `address` signed
    pub fn require(&self, address: &Address, action: &str) -> LedgerResult<()> {
        if !self.contains(address) {
            return Err(LedgerError::NotAuthorized(format!(
                "{} requires signature of {}",
                action,
                address.short()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// INSTRUCTION SET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    CreateMint {
        mint: Address,
        decimals: u8,
        authority: Address,
    },
    MintTo {
        mint: Address,
        owner: Address,
        amount: u64,
    },
    OpenAccount {
        owner: Address,
        mint: Address,
    },
    CloseAccount {
        owner: Address,
        mint: Address,
    },
    EscrowSetup {
        payer: Address,
        counterparty: Address,
        mint: Address,
    },
    EscrowDeposit {
        payer: Address,
        counterparty: Address,
        mint: Address,
        amount: u64,
    },
    EscrowResolve {
        payer: Address,
        counterparty: Address,
        mint: Address,
        winner: Address,
    },
    EscrowPullBack {
        payer: Address,
        counterparty: Address,
        mint: Address,
    },
    MarketInit {
        beneficiary: Address,
        token_mint: Address,
        fee_numerator: u64,
        fee_denominator: u64,
    },
    MarketAddLiquidity {
        beneficiary: Address,
        token_mint: Address,
        token_amount: u64,
        base_amount: u64,
    },
    MarketSwap {
        trader: Address,
        beneficiary: Address,
        token_mint: Address,
        amount_in: u64,
        direction: SwapDirection,
    },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::CreateMint { .. } => "CreateMint",
            Instruction::MintTo { .. } => "MintTo",
            Instruction::OpenAccount { .. } => "OpenAccount",
            Instruction::CloseAccount { .. } => "CloseAccount",
            Instruction::EscrowSetup { .. } => "EscrowSetup",
            Instruction::EscrowDeposit { .. } => "EscrowDeposit",
            Instruction::EscrowResolve { .. } => "EscrowResolve",
            Instruction::EscrowPullBack { .. } => "EscrowPullBack",
            Instruction::MarketInit { .. } => "MarketInit",
            Instruction::MarketAddLiquidity { .. } => "MarketAddLiquidity",
            Instruction::MarketSwap { .. } => "MarketSwap",
        }
    }
}

// ============================================================================
// RECEIPTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReceiptDetail {
    MintCreated { mint: Address },
    Minted { account: Address, amount: u64 },
    AccountOpened { account: Address },
    AccountClosed { account: Address },
    EscrowCreated { state: Address, vault: Address },
    EscrowFunded { vault_balance: u64 },
    EscrowResolved { stage: EscrowStage, payout: Payout },
    EscrowRefunded { stage: EscrowStage, refund: Refund },
    MarketCreated { state: Address, token_reserve: Address, base_reserve: Address },
    LiquidityAdded { reserves: Reserves },
    Swapped { quote: SwapQuote },
}

/// What a committed instruction did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub slot: u64,
    pub instruction: String,
    pub detail: ReceiptDetail,
    pub transfers: Vec<Transfer>,
    /// Post-commit balance of every account a transfer touched
    pub balances: BTreeMap<Address, u64>,
}
