/// Ledger Store
///
/// Authoritative mapping from address to balance record, plus the escrow and
/// market state records the engines keep at derived addresses.
///
/// KEY RULES:
/// - Balances are unsigned integers in the mint's smallest unit
/// - Program-owned accounts (vaults, reserves) only move through engine paths
/// - Writes are staged in a `Changeset` and committed all at once

pub mod changeset;
pub mod journal;

pub use changeset::{Changeset, Writes};
pub use journal::{Journal, LedgerEntry};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::escrow::EscrowState;
use crate::market::MarketState;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Who controls an account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Wallet-controlled, opened and closed by its owner
    User,
    /// Lives at a derived address, mutated only by the engine
    Program,
}

/// A token balance for one owner and one mint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    /// Wallet for user accounts, controlling state record for program accounts
    pub owner: Address,
    pub mint: Address,
    pub amount: u64,
    pub kind: AccountKind,
}

impl Account {
    pub fn user(address: Address, owner: Address, mint: Address) -> Self {
        Self { address, owner, mint, amount: 0, kind: AccountKind::User }
    }

    pub fn program(address: Address, authority: Address, mint: Address) -> Self {
        Self { address, owner: authority, mint, amount: 0, kind: AccountKind::Program }
    }

    pub fn is_program_owned(&self) -> bool {
        self.kind == AccountKind::Program
    }
}

/// Token identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mint {
    pub address: Address,
    pub decimals: u8,
    /// `None` for mints only the engine can issue (the base currency)
    pub mint_authority: Option<Address>,
    pub supply: u64,
}

/// One balance movement inside an instruction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transfer {
    pub mint: Address,
    /// `None` when tokens are newly issued
    pub from: Option<Address>,
    pub to: Address,
    pub amount: u64,
}

// ============================================================================
// LEDGER STORE
// ============================================================================

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LedgerStore {
    accounts: HashMap<Address, Account>,
    mints: HashMap<Address, Mint>,
    escrows: HashMap<Address, EscrowState>,
    markets: HashMap<Address, MarketState>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Current balance, or `NotFound` for an address that was never opened
    pub fn balance(&self, address: &Address) -> LedgerResult<u64> {
        self.accounts
            .get(address)
            .map(|account| account.amount)
            .ok_or_else(|| LedgerError::NotFound(format!("account {}", address)))
    }

    pub fn mint(&self, address: &Address) -> Option<&Mint> {
        self.mints.get(address)
    }

    pub fn escrow(&self, address: &Address) -> Option<&EscrowState> {
        self.escrows.get(address)
    }

    pub fn market(&self, address: &Address) -> Option<&MarketState> {
        self.markets.get(address)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn escrow_count(&self) -> usize {
        self.escrows.len()
    }

    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    /// Sum of every account balance for `mint`; equals the mint supply when
    /// the ledger is consistent
    pub fn circulating(&self, mint: &Address) -> u128 {
        self.accounts
            .values()
            .filter(|account| &account.mint == mint)
            .map(|account| account.amount as u128)
            .sum()
    }

    /// Apply the staged writes of a successful instruction
    pub fn commit(&mut self, writes: Writes) {
        writes.accounts.apply(&mut self.accounts);
        writes.mints.apply(&mut self.mints);
        writes.escrows.apply(&mut self.escrows);
        writes.markets.apply(&mut self.markets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_of_missing_account() {
        let store = LedgerStore::new();
        let err = store.balance(&Address::new([9; 32])).unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn test_commit_applies_staged_account() {
        let mut store = LedgerStore::new();
        let owner = Address::new_unique();
        let mint = Address::new([1; 32]);
        let address = Address::new([2; 32]);

        let writes = {
            let mut cs = Changeset::new(&store);
            cs.create_account(Account::user(address, owner, mint)).unwrap();
            cs.into_writes()
        };
        assert!(store.account(&address).is_none());

        store.commit(writes);
        assert_eq!(store.balance(&address).unwrap(), 0);
        assert_eq!(store.account_count(), 1);
    }
}
