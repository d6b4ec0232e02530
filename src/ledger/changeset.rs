// ============================================================================
// Changeset - staged writes for one instruction
// ============================================================================
//
// Reads fall through to the committed store unless the instruction already
// wrote the address. Nothing touches the store until `LedgerStore::commit`,
// so a failed instruction is rejected by simply dropping its changeset.
//
// ============================================================================

use std::collections::HashMap;

use super::{Account, LedgerStore, Mint, Transfer};
use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::escrow::EscrowState;
use crate::market::MarketState;

/// Pending writes for one table; `None` marks a removal
#[derive(Debug)]
pub(super) struct Overlay<T> {
    writes: HashMap<Address, Option<T>>,
}

impl<T> Default for Overlay<T> {
    fn default() -> Self {
        Self { writes: HashMap::new() }
    }
}

impl<T> Overlay<T> {
    fn get<'a>(&'a self, base: &'a HashMap<Address, T>, address: &Address) -> Option<&'a T> {
        match self.writes.get(address) {
            Some(staged) => staged.as_ref(),
            None => base.get(address),
        }
    }

    fn put(&mut self, address: Address, value: T) {
        self.writes.insert(address, Some(value));
    }

    fn remove(&mut self, address: Address) {
        self.writes.insert(address, None);
    }

    pub(super) fn apply(self, base: &mut HashMap<Address, T>) {
        for (address, staged) in self.writes {
            match staged {
                Some(value) => {
                    base.insert(address, value);
                }
                None => {
                    base.remove(&address);
                }
            }
        }
    }
}

/// Owned result of a successful changeset, ready to commit
#[derive(Debug)]
pub struct Writes {
    pub(super) accounts: Overlay<Account>,
    pub(super) mints: Overlay<Mint>,
    pub(super) escrows: Overlay<EscrowState>,
    pub(super) markets: Overlay<MarketState>,
    pub transfers: Vec<Transfer>,
}

pub struct Changeset<'a> {
    store: &'a LedgerStore,
    accounts: Overlay<Account>,
    mints: Overlay<Mint>,
    escrows: Overlay<EscrowState>,
    markets: Overlay<MarketState>,
    transfers: Vec<Transfer>,
}

impl<'a> Changeset<'a> {
    pub fn new(store: &'a LedgerStore) -> Self {
        Self {
            store,
            accounts: Overlay::default(),
            mints: Overlay::default(),
            escrows: Overlay::default(),
            markets: Overlay::default(),
            transfers: Vec::new(),
        }
    }

    pub fn into_writes(self) -> Writes {
        Writes {
            accounts: self.accounts,
            mints: self.mints,
            escrows: self.escrows,
            markets: self.markets,
            transfers: self.transfers,
        }
    }

    // ===== ACCOUNTS =====

    pub fn account(&self, address: &Address) -> LedgerResult<Account> {
        self.accounts
            .get(&self.store.accounts, address)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("account {}", address)))
    }

    pub fn account_exists(&self, address: &Address) -> bool {
        self.accounts.get(&self.store.accounts, address).is_some()
    }

    pub fn create_account(&mut self, account: Account) -> LedgerResult<()> {
        if self.account_exists(&account.address) {
            return Err(LedgerError::DuplicateState(format!("account {}", account.address)));
        }
        self.accounts.put(account.address, account);
        Ok(())
    }

    pub fn close_account(&mut self, address: &Address) -> LedgerResult<Account> {
        let account = self.account(address)?;
        self.accounts.remove(*address);
        Ok(account)
    }

    /// Remove `amount` from an account, returning the new balance
    pub fn debit(&mut self, address: &Address, amount: u64) -> LedgerResult<u64> {
        let mut account = self.account(address)?;
        account.amount = account.amount.checked_sub(amount).ok_or(
            LedgerError::InsufficientBalance { available: account.amount, required: amount },
        )?;
        let balance = account.amount;
        self.accounts.put(*address, account);
        Ok(balance)
    }

    /// Add `amount` to an account, returning the new balance
    pub fn credit(&mut self, address: &Address, amount: u64) -> LedgerResult<u64> {
        let mut account = self.account(address)?;
        account.amount = account
            .amount
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("account balance"))?;
        let balance = account.amount;
        self.accounts.put(*address, account);
        Ok(balance)
    }

    /// Move tokens between two accounts of the same mint
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> LedgerResult<()> {
        let source = self.account(from)?;
        let destination = self.account(to)?;
        if source.mint != destination.mint {
            return Err(LedgerError::InvalidArgument(format!(
                "mint mismatch: {} -> {}",
                source.mint.short(),
                destination.mint.short()
            )));
        }

        self.debit(from, amount)?;
        self.credit(to, amount)?;
        if amount > 0 {
            self.transfers.push(Transfer { mint: source.mint, from: Some(*from), to: *to, amount });
        }
        Ok(())
    }

    /// Create new tokens in `to`, raising the mint's supply
    pub fn issue(&mut self, to: &Address, amount: u64) -> LedgerResult<()> {
        let destination = self.account(to)?;
        let mut mint = self.mint(&destination.mint)?;
        mint.supply = mint
            .supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("mint supply"))?;
        self.credit(to, amount)?;
        self.mints.put(mint.address, mint);
        self.transfers.push(Transfer { mint: destination.mint, from: None, to: *to, amount });
        Ok(())
    }

    // ===== MINTS =====

    pub fn mint(&self, address: &Address) -> LedgerResult<Mint> {
        self.mints
            .get(&self.store.mints, address)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("mint {}", address)))
    }

    pub fn create_mint(&mut self, mint: Mint) -> LedgerResult<()> {
        if self.mints.get(&self.store.mints, &mint.address).is_some() {
            return Err(LedgerError::DuplicateState(format!("mint {}", mint.address)));
        }
        self.mints.put(mint.address, mint);
        Ok(())
    }

    // ===== ESCROW STATES =====

    pub fn escrow(&self, address: &Address) -> LedgerResult<EscrowState> {
        self.escrows
            .get(&self.store.escrows, address)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("escrow state {}", address)))
    }

    pub fn create_escrow(&mut self, address: Address, state: EscrowState) -> LedgerResult<()> {
        if self.escrows.get(&self.store.escrows, &address).is_some() {
            return Err(LedgerError::DuplicateState(format!("escrow state {}", address)));
        }
        self.escrows.put(address, state);
        Ok(())
    }

    pub fn put_escrow(&mut self, address: Address, state: EscrowState) {
        self.escrows.put(address, state);
    }

    pub fn remove_escrow(&mut self, address: &Address) {
        self.escrows.remove(*address);
    }

    // ===== MARKET STATES =====

    pub fn market(&self, address: &Address) -> LedgerResult<MarketState> {
        self.markets
            .get(&self.store.markets, address)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("market state {}", address)))
    }

    pub fn create_market(&mut self, address: Address, state: MarketState) -> LedgerResult<()> {
        if self.markets.get(&self.store.markets, &address).is_some() {
            return Err(LedgerError::DuplicateState(format!("market state {}", address)));
        }
        self.markets.put(address, state);
        Ok(())
    }

    pub fn put_market(&mut self, address: Address, state: MarketState) {
        self.markets.put(address, state);
    }
}
