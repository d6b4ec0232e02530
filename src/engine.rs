// ============================================================================
// Settlement Engine
// ============================================================================
//
// Owns the committed ledger and runs every instruction the same way:
//
//   1. stage all reads and writes in a Changeset over the store
//   2. dispatch to the token / escrow / market operation
//   3. on success commit the writes, bump the slot, journal the entry
//   4. on failure drop the changeset; the store never saw a thing
//
// Exclusive access (`&mut self`) is the host's job; the HTTP layer keeps the
// engine behind a mutex.
//
// ============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::address::{associated_account_address, derive_address, tags, Address};
use crate::config::Config;
use crate::error::{LedgerError, LedgerResult};
use crate::escrow::{self, escrow_addresses, EscrowStage, EscrowState};
use crate::instruction::{Instruction, Receipt, ReceiptDetail, Signers};
use crate::ledger::{Account, Changeset, Journal, LedgerEntry, LedgerStore, Mint, Transfer, Writes};
use crate::market::{self, cpmm, market_addresses, MarketState, SwapDirection, SwapQuote};
use crate::token;

/// Escrow state together with what its vault currently holds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowView {
    pub address: Address,
    pub vault_balance: u64,
    pub state: EscrowState,
}

/// Market state with live reserves and a display price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketView {
    pub address: Address,
    pub state: MarketState,
    pub token_reserve_balance: u64,
    pub base_reserve_balance: u64,
    /// Base currency per whole token; `None` while the token reserve is empty
    pub spot_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    program_id: Address,
    base_mint: Address,
    slot: u64,
    store: LedgerStore,
    journal: Journal,
}

impl Engine {
    /// Fresh ledger holding only the engine-owned base-currency mint
    pub fn new(config: &Config) -> LedgerResult<Self> {
        let (base_mint, _) = derive_address(&[tags::BASE_MINT], &config.program_id)?;
        let mut store = LedgerStore::new();
        let writes = {
            let mut cs = Changeset::new(&store);
            cs.create_mint(Mint {
                address: base_mint,
                decimals: config.base_decimals,
                mint_authority: None,
                supply: 0,
            })?;
            cs.into_writes()
        };
        store.commit(writes);

        info!(
            program = %config.program_id.short(),
            base_mint = %base_mint.short(),
            "🏦 Settlement engine initialized"
        );
        Ok(Self {
            program_id: config.program_id,
            base_mint,
            slot: 0,
            store,
            journal: Journal::new(config.journal_capacity),
        })
    }

    pub fn program_id(&self) -> Address {
        self.program_id
    }

    pub fn base_mint(&self) -> Address {
        self.base_mint
    }

    /// Number of committed instructions
    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub(crate) fn set_journal_capacity(&mut self, capacity: usize) {
        self.journal.set_capacity(capacity);
    }

    // ========================================================================
    // INSTRUCTIONS
    // ========================================================================

    /// Run one instruction atomically
    pub fn process(
        &mut self,
        signers: &[Address],
        instruction: &Instruction,
    ) -> LedgerResult<Receipt> {
        let name = instruction.name();
        let staged = {
            let mut cs = Changeset::new(&self.store);
            execute(&mut cs, &self.program_id, &self.base_mint, Signers::new(signers), instruction)
                .map(|detail| (detail, cs.into_writes()))
        };

        match staged {
            Ok((detail, writes)) => Ok(self.commit(name, signers, detail, writes)),
            Err(e) => {
                warn!(instruction = name, kind = e.kind(), error = %e, "❌ Instruction rejected");
                Err(e)
            }
        }
    }

    /// Credit `owner` with freshly issued base currency, opening the account if needed
    pub fn airdrop(&mut self, owner: &Address, amount: u64) -> LedgerResult<u64> {
        if amount == 0 {
            return Err(LedgerError::InvalidArgument("airdrop amount must be positive".into()));
        }
        let account = associated_account_address(owner, &self.base_mint, &self.program_id)?;
        let writes = {
            let mut cs = Changeset::new(&self.store);
            if !cs.account_exists(&account) {
                cs.create_account(Account::user(account, *owner, self.base_mint))?;
            }
            let existing = cs.account(&account)?;
            if existing.is_program_owned() || existing.owner != *owner {
                return Err(LedgerError::NotAuthorized(format!(
                    "account {} is not controlled by {}",
                    account.short(),
                    owner.short()
                )));
            }
            cs.issue(&account, amount)?;
            cs.into_writes()
        };

        let transfers = self.apply(writes);
        self.journal.record(LedgerEntry::new(self.slot, "Airdrop", &[], transfers));
        let balance = self.store.balance(&account)?;
        info!(owner = %owner.short(), amount, balance, "🪂 Airdrop");
        Ok(balance)
    }

    fn apply(&mut self, mut writes: Writes) -> Vec<Transfer> {
        let transfers = std::mem::take(&mut writes.transfers);
        self.store.commit(writes);
        self.slot += 1;
        transfers
    }

    fn commit(
        &mut self,
        name: &str,
        signers: &[Address],
        detail: ReceiptDetail,
        writes: Writes,
    ) -> Receipt {
        let transfers = self.apply(writes);

        let mut balances = BTreeMap::new();
        for transfer in &transfers {
            for address in transfer.from.iter().chain(std::iter::once(&transfer.to)) {
                // closed accounts have no balance to report
                if let Some(account) = self.store.account(address) {
                    balances.insert(*address, account.amount);
                }
            }
        }

        self.journal.record(LedgerEntry::new(self.slot, name, signers, transfers.clone()));
        info!(
            slot = self.slot,
            instruction = name,
            transfers = transfers.len(),
            "✅ Instruction committed"
        );

        Receipt {
            slot: self.slot,
            instruction: name.to_string(),
            detail,
            transfers,
            balances,
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn balance(&self, address: &Address) -> LedgerResult<u64> {
        self.store.balance(address)
    }

    pub fn associated_account(&self, owner: &Address, mint: &Address) -> LedgerResult<Account> {
        let address = associated_account_address(owner, mint, &self.program_id)?;
        self.store
            .account(&address)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("account {}", address)))
    }

    pub fn escrow(
        &self,
        payer: &Address,
        counterparty: &Address,
        mint: &Address,
    ) -> LedgerResult<EscrowView> {
        let addresses = escrow_addresses(&self.program_id, payer, counterparty, mint)?;
        let state = self
            .store
            .escrow(&addresses.state)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("escrow state {}", addresses.state)))?;
        Ok(EscrowView {
            address: addresses.state,
            vault_balance: self.store.balance(&state.vault)?,
            state,
        })
    }

    pub fn market(&self, beneficiary: &Address, token_mint: &Address) -> LedgerResult<MarketView> {
        let addresses = market_addresses(&self.program_id, beneficiary, token_mint)?;
        let state = self
            .store
            .market(&addresses.state)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("market state {}", addresses.state)))?;
        let token_reserve_balance = self.store.balance(&state.token_reserve)?;
        let base_reserve_balance = self.store.balance(&state.base_reserve)?;

        let decimals = |mint: &Address| self.store.mint(mint).map(|m| m.decimals).unwrap_or(0);
        let spot_price = cpmm::spot_price(
            token_reserve_balance,
            base_reserve_balance,
            decimals(&state.token_mint),
            decimals(&state.base_mint),
        );

        Ok(MarketView {
            address: addresses.state,
            state,
            token_reserve_balance,
            base_reserve_balance,
            spot_price,
        })
    }

    /// What a swap would yield right now, without executing it
    pub fn quote_swap(
        &self,
        beneficiary: &Address,
        token_mint: &Address,
        amount_in: u64,
        direction: SwapDirection,
    ) -> LedgerResult<SwapQuote> {
        let addresses = market_addresses(&self.program_id, beneficiary, token_mint)?;
        let cs = Changeset::new(&self.store);
        let state = cs.market(&addresses.state)?;
        market::preview_swap(&cs, &state, amount_in, direction)
    }
}

fn execute(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    base_mint: &Address,
    signers: Signers<'_>,
    instruction: &Instruction,
) -> LedgerResult<ReceiptDetail> {
    let detail = match instruction {
        Instruction::CreateMint { mint, decimals, authority } => {
            token::create_mint(cs, &signers, *mint, *decimals, *authority)?;
            ReceiptDetail::MintCreated { mint: *mint }
        }
        Instruction::MintTo { mint, owner, amount } => {
            let account = token::mint_to(cs, program_id, &signers, mint, owner, *amount)?;
            ReceiptDetail::Minted { account, amount: *amount }
        }
        Instruction::OpenAccount { owner, mint } => ReceiptDetail::AccountOpened {
            account: token::open_account(cs, program_id, &signers, owner, mint)?,
        },
        Instruction::CloseAccount { owner, mint } => ReceiptDetail::AccountClosed {
            account: token::close_account(cs, program_id, &signers, owner, mint)?,
        },
        Instruction::EscrowSetup { payer, counterparty, mint } => {
            let addresses = escrow::setup(cs, program_id, &signers, payer, counterparty, mint)?;
            ReceiptDetail::EscrowCreated { state: addresses.state, vault: addresses.vault }
        }
        Instruction::EscrowDeposit { payer, counterparty, mint, amount } => {
            let vault_balance =
                escrow::deposit(cs, program_id, &signers, payer, counterparty, mint, *amount)?;
            ReceiptDetail::EscrowFunded { vault_balance }
        }
        Instruction::EscrowResolve { payer, counterparty, mint, winner } => {
            ReceiptDetail::EscrowResolved {
                stage: EscrowStage::Resolved,
                payout: escrow::resolve(cs, program_id, payer, counterparty, mint, winner)?,
            }
        }
        Instruction::EscrowPullBack { payer, counterparty, mint } => ReceiptDetail::EscrowRefunded {
            stage: EscrowStage::Refunded,
            refund: escrow::pull_back(cs, program_id, payer, counterparty, mint)?,
        },
        Instruction::MarketInit { beneficiary, token_mint, fee_numerator, fee_denominator } => {
            let addresses = market::initialize(
                cs,
                program_id,
                &signers,
                beneficiary,
                token_mint,
                base_mint,
                *fee_numerator,
                *fee_denominator,
            )?;
            ReceiptDetail::MarketCreated {
                state: addresses.state,
                token_reserve: addresses.token_reserve,
                base_reserve: addresses.base_reserve,
            }
        }
        Instruction::MarketAddLiquidity { beneficiary, token_mint, token_amount, base_amount } => {
            ReceiptDetail::LiquidityAdded {
                reserves: market::add_liquidity(
                    cs,
                    program_id,
                    &signers,
                    beneficiary,
                    token_mint,
                    *token_amount,
                    *base_amount,
                )?,
            }
        }
        Instruction::MarketSwap { trader, beneficiary, token_mint, amount_in, direction } => {
            ReceiptDetail::Swapped {
                quote: market::swap(
                    cs,
                    program_id,
                    &signers,
                    trader,
                    beneficiary,
                    token_mint,
                    *amount_in,
                    *direction,
                )?,
            }
        }
    };
    Ok(detail)
}
