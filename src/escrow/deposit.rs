// ============================================================================
// Escrow Deposit - joint funding
// ============================================================================
//
// Both parties co-sign one call and each puts in `amount`. There is no
// one-sided deposit, so no party can end up locked in alone.
//
// ============================================================================

use tracing::info;

use super::{escrow_addresses, EscrowStage};
use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::instruction::Signers;
use crate::ledger::Changeset;
use crate::token::user_account;

/// Fund the escrow from both sides and return the vault balance
pub fn deposit(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    signers: &Signers<'_>,
    payer: &Address,
    counterparty: &Address,
    mint: &Address,
    amount: u64,
) -> LedgerResult<u64> {
    let addresses = escrow_addresses(program_id, payer, counterparty, mint)?;
    let mut state = cs.escrow(&addresses.state)?;

    signers.require(&state.payer, "escrow deposit")?;
    signers.require(&state.counterparty, "escrow deposit")?;
    state.advance(EscrowStage::Funded)?;
    if amount == 0 {
        return Err(LedgerError::InvalidArgument("deposit amount must be positive".into()));
    }

    let payer_account = user_account(cs, program_id, &state.payer, &state.mint)?;
    let counterparty_account = user_account(cs, program_id, &state.counterparty, &state.mint)?;

    cs.transfer(&payer_account, &state.vault, amount)?;
    cs.transfer(&counterparty_account, &state.vault, amount)?;

    state.payer_deposit = amount;
    state.counterparty_deposit = amount;

    let vault_balance = cs.account(&state.vault)?.amount;
    state.check_vault(vault_balance)?;

    cs.put_escrow(addresses.state, state);

    info!(escrow = %addresses.state.short(), amount, vault_balance, "💰 Escrow funded");
    Ok(vault_balance)
}
