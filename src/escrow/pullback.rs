// ============================================================================
// Escrow Pull-Back - symmetric refund
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{escrow_addresses, EscrowStage};
use crate::address::Address;
use crate::error::LedgerResult;
use crate::ledger::Changeset;
use crate::token::receiving_account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub payer_refund: u64,
    pub counterparty_refund: u64,
}

/// Return each party exactly its own recorded deposit and close the escrow
pub fn pull_back(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    payer: &Address,
    counterparty: &Address,
    mint: &Address,
) -> LedgerResult<Refund> {
    let addresses = escrow_addresses(program_id, payer, counterparty, mint)?;
    let mut state = cs.escrow(&addresses.state)?;

    state.advance(EscrowStage::Refunded)?;
    state.check_vault_address(program_id)?;
    let vault = cs.account(&state.vault)?;
    state.check_vault(vault.amount)?;

    let payer_account = receiving_account(cs, program_id, &state.payer, &state.mint)?;
    let counterparty_account = receiving_account(cs, program_id, &state.counterparty, &state.mint)?;

    cs.transfer(&state.vault, &payer_account, state.payer_deposit)?;
    cs.transfer(&state.vault, &counterparty_account, state.counterparty_deposit)?;

    cs.close_account(&state.vault)?;
    cs.remove_escrow(&addresses.state);

    info!(
        escrow = %addresses.state.short(),
        payer_refund = state.payer_deposit,
        counterparty_refund = state.counterparty_deposit,
        "💸 Escrow refunded"
    );
    Ok(Refund {
        payer_refund: state.payer_deposit,
        counterparty_refund: state.counterparty_deposit,
    })
}
