// ============================================================================
// Escrow Resolve - winner takes the vault
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{escrow_addresses, EscrowStage};
use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Changeset;
use crate::token::receiving_account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub winner: Address,
    pub amount: u64,
}

/// Pay the whole vault to `winner` and close the escrow.
///
/// Permissionless once funded; `winner` must be one of the two parties.
pub fn resolve(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    payer: &Address,
    counterparty: &Address,
    mint: &Address,
    winner: &Address,
) -> LedgerResult<Payout> {
    let addresses = escrow_addresses(program_id, payer, counterparty, mint)?;
    let mut state = cs.escrow(&addresses.state)?;

    state.advance(EscrowStage::Resolved)?;
    if !state.is_party(winner) {
        return Err(LedgerError::InvalidArgument(format!(
            "winner {} is not a party to this escrow",
            winner.short()
        )));
    }

    state.check_vault_address(program_id)?;
    let vault = cs.account(&state.vault)?;
    state.check_vault(vault.amount)?;

    let winner_account = receiving_account(cs, program_id, winner, &state.mint)?;
    cs.transfer(&state.vault, &winner_account, vault.amount)?;

    cs.close_account(&state.vault)?;
    cs.remove_escrow(&addresses.state);

    info!(
        escrow = %addresses.state.short(),
        winner = %winner.short(),
        amount = vault.amount,
        "🏆 Escrow resolved"
    );
    Ok(Payout { winner: *winner, amount: vault.amount })
}
