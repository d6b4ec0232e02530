// ============================================================================
// Escrow Setup
// ============================================================================
//
// The payer opens the escrow state and an empty vault at addresses derived
// from (payer, counterparty, mint). A second setup for the same triple fails
// while the first escrow is live.
//
// ============================================================================

use tracing::info;

use super::{escrow_addresses, EscrowAddresses, EscrowStage, EscrowState};
use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::instruction::Signers;
use crate::ledger::{Account, Changeset};

pub fn setup(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    signers: &Signers<'_>,
    payer: &Address,
    counterparty: &Address,
    mint: &Address,
) -> LedgerResult<EscrowAddresses> {
    signers.require(payer, "escrow setup")?;
    if payer == counterparty {
        return Err(LedgerError::InvalidArgument(
            "payer and counterparty must differ".into(),
        ));
    }
    cs.mint(mint)?;

    let addresses = escrow_addresses(program_id, payer, counterparty, mint)?;
    let mut state = EscrowState {
        payer: *payer,
        counterparty: *counterparty,
        mint: *mint,
        vault: addresses.vault,
        payer_deposit: 0,
        counterparty_deposit: 0,
        stage: EscrowStage::Uninitialized,
        state_bump: addresses.state_bump,
        vault_bump: addresses.vault_bump,
    };
    state.advance(EscrowStage::AwaitingDeposits)?;

    cs.create_escrow(addresses.state, state)?;
    cs.create_account(Account::program(addresses.vault, addresses.state, *mint))?;

    info!(
        escrow = %addresses.state.short(),
        payer = %payer.short(),
        counterparty = %counterparty.short(),
        "🔐 Escrow created"
    );
    Ok(addresses)
}
