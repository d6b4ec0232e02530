// ============================================================================
// Market Initialize
// ============================================================================
//
// The beneficiary opens a market for one token against the base currency.
// Reserves start empty; pricing is undefined until liquidity arrives.
//
// ============================================================================

use tracing::info;

use super::{market_addresses, FeeRatio, MarketAddresses, MarketState};
use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::instruction::Signers;
use crate::ledger::{Account, Changeset};

#[allow(clippy::too_many_arguments)]
pub fn initialize(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    signers: &Signers<'_>,
    beneficiary: &Address,
    token_mint: &Address,
    base_mint: &Address,
    fee_numerator: u64,
    fee_denominator: u64,
) -> LedgerResult<MarketAddresses> {
    signers.require(beneficiary, "market init")?;
    let fee = FeeRatio::new(fee_numerator, fee_denominator)?;
    if token_mint == base_mint {
        return Err(LedgerError::InvalidArgument(
            "market token cannot be the base currency".into(),
        ));
    }
    cs.mint(token_mint)?;
    cs.mint(base_mint)?;

    let addresses = market_addresses(program_id, beneficiary, token_mint)?;
    cs.create_market(
        addresses.state,
        MarketState {
            beneficiary: *beneficiary,
            token_mint: *token_mint,
            base_mint: *base_mint,
            fee,
            token_reserve: addresses.token_reserve,
            base_reserve: addresses.base_reserve,
            state_bump: addresses.state_bump,
            token_reserve_bump: addresses.token_reserve_bump,
            base_reserve_bump: addresses.base_reserve_bump,
        },
    )?;
    cs.create_account(Account::program(addresses.token_reserve, addresses.state, *token_mint))?;
    cs.create_account(Account::program(addresses.base_reserve, addresses.state, *base_mint))?;

    info!(
        market = %addresses.state.short(),
        beneficiary = %beneficiary.short(),
        fee = %format!("{}/{}", fee_numerator, fee_denominator),
        "🏪 Market created"
    );
    Ok(addresses)
}
