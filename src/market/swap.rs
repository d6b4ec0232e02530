// ============================================================================
// Market Swap
// ============================================================================
//
// The trader pays `amount_in` in full into the input reserve. The fee is
// never split out; it stays in the pool and lifts k for later trades.
//
// ============================================================================

use tracing::{debug, info};

use super::cpmm::{self, SwapQuote};
use super::{market_addresses, MarketState, SwapDirection};
use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::instruction::Signers;
use crate::ledger::Changeset;
use crate::token::user_account;

/// Price a swap against the market's current (possibly staged) reserves
pub fn preview_swap(
    cs: &Changeset<'_>,
    market: &MarketState,
    amount_in: u64,
    direction: SwapDirection,
) -> LedgerResult<SwapQuote> {
    let (reserve_in, reserve_out) = market.reserves_for(direction);
    let reserve_in = cs.account(&reserve_in)?.amount;
    let reserve_out = cs.account(&reserve_out)?.amount;
    let quote = cpmm::quote(reserve_in, reserve_out, amount_in, &market.fee, direction)?;
    debug!(
        %direction,
        amount_in,
        amount_out = quote.amount_out,
        fee = quote.fee_retained,
        "📈 Swap quoted"
    );
    Ok(quote)
}

#[allow(clippy::too_many_arguments)]
pub fn swap(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    signers: &Signers<'_>,
    trader: &Address,
    beneficiary: &Address,
    token_mint: &Address,
    amount_in: u64,
    direction: SwapDirection,
) -> LedgerResult<SwapQuote> {
    signers.require(trader, "market swap")?;
    let addresses = market_addresses(program_id, beneficiary, token_mint)?;
    let market = cs.market(&addresses.state)?;
    let quote = preview_swap(cs, &market, amount_in, direction)?;

    let (mint_in, mint_out) = market.mints_for(direction);
    let (reserve_in, reserve_out) = market.reserves_for(direction);
    let trader_in = user_account(cs, program_id, trader, &mint_in)?;
    let trader_out = user_account(cs, program_id, trader, &mint_out)?;

    cs.transfer(&trader_in, &reserve_in, quote.amount_in)?;
    cs.transfer(&reserve_out, &trader_out, quote.amount_out)?;

    let in_after = cs.account(&reserve_in)?.amount;
    let out_after = cs.account(&reserve_out)?.amount;
    if in_after != quote.reserve_in_after || out_after != quote.reserve_out_after {
        return Err(LedgerError::InvariantViolation(format!(
            "reserves moved to {}/{} but quote expected {}/{}",
            in_after, out_after, quote.reserve_in_after, quote.reserve_out_after
        )));
    }
    cpmm::check_invariant(quote.reserve_in_before, quote.reserve_out_before, in_after, out_after)?;

    info!(
        market = %addresses.state.short(),
        trader = %trader.short(),
        %direction,
        amount_in,
        amount_out = quote.amount_out,
        "🔄 Swap executed"
    );
    Ok(quote)
}
