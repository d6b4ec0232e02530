// ============================================================================
// Market Liquidity
// ============================================================================
//
// Only the beneficiary provides liquidity and no share token is issued.
// Amounts are taken as given; keeping the ratio sensible on later additions
// is the beneficiary's own business.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;

use super::market_addresses;
use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::instruction::Signers;
use crate::ledger::Changeset;
use crate::token::user_account;

/// Reserve balances after an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub token: u64,
    pub base: u64,
}

pub fn add_liquidity(
    cs: &mut Changeset<'_>,
    program_id: &Address,
    signers: &Signers<'_>,
    beneficiary: &Address,
    token_mint: &Address,
    token_amount: u64,
    base_amount: u64,
) -> LedgerResult<Reserves> {
    let addresses = market_addresses(program_id, beneficiary, token_mint)?;
    let market = cs.market(&addresses.state)?;
    signers.require(&market.beneficiary, "add liquidity")?;
    if token_amount == 0 && base_amount == 0 {
        return Err(LedgerError::InvalidArgument("liquidity amounts are both zero".into()));
    }

    if token_amount > 0 {
        let source = user_account(cs, program_id, &market.beneficiary, &market.token_mint)?;
        cs.transfer(&source, &market.token_reserve, token_amount)?;
    }
    if base_amount > 0 {
        let source = user_account(cs, program_id, &market.beneficiary, &market.base_mint)?;
        cs.transfer(&source, &market.base_reserve, base_amount)?;
    }

    let reserves = Reserves {
        token: cs.account(&market.token_reserve)?.amount,
        base: cs.account(&market.base_reserve)?.amount,
    };
    info!(
        market = %addresses.state.short(),
        token_amount,
        base_amount,
        token_reserve = reserves.token,
        base_reserve = reserves.base,
        "💧 Liquidity added"
    );
    Ok(reserves)
}
