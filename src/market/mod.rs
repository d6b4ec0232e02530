// ============================================================================
// Market Module - Constant-Product Token/Base Market
// ============================================================================
//
// One market per (beneficiary, token mint), priced against the engine's
// base currency:
//   - cpmm:        integer pricing math, fees, invariant check
//   - initialize:  beneficiary opens the state and two empty reserves
//   - liquidity:   beneficiary funds both reserves
//   - swap:        anyone trades in either direction
//
// ============================================================================

pub mod cpmm;
pub mod initialize;
pub mod liquidity;
pub mod swap;

pub use cpmm::{FeeRatio, SwapQuote};
pub use initialize::initialize;
pub use liquidity::{add_liquidity, Reserves};
pub use swap::{preview_swap, swap};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::{derive_address, tags, Address};
use crate::error::{LedgerError, LedgerResult};

/// Which side of the market the trader receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Pay base currency, receive tokens
    ToToken,
    /// Pay tokens, receive base currency
    ToBase,
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapDirection::ToToken => write!(f, "to_token"),
            SwapDirection::ToBase => write!(f, "to_base"),
        }
    }
}

impl FromStr for SwapDirection {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to_token" | "toToken" => Ok(SwapDirection::ToToken),
            "to_base" | "toBase" => Ok(SwapDirection::ToBase),
            other => Err(LedgerError::InvalidArgument(format!(
                "unknown swap direction '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub beneficiary: Address,
    pub token_mint: Address,
    pub base_mint: Address,
    pub fee: FeeRatio,
    pub token_reserve: Address,
    pub base_reserve: Address,
    pub state_bump: u8,
    pub token_reserve_bump: u8,
    pub base_reserve_bump: u8,
}

impl MarketState {
    /// (input reserve, output reserve) for a swap in `direction`
    pub fn reserves_for(&self, direction: SwapDirection) -> (Address, Address) {
        match direction {
            SwapDirection::ToToken => (self.base_reserve, self.token_reserve),
            SwapDirection::ToBase => (self.token_reserve, self.base_reserve),
        }
    }

    /// (mint paid, mint received) for a swap in `direction`
    pub fn mints_for(&self, direction: SwapDirection) -> (Address, Address) {
        match direction {
            SwapDirection::ToToken => (self.base_mint, self.token_mint),
            SwapDirection::ToBase => (self.token_mint, self.base_mint),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketAddresses {
    pub state: Address,
    pub state_bump: u8,
    pub token_reserve: Address,
    pub token_reserve_bump: u8,
    pub base_reserve: Address,
    pub base_reserve_bump: u8,
}

/// Recompute a market's state and reserve addresses from public inputs
///
/// The reserves hang off the state address, so they are unique per market.
pub fn market_addresses(
    program_id: &Address,
    beneficiary: &Address,
    token_mint: &Address,
) -> LedgerResult<MarketAddresses> {
    let (state, state_bump) = derive_address(
        &[tags::MARKET_STATE, beneficiary.as_ref(), token_mint.as_ref()],
        program_id,
    )?;
    let (token_reserve, token_reserve_bump) = derive_address(
        &[tags::TOKEN_RESERVE, state.as_ref(), beneficiary.as_ref()],
        program_id,
    )?;
    let (base_reserve, base_reserve_bump) = derive_address(
        &[tags::BASE_RESERVE, state.as_ref(), beneficiary.as_ref()],
        program_id,
    )?;
    Ok(MarketAddresses {
        state,
        state_bump,
        token_reserve,
        token_reserve_bump,
        base_reserve,
        base_reserve_bump,
    })
}
