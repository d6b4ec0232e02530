use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SwapDirection;
use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// CPMM PRICING
// ============================================================================

// Constant Product Market Maker between one token and the base currency
//
// Formula: x * y = k (constant product)
//
// - x = token reserve
// - y = base reserve
// - fees stay inside the input reserve, so k drifts upward for the pool
//
// All arithmetic is integer. Every division floors, and intermediate
// products are computed in u128 with checked operations.

/// Swap fee as an exact ratio, `0 <= numerator < denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFeeRatio")]
pub struct FeeRatio {
    numerator: u64,
    denominator: u64,
}

// Unchecked wire form; every decoded ratio goes back through `FeeRatio::new`
#[derive(Deserialize)]
struct RawFeeRatio {
    numerator: u64,
    denominator: u64,
}

impl TryFrom<RawFeeRatio> for FeeRatio {
    type Error = LedgerError;

    fn try_from(raw: RawFeeRatio) -> LedgerResult<Self> {
        FeeRatio::new(raw.numerator, raw.denominator)
    }
}

impl FeeRatio {
    pub fn new(numerator: u64, denominator: u64) -> LedgerResult<Self> {
        if denominator == 0 || numerator >= denominator {
            return Err(LedgerError::InvalidArgument(format!(
                "fee {}/{} must satisfy 0 <= numerator < denominator",
                numerator, denominator
            )));
        }
        Ok(Self { numerator, denominator })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Input left after the fee: `amount_in * (den - num) / den`, floored
    pub fn net_input(&self, amount_in: u64) -> LedgerResult<u64> {
        let kept = (self.denominator - self.numerator) as u128;
        let net = (amount_in as u128)
            .checked_mul(kept)
            .ok_or_else(|| LedgerError::overflow("fee-adjusted input"))?
            / self.denominator as u128;
        u64::try_from(net).map_err(|_| LedgerError::overflow("fee-adjusted input"))
    }
}

/// Full breakdown of one swap, before or after execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub direction: SwapDirection,
    pub amount_in: u64,
    pub amount_in_net: u64,
    /// Portion of the input that stays in the pool as fee
    pub fee_retained: u64,
    pub amount_out: u64,
    pub reserve_in_before: u64,
    pub reserve_out_before: u64,
    pub reserve_in_after: u64,
    pub reserve_out_after: u64,
}

/// Price a swap against the given reserves
///
/// # Arguments
/// * `reserve_in` - Reserve on the side the trader pays into
/// * `reserve_out` - Reserve on the side the trader receives from
/// * `amount_in` - Full amount the trader pays, fee included
///
/// # Returns
/// Ok(SwapQuote), or `InvariantViolation` if the swap is empty, would pay
/// nothing, or would drain the output reserve
pub fn quote(
    reserve_in: u64,
    reserve_out: u64,
    amount_in: u64,
    fee: &FeeRatio,
    direction: SwapDirection,
) -> LedgerResult<SwapQuote> {
    if amount_in == 0 {
        return Err(LedgerError::InvariantViolation("swap input must be positive".into()));
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(LedgerError::InvariantViolation("market has an empty reserve".into()));
    }

    let amount_in_net = fee.net_input(amount_in)?;
    let k = (reserve_in as u128)
        .checked_mul(reserve_out as u128)
        .ok_or_else(|| LedgerError::overflow("constant product"))?;
    let shifted_in = (reserve_in as u128)
        .checked_add(amount_in_net as u128)
        .ok_or_else(|| LedgerError::overflow("input reserve"))?;

    // amount_out = reserve_out - k / (reserve_in + amount_in_net)
    let remaining_out = k / shifted_in;
    let amount_out = (reserve_out as u128)
        .checked_sub(remaining_out)
        .ok_or_else(|| LedgerError::InvariantViolation("output exceeds reserve".into()))?;
    let amount_out = u64::try_from(amount_out).map_err(|_| LedgerError::overflow("swap output"))?;

    if amount_out == 0 {
        return Err(LedgerError::InvariantViolation(format!(
            "input {} buys nothing at current reserves",
            amount_in
        )));
    }
    if amount_out >= reserve_out {
        return Err(LedgerError::InvariantViolation(
            "swap would drain the output reserve".into(),
        ));
    }

    let reserve_in_after = reserve_in
        .checked_add(amount_in)
        .ok_or_else(|| LedgerError::overflow("input reserve"))?;
    let reserve_out_after = reserve_out - amount_out;
    check_invariant(reserve_in, reserve_out, reserve_in_after, reserve_out_after)?;

    Ok(SwapQuote {
        direction,
        amount_in,
        amount_in_net,
        fee_retained: amount_in - amount_in_net,
        amount_out,
        reserve_in_before: reserve_in,
        reserve_out_before: reserve_out,
        reserve_in_after,
        reserve_out_after,
    })
}

/// The product may only shrink by the flooring of the output reserve, i.e.
/// `in_after * (out_after + 1) > in_before * out_before`
pub fn check_invariant(
    in_before: u64,
    out_before: u64,
    in_after: u64,
    out_after: u64,
) -> LedgerResult<()> {
    let before = in_before as u128 * out_before as u128;
    let bound = (in_after as u128)
        .checked_mul(out_after as u128 + 1)
        .ok_or_else(|| LedgerError::overflow("constant product"))?;
    if bound <= before {
        return Err(LedgerError::InvariantViolation(format!(
            "product fell from {} to {}",
            before,
            in_after as u128 * out_after as u128
        )));
    }
    Ok(())
}

/// Human-readable amount for a mint with `decimals`
pub fn ui_amount(amount: u64, decimals: u8) -> Decimal {
    let mut value = Decimal::from(amount);
    // decimals above 28 are not representable; fall back to raw units
    if value.set_scale(decimals as u32).is_err() {
        return Decimal::from(amount);
    }
    value
}

/// Base currency paid per whole token at the current reserves
pub fn spot_price(
    token_reserve: u64,
    base_reserve: u64,
    token_decimals: u8,
    base_decimals: u8,
) -> Option<Decimal> {
    if token_reserve == 0 {
        return None;
    }
    ui_amount(base_reserve, base_decimals).checked_div(ui_amount(token_reserve, token_decimals))
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const UNIT: u64 = 1_000_000_000;

    #[test]
    fn test_fee_ratio_bounds() {
        assert!(FeeRatio::new(0, 1000).is_ok());
        assert!(FeeRatio::new(999, 1000).is_ok());
        assert_eq!(FeeRatio::new(1000, 1000).unwrap_err().kind(), "InvalidArgument");
        assert_eq!(FeeRatio::new(0, 0).unwrap_err().kind(), "InvalidArgument");
    }

    #[test]
    fn test_net_input_floors_toward_pool() {
        let fee = FeeRatio::new(3, 1000).unwrap();
        // 999 * 997 / 1000 = 996.003
        assert_eq!(fee.net_input(999).unwrap(), 996);
        let expected = (u64::MAX as u128 * 997 / 1000) as u64;
        assert_eq!(fee.net_input(u64::MAX).unwrap(), expected);
    }

    #[test]
    fn test_decoded_fee_ratio_is_validated() {
        for json in [
            r#"{"numerator":0,"denominator":0}"#,
            r#"{"numerator":7,"denominator":5}"#,
            r#"{"numerator":5,"denominator":5}"#,
        ] {
            assert!(serde_json::from_str::<FeeRatio>(json).is_err(), "accepted {}", json);
        }

        let fee: FeeRatio = serde_json::from_str(r#"{"numerator":3,"denominator":1000}"#).unwrap();
        assert_eq!(fee, FeeRatio::new(3, 1000).unwrap());
        assert_eq!(serde_json::to_string(&fee).unwrap(), r#"{"numerator":3,"denominator":1000}"#);
    }

    #[test]
    fn test_zero_fee_reference_swap() {
        let fee = FeeRatio::new(0, 1000).unwrap();
        let quote = quote(2 * UNIT, 50 * UNIT, UNIT, &fee, SwapDirection::ToToken).unwrap();

        assert_eq!(quote.amount_in_net, UNIT);
        assert_eq!(quote.amount_out, 16_666_666_667);
        assert_eq!(quote.reserve_in_after, 3 * UNIT);
        assert_eq!(quote.reserve_out_after, 33_333_333_333);
        assert_eq!(quote.fee_retained, 0);
    }

    #[test]
    fn test_fee_reduces_output() {
        let free = FeeRatio::new(0, 1000).unwrap();
        let paid = FeeRatio::new(30, 1000).unwrap();
        let a = quote(10 * UNIT, 10 * UNIT, UNIT, &free, SwapDirection::ToBase).unwrap();
        let b = quote(10 * UNIT, 10 * UNIT, UNIT, &paid, SwapDirection::ToBase).unwrap();

        assert!(b.amount_out < a.amount_out);
        assert_eq!(b.fee_retained, 30_000_000);
        // full input lands in the reserve
        assert_eq!(b.reserve_in_after, 11 * UNIT);
    }

    #[test]
    fn test_rejects_empty_input_and_empty_pool() {
        let fee = FeeRatio::new(0, 1).unwrap();
        for (reserve_in, reserve_out, amount_in) in [(10, 10, 0), (0, 10, 5), (10, 0, 5)] {
            let err = quote(reserve_in, reserve_out, amount_in, &fee, SwapDirection::ToToken)
                .unwrap_err();
            assert_eq!(err.kind(), "InvariantViolation");
        }
    }

    #[test]
    fn test_rejects_draining_swap() {
        let fee = FeeRatio::new(0, 1).unwrap();
        // k = 1, k / 6 floors to 0 so the whole output reserve would leave
        let err = quote(1, 1, 5, &fee, SwapDirection::ToBase).unwrap_err();
        assert_eq!(err.kind(), "InvariantViolation");
    }

    #[test]
    fn test_rejects_dust_that_buys_nothing() {
        let fee = FeeRatio::new(1, 2).unwrap();
        // net input is 0 after the 50% fee
        let err = quote(1_000, 1_000, 1, &fee, SwapDirection::ToBase).unwrap_err();
        assert_eq!(err.kind(), "InvariantViolation");
    }

    #[test]
    fn test_input_reserve_overflow() {
        let fee = FeeRatio::new(0, 1).unwrap();
        let err = quote(u64::MAX - 1, u64::MAX, 10, &fee, SwapDirection::ToToken).unwrap_err();
        assert_eq!(err.kind(), "ArithmeticOverflow");
    }

    #[test]
    fn test_price_impact_increases_with_size() {
        let fee = FeeRatio::new(0, 1).unwrap();
        let small = quote(100 * UNIT, 100 * UNIT, UNIT, &fee, SwapDirection::ToToken).unwrap();
        let large =
            quote(100 * UNIT, 100 * UNIT, 10 * UNIT, &fee, SwapDirection::ToToken).unwrap();

        // out per unit in gets worse as the trade grows
        let large_rate = (large.amount_out as u128) * (UNIT as u128);
        let small_rate = (small.amount_out as u128) * 10 * (UNIT as u128);
        assert!(large_rate < small_rate);
    }

    #[test]
    fn test_spot_price_uses_decimals() {
        assert_eq!(spot_price(50 * UNIT, 2 * UNIT, 9, 9), Some(dec!(0.04)));
        assert_eq!(spot_price(5_000_000, 2 * UNIT, 6, 9), Some(dec!(0.4)));
        assert_eq!(spot_price(0, UNIT, 9, 9), None);
    }
}
