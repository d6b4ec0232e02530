/// Constant-product market integration tests
///
/// The beneficiary lists a 9-decimal token against the base currency and a
/// separate trader swaps through the engine's instruction interface.

use blackbook_settlement::{
    Address, Config, Engine, Instruction, LedgerError, ReceiptDetail, SwapDirection, SwapQuote,
};
use rust_decimal_macros::dec;

const UNIT: u64 = 1_000_000_000;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

struct Market {
    engine: Engine,
    beneficiary: Address,
    trader: Address,
    token: Address,
    base: Address,
}

impl Market {
    /// Beneficiary holds 200 tokens and 10 base; trader holds 5 base and an empty token account
    fn new(fee_numerator: u64, fee_denominator: u64) -> Self {
        let mut engine = Engine::new(&Config::default()).unwrap();
        let beneficiary = Address::new_unique();
        let trader = Address::new_unique();
        let token = Address::new_unique();
        let base = engine.base_mint();

        engine
            .process(
                &[beneficiary],
                &Instruction::CreateMint { mint: token, decimals: 9, authority: beneficiary },
            )
            .unwrap();
        for owner in [beneficiary, trader] {
            engine.process(&[owner], &Instruction::OpenAccount { owner, mint: token }).unwrap();
        }
        engine
            .process(
                &[beneficiary],
                &Instruction::MintTo { mint: token, owner: beneficiary, amount: 200 * UNIT },
            )
            .unwrap();
        engine.airdrop(&beneficiary, 10 * UNIT).unwrap();
        engine.airdrop(&trader, 5 * UNIT).unwrap();

        engine
            .process(
                &[beneficiary],
                &Instruction::MarketInit {
                    beneficiary,
                    token_mint: token,
                    fee_numerator,
                    fee_denominator,
                },
            )
            .unwrap();
        Self { engine, beneficiary, trader, token, base }
    }

    fn add_liquidity(&mut self, token_amount: u64, base_amount: u64) -> Result<(), LedgerError> {
        let beneficiary = self.beneficiary;
        self.engine
            .process(
                &[beneficiary],
                &Instruction::MarketAddLiquidity {
                    beneficiary,
                    token_mint: self.token,
                    token_amount,
                    base_amount,
                },
            )
            .map(|_| ())
    }

    fn swap(
        &mut self,
        trader: Address,
        amount_in: u64,
        direction: SwapDirection,
    ) -> Result<SwapQuote, LedgerError> {
        let instruction = Instruction::MarketSwap {
            trader,
            beneficiary: self.beneficiary,
            token_mint: self.token,
            amount_in,
            direction,
        };
        self.engine.process(&[trader], &instruction).map(|receipt| match receipt.detail {
            ReceiptDetail::Swapped { quote } => quote,
            other => panic!("unexpected receipt {:?}", other),
        })
    }

    fn reserves(&self) -> (u64, u64) {
        let view = self.engine.market(&self.beneficiary, &self.token).unwrap();
        (view.token_reserve_balance, view.base_reserve_balance)
    }

    fn holding(&self, owner: &Address, mint: &Address) -> u64 {
        self.engine.associated_account(owner, mint).unwrap().amount
    }
}

// ============================================================================
// REFERENCE SWAPS
// ============================================================================

#[test]
fn test_base_to_token_reference_swap() {
    let mut m = Market::new(0, 1000);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();

    let quote = m.swap(m.trader, UNIT, SwapDirection::ToToken).unwrap();
    assert_eq!(quote.amount_in_net, UNIT);
    assert_eq!(quote.amount_out, 16_666_666_667);

    assert_eq!(m.reserves(), (33_333_333_333, 3 * UNIT));
    assert_eq!(m.holding(&m.trader, &m.token), 16_666_666_667);
    assert_eq!(m.holding(&m.trader, &m.base), 4 * UNIT);
}

#[test]
fn test_token_to_base_follow_up_swap() {
    let mut m = Market::new(0, 1000);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();
    m.swap(m.trader, UNIT, SwapDirection::ToToken).unwrap();

    let beneficiary = m.beneficiary;
    let base_before = m.holding(&beneficiary, &m.base);
    let quote = m.swap(beneficiary, 50 * UNIT, SwapDirection::ToBase).unwrap();

    assert_eq!(quote.amount_out, 1_800_000_001);
    assert_eq!(m.reserves(), (83_333_333_333, 1_199_999_999));
    assert_eq!(m.holding(&beneficiary, &m.base), base_before + 1_800_000_001);
}

#[test]
fn test_fee_grows_the_product() {
    let mut m = Market::new(30, 1000);
    m.add_liquidity(100 * UNIT, 5 * UNIT).unwrap();

    let mut k = 100 * UNIT as u128 * 5 * UNIT as u128;
    for _ in 0..5 {
        let quote = m.swap(m.trader, UNIT / 2, SwapDirection::ToToken).unwrap();
        assert_eq!(quote.fee_retained, 15_000_000);
        let (token, base) = m.reserves();
        let next = token as u128 * base as u128;
        assert!(next > k, "product fell from {} to {}", k, next);
        k = next;
    }
}

// ============================================================================
// LIQUIDITY & INITIALIZATION
// ============================================================================

#[test]
fn test_only_beneficiary_adds_liquidity() {
    let mut m = Market::new(0, 1);
    let (trader, beneficiary, token_mint) = (m.trader, m.beneficiary, m.token);
    let err = m
        .engine
        .process(
            &[trader],
            &Instruction::MarketAddLiquidity {
                beneficiary,
                token_mint,
                token_amount: 1,
                base_amount: 1,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "NotAuthorized");
    assert_eq!(m.reserves(), (0, 0));
}

#[test]
fn test_liquidity_has_no_ratio_check() {
    let mut m = Market::new(0, 1);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();
    m.add_liquidity(UNIT, 0).unwrap();
    m.add_liquidity(0, 3 * UNIT).unwrap();
    assert_eq!(m.reserves(), (51 * UNIT, 5 * UNIT));
    assert_eq!(m.add_liquidity(0, 0).unwrap_err().kind(), "InvalidArgument");
}

#[test]
fn test_liquidity_beyond_holdings_rolls_back() {
    let mut m = Market::new(0, 1);
    // token leg succeeds, base leg cannot be covered
    let err = m.add_liquidity(10 * UNIT, 11 * UNIT).unwrap_err();
    assert_eq!(err.kind(), "InsufficientBalance");
    assert_eq!(m.reserves(), (0, 0));
    assert_eq!(m.holding(&m.beneficiary, &m.token), 200 * UNIT);
}

#[test]
fn test_market_init_rules() {
    let mut m = Market::new(0, 1);
    let (beneficiary, token_mint, base) = (m.beneficiary, m.token, m.base);

    let err = m
        .engine
        .process(
            &[beneficiary],
            &Instruction::MarketInit {
                beneficiary,
                token_mint,
                fee_numerator: 1,
                fee_denominator: 100,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "DuplicateState");

    let err = m
        .engine
        .process(
            &[beneficiary],
            &Instruction::MarketInit {
                beneficiary,
                token_mint: base,
                fee_numerator: 0,
                fee_denominator: 1,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");

    let other = Address::new_unique();
    let err = m
        .engine
        .process(
            &[other],
            &Instruction::MarketInit {
                beneficiary: other,
                token_mint,
                fee_numerator: 5,
                fee_denominator: 5,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");

    let err = m
        .engine
        .process(
            &[beneficiary],
            &Instruction::MarketInit {
                beneficiary: other,
                token_mint,
                fee_numerator: 0,
                fee_denominator: 1,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), "NotAuthorized");
}

// ============================================================================
// SWAP REJECTIONS
// ============================================================================

#[test]
fn test_swap_against_empty_market() {
    let mut m = Market::new(0, 1);
    let err = m.swap(m.trader, UNIT, SwapDirection::ToToken).unwrap_err();
    assert_eq!(err.kind(), "InvariantViolation");
}

#[test]
fn test_zero_input_swap() {
    let mut m = Market::new(0, 1);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();
    let err = m.swap(m.trader, 0, SwapDirection::ToToken).unwrap_err();
    assert_eq!(err.kind(), "InvariantViolation");
}

#[test]
fn test_swap_needs_trader_signature() {
    let mut m = Market::new(0, 1);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();
    let instruction = Instruction::MarketSwap {
        trader: m.trader,
        beneficiary: m.beneficiary,
        token_mint: m.token,
        amount_in: UNIT,
        direction: SwapDirection::ToToken,
    };
    let err = m.engine.process(&[m.beneficiary], &instruction).unwrap_err();
    assert_eq!(err.kind(), "NotAuthorized");
}

#[test]
fn test_underfunded_swap_leaves_reserves() {
    let mut m = Market::new(0, 1);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();
    let err = m.swap(m.trader, 6 * UNIT, SwapDirection::ToToken).unwrap_err();
    assert_eq!(err, LedgerError::InsufficientBalance { available: 5 * UNIT, required: 6 * UNIT });
    assert_eq!(m.reserves(), (50 * UNIT, 2 * UNIT));
    assert_eq!(m.holding(&m.trader, &m.token), 0);
}

#[test]
fn test_swap_into_missing_account() {
    let mut m = Market::new(0, 1);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();
    let stranger = Address::new_unique();
    m.engine.airdrop(&stranger, UNIT).unwrap();

    // no token account to receive into
    let err = m.swap(stranger, UNIT, SwapDirection::ToToken).unwrap_err();
    assert_eq!(err.kind(), "NotFound");
    assert_eq!(m.reserves(), (50 * UNIT, 2 * UNIT));
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_quote_matches_executed_swap() {
    let mut m = Market::new(3, 1000);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();

    let preview =
        m.engine.quote_swap(&m.beneficiary, &m.token, UNIT, SwapDirection::ToToken).unwrap();
    assert_eq!(m.reserves(), (50 * UNIT, 2 * UNIT));

    let executed = m.swap(m.trader, UNIT, SwapDirection::ToToken).unwrap();
    assert_eq!(preview, executed);
}

#[test]
fn test_market_view_spot_price() {
    let mut m = Market::new(0, 1);
    assert_eq!(m.engine.market(&m.beneficiary, &m.token).unwrap().spot_price, None);

    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();
    let view = m.engine.market(&m.beneficiary, &m.token).unwrap();
    assert_eq!(view.spot_price, Some(dec!(0.04)));
    assert_eq!(view.state.beneficiary, m.beneficiary);
}

#[test]
fn test_supply_is_conserved_across_swaps() {
    let mut m = Market::new(10, 1000);
    m.add_liquidity(50 * UNIT, 2 * UNIT).unwrap();
    m.swap(m.trader, UNIT, SwapDirection::ToToken).unwrap();
    m.swap(m.trader, 3 * UNIT, SwapDirection::ToBase).unwrap();

    for mint in [m.token, m.base] {
        let supply = m.engine.store().mint(&mint).unwrap().supply as u128;
        assert_eq!(m.engine.store().circulating(&mint), supply);
    }
}
