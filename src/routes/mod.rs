// Routes module - wires every HTTP endpoint to its handler

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;

pub fn router(state: SharedState) -> Router {
    Router::new()
        // ===== INSTRUCTIONS =====
        .route("/instructions", post(submit_instruction))
        .route("/airdrop", post(airdrop))
        // ===== LEDGER QUERIES =====
        .route("/balance/:address", get(get_balance))
        .route("/accounts/:owner/:mint", get(get_account))
        .route("/escrows/:payer/:counterparty/:mint", get(get_escrow))
        .route("/markets/:beneficiary/:token_mint", get(get_market))
        .route("/markets/:beneficiary/:token_mint/quote", get(get_quote))
        .route("/ledger", get(get_ledger))
        // ===== HEALTH CHECK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
