// HTTP request handlers for the settlement API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::address::Address;
use crate::app_state::{lock, SharedState};
use crate::engine::{EscrowView, MarketView};
use crate::error::LedgerError;
use crate::instruction::{Instruction, Receipt};
use crate::ledger::{Account, LedgerEntry};
use crate::market::{SwapDirection, SwapQuote};

const DEFAULT_LEDGER_LIMIT: usize = 50;

// ===== ERRORS =====

/// A rejected request, rendered as `{ "error": kind, "message": ... }`
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LedgerError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::DuplicateState(_) => StatusCode::CONFLICT,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = json!({ "error": self.0.kind(), "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.parse().map_err(ApiError)
}

// ===== REQUEST BODIES =====

#[derive(Debug, Deserialize)]
pub struct InstructionRequest {
    #[serde(default)]
    pub signers: Vec<Address>,
    pub instruction: Instruction,
}

#[derive(Debug, Deserialize)]
pub struct AirdropRequest {
    pub owner: Address,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub amount_in: u64,
    pub direction: SwapDirection,
}

#[derive(Debug, Deserialize)]
pub struct LedgerParams {
    pub limit: Option<usize>,
}

// ===== HANDLERS =====

pub async fn health_check() -> &'static str {
    "BlackBook Settlement Engine - Online ✅"
}

pub async fn submit_instruction(
    State(state): State<SharedState>,
    Json(request): Json<InstructionRequest>,
) -> ApiResult<Receipt> {
    let mut app_state = lock(&state);
    let receipt = app_state.engine.process(&request.signers, &request.instruction)?;
    Ok(Json(receipt))
}

pub async fn get_balance(
    State(state): State<SharedState>,
    Path(address): Path<String>,
) -> ApiResult<Value> {
    let address = parse_address(&address)?;
    let balance = lock(&state).engine.balance(&address)?;
    Ok(Json(json!({ "address": address, "balance": balance })))
}

pub async fn get_account(
    State(state): State<SharedState>,
    Path((owner, mint)): Path<(String, String)>,
) -> ApiResult<Account> {
    let (owner, mint) = (parse_address(&owner)?, parse_address(&mint)?);
    let account = lock(&state).engine.associated_account(&owner, &mint)?;
    Ok(Json(account))
}

pub async fn get_escrow(
    State(state): State<SharedState>,
    Path((payer, counterparty, mint)): Path<(String, String, String)>,
) -> ApiResult<EscrowView> {
    let payer = parse_address(&payer)?;
    let counterparty = parse_address(&counterparty)?;
    let mint = parse_address(&mint)?;
    let view = lock(&state).engine.escrow(&payer, &counterparty, &mint)?;
    Ok(Json(view))
}

pub async fn get_market(
    State(state): State<SharedState>,
    Path((beneficiary, token_mint)): Path<(String, String)>,
) -> ApiResult<MarketView> {
    let (beneficiary, token_mint) = (parse_address(&beneficiary)?, parse_address(&token_mint)?);
    let view = lock(&state).engine.market(&beneficiary, &token_mint)?;
    Ok(Json(view))
}

pub async fn get_quote(
    State(state): State<SharedState>,
    Path((beneficiary, token_mint)): Path<(String, String)>,
    Query(params): Query<QuoteParams>,
) -> ApiResult<SwapQuote> {
    let (beneficiary, token_mint) = (parse_address(&beneficiary)?, parse_address(&token_mint)?);
    let quote = lock(&state)
        .engine
        .quote_swap(&beneficiary, &token_mint, params.amount_in, params.direction)?;
    Ok(Json(quote))
}

pub async fn airdrop(
    State(state): State<SharedState>,
    Json(request): Json<AirdropRequest>,
) -> ApiResult<Value> {
    let mut app_state = lock(&state);
    if !app_state.config.enable_airdrop {
        return Err(LedgerError::NotAuthorized("airdrop is disabled".into()).into());
    }
    let balance = app_state.engine.airdrop(&request.owner, request.amount)?;
    Ok(Json(json!({ "owner": request.owner, "balance": balance })))
}

pub async fn get_ledger(
    State(state): State<SharedState>,
    Query(params): Query<LedgerParams>,
) -> Json<Vec<LedgerEntry>> {
    let app_state = lock(&state);
    let limit = params.limit.unwrap_or(DEFAULT_LEDGER_LIMIT);
    Json(app_state.engine.journal().recent(limit).into_iter().cloned().collect())
}
