//! Axum route handlers for the treasury service.
//!
//! Every handler takes the single treasury lock for the whole operation, so
//! requests are applied one at a time. The wall clock is read here, at the
//! edge, and passed into the engine.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use treasury::{
    ApprovalReceipt, DepositReceipt, ExecutionReceipt, Intent, IntentCreated, IntentId,
    IntentStatus, MemoryLedger, PermitAuthorization, SignedApproval, SigningDomain, TokenAmount,
    Treasury, TreasuryError, UnixTimestamp,
};
use treasury_evm::Eip712Verifier;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// The hosted treasury behind its single-writer lock.
pub type SharedTreasury = Arc<Mutex<Treasury<Eip712Verifier, MemoryLedger>>>;

/// Source of the current time.
pub type Clock = fn() -> UnixTimestamp;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    treasury: SharedTreasury,
    clock: Clock,
}

impl AppState {
    /// Wraps `treasury`, reading time from the system clock.
    pub fn new(treasury: Treasury<Eip712Verifier, MemoryLedger>) -> Self {
        Self {
            treasury: Arc::new(Mutex::new(treasury)),
            clock: UnixTimestamp::now,
        }
    }

    /// Builds the treasury described by `config` over an in-memory ledger
    /// seeded with the genesis balances.
    ///
    /// # Errors
    ///
    /// Returns the treasury's configuration error.
    pub fn from_config(config: ServerConfig) -> Result<Self, TreasuryError> {
        let ledger = MemoryLedger::with_balances(
            config
                .genesis
                .iter()
                .map(|balance| (balance.account, balance.amount)),
        );
        let treasury = Treasury::new(config.treasury, Eip712Verifier, ledger)?;
        Ok(Self::new(treasury))
    }

    /// Replaces the clock.
    #[must_use]
    pub const fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The shared treasury handle.
    pub const fn treasury(&self) -> &SharedTreasury {
        &self.treasury
    }

    fn now(&self) -> UnixTimestamp {
        (self.clock)()
    }
}

/// Multisig policy and deployment identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyView {
    /// Signing domain.
    pub domain: SigningDomain,
    /// Accepted asset.
    pub asset: Address,
    /// Custody account.
    pub custody: Address,
    /// Current owners.
    pub owners: Vec<Address>,
    /// Quorum above the value threshold.
    pub required_signatures: usize,
    /// Largest single-approval amount.
    pub value_threshold: TokenAmount,
    /// Custodian.
    pub custodian: Address,
}

/// Balance of one account.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    /// Account.
    pub account: Address,
    /// Ledger balance.
    pub balance: TokenAmount,
}

/// One nonce bitmap word, or the next free nonce in it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceView {
    /// Nonce owner.
    pub owner: Address,
    /// Word index.
    pub word: TokenAmount,
    /// Current bitmap, for `GET /nonces/{owner}/{word}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitmap: Option<TokenAmount>,
    /// Lowest unused nonce, for `GET /nonces/{owner}/{word}/next`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<TokenAmount>,
}

/// An active intent with its status under the current policy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentView {
    /// The intent.
    #[serde(flatten)]
    pub intent: Intent,
    /// Status.
    pub status: IntentStatus,
    /// Approvals still missing.
    pub approvals_needed: usize,
}

/// `POST /deposits` body.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositRequest {
    /// The signed authorization.
    pub permit: PermitAuthorization,
    /// Owner signature.
    pub signature: Bytes,
}

/// `POST /intents` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    /// Creator.
    pub user: Address,
    /// Payee.
    pub to: Address,
    /// Amount per execution.
    pub amount: TokenAmount,
    /// Seconds between executions; omitted or `0` for one-shot.
    #[serde(default)]
    pub recurring_interval: u64,
    /// Explicit first execution time.
    #[serde(default)]
    pub start: Option<UnixTimestamp>,
}

/// `POST /intents/{id}/approvals` body: one approval or a batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApprovalRequest {
    /// Several approvals, recorded all or none.
    Batch {
        /// The approvals.
        approvals: Vec<SignedApproval>,
    },
    /// A single approval.
    Single(SignedApproval),
}

fn parse_address(name: &'static str, value: &str) -> Result<Address, ApiError> {
    value.parse().map_err(|_| ApiError::param(name, value))
}

fn parse_word(value: &str) -> Result<U256, ApiError> {
    value.parse().map_err(|_| ApiError::param("word", value))
}

fn intent_view(
    treasury: &Treasury<Eip712Verifier, MemoryLedger>,
    intent: &Intent,
) -> IntentView {
    let policy = treasury.policy();
    let required = policy.required_approvals(intent.amount);
    IntentView {
        intent: intent.clone(),
        status: intent.status(policy),
        approvals_needed: required.saturating_sub(intent.counted_approvals(policy)),
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /policy`
pub async fn get_policy(State(state): State<AppState>) -> Json<PolicyView> {
    let treasury = state.treasury.lock().await;
    let policy = treasury.policy();
    Json(PolicyView {
        domain: treasury.domain().clone(),
        asset: treasury.asset(),
        custody: treasury.custody(),
        owners: policy.owners().to_vec(),
        required_signatures: policy.required_signatures(),
        value_threshold: policy.value_threshold(),
        custodian: policy.custodian(),
    })
}

/// `GET /balances/{account}`
///
/// # Errors
///
/// 400 on a malformed address.
pub async fn get_balance(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<BalanceView>, ApiError> {
    let account = parse_address("account", &account)?;
    let balance = state.treasury.lock().await.balance_of(account);
    Ok(Json(BalanceView { account, balance }))
}

/// `GET /nonces/{owner}/{word}`
///
/// # Errors
///
/// 400 on a malformed owner or word index.
pub async fn get_nonce_bitmap(
    State(state): State<AppState>,
    Path((owner, word)): Path<(String, String)>,
) -> Result<Json<NonceView>, ApiError> {
    let owner = parse_address("owner", &owner)?;
    let word = parse_word(&word)?;
    let bitmap = state.treasury.lock().await.nonces().bitmap(owner, word);
    Ok(Json(NonceView {
        owner,
        word: word.into(),
        bitmap: Some(bitmap.into()),
        nonce: None,
    }))
}

/// `GET /nonces/{owner}/{word}/next`
///
/// # Errors
///
/// 400 on malformed input, 409 when the word is exhausted.
pub async fn get_next_nonce(
    State(state): State<AppState>,
    Path((owner, word)): Path<(String, String)>,
) -> Result<Json<NonceView>, ApiError> {
    let owner = parse_address("owner", &owner)?;
    let word = parse_word(&word)?;
    let nonce = state.treasury.lock().await.next_unused_nonce(owner, word)?;
    Ok(Json(NonceView {
        owner,
        word: word.into(),
        bitmap: None,
        nonce: Some(nonce.into()),
    }))
}

/// `POST /deposits`
///
/// # Errors
///
/// Any permit or ledger rejection.
pub async fn post_deposit(
    State(state): State<AppState>,
    body: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<Json<DepositReceipt>, ApiError> {
    let Json(body) = body?;
    let now = state.now();
    let receipt = state
        .treasury
        .lock()
        .await
        .deposit(&body.permit, &body.signature, now)?;
    Ok(Json(receipt))
}

/// `POST /intents`
///
/// # Errors
///
/// 400 on a zero amount, 422 when `start` is in the past.
pub async fn post_intent(
    State(state): State<AppState>,
    body: Result<Json<CreateIntentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IntentCreated>), ApiError> {
    let Json(body) = body?;
    let now = state.now();
    let mut treasury = state.treasury.lock().await;
    let created = match body.start {
        Some(start) => treasury.create_intent_at(
            body.user,
            body.to,
            body.amount,
            body.recurring_interval,
            start,
            now,
        )?,
        None => {
            treasury.create_intent(body.user, body.to, body.amount, body.recurring_interval, now)?
        }
    };
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /intents`
pub async fn list_intents(State(state): State<AppState>) -> Json<Vec<IntentView>> {
    let treasury = state.treasury.lock().await;
    Json(
        treasury
            .intents()
            .active_intents()
            .map(|intent| intent_view(&treasury, intent))
            .collect(),
    )
}

/// `GET /intents/{id}`
///
/// # Errors
///
/// 404 for unknown or finalized intents.
pub async fn get_intent(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<IntentView>, ApiError> {
    let id = IntentId(id);
    let treasury = state.treasury.lock().await;
    let intent = treasury
        .intents()
        .intent(id)
        .ok_or(TreasuryError::IntentNotFound(id))?;
    Ok(Json(intent_view(&treasury, intent)))
}

/// `POST /intents/{id}/approvals`
///
/// # Errors
///
/// Any approval rejection; a batch is recorded all or none.
pub async fn post_approval(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<ApprovalRequest>, JsonRejection>,
) -> Result<Json<ApprovalReceipt>, ApiError> {
    let Json(body) = body?;
    let id = IntentId(id);
    let mut treasury = state.treasury.lock().await;
    let receipt = match body {
        ApprovalRequest::Single(approval) => {
            treasury.approve_intent(id, approval.signer, &approval.signature)?
        }
        ApprovalRequest::Batch { approvals } => treasury.approve_intent_batch(id, &approvals)?,
    };
    Ok(Json(receipt))
}

/// `POST /intents/{id}/execute`
///
/// # Errors
///
/// 404, 422 when not due or not approved, or a ledger rejection.
pub async fn post_execute(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ExecutionReceipt>, ApiError> {
    let now = state.now();
    let receipt = state
        .treasury
        .lock()
        .await
        .execute_intent(IntentId(id), now)?;
    Ok(Json(receipt))
}

/// Creates an Axum [`Router`] with all treasury endpoints.
///
/// Endpoints:
/// - `GET /health` - liveness
/// - `GET /policy` - owners, thresholds and signing domain
/// - `GET /balances/{account}` - ledger balance
/// - `GET /nonces/{owner}/{word}` - nonce bitmap word
/// - `GET /nonces/{owner}/{word}/next` - lowest unused nonce in a word
/// - `POST /deposits` - redeem a signed permit
/// - `GET /intents`, `POST /intents` - list or create intents
/// - `GET /intents/{id}` - one intent
/// - `POST /intents/{id}/approvals` - record owner approvals
/// - `POST /intents/{id}/execute` - execute a due intent
pub fn treasury_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/policy", get(get_policy))
        .route("/balances/{account}", get(get_balance))
        .route("/nonces/{owner}/{word}", get(get_nonce_bitmap))
        .route("/nonces/{owner}/{word}/next", get(get_next_nonce))
        .route("/deposits", post(post_deposit))
        .route("/intents", get(list_intents).post(post_intent))
        .route("/intents/{id}", get(get_intent))
        .route("/intents/{id}/approvals", post(post_approval))
        .route("/intents/{id}/execute", post(post_execute))
        .with_state(state)
}
