//! API route handlers.
//!
//! All endpoints speak JSON. Shared state lives in an `Arc<ServerState>`;
//! everything except `/health` and the register/login pair requires a
//! bearer token issued at login.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis;
use crate::analysis::ScenarioOutlook;
use crate::auth::{hash_password, verify_password, SessionManager};
use crate::extraction::{ExtractedFacts, NoticeExtractor, NoticeSource};
use crate::storage::{self, AnalysisRepository, UserRepository};
use crate::types::{
    AnalysisRecord, ArremateError, AuctionFacts, InvestmentResult, RateSettings, User, UserProfile,
};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServerState {
    /// Active rate settings; replaced wholesale by PUT /api/settings.
    pub rates: RwLock<RateSettings>,
    /// Where updated settings are persisted, when configured.
    pub settings_path: Option<PathBuf>,
    pub users: Arc<dyn UserRepository>,
    pub analyses: Arc<dyn AnalysisRepository>,
    pub sessions: SessionManager,
    /// Absent when no extraction provider is configured — extraction
    /// then degrades to empty results.
    pub extractor: Option<Arc<dyn NoticeExtractor>>,
}

pub type AppState = Arc<ServerState>;

impl ServerState {
    pub fn new(
        rates: RateSettings,
        users: Arc<dyn UserRepository>,
        analyses: Arc<dyn AnalysisRepository>,
        extractor: Option<Arc<dyn NoticeExtractor>>,
        settings_path: Option<PathBuf>,
    ) -> Self {
        Self {
            rates: RwLock::new(rates),
            settings_path,
            users,
            analyses,
            sessions: SessionManager::new(),
            extractor,
        }
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ArremateError {
    fn into_response(self) -> Response {
        let status = match &self {
            ArremateError::InvalidCredentials | ArremateError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ArremateError::AccountDisabled | ArremateError::Forbidden => StatusCode::FORBIDDEN,
            ArremateError::EmailTaken(_) => StatusCode::CONFLICT,
            ArremateError::NotFound(_) => StatusCode::NOT_FOUND,
            ArremateError::Extraction { .. } => StatusCode::BAD_GATEWAY,
            ArremateError::Storage(_) | ArremateError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

fn storage_err(e: anyhow::Error) -> ArremateError {
    ArremateError::Storage(e.to_string())
}

// ---------------------------------------------------------------------------
// Auth plumbing
// ---------------------------------------------------------------------------

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the caller from the Authorization header. A user deactivated
/// after logging in loses access immediately.
fn require_user(state: &ServerState, headers: &HeaderMap) -> Result<User, ArremateError> {
    let token = bearer_token(headers).ok_or(ArremateError::Unauthorized)?;
    let user_id = state
        .sessions
        .resolve(token)
        .ok_or(ArremateError::Unauthorized)?;
    let user = state
        .users
        .get(&user_id)
        .map_err(storage_err)?
        .ok_or(ArremateError::Unauthorized)?;
    if !user.is_active {
        return Err(ArremateError::AccountDisabled);
    }
    Ok(user)
}

fn require_admin(state: &ServerState, headers: &HeaderMap) -> Result<User, ArremateError> {
    let user = require_user(state, headers)?;
    if !user.is_admin {
        return Err(ArremateError::Forbidden);
    }
    Ok(user)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Facts plus an optional rate override; absent settings mean "use the
/// server's active rates".
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub facts: AuctionFacts,
    #[serde(default)]
    pub settings: Option<RateSettings>,
}

#[derive(Debug, Serialize)]
pub struct MaxBidResponse {
    pub max_bid: Decimal,
}

// ---------------------------------------------------------------------------
// Auth handlers
// ---------------------------------------------------------------------------

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ArremateError> {
    if state
        .users
        .find_by_email(&req.email)
        .map_err(storage_err)?
        .is_some()
    {
        return Err(ArremateError::EmailTaken(req.email));
    }

    // The first account becomes the administrator.
    let is_admin = state.users.count().map_err(storage_err)? == 0;

    let user = User {
        id: Uuid::new_v4().to_string(),
        email: req.email,
        username: req.username,
        password_hash: hash_password(&req.password).map_err(storage_err)?,
        is_active: true,
        is_admin,
        created_at: Utc::now(),
    };
    state.users.insert(user.clone()).map_err(storage_err)?;

    info!(user_id = %user.id, admin = user.is_admin, "User registered");

    let token = state.sessions.issue(&user.id);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserProfile::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ArremateError> {
    let user = state
        .users
        .find_by_email(&req.email)
        .map_err(storage_err)?
        .ok_or(ArremateError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ArremateError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(ArremateError::AccountDisabled);
    }

    let token = state.sessions.issue(&user.id);
    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    StatusCode::NO_CONTENT
}

pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ArremateError> {
    let user = require_user(&state, &headers)?;
    Ok(Json(UserProfile::from(&user)))
}

// ---------------------------------------------------------------------------
// Analysis handlers
// ---------------------------------------------------------------------------

async fn effective_settings(state: &ServerState, req: &EvaluateRequest) -> RateSettings {
    match req.settings {
        Some(s) => s,
        None => *state.rates.read().await,
    }
}

pub async fn evaluate_facts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<InvestmentResult>, ArremateError> {
    require_user(&state, &headers)?;
    let settings = effective_settings(&state, &req).await;
    Ok(Json(analysis::evaluate(&req.facts, &settings)))
}

pub async fn max_bid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<MaxBidResponse>, ArremateError> {
    require_user(&state, &headers)?;
    let settings = effective_settings(&state, &req).await;
    Ok(Json(MaxBidResponse {
        max_bid: analysis::max_bid_for_break_even(&req.facts, &settings),
    }))
}

pub async fn scenario_outlook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<ScenarioOutlook>, ArremateError> {
    require_user(&state, &headers)?;
    let settings = effective_settings(&state, &req).await;
    Ok(Json(analysis::outlook(&req.facts, &settings)))
}

// ---------------------------------------------------------------------------
// Saved-analysis handlers
// ---------------------------------------------------------------------------

pub async fn list_analyses(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AnalysisRecord>>, ArremateError> {
    let user = require_user(&state, &headers)?;
    let records = state.analyses.list_for(&user.id).map_err(storage_err)?;
    Ok(Json(records))
}

pub async fn save_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EvaluateRequest>,
) -> Result<(StatusCode, Json<AnalysisRecord>), ArremateError> {
    let user = require_user(&state, &headers)?;
    let settings = effective_settings(&state, &req).await;

    // The result is recomputed here — stored analyses always reflect the
    // facts and settings they carry.
    let record = AnalysisRecord {
        id: Uuid::new_v4().to_string(),
        owner_id: user.id.clone(),
        saved_at: Utc::now(),
        result: analysis::evaluate(&req.facts, &settings),
        facts: req.facts,
        settings,
    };
    state.analyses.put(record.clone()).map_err(storage_err)?;

    info!(analysis_id = %record.id, user_id = %user.id, "Analysis saved");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AnalysisRecord>, ArremateError> {
    let user = require_user(&state, &headers)?;
    let record = state
        .analyses
        .get(&id)
        .map_err(storage_err)?
        .filter(|r| r.owner_id == user.id)
        .ok_or_else(|| ArremateError::NotFound(format!("analysis {id}")))?;
    Ok(Json(record))
}

pub async fn delete_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ArremateError> {
    let user = require_user(&state, &headers)?;
    let owned = state
        .analyses
        .get(&id)
        .map_err(storage_err)?
        .filter(|r| r.owner_id == user.id)
        .is_some();
    if !owned {
        return Err(ArremateError::NotFound(format!("analysis {id}")));
    }
    state.analyses.delete(&id).map_err(storage_err)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Settings handlers
// ---------------------------------------------------------------------------

pub async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RateSettings>, ArremateError> {
    require_user(&state, &headers)?;
    Ok(Json(*state.rates.read().await))
}

pub async fn put_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new_rates): Json<RateSettings>,
) -> Result<Json<RateSettings>, ArremateError> {
    require_user(&state, &headers)?;

    *state.rates.write().await = new_rates;
    if let Some(path) = &state.settings_path {
        storage::save_json(&new_rates, path).map_err(storage_err)?;
    }

    info!("Rate settings updated");
    Ok(Json(new_rates))
}

// ---------------------------------------------------------------------------
// Extraction handler
// ---------------------------------------------------------------------------

/// Run the notice extractor. Failures never propagate: a missing
/// provider or a failed call degrades to an empty extraction so the
/// form flow is never blocked.
pub async fn extract_notice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(source): Json<NoticeSource>,
) -> Result<Json<ExtractedFacts>, ArremateError> {
    require_user(&state, &headers)?;

    let Some(extractor) = &state.extractor else {
        warn!("Extraction requested but no provider is configured");
        return Ok(Json(ExtractedFacts::default()));
    };

    match extractor.extract(&source).await {
        Ok(extracted) => Ok(Json(extracted)),
        Err(e) => {
            warn!(
                provider = extractor.provider_name(),
                error = %e,
                "Extraction failed — returning empty result"
            );
            Ok(Json(ExtractedFacts::default()))
        }
    }
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

pub async fn admin_list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserProfile>>, ArremateError> {
    require_admin(&state, &headers)?;
    let users = state.users.list().map_err(storage_err)?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

pub async fn admin_toggle_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ArremateError> {
    let admin = require_admin(&state, &headers)?;
    if admin.id == id {
        // An admin cannot lock themselves out.
        return Err(ArremateError::Forbidden);
    }

    let mut user = state
        .users
        .get(&id)
        .map_err(storage_err)?
        .ok_or_else(|| ArremateError::NotFound(format!("user {id}")))?;
    user.is_active = !user.is_active;
    state.users.update(&user).map_err(storage_err)?;

    info!(user_id = %user.id, active = user.is_active, "User status toggled");
    Ok(Json(UserProfile::from(&user)))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Fresh state over temp-file stores, default rates, no extractor.
#[cfg(test)]
pub fn test_state() -> AppState {
    use crate::storage::{JsonAnalysisStore, JsonUserStore};

    let dir = std::env::temp_dir().join(format!("arremate_state_{}", Uuid::new_v4()));
    let users = JsonUserStore::open(dir.join("users.json")).unwrap();
    let analyses = JsonAnalysisStore::open(dir.join("analyses.json")).unwrap();

    Arc::new(ServerState::new(
        RateSettings::default(),
        Arc::new(users),
        Arc::new(analyses),
        None,
        None,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
