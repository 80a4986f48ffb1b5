//! REST API over the voting core

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ballot_common::{
    ActionPayload, BallotError, Candidate, Identity, Phase, PhaseError, Signature, VotingError,
};
use ballot_core::{Transition, VotingCore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared handler state
pub type AppState = Arc<VotingCore>;

/// Errors returned to REST clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ballot(#[from] BallotError),

    #[error("Malformed request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ballot(err) => match err {
                BallotError::Authorization(_) => StatusCode::FORBIDDEN,
                BallotError::Voting(VotingError::CandidateIndexOutOfRange { .. }) => {
                    StatusCode::BAD_REQUEST
                }
                BallotError::Phase(PhaseError::UnknownPhase(_) | PhaseError::UnrecognizedPhase(_)) => {
                    StatusCode::BAD_REQUEST
                }
                BallotError::Phase(_) | BallotError::Registration(_) | BallotError::Voting(_) => {
                    StatusCode::CONFLICT
                }
                BallotError::Identity(_) | BallotError::Crypto(_) => StatusCode::BAD_REQUEST,
                BallotError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "malformed_request",
            ApiError::Ballot(err) => err.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        }
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ChangePhaseRequest {
    pub phase: Phase,
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterVoterRequest {
    pub voter: Identity,
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub candidate_index: u64,
    /// The voter's signature over `CastVote { candidate_index }`
    pub signature: Signature,
}

/// Which action to compute a digest for
#[derive(Debug, Deserialize)]
pub struct DigestQuery {
    pub action: String,
    pub voter: Option<String>,
    pub phase: Option<String>,
    pub candidate_index: Option<u64>,
}

impl DigestQuery {
    fn payload(&self) -> ApiResult<ActionPayload> {
        let missing =
            |field: &str| ApiError::BadRequest(format!("`{field}` is required for `{}`", self.action));

        match self.action.as_str() {
            "register_voter" | "registerVoter" => {
                let voter = self.voter.as_deref().ok_or_else(|| missing("voter"))?;
                Ok(ActionPayload::RegisterVoter {
                    voter: Identity::parse(voter).map_err(BallotError::from)?,
                })
            }
            "change_phase" | "changePhase" => {
                let phase = self.phase.as_deref().ok_or_else(|| missing("phase"))?;
                Ok(ActionPayload::ChangePhase {
                    phase: phase.parse::<Phase>().map_err(BallotError::from)?,
                })
            }
            "cast_vote" | "vote" => Ok(ActionPayload::CastVote {
                candidate_index: self.candidate_index.ok_or_else(|| missing("candidate_index"))?,
            }),
            other => Err(ApiError::BadRequest(format!("Unknown action `{other}`"))),
        }
    }
}

#[derive(Debug, Serialize)]
struct CandidateView {
    index: usize,
    name: String,
    vote_count: u64,
}

impl CandidateView {
    fn new(index: usize, candidate: Candidate) -> Self {
        Self {
            index,
            name: candidate.name,
            vote_count: candidate.vote_count,
        }
    }
}

/// Build the API router
pub fn router(core: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/election", get(election))
        .route("/api/v1/phase", get(get_phase).post(change_phase))
        .route("/api/v1/candidates", get(list_candidates))
        .route("/api/v1/candidates/:index", get(get_candidate))
        .route("/api/v1/winner", get(get_winner))
        .route("/api/v1/voters", post(register_voter))
        .route("/api/v1/voters/:identity", get(get_voter))
        .route("/api/v1/votes", post(cast_vote))
        .route("/api/v1/action-digest", get(action_digest))
        .layer(cors)
        .with_state(core)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": ballot_common::VERSION,
    }))
}

async fn election(State(core): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = core.snapshot();
    Json(json!({
        "domain": core.domain(),
        "admins": core.admins(),
        "required_signatures": core.required_signatures(),
        "phase": snapshot.phase,
        "registered_voters": snapshot.registered_voters,
        "votes_cast": snapshot.votes_cast,
    }))
}

async fn get_phase(State(core): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "phase": core.get_phase() }))
}

async fn change_phase(
    State(core): State<AppState>,
    body: Result<Json<ChangePhaseRequest>, JsonRejection>,
) -> ApiResult<Json<Transition>> {
    let Json(request) = body?;
    let transition = core.change_phase(request.phase, &request.signatures)?;
    Ok(Json(transition))
}

async fn list_candidates(State(core): State<AppState>) -> Json<serde_json::Value> {
    let candidates: Vec<CandidateView> = core
        .get_results()
        .into_iter()
        .enumerate()
        .map(|(i, c)| CandidateView::new(i, c))
        .collect();
    Json(json!({
        "count": candidates.len(),
        "candidates": candidates,
    }))
}

async fn get_candidate(
    State(core): State<AppState>,
    index: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(index) = index?;
    let candidate = core.get_candidate(index)?;
    Ok(Json(json!({
        "index": index,
        "name": candidate.name,
        "vote_count": candidate.vote_count,
    })))
}

async fn get_winner(State(core): State<AppState>) -> Json<serde_json::Value> {
    let phase = core.get_phase();
    Json(json!({
        "winner": core.get_winner(),
        "phase": phase,
        "final": phase == Phase::Ended,
    }))
}

async fn register_voter(
    State(core): State<AppState>,
    body: Result<Json<RegisterVoterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let Json(request) = body?;
    core.register_voter(request.voter, &request.signatures)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "voter": request.voter, "registered": true })),
    ))
}

async fn get_voter(
    State(core): State<AppState>,
    identity: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(identity) = identity?;
    let voter = Identity::parse(&identity).map_err(BallotError::from)?;
    let record = core.voter_record(&voter);
    Ok(Json(json!({
        "voter": voter,
        "is_registered": record.is_registered,
        "has_voted": record.has_voted,
    })))
}

async fn cast_vote(
    State(core): State<AppState>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(request) = body?;
    core.vote_signed(&request.signature, request.candidate_index)?;
    Ok(Json(json!({
        "voter": request.signature.signer,
        "candidate_index": request.candidate_index,
    })))
}

async fn action_digest(
    State(core): State<AppState>,
    query: Result<Query<DigestQuery>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Query(query) = query?;
    let action = query.payload()?;
    Ok(Json(json!({
        "action": action,
        "domain": core.domain(),
        "digest": hex::encode(action.digest(core.domain())),
    })))
}
