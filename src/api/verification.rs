//! REST API endpoint for claim verification

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, post, web};
use serde::Deserialize;
use utoipa::{OpenApi, ToSchema};

use crate::model::{ClaimContext, Confidence, Outcome, OutcomeCode};
use crate::service::VerificationService;

/// Request body for a verification attempt
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// Claimed step count. 0 means auto-extract: no claim to check.
    pub claimed_value: f64,
    /// ISO date the claim is for
    pub claimed_date: Option<String>,
    /// Blob store path of the proof image
    pub proof_path: String,
    pub requester_id: String,
    pub league_id: Option<String>,
    /// Claim record to annotate with the verdict; omit for dry-run extraction
    pub claim_id: Option<String>,
    /// Original upload filename, passed to the extractor as a date hint
    pub filename_hint: Option<String>,
}

impl From<VerifyRequest> for ClaimContext {
    fn from(request: VerifyRequest) -> Self {
        ClaimContext {
            claimed_value: request.claimed_value,
            claimed_date: request.claimed_date,
            proof_path: request.proof_path,
            requester_id: request.requester_id,
            league_id: request.league_id,
            claim_id: request.claim_id,
            filename_hint: request.filename_hint,
        }
    }
}

/// Verify an activity claim against its photographic proof
///
/// Always returns a classified outcome envelope; the envelope's own
/// status value is used as the HTTP response status.
#[utoipa::path(
    post,
    path = "/v1/verifications",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Pipeline completed, verdict inside", body = Outcome),
        (status = 404, description = "Proof unavailable", body = Outcome),
        (status = 429, description = "Extraction provider rate limited", body = Outcome),
        (status = 502, description = "Extraction endpoint unreachable", body = Outcome),
        (status = 504, description = "Extraction timed out", body = Outcome),
        (status = 500, description = "Unexpected failure", body = Outcome)
    ),
    tag = "verifications"
)]
#[post("/v1/verifications")]
pub async fn verify_claim(
    service: web::Data<VerificationService>,
    body: web::Json<VerifyRequest>,
) -> impl Responder {
    let outcome = service.verify(body.into_inner().into()).await;

    let status =
        StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(outcome)
}

/// Configure verification routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(verify_claim);
}

#[derive(OpenApi)]
#[openapi(
    paths(verify_claim, crate::api::health::liveness, crate::api::health::readiness),
    components(schemas(
        VerifyRequest,
        Outcome,
        OutcomeCode,
        Confidence,
        crate::api::health::HealthStatus,
        crate::api::health::ReadinessStatus
    )),
    tags(
        (name = "verifications", description = "Activity-claim verification"),
        (name = "health", description = "Service health probes")
    )
)]
pub struct ApiDoc;
