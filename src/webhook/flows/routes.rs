//! WhatsApp Flows endpoint handlers
//!
//! - `POST /` - encrypted data exchange, answers with a base64 ciphertext
//! - `GET /?challenge=...` - signs the challenge with the endpoint private key
//! - `GET /` - liveness check
//!
//! Any other method is answered with 405.

use super::{
    handler::{ExchangeReply, FlowEndpoint},
    schemas,
};
use crate::{consts, metric};
use ntex::{http, util::Bytes, web};
use tracing::Instrument;

/// Data exchange endpoint (POST)
///
/// # Returns
/// - 200 `text/plain` with the encrypted next screen
/// - 427 `text/plain` with an encrypted `error_msg` when the flow token is no longer valid
/// - 400, 421, 432 or 500 with an empty body, see [`super::errors::FlowError`]
#[web::post("/")]
pub async fn exchange(
    req: web::HttpRequest,
    body: Bytes,
    endpoint: web::types::State<FlowEndpoint>,
) -> Result<impl web::Responder, web::Error> {
    let signature_header = req
        .headers()
        .get(consts::SIGNATURE_HEADER_NAME)
        .and_then(|value| value.to_str().ok());

    let reply = endpoint
        .exchange(&body, signature_header)
        .instrument(logfire::span!("flows_exchange"))
        .await;

    match reply {
        Ok(ExchangeReply::Screen(ciphertext)) => {
            metric::incr_flow_exchange_statds("Screen");
            Ok(web::HttpResponse::Ok()
                .content_type("text/plain")
                .body(ciphertext))
        }
        Ok(ExchangeReply::TokenInvalidated(ciphertext)) => {
            metric::incr_flow_exchange_statds("TokenInvalidated");
            Ok(
                web::HttpResponse::build(consts::status_code(consts::STATUS_FLOW_TOKEN_INVALID))
                    .content_type("text/plain")
                    .body(ciphertext),
            )
        }
        Err(e) => {
            metric::incr_flow_exchange_statds(e.kind());
            Err(e.into())
        }
    }
}

/// Liveness endpoint (GET)
///
/// With a non-empty `challenge` query parameter the challenge is signed and
/// returned as `{"status":"ok","challenge":...,"signature":...}`.
#[web::get("/")]
pub async fn challenge(
    query: web::types::Query<schemas::ChallengeQuery>,
    endpoint: web::types::State<FlowEndpoint>,
) -> Result<impl web::Responder, web::Error> {
    let Some(challenge) = query
        .into_inner()
        .challenge
        .filter(|challenge| !challenge.is_empty())
    else {
        return Ok(web::HttpResponse::Ok().json(&schemas::HealthResponse {
            status: "ok",
            message: "Endpoint alive",
        }));
    };

    let signature = endpoint.sign_challenge(&challenge).inspect_err(|e| {
        metric::incr_challenge_statds(e.kind());
    })?;
    metric::incr_challenge_statds("Signed");

    Ok(web::HttpResponse::Ok().json(&schemas::ChallengeResponse {
        status: "ok",
        challenge,
        signature,
    }))
}

/// Fallback for every method the endpoint does not serve
pub async fn method_not_allowed() -> web::HttpResponse {
    web::HttpResponse::MethodNotAllowed()
        .set_header(http::header::ALLOW, consts::ALLOWED_METHODS)
        .finish()
}
