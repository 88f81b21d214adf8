use actix_web::{HttpResponse, Responder, get, post, web};
use chrono::DateTime;
use log::{info, warn};

use super::models::{
    AppState, ChainInfoResponse, ErrorResponse, GenerateRequest, GenerateResponse,
    SubmitBlockRequest, SubmitBlockResponse, UtxoResponse, VerifyResponse,
};
use crate::blockchain::checkpoint::{self, Checkpoint};
use crate::blockchain::{ConsensusOracle, SubmitOutcome};
use crate::errors::ChainError;

/// Upper bound on blocks generated by a single request.
pub const MAX_GENERATE: u32 = 1_000;

/// Height, tip and clock of the in-process node.
#[get("/chain/info/")]
pub async fn get_info(state: web::Data<AppState>) -> impl Responder {
    let next = state.driver.lock().expect("mutex poisoned").state();
    let node = state.node.lock().expect("mutex poisoned");
    let tip = node.tip();
    let resp = ChainInfoResponse {
        network: node.params().network.to_string(),
        height: tip.height,
        tip: tip.hash,
        tip_time: tip.header.time,
        tip_time_utc: DateTime::from_timestamp(i64::from(tip.header.time), 0)
            .map(|t| t.to_rfc3339()),
        median_time_past: node.median_time_past(),
        next,
    };
    HttpResponse::Ok().json(resp)
}

/// UTXO set digest and size.
#[get("/chain/utxo/")]
pub async fn get_utxo(state: web::Data<AppState>) -> impl Responder {
    let node = state.node.lock().expect("mutex poisoned");
    match node.utxo_set_digest() {
        Ok(digest) => HttpResponse::Ok().json(UtxoResponse {
            height: node.height(),
            digest,
            coins: node.utxo().len(),
            total_value: node.utxo().total_value(),
        }),
        Err(e) => error_response(&e),
    }
}

/// Submit a hex-encoded block. Rejections are reported, not treated as errors.
#[post("/chain/submit/")]
pub async fn submit_block(
    state: web::Data<AppState>,
    body: web::Json<SubmitBlockRequest>,
) -> impl Responder {
    let raw = match hex::decode(body.hex.trim()) {
        Ok(raw) => raw,
        Err(_) => return bad_request("hex: invalid block hex"),
    };

    let mut node = state.node.lock().expect("mutex poisoned");
    let outcome = match node.submit_block(&raw) {
        Ok(outcome) => outcome,
        Err(e) => return error_response(&e),
    };
    let reason = match outcome {
        SubmitOutcome::Accepted => {
            info!("API - accepted external block, tip {}", node.tip().hash);
            None
        }
        SubmitOutcome::Rejected(reason) => Some(reason),
    };
    HttpResponse::Ok().json(SubmitBlockResponse {
        accepted: reason.is_none(),
        reason,
        height: node.height(),
        tip: node.tip().hash,
    })
}

/// Generate `blocks` blocks on the current tip with the server's driver.
#[post("/chain/generate/")]
pub async fn generate(
    state: web::Data<AppState>,
    body: web::Json<GenerateRequest>,
) -> impl Responder {
    if body.blocks == 0 || body.blocks > MAX_GENERATE {
        return bad_request(&format!("blocks must be between 1 and {MAX_GENERATE}"));
    }

    // mining runs on the blocking pool, off the async worker
    let blocks = body.blocks;
    let result = web::block(move || {
        let mut driver = state.driver.lock().expect("mutex poisoned");
        let mut node = state.node.lock().expect("mutex poisoned");

        driver.resync(&*node)?;
        // blocks submitted through /chain/submit/ may be ahead of the virtual clock
        driver.bump_clock(node.tip().header.time.saturating_add(1));

        let next = driver.advance_by(&mut *node, blocks)?;
        Ok::<_, ChainError>(GenerateResponse {
            generated: blocks,
            height: node.height(),
            tip: node.tip().hash,
            next,
        })
    })
    .await;

    match result {
        Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            warn!("API - generate task failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}

/// Check the node against a checkpoint. A mismatch is a normal answer.
#[post("/chain/verify/")]
pub async fn verify_checkpoint(
    state: web::Data<AppState>,
    body: web::Json<Checkpoint>,
) -> impl Responder {
    let node = state.node.lock().expect("mutex poisoned");
    let resp = match checkpoint::verify(&*node, &body) {
        Ok(()) => VerifyResponse {
            verified: true,
            height: body.height,
            field: None,
            expected: None,
            actual: None,
        },
        Err(ChainError::CheckpointMismatch {
            height,
            field,
            expected,
            actual,
        }) => VerifyResponse {
            verified: false,
            height,
            field: Some(field.to_string()),
            expected: Some(expected),
            actual: Some(actual),
        },
        Err(e) => return error_response(&e),
    };
    HttpResponse::Ok().json(resp)
}

/* -------------------- Helpers -------------------- */

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: message.to_string(),
    })
}

fn error_response(e: &ChainError) -> HttpResponse {
    warn!("API - request failed: {e}");
    let body = ErrorResponse {
        error: e.to_string(),
    };
    match e {
        ChainError::InvalidInput(_) | ChainError::Decode(_) => HttpResponse::BadRequest().json(body),
        ChainError::BlockRejected { .. } | ChainError::TipUnchanged { .. } => {
            HttpResponse::Conflict().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}
