//! HTTP route handlers
//!
//! The shell is thin: decode, call the orchestrator, encode. Validation
//! failures come back as 400 with `{"error": "<message>"}`.

use crate::errors::ApiError;
use crate::models::{PendingIdRequest, ProposeRequest, RegisterRequest};
use actix_web::{web, HttpResponse};
use serde_json::json;
use signet_core::{Error, Node, TransactionData, WireBlock};
use tracing::{info, warn};

/// GET /chain: the full chain, genesis first
pub async fn get_chain(node: web::Data<Node>) -> Result<HttpResponse, ApiError> {
    let chain = node.chain_snapshot()?;
    Ok(HttpResponse::Ok().json(chain))
}

/// POST /block: inbound gossip
pub async fn receive_block(
    node: web::Data<Node>,
    block: web::Json<WireBlock>,
) -> Result<HttpResponse, ApiError> {
    match node.receive_block(block.into_inner()) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "status": "received" }))),
        Err(err @ Error::SyncNeeded { .. }) => {
            // the sender is ahead of us; catch up in the background and let
            // it retry or find us during its own sync
            info!("{}, scheduling chain sync", err);
            let node = node.clone();
            tokio::spawn(async move {
                if let Err(e) = node.sync_chain().await {
                    warn!("background chain sync failed: {}", e);
                }
            });
            Err(ApiError::Core(err))
        }
        Err(err) => Err(ApiError::Core(err)),
    }
}

/// POST /transaction/propose
pub async fn propose(
    node: web::Data<Node>,
    request: web::Json<ProposeRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    let data = TransactionData {
        from: request.from,
        to: request.to.clone(),
        amount: request.amount,
        title: request.title,
    };

    let pending = node
        .propose_transaction(data, request.from_signature)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "proposed",
        "message": format!("Transaction proposed to {}", request.to),
        "id": pending.id,
    })))
}

/// POST /transaction/approve
pub async fn approve(
    node: web::Data<Node>,
    request: web::Json<PendingIdRequest>,
) -> Result<HttpResponse, ApiError> {
    let block = node.approve_transaction(&request.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "approved",
        "block": WireBlock::from_block(&block)?,
    })))
}

/// POST /transaction/reject
pub async fn reject(
    node: web::Data<Node>,
    request: web::Json<PendingIdRequest>,
) -> Result<HttpResponse, ApiError> {
    node.reject_transaction(&request.id)?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "rejected",
        "message": "Transaction rejected",
    })))
}

/// GET /transaction/pending
pub async fn list_pending(node: web::Data<Node>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(node.list_pending()))
}

/// POST /register
pub async fn register(
    node: web::Data<Node>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    if request.node_name.is_empty() {
        return Err(ApiError::Validation("node_name is required".to_string()));
    }
    if request.nick_name.is_empty() {
        return Err(ApiError::Validation("nick_name is required".to_string()));
    }
    if request.address.is_empty() {
        return Err(ApiError::Validation("address is required".to_string()));
    }
    if request.public_key.is_empty() {
        return Err(ApiError::Validation("public_key is required".to_string()));
    }

    let block = node.register_node(
        &request.node_name,
        &request.nick_name,
        &request.address,
        &request.public_key,
    )?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "registered",
        "block": WireBlock::from_block(&block)?,
    })))
}

/// GET /peers
pub async fn get_peers(node: web::Data<Node>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(node.peers()))
}

/// GET /info
pub async fn get_info(node: web::Data<Node>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(json!({ "node_name": node.node_name() })))
}

/// JSON body decode failures answer in the same `{"error": …}` shape
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid JSON: {}", err);
        actix_web::error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "error": message })),
        )
        .into()
    })
}

/// Wire the route table
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/chain", web::get().to(get_chain))
        .route("/block", web::post().to(receive_block))
        .route("/transaction/propose", web::post().to(propose))
        .route("/transaction/approve", web::post().to(approve))
        .route("/transaction/reject", web::post().to(reject))
        .route("/transaction/pending", web::get().to(list_pending))
        .route("/register", web::post().to(register))
        .route("/peers", web::get().to(get_peers))
        .route("/info", web::get().to(get_info));
}
