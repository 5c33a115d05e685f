use actix_web::{HttpResponse, get, web};
use log::warn;

use super::models::MineResponse;
use crate::error::NodeError;
use crate::node::Node;

/// Mine the next block on the blocking pool so workers keep serving reads.
#[get("/mine")]
pub async fn mine(node: web::Data<Node>) -> Result<HttpResponse, NodeError> {
    let worker = node.clone();
    let block = web::block(move || worker.mine_next_block())
        .await
        .map_err(|e| NodeError::Blocking(e.to_string()))?
        .inspect_err(|e| warn!("GET /mine - failed: {e}"))?;

    Ok(HttpResponse::Ok().json(MineResponse {
        message: "New Block",
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}
