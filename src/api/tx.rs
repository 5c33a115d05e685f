use actix_web::{HttpResponse, Responder, get, post, web};
use log::debug;

use super::models::{NewTxResponse, PendingResponse};
use crate::error::NodeError;
use crate::node::{NewTransaction, Node};

/// Queue a transaction for the next block.
#[post("/transactions/new")]
pub async fn post_transaction(
    node: web::Data<Node>,
    body: web::Json<NewTransaction>,
) -> Result<HttpResponse, NodeError> {
    let index = node.submit_transaction(body.into_inner())?;
    debug!("POST /transactions/new - queued for block #{index}");
    Ok(HttpResponse::Created().json(NewTxResponse {
        message: format!("Transaction will be added to Block {index}"),
        index,
    }))
}

/// List the pending pool.
#[get("/transactions/pending")]
pub async fn get_pending(node: web::Data<Node>) -> impl Responder {
    let transactions = node.pending_transactions();
    HttpResponse::Ok().json(PendingResponse {
        size: transactions.len(),
        transactions,
    })
}
