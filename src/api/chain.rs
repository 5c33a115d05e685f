use actix_web::{HttpResponse, Responder, get, web};

use super::models::ValidateResponse;
use crate::node::Node;

/// Get the full chain with its length (also what peers fetch).
#[get("/chain")]
pub async fn get_chain(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(node.chain())
}

/// Validate the local chain.
#[get("/chain/validate")]
pub async fn validate_chain(node: web::Data<Node>) -> impl Responder {
    let (valid, length) = node.validate_local_chain();
    HttpResponse::Ok().json(ValidateResponse { valid, length })
}
