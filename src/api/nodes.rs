use actix_web::{HttpResponse, get, post, web};

use super::models::{RegisterNodesRequest, RegisterNodesResponse, ResolveResponse};
use crate::error::NodeError;
use crate::node::Node;

#[post("/nodes/register")]
pub async fn register_nodes(
    node: web::Data<Node>,
    body: web::Json<RegisterNodesRequest>,
) -> Result<HttpResponse, NodeError> {
    let registered = node.register_peers(body.into_inner().nodes)?;
    Ok(HttpResponse::Created().json(RegisterNodesResponse {
        message: "New nodes have been added",
        total_nodes: registered.into_iter().collect(),
    }))
}

/// Run the longest-valid-chain rule against every known peer.
#[get("/nodes/resolve")]
pub async fn resolve(node: web::Data<Node>) -> HttpResponse {
    let outcome = node.resolve_consensus().await;
    let message = if outcome.replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    HttpResponse::Ok().json(ResolveResponse {
        message,
        replaced: outcome.replaced,
        chain: outcome.chain,
    })
}
