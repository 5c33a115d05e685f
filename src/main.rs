mod api;
mod blockchain;
mod config;
mod error;
mod network;
mod node;
mod transaction;

use std::io;
use std::time::Duration;

use actix_web::{App, HttpServer, rt, web};
use dotenvy::dotenv;
use log::{debug, info};

use config::Config;
use network::{ConsensusResolver, HttpChainSource};
use node::Node;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    let source = HttpChainSource::new(config.peer_timeout).map_err(io::Error::other)?;
    let node = web::Data::new(Node::new(&config, ConsensusResolver::new(source)));

    println!(
        "⛓️ Starting ledger node {} at http://{}:{}",
        node.node_id(),
        config.host,
        config.port
    );

    if let Some(every) = config.resolve_interval {
        info!("resolving consensus every {}s", every.as_secs());
        rt::spawn(resolve_periodically(node.clone(), every));
    }

    // A mine in flight would otherwise hold up graceful shutdown.
    let on_signal = node.clone();
    rt::spawn(async move {
        if rt::signal::ctrl_c().await.is_ok() {
            on_signal.cancel_mining();
        }
    });

    let app_node = node.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_node.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

async fn resolve_periodically(node: web::Data<Node>, every: Duration) {
    let mut ticker = rt::time::interval(every);
    // The first tick completes immediately; skip it so peers can register.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let outcome = node.resolve_consensus().await;
        debug!(
            "periodic consensus - replaced={} length={}",
            outcome.replaced,
            outcome.chain.len()
        );
    }
}
