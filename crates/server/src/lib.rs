//! Read-only HTTP mirror of donation pool status.
//!
//! `GET /pool-status/{address}` answers with the pool's `PoolStatus` as JSON:
//!
//! - `200` `{"initialized": true, "totalDonations": 150000000}`
//! - `400` `{"error": "..."}` when the address cannot be parsed
//! - `503` `{"error": "failed to fetch pool status", "address": "0x..."}` when the ledger cannot
//!   be reached. Transport details only go to the log.
//!
//! An unreachable ledger is never reported as an uninitialized pool.

use std::{net, sync::Arc};

use actix_cors::Cors;
use actix_web::{
    get, middleware,
    web::{self, Data},
    App, HttpResponse, HttpServer,
};
use donation_core::{PoolStatusService, StatusError};
use serde::Serialize;
use tracing::{debug, info, warn};

pub const ENDPOINT_POOL_STATUS: &str = "/pool-status";

/// Body of every 503 reply.
pub const UNAVAILABLE_MESSAGE: &str = "failed to fetch pool status";

/// Pool status backend shared by every worker.
pub type SharedService = Arc<dyn PoolStatusService>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

#[get("/pool-status/{address}")]
pub async fn get_pool_status(
    service: Data<SharedService>,
    address: web::Path<String>,
) -> HttpResponse {
    let address = address.into_inner();
    debug!("Pool status requested for {}", address);

    match service.pool_status(&address).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e @ StatusError::InvalidAddress(_)) => HttpResponse::BadRequest().json(ErrorBody {
            error: e.to_string(),
            address: None,
        }),
        Err(StatusError::Unavailable { address, reason }) => {
            warn!("Pool status for {} unavailable: {}", address, reason);
            HttpResponse::ServiceUnavailable().json(ErrorBody {
                error: UNAVAILABLE_MESSAGE.to_string(),
                address: Some(address.to_string()),
            })
        }
    }
}

/// Registers the mirror's routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_pool_status);
}

/// Serves the mirror until the process receives a shutdown signal.
pub async fn start_server<A: net::ToSocketAddrs>(
    service: SharedService,
    addrs: A,
) -> std::io::Result<()> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(Data::new(service.clone()))
            .configure(configure)
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
    })
    .bind(addrs)?;

    for addr in server.addrs() {
        info!("Pool status mirror listening on http://{}", addr);
    }
    server.run().await
}
