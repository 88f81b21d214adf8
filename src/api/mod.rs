mod chain;
mod health;
pub mod models;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_info)
            .service(chain::get_utxo)
            .service(chain::submit_block)
            .service(chain::generate)
            .service(chain::verify_checkpoint),
    );
}
