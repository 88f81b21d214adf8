use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::error;

use regtest_chaingen::api::{self, AppState};
use regtest_chaingen::blockchain::ChainParams;
use regtest_chaingen::config::NodeConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = match NodeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("CONFIG - {e}");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    let mut params = ChainParams::regtest();
    if let Some(mock_time) = config.initial_mock_time {
        params.initial_mock_time = mock_time;
    }

    let state = AppState::new(params, config.recipient).map_err(std::io::Error::other)?;
    let state = web::Data::new(state);

    println!(
        "⛓️ Starting regtest chain generator at http://{}:{}",
        config.host, config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
