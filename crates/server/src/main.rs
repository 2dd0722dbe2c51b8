//! SlapHard server binary.
//!
//! Runs the websocket game server. Configuration comes entirely from the
//! environment; see [`slap_server::ServerConfig`].

use slap_server::ServerConfig;

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            std::process::exit(1);
        }
    };
    slap_core::init_logging(config.log_dir.as_deref());
    slap_core::trap_interrupt();
    if let Err(e) = slap_server::run(config).await {
        log::error!("server failed: {}", e);
        std::process::exit(1);
    }
}
