use std::sync::Arc;

use portalgate::config::{load_config, print_schema};
use portalgate::startup;
use portalgate::utils::logger::init_logging;

#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = load_config();
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error initializing logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = startup::run(Arc::new(config)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
