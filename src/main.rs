use std::net::TcpListener;
use std::sync::Arc;

use session_auth::clock::SystemClock;
use session_auth::configuration::get_configuration;
use session_auth::startup::{run, Services};
use session_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let services = Services::from_settings(&configuration, Arc::new(SystemClock)).map_err(|e| {
        tracing::error!("Failed to initialise services: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Initialisation error")
    })?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Application listening on {}", address);

    run(listener, services)?.await
}
