//! Binary entry point for the Launchpad deployments service.

use launchpad::{config::ConfigLoader, server::run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::new().load()?;

    // Secrets are masked; safe to print at startup.
    println!("Loaded configuration for profile: {}", config.profile);
    if let Ok(rendered) = config.redacted_json() {
        println!("Configuration: {}", rendered);
    }

    run_server(config).await
}
