#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;

use smartlaunch::{
    configure_services, settings::SmartLaunchSettings, LaunchController, MemoryStore, VERSION,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = SmartLaunchSettings::load().context("Failed to load settings")?;
    settings.validate().context("Invalid settings")?;

    start_server(settings).await
}

/// Start the server with in-memory sessions
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(settings: SmartLaunchSettings) -> anyhow::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, "In-memory", &settings);

    let controller = web::Data::new(LaunchController::from_settings(
        &settings,
        Arc::new(MemoryStore::new()),
    ));

    HttpServer::new(move || {
        App::new()
            .app_data(controller.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("Server terminated with an error")
}

fn print_startup_info(bind_address: &str, session_backend: &str, settings: &SmartLaunchSettings) {
    println!("Starting SMART on FHIR launch service v{VERSION} on http://{bind_address}");
    println!("Session Backend: {session_backend}");
    println!(
        "Session lifetime: {} minutes, state: {}",
        settings.session.duration_minutes,
        if settings.session.state_secret.is_some() {
            "HMAC-signed"
        } else {
            "session id"
        }
    );
    println!();
    println!("SMART launch endpoints:");
    println!("  GET  /launch?iss=..&launch=..     - EHR launch");
    println!("  GET  /fhir_redirect?code=..&state=.. - Authorization redirect");
    println!();
    println!("Authorized FHIR server:");
    println!("  {}", settings.fhir.authorized_fhir_url);
    println!("Redirect URL registered with the FHIR server:");
    println!("  {}", settings.fhir.redirect_url);
    println!("Scopes: {}", settings.fhir.scopes.join(" "));
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
}
