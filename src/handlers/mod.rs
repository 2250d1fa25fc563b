// HTTP request handlers for the SMART launch flow
pub mod health;
pub mod launch;
pub mod redirect;


use actix_web::web;

// Re-export the main handler functions
pub use health::health;
pub use launch::launch;
pub use redirect::fhir_redirect;

/// Route table shared by the binary and the integration tests
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/launch", web::get().to(launch))
        .route("/fhir_redirect", web::get().to(fhir_redirect))
        .route("/ping", web::get().to(health));
}
