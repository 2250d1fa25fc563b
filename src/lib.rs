#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the smartlaunch application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod controller;
pub mod error;
pub mod handlers;
pub mod models;
pub mod session;
pub mod settings;
pub mod smart;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use controller::LaunchController;
pub use error::LaunchError;
pub use handlers::{configure_services, fhir_redirect, health, launch};
pub use models::Session;
pub use session::{MemoryStore, SessionManager, SessionStore};
pub use settings::SmartLaunchSettings;
pub use smart::{AuthFlowConfig, FhirToken};
