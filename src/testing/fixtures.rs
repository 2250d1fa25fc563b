//! Pre-built settings, sessions and controllers for tests

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::controller::LaunchController;
use crate::models::Session;
use crate::session::{SessionManager, SessionStore};
use crate::settings::SmartLaunchSettings;
use crate::smart::{AuthFlowConfig, FhirToken};

use super::constants::{TEST_ACCESS_TOKEN, TEST_CLIENT_ID, TEST_LAUNCH_ID, TEST_REDIRECT_URL};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Valid settings authorizing `issuer_url`, with insecure cookies so test
    /// clients send them back over plain HTTP
    #[must_use]
    pub fn settings(issuer_url: &str) -> SmartLaunchSettings {
        let mut settings = SmartLaunchSettings::default();
        settings.fhir.authorized_fhir_url = issuer_url.to_string();
        settings.fhir.client_id = TEST_CLIENT_ID.to_string();
        settings.fhir.redirect_url = TEST_REDIRECT_URL.to_string();
        settings.cookies.secure = false;
        settings
    }

    /// Client registration used against mock FHIR servers
    #[must_use]
    pub fn auth_flow() -> AuthFlowConfig {
        AuthFlowConfig::new(
            TEST_CLIENT_ID,
            TEST_REDIRECT_URL,
            vec!["launch".to_string(), "profile".to_string()],
        )
    }

    /// Session manager with a 30 minute lifetime over `store`
    #[must_use]
    pub fn session_manager(store: impl SessionStore + 'static) -> SessionManager {
        SessionManager::new(Arc::new(store), Duration::minutes(30), false)
    }

    /// Controller trusting `issuer_url`, backed by `store`
    #[must_use]
    pub fn launch_controller(
        issuer_url: &str,
        store: impl SessionStore + 'static,
    ) -> LaunchController {
        LaunchController::new(issuer_url, Self::session_manager(store), Self::auth_flow())
    }

    /// Session that completed `/launch` from `issuer_url`
    #[must_use]
    pub fn launched_session(id: &str, issuer_url: &str) -> Session {
        let mut session = Session::new(id, Utc::now() + Duration::minutes(30));
        session.issuer_url = Some(issuer_url.to_string());
        session.launch_context_id = Some(TEST_LAUNCH_ID.to_string());
        session
    }

    /// Token as returned by a SMART token endpoint
    #[must_use]
    pub fn fhir_token() -> FhirToken {
        FhirToken {
            access_token: TEST_ACCESS_TOKEN.to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("test-refresh-token".to_string()),
            expires_in: Some(3600),
            scope: Some("launch profile".to_string()),
            patient: Some("p123".to_string()),
            encounter: Some("e123".to_string()),
            id_token: None,
            extra: serde_json::Map::new(),
        }
    }
}
