//! Launch controller
//!
//! The SMART-on-FHIR state machine behind `/launch` and `/fhir_redirect`:
//!
//! ```text
//! NoSession -> LaunchPending -> AwaitingRedirect -> Authenticated
//! ```
//!
//! `/launch` validates the issuer, creates a session, records the launch on it
//! and redirects the browser to the issuer's authorization endpoint with the
//! session's state. `/fhir_redirect` finds the session through the cookie,
//! checks the state, exchanges the code and stores the token on the session.
//! Failures are terminal for the request and never stored.

use actix_web::{HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::error::LaunchError;
use crate::models::Session;
use crate::session::{NewSession, SessionManager, SessionStore};
use crate::settings::SmartLaunchSettings;
use crate::smart::AuthFlowConfig;
use crate::utils::crypto::StateSigner;
use crate::utils::logging::LoggingHelper;
use crate::utils::query::non_empty_query_param;
use crate::utils::response_builder::ResponseBuilder;

const ISS_KEY: &str = "iss";
const LAUNCH_ID_KEY: &str = "launch";
const CODE_KEY: &str = "code";
const STATE_KEY: &str = "state";

const CANNOT_CREATE_SESSION: &str = "cannot create session";
const CANNOT_BUILD_AUTH_URL: &str = "cannot get FHIR authentication URL";
const SESSION_MISSING_FHIR_URL: &str = "invalid session: missing fhirURL";
const SESSION_MISSING_LAUNCH_ID: &str = "invalid session: missing launchID";
const MISSING_CODE: &str = "missing code in URL query parameters";
const INVALID_STATE: &str = "invalid state in query parameters";
const TOKEN_EXCHANGE_FAILED: &str = "server failed to exchange for FHIR access token";
const RETRIEVE_SESSION_FAILED: &str = "server failed to retrieve session";
const SAVE_SESSION_FAILED: &str = "server failed to save session";

/// Body of a successful `/fhir_redirect`
pub const AUTHENTICATED_MESSAGE: &str = "Successfully authenticated with FHIR";

/// Orchestrates the launch and redirect endpoints
#[derive(Clone)]
pub struct LaunchController {
    authorized_fhir_url: String,
    sessions: SessionManager,
    auth_flow: AuthFlowConfig,
    state_signer: Option<StateSigner>,
}

impl LaunchController {
    #[must_use]
    pub fn new(
        authorized_fhir_url: impl Into<String>,
        sessions: SessionManager,
        auth_flow: AuthFlowConfig,
    ) -> Self {
        Self {
            authorized_fhir_url: authorized_fhir_url.into(),
            sessions,
            auth_flow,
            state_signer: None,
        }
    }

    /// Sign the OAuth state instead of sending the raw session id
    #[must_use]
    pub fn with_state_signer(mut self, signer: StateSigner) -> Self {
        self.state_signer = Some(signer);
        self
    }

    /// Build the controller described by validated settings
    #[must_use]
    pub fn from_settings(settings: &SmartLaunchSettings, store: Arc<dyn SessionStore>) -> Self {
        let sessions = SessionManager::new(
            store,
            settings.session_duration(),
            settings.cookies.secure,
        );
        let auth_flow = AuthFlowConfig::new(
            settings.fhir.client_id.clone(),
            settings.fhir.redirect_url.clone(),
            settings.fhir.scopes.clone(),
        );
        let controller = Self::new(settings.fhir.authorized_fhir_url.clone(), sessions, auth_flow);
        match settings.session.state_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                controller.with_state_signer(StateSigner::new(secret.as_bytes()))
            }
            _ => controller,
        }
    }

    #[must_use]
    pub fn authorized_fhir_url(&self) -> &str {
        &self.authorized_fhir_url
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Handle `GET /launch?iss=...&launch=...`
    ///
    /// # Errors
    ///
    /// 401 for a missing or unauthorized issuer or a missing launch id, 500 if
    /// the session cannot be persisted and 400 if the authorization URL cannot
    /// be built
    pub async fn launch(&self, req: &HttpRequest) -> Result<HttpResponse, LaunchError> {
        let Some(issuer_url) = non_empty_query_param(req, ISS_KEY) else {
            return Err(reject(
                "/launch",
                LaunchError::unauthorized("missing iss in URL query parameters"),
            ));
        };
        if issuer_url != self.authorized_fhir_url {
            return Err(reject(
                "/launch",
                LaunchError::unauthorized(format!("unauthorized iss {issuer_url}")),
            ));
        }
        let Some(launch_context_id) = non_empty_query_param(req, LAUNCH_ID_KEY) else {
            return Err(reject(
                "/launch",
                LaunchError::unauthorized("missing launch in URL query parameters"),
            ));
        };
        LoggingHelper::log_launch_accepted(&issuer_url, &launch_context_id);

        let NewSession { mut session, cookie } = self.sessions.create().await.map_err(|e| {
            log::error!("Failed to create session: {e}");
            LaunchError::Store(CANNOT_CREATE_SESSION.to_string())
        })?;

        let state = self.state_for(session.id())?;
        let auth_url = self
            .auth_flow
            .build_authorization_url(&issuer_url, &launch_context_id, &state)
            .await
            .map_err(|e| {
                log::warn!("Failed to build FHIR authorization URL for {issuer_url}: {e}");
                LaunchError::Discovery(CANNOT_BUILD_AUTH_URL.to_string())
            })?;

        session.issuer_url = Some(issuer_url);
        session.launch_context_id = Some(launch_context_id);
        self.sessions.save(&session).await.map_err(|e| {
            log::error!("Failed to save launched session: {e}");
            LaunchError::Store(CANNOT_CREATE_SESSION.to_string())
        })?;
        LoggingHelper::log_session_saved("launch");

        Ok(ResponseBuilder::redirect_with_cookie(&auth_url, cookie))
    }

    /// Handle `GET /fhir_redirect?code=...&state=...`
    ///
    /// # Errors
    ///
    /// 401 without a usable session, 400 for a missing code or a state that
    /// does not belong to the session, 500 if the exchange or the session write
    /// fails
    pub async fn fhir_redirect(&self, req: &HttpRequest) -> Result<HttpResponse, LaunchError> {
        let mut session = self.load_session(req).await?;

        let Some(issuer_url) = session.issuer_url().map(ToString::to_string) else {
            return Err(reject(
                "/fhir_redirect",
                LaunchError::unauthorized(SESSION_MISSING_FHIR_URL),
            ));
        };
        if session.launch_context_id().is_none() {
            return Err(reject(
                "/fhir_redirect",
                LaunchError::unauthorized(SESSION_MISSING_LAUNCH_ID),
            ));
        }

        let Some(code) = non_empty_query_param(req, CODE_KEY) else {
            return Err(reject("/fhir_redirect", LaunchError::bad_request(MISSING_CODE)));
        };
        let state = non_empty_query_param(req, STATE_KEY).unwrap_or_default();
        if !self.state_matches(session.id(), &state) {
            return Err(reject("/fhir_redirect", LaunchError::bad_request(INVALID_STATE)));
        }

        let token = self
            .auth_flow
            .exchange_code(&issuer_url, &code)
            .await
            .map_err(|e| {
                log::error!("Token exchange with {issuer_url} failed: {e}");
                LaunchError::TokenExchange(TOKEN_EXCHANGE_FAILED.to_string())
            })?;

        session.auth_token = Some(token);
        self.sessions.save(&session).await.map_err(|e| {
            log::error!("Failed to save authenticated session: {e}");
            LaunchError::Store(SAVE_SESSION_FAILED.to_string())
        })?;
        LoggingHelper::log_session_saved("token exchange");

        Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(AUTHENTICATED_MESSAGE))
    }

    /// Session for the request's cookie; expired sessions count as missing
    async fn load_session(&self, req: &HttpRequest) -> Result<Session, LaunchError> {
        match self.sessions.retrieve_unexpired(req).await {
            Ok(session) => Ok(session),
            Err(e) if e.is_not_found() => {
                Err(reject("/fhir_redirect", LaunchError::SessionNotFound))
            }
            Err(e) => {
                log::error!("Failed to retrieve session: {e}");
                Err(LaunchError::Store(RETRIEVE_SESSION_FAILED.to_string()))
            }
        }
    }

    /// State sent to the authorization server for a session
    fn state_for(&self, session_id: &str) -> Result<String, LaunchError> {
        match &self.state_signer {
            Some(signer) => signer.sign(session_id).map_err(|e| {
                log::error!("Failed to sign state: {e}");
                LaunchError::Discovery(CANNOT_BUILD_AUTH_URL.to_string())
            }),
            None => Ok(session_id.to_string()),
        }
    }

    /// Exact match against the state issued for this session
    fn state_matches(&self, session_id: &str, state: &str) -> bool {
        match &self.state_signer {
            Some(signer) => signer.verify(session_id, state),
            None => state == session_id,
        }
    }
}

fn reject(endpoint: &str, err: LaunchError) -> LaunchError {
    LoggingHelper::log_request_rejected(endpoint, &err.to_string());
    err
}
