//! Session Manager
//!
//! Creates, retrieves and saves [`Session`] records on top of a
//! [`SessionStore`], and binds a session to the browser through the `session`
//! cookie.
//!
//! A freshly created session is handed back to the caller directly together with
//! the cookie to set on the response; only the browser's *next* request reaches
//! the session through the cookie.

use actix_web::cookie::Cookie;
use actix_web::HttpRequest;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::models::Session;
use crate::session::cookie::{session_id_from_request, CookieFactory};
use crate::session::store::{SessionStore, StoreError};
use crate::utils::crypto::generate_session_id;
use crate::utils::logging::LoggingHelper;

/// Errors raised while creating, loading or saving a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error("session expired")]
    Expired,
    #[error("failed to serialize session: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("failed to deserialize session: {0}")]
    Deserialization(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether the error means "this browser has no usable session"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound | Self::Expired)
    }
}

/// A session that was just created and the cookie binding it to the browser
#[derive(Debug)]
pub struct NewSession {
    pub session: Session,
    pub cookie: Cookie<'static>,
}

/// Session manager backed by a pluggable [`SessionStore`]
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    session_duration: Duration,
    cookie_factory: CookieFactory,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, session_duration: Duration, cookie_secure: bool) -> Self {
        Self {
            store,
            session_duration,
            cookie_factory: CookieFactory::new(cookie_secure),
        }
    }

    #[must_use]
    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    #[must_use]
    pub fn cookie_factory(&self) -> &CookieFactory {
        &self.cookie_factory
    }

    /// Create and persist an empty session, returning it with its cookie
    ///
    /// The record is stored before any launch data is known so that a later
    /// lookup can tell a store failure apart from a session that was never made.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be serialized or persisted
    pub async fn create(&self) -> Result<NewSession, SessionError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.session_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = Session::new(generate_session_id(), expires_at);
        self.save(&session).await?;
        let cookie = self.cookie_factory.create_session_cookie(&session);
        LoggingHelper::log_session_created(&session.expires_at);
        Ok(NewSession { session, cookie })
    }

    /// Load the session named by the request's `session` cookie
    ///
    /// Expiry is not checked here; see [`Session::is_expired`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] when the cookie is missing or empty or
    /// the store has no record for it, [`SessionError::Deserialization`] when the
    /// stored bytes are corrupt, and [`SessionError::Store`] on backend failure
    pub async fn retrieve(&self, req: &HttpRequest) -> Result<Session, SessionError> {
        let id = session_id_from_request(req).ok_or(SessionError::NotFound)?;
        self.find(&id).await
    }

    /// Like [`SessionManager::retrieve`], but an expired session is an error
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Expired`] for a session past its expiry, otherwise
    /// the same errors as [`SessionManager::retrieve`]
    pub async fn retrieve_unexpired(&self, req: &HttpRequest) -> Result<Session, SessionError> {
        let session = self.retrieve(req).await?;
        if session.is_expired() {
            log::debug!("Session expired at {}", session.expires_at);
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    /// Load a session by id
    ///
    /// # Errors
    ///
    /// Same as [`SessionManager::retrieve`], minus the cookie handling
    pub async fn find(&self, id: &str) -> Result<Session, SessionError> {
        let record = self.store.retrieve(id).await?.ok_or(SessionError::NotFound)?;
        Session::from_bytes(&record.value).map_err(SessionError::Deserialization)
    }

    /// Serialize and persist `session`, creating the record if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the store rejects the write
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let bytes = session.to_bytes().map_err(SessionError::Serialization)?;
        self.store
            .store(session.id(), bytes, session.expires_at)
            .await?;
        Ok(())
    }
}
