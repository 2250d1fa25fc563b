use actix_web::cookie::{time::OffsetDateTime, Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::{DateTime, Utc};

use crate::models::Session;

/// Name of the cookie binding a browser to its session
pub const COOKIE_NAME: &str = "session";

/// Builds the `session` cookie for a given session
///
/// `SameSite=Lax` keeps the cookie on the top-level GET navigation back from the
/// FHIR authorization server to `/fhir_redirect`.
#[derive(Clone, Debug)]
pub struct CookieFactory {
    cookie_secure: bool,
}

impl CookieFactory {
    #[must_use]
    pub fn new(cookie_secure: bool) -> Self {
        Self { cookie_secure }
    }

    /// Cookie carrying the session id, expiring with the session
    #[must_use]
    pub fn create_session_cookie(&self, session: &Session) -> Cookie<'static> {
        Cookie::build(COOKIE_NAME, session.id().to_owned())
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .expires(to_offset_date_time(session.expires_at))
            .finish()
    }
}

/// Session id carried by the request's `session` cookie, if any and non-empty
#[must_use]
pub fn session_id_from_request(req: &HttpRequest) -> Option<String> {
    let cookie = req.cookie(COOKIE_NAME)?;
    let value = cookie.value();
    if value.is_empty() {
        log::debug!("Session cookie present but empty");
        return None;
    }
    Some(value.to_string())
}

fn to_offset_date_time(at: DateTime<Utc>) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(at.timestamp()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
