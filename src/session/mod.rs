//! Session Management Module
//!
//! Server-side sessions backing the SMART launch flow.
//!
//! # Modules
//!
//! - [`manager`] - Creating, retrieving and saving sessions
//! - [`store`] - Pluggable key/value persistence with an in-memory backend
//! - [`cookie`] - The `session` cookie binding a browser to its session

pub mod cookie;
pub mod manager;
pub mod store;

pub use cookie::{CookieFactory, COOKIE_NAME};
pub use manager::{NewSession, SessionError, SessionManager};
pub use store::{MemoryStore, SessionStore, StoreError, StoredRecord};
