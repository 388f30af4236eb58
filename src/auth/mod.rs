//! Authentication module for session persistence and credential validation.
//!
//! This module provides:
//! - `Session` / `SessionStore`: the persisted "logged in as" slot
//! - `validate_login` / `validate_register`: pure form-input rule checks
//!
//! The session is the single source of truth for whether this client is
//! authenticated; a stored session is trusted until overwritten or cleared.

pub mod session;
pub mod validator;

pub use session::{FileSessionStore, Session, SessionStore};
pub use validator::{validate_login, validate_register, LoginInput, RegisterInput, ValidationError};
