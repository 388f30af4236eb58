//! HTTP client module for the remote authentication service.
//!
//! This module provides `AuthClient` for the login and register endpoints.
//! Every call is classified into an `AuthOutcome`; transport and parse
//! failures never escape as errors.

pub mod client;
pub mod error;

pub use client::{AuthClient, AuthGateway, AuthOutcome, LoginRequest, RegisterRequest};
pub use error::ApiError;
