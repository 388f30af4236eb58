//! API client for the chat application's authentication service.
//!
//! Both endpoints answer with the same envelope: a boolean status flag plus
//! either the authenticated user payload or a rejection message. The client
//! folds every reply, including transport and parse failures, into an
//! `AuthOutcome` so callers branch on exactly three cases.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Session;

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Authentication endpoints, relative to the configured base URL
const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";

/// Fallback when the server rejects without supplying a message
const REJECTED_FALLBACK_MESSAGE: &str = "Authentication failed.";

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register request body. The confirmation password is validated locally
/// and has no field here, so it can never be transmitted.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Reply envelope shared by both endpoints
#[derive(Debug, Deserialize)]
struct AuthReply {
    status: bool,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(alias = "_id")]
    id: String,
    username: String,
    #[serde(default)]
    presence: Option<String>,
}

/// Tagged result of a remote authentication attempt.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Success { session: Session },
    Rejected { message: String },
    TransportFailure,
}

/// Abstraction over the remote service so the flow controller can be
/// driven by a test double.
// The flow runs single-threaded, so the futures need no Send bound.
#[allow(async_fn_in_trait)]
pub trait AuthGateway {
    async fn login(&self, request: &LoginRequest) -> AuthOutcome;
    async fn register(&self, request: &RegisterRequest) -> AuthOutcome;
}

/// API client for the authentication service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, base_url })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<AuthReply, ApiError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::ServerStatus(response.status()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    fn classify(result: Result<AuthReply, ApiError>) -> AuthOutcome {
        match result {
            Ok(reply) => Self::classify_reply(reply),
            Err(e) => {
                warn!(error = %e, "Authentication request failed");
                AuthOutcome::TransportFailure
            }
        }
    }

    fn classify_reply(reply: AuthReply) -> AuthOutcome {
        match (reply.status, reply.user) {
            (true, Some(user)) => AuthOutcome::Success {
                session: Session {
                    id: user.id,
                    username: user.username,
                    presence: user.presence,
                    created_at: Utc::now(),
                },
            },
            (true, None) => {
                warn!("Reply had status=true but no user payload");
                AuthOutcome::TransportFailure
            }
            (false, _) => AuthOutcome::Rejected {
                message: reply
                    .msg
                    .unwrap_or_else(|| REJECTED_FALLBACK_MESSAGE.to_string()),
            },
        }
    }
}

impl AuthGateway for AuthClient {
    async fn login(&self, request: &LoginRequest) -> AuthOutcome {
        debug!("Sending login request");
        Self::classify(self.post(LOGIN_PATH, request).await)
    }

    async fn register(&self, request: &RegisterRequest) -> AuthOutcome {
        debug!("Sending register request");
        Self::classify(self.post(REGISTER_PATH, request).await)
    }
}
