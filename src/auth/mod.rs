//! Caller credential forwarding.
//!
//! Authentication is not enforced here; the remote report service does that.
//! The caller's bearer token is captured per request and made available to
//! outgoing gateway calls through a task-local slot.

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};

tokio::task_local! {
    static CALLER_TOKEN: Option<CallerToken>;
}

/// Bearer token presented by the caller.
/// Uses `SecretString` so it never shows up in logs.
#[derive(Clone)]
pub struct CallerToken(SecretString);

impl CallerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Parse an `Authorization` header value of the form `Bearer <token>`.
    pub fn from_authorization(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return None;
        }
        Some(Self::new(token))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for CallerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CallerToken([REDACTED])")
    }
}

/// Run `fut` with `token` visible to [`current_caller_token`].
pub async fn with_caller_token<F: Future>(token: Option<CallerToken>, fut: F) -> F::Output {
    CALLER_TOKEN.scope(token, fut).await
}

/// Token of the request currently being served, if any.
pub fn current_caller_token() -> Option<CallerToken> {
    CALLER_TOKEN.try_with(|t| t.clone()).ok().flatten()
}
