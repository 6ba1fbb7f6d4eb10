//! Build-time configuration and redirect status validation.
//!
//! [`RedirectConfig`] is the serde-deserializable configuration
//! surface, consumed once at startup to produce an immutable
//! [`RedirectRewriter`](crate::middleware::RedirectRewriter). The
//! status code is validated through [`RedirectStatus`] at build time:
//! an out-of-range code fails immediately and never reaches request
//! handling, so the hot path shares the instance across request tasks
//! without synchronization.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::SignpostError;
use crate::middleware::RedirectRewriter;

/// A redirect status code, guaranteed to be in the 3xx range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectStatus(StatusCode);

impl RedirectStatus {
    /// The default, 303 See Other. Unlike most framework redirect
    /// defaults it is never cached by clients.
    pub const SEE_OTHER: Self = Self(StatusCode::SEE_OTHER);

    /// Validate a wire code into a redirect status. Out-of-range codes
    /// are rejected, never clamped.
    ///
    /// # Errors
    ///
    /// [`SignpostError::InvalidRedirectStatus`] unless `code` is in
    /// [300, 399].
    pub fn new(code: u16) -> Result<Self, SignpostError> {
        match StatusCode::from_u16(code) {
            Ok(status) if status.is_redirection() => Ok(Self(status)),
            _ => Err(SignpostError::InvalidRedirectStatus { status: code }),
        }
    }

    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0.as_u16()
    }
}

impl Default for RedirectStatus {
    fn default() -> Self {
        Self::SEE_OTHER
    }
}

impl From<RedirectStatus> for StatusCode {
    fn from(status: RedirectStatus) -> Self {
        status.0
    }
}

/// Configuration for the redirect middleware, deserializable from any
/// serde format the embedding application loads its config with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Status code applied to rewritten redirects.
    pub status_code: u16,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            status_code: StatusCode::SEE_OTHER.as_u16(),
        }
    }
}

impl RedirectConfig {
    /// Consume the configuration into an immutable middleware
    /// instance.
    ///
    /// # Errors
    ///
    /// [`SignpostError::InvalidRedirectStatus`] when `status_code` is
    /// outside [300, 399].
    pub fn build(self) -> Result<RedirectRewriter, SignpostError> {
        Ok(RedirectRewriter::with_status(RedirectStatus::new(
            self.status_code,
        )?))
    }
}
