//! The redirect-rewriting middleware.
//!
//! [`RedirectRewriter`] is the immutable instance produced from
//! [`RedirectConfig`](crate::config::RedirectConfig). It intercepts
//! redirect operations in two forms: [`wrap`](RedirectRewriter::wrap)
//! decorates a per-response [`ResponseHandle`] so its redirect
//! operation resolves targets against the effective request (with a
//! guarantee that a response is wrapped at most once), and
//! [`rewrite_response`](RedirectRewriter::rewrite_response) is the
//! value-level form used by the Tower [`layer`] to post-process
//! `http::Response` values.

#[cfg(feature = "layer")]
pub mod layer;

use http::header::LOCATION;
use http::HeaderValue;

use crate::config::RedirectStatus;
use crate::effective::EffectiveRequest;
use crate::error::SignpostError;
use crate::resolve::resolve_location;
use crate::respond::{is_rewritten, ResponseHandle, RewriteHandle};

/// The middleware instance. Configuration is fixed at construction, so
/// copies can be handed to every request task without locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectRewriter {
    status: RedirectStatus,
}

impl RedirectRewriter {
    /// Middleware with the default 303 See Other redirect status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status(status: RedirectStatus) -> Self {
        Self { status }
    }

    #[must_use]
    pub fn status(&self) -> RedirectStatus {
        self.status
    }

    /// Wrap a response handle so its redirect operation is
    /// intercepted.
    ///
    /// At most one rewriting layer exists per response: when the given
    /// handle, or any handle it transitively decorates, already
    /// rewrites redirects, it is returned unchanged. Decorations
    /// without the capability are left alone and layered over.
    #[must_use]
    pub fn wrap<'a>(
        &self,
        handle: Box<dyn ResponseHandle + 'a>,
        request: EffectiveRequest,
    ) -> Box<dyn ResponseHandle + 'a> {
        if is_rewritten(handle.as_ref()) {
            return handle;
        }
        Box::new(RewriteHandle::new(handle, request, self.status))
    }

    /// Rewrite a redirect response in place: resolve its `Location`
    /// header against the effective request and replace the status
    /// with the configured code. Non-redirect responses and redirects
    /// without a `Location` are untouched; returns whether a rewrite
    /// happened.
    ///
    /// # Errors
    ///
    /// [`SignpostError::MalformedTarget`] when the `Location` value is
    /// not valid UTF-8 or cannot be resolved into a valid URI.
    pub fn rewrite_response<B>(
        &self,
        response: &mut http::Response<B>,
        request: &EffectiveRequest,
    ) -> Result<bool, SignpostError> {
        if !response.status().is_redirection() {
            return Ok(false);
        }
        let Some(location) = response.headers().get(LOCATION) else {
            return Ok(false);
        };

        let target = match location.to_str() {
            Ok(target) => target,
            Err(source) => {
                let lossy = String::from_utf8_lossy(location.as_bytes()).into_owned();
                return Err(SignpostError::malformed(lossy, source));
            }
        };

        let resolved = resolve_location(target, request)?;
        let value = HeaderValue::from_str(&resolved)
            .map_err(|source| SignpostError::malformed(target, source))?;
        tracing::debug!(
            from = %target,
            to = %resolved,
            status = self.status.as_u16(),
            "rewrote redirect"
        );

        *response.status_mut() = self.status.into();
        response.headers_mut().insert(LOCATION, value);
        Ok(true)
    }

    /// Tower layer applying this middleware to every response passing
    /// through a service stack.
    #[cfg(feature = "layer")]
    #[must_use]
    pub fn layer(&self) -> layer::RedirectRewriteLayer {
        layer::RedirectRewriteLayer::new(*self)
    }
}
