//! Tower integration for the redirect rewriter.
//!
//! [`RedirectRewriteLayer`] wraps a service so every response passing
//! through it gets its redirect `Location` resolved against the
//! effective request and its status normalized to the configured
//! code. The effective request is taken from the request extensions
//! (installed there by a forwarded-header collaborator) with a
//! fallback to the request's own `Host` header.

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use http::header::LOCATION;
use http::{Request, Response, StatusCode};
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::effective::EffectiveRequest;
use crate::middleware::RedirectRewriter;

/// Layer that applies [`RedirectRewriteService`].
#[derive(Debug, Clone, Copy)]
pub struct RedirectRewriteLayer {
    rewriter: RedirectRewriter,
}

impl RedirectRewriteLayer {
    #[must_use]
    pub fn new(rewriter: RedirectRewriter) -> Self {
        Self { rewriter }
    }
}

impl Default for RedirectRewriteLayer {
    fn default() -> Self {
        Self::new(RedirectRewriter::new())
    }
}

impl<S> Layer<S> for RedirectRewriteLayer {
    type Service = RedirectRewriteService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RedirectRewriteService {
            inner,
            rewriter: self.rewriter,
        }
    }
}

/// Service that rewrites redirect responses produced by `inner`.
#[derive(Debug, Clone)]
pub struct RedirectRewriteService<S> {
    inner: S,
    rewriter: RedirectRewriter,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RedirectRewriteService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let effective = EffectiveRequest::from_request(&request);
        ResponseFuture {
            future: self.inner.call(request),
            effective,
            rewriter: self.rewriter,
        }
    }
}

pin_project! {
    /// Response future for [`RedirectRewriteService`].
    pub struct ResponseFuture<F> {
        #[pin]
        future: F,
        effective: Option<EffectiveRequest>,
        rewriter: RedirectRewriter,
    }
}

impl<F, B, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let mut response = match ready!(this.future.poll(cx)) {
            Ok(response) => response,
            Err(error) => return Poll::Ready(Err(error)),
        };

        match this.effective.as_ref() {
            Some(effective) => {
                if let Err(error) = this.rewriter.rewrite_response(&mut response, effective) {
                    // Never forward a Location that failed to resolve.
                    tracing::error!(error = %error, "failed to rewrite redirect location");
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    response.headers_mut().remove(LOCATION);
                }
            }
            None => {
                if response.status().is_redirection() {
                    tracing::warn!(
                        "redirect response without an effective request view, location left as-is"
                    );
                }
            }
        }

        Poll::Ready(Ok(response))
    }
}
