//! Response-handle abstraction and the rewriting wrapper.
//!
//! [`ResponseHandle`] is the minimal view of an outbound response the
//! middleware drives: status, headers, and the framework's native
//! redirect primitive. A rewriting layer advertises itself through the
//! [`rewrites_redirects`](ResponseHandle::rewrites_redirects)
//! capability and links to the handle it decorates via
//! [`underlying`](ResponseHandle::underlying), so the wrap operation
//! can walk a decoration chain and guarantee at most one rewriting
//! layer per response. [`HttpHandle`] is the `http::Response`-backed
//! implementation.

use http::header::LOCATION;
use http::{HeaderName, HeaderValue, StatusCode};

use crate::config::RedirectStatus;
use crate::effective::EffectiveRequest;
use crate::error::SignpostError;
use crate::resolve::resolve_location;

/// Minimal view of an outbound response.
///
/// Framework glue implements this once per response type; decorators
/// forward everything they do not intercept and report the handle they
/// decorate through [`underlying`](Self::underlying).
pub trait ResponseHandle {
    /// Set the response status line.
    fn set_status(&mut self, status: StatusCode);

    /// Set a response header, replacing any previous value.
    fn insert_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Issue a redirect to `location`.
    ///
    /// On an unwrapped handle this is the framework's native redirect
    /// primitive; on a wrapped handle the target is resolved against
    /// the effective request first.
    ///
    /// # Errors
    ///
    /// [`SignpostError::MalformedTarget`] when the location cannot be
    /// resolved into a valid URI.
    fn send_redirect(&mut self, location: &str) -> Result<(), SignpostError>;

    /// The handle this one decorates, when part of a wrapping chain.
    fn underlying(&self) -> Option<&dyn ResponseHandle> {
        None
    }

    /// Capability marker: this handle already rewrites redirect
    /// targets.
    fn rewrites_redirects(&self) -> bool {
        false
    }
}

/// Walk the decoration chain looking for a rewriting layer.
pub(crate) fn is_rewritten(handle: &dyn ResponseHandle) -> bool {
    let mut current = Some(handle);
    while let Some(handle) = current {
        if handle.rewrites_redirects() {
            return true;
        }
        current = handle.underlying();
    }
    false
}

/// The rewriting layer: intercepts `send_redirect`, resolves the
/// target, and emits an explicit status plus `Location` header on the
/// handle beneath it. It never invokes the underlying native redirect,
/// which would set the framework default on top.
pub(crate) struct RewriteHandle<'a> {
    inner: Box<dyn ResponseHandle + 'a>,
    request: EffectiveRequest,
    status: RedirectStatus,
}

impl<'a> RewriteHandle<'a> {
    pub(crate) fn new(
        inner: Box<dyn ResponseHandle + 'a>,
        request: EffectiveRequest,
        status: RedirectStatus,
    ) -> Self {
        Self {
            inner,
            request,
            status,
        }
    }
}

impl ResponseHandle for RewriteHandle<'_> {
    fn set_status(&mut self, status: StatusCode) {
        self.inner.set_status(status);
    }

    fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.inner.insert_header(name, value);
    }

    fn send_redirect(&mut self, location: &str) -> Result<(), SignpostError> {
        let resolved = resolve_location(location, &self.request)?;
        let value = HeaderValue::from_str(&resolved)
            .map_err(|source| SignpostError::malformed(location, source))?;
        tracing::debug!(
            from = %location,
            to = %resolved,
            status = self.status.as_u16(),
            "rewrote redirect"
        );
        self.inner.set_status(self.status.into());
        self.inner.insert_header(LOCATION, value);
        Ok(())
    }

    fn underlying(&self) -> Option<&dyn ResponseHandle> {
        Some(self.inner.as_ref())
    }

    fn rewrites_redirects(&self) -> bool {
        true
    }
}

/// [`ResponseHandle`] backed by a mutable `http::Response`.
///
/// Its native `send_redirect` is the framework default the middleware
/// overrides: 302 Found plus the location string as given.
pub struct HttpHandle<'a, B> {
    response: &'a mut http::Response<B>,
}

impl<'a, B> HttpHandle<'a, B> {
    #[must_use]
    pub fn new(response: &'a mut http::Response<B>) -> Self {
        Self { response }
    }
}

impl<B> ResponseHandle for HttpHandle<'_, B> {
    fn set_status(&mut self, status: StatusCode) {
        *self.response.status_mut() = status;
    }

    fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers_mut().insert(name, value);
    }

    fn send_redirect(&mut self, location: &str) -> Result<(), SignpostError> {
        let value = HeaderValue::from_str(location)
            .map_err(|source| SignpostError::malformed(location, source))?;
        *self.response.status_mut() = StatusCode::FOUND;
        self.response.headers_mut().insert(LOCATION, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Recorded {
        status: Option<StatusCode>,
        location: Option<HeaderValue>,
        native_redirects: usize,
    }

    struct Recorder {
        recorded: Rc<RefCell<Recorded>>,
    }

    impl ResponseHandle for Recorder {
        fn set_status(&mut self, status: StatusCode) {
            self.recorded.borrow_mut().status = Some(status);
        }

        fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
            if name == LOCATION {
                self.recorded.borrow_mut().location = Some(value);
            }
        }

        fn send_redirect(&mut self, _location: &str) -> Result<(), SignpostError> {
            self.recorded.borrow_mut().native_redirects += 1;
            Ok(())
        }
    }

    struct Passthrough<'a> {
        inner: Box<dyn ResponseHandle + 'a>,
    }

    impl ResponseHandle for Passthrough<'_> {
        fn set_status(&mut self, status: StatusCode) {
            self.inner.set_status(status);
        }

        fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
            self.inner.insert_header(name, value);
        }

        fn send_redirect(&mut self, location: &str) -> Result<(), SignpostError> {
            self.inner.send_redirect(location)
        }

        fn underlying(&self) -> Option<&dyn ResponseHandle> {
            Some(self.inner.as_ref())
        }
    }

    fn request() -> EffectiveRequest {
        EffectiveRequest::new("https", "example.com", "/old/page")
    }

    #[test]
    fn rewrite_intercepts_the_native_redirect() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let recorder = Recorder {
            recorded: Rc::clone(&recorded),
        };
        let mut handle =
            RewriteHandle::new(Box::new(recorder), request(), RedirectStatus::default());

        handle.send_redirect("new").unwrap();

        let recorded = recorded.borrow();
        assert_eq!(recorded.status, Some(StatusCode::SEE_OTHER));
        assert_eq!(
            recorded.location.as_ref().unwrap(),
            "https://example.com/old/new"
        );
        assert_eq!(recorded.native_redirects, 0);
    }

    #[test]
    fn malformed_target_propagates() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let recorder = Recorder {
            recorded: Rc::clone(&recorded),
        };
        let mut handle =
            RewriteHandle::new(Box::new(recorder), request(), RedirectStatus::default());

        let error = handle.send_redirect("http://[oops").unwrap_err();
        assert!(matches!(error, SignpostError::MalformedTarget { .. }));
        assert_eq!(recorded.borrow().status, None);
    }

    #[test]
    fn chain_walk_finds_the_rewriting_layer() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let recorder = Recorder {
            recorded: Rc::clone(&recorded),
        };
        let rewriting =
            RewriteHandle::new(Box::new(recorder), request(), RedirectStatus::default());

        assert!(is_rewritten(&rewriting));

        let decorated = Passthrough {
            inner: Box::new(rewriting),
        };
        assert!(is_rewritten(&decorated));
    }

    #[test]
    fn chain_walk_ignores_unrelated_decorations() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let recorder = Recorder {
            recorded: Rc::clone(&recorded),
        };
        let decorated = Passthrough {
            inner: Box::new(recorder),
        };

        assert!(!is_rewritten(&decorated));
    }

    #[test]
    fn http_handle_native_redirect_uses_the_framework_default() {
        let mut response = http::Response::new(());
        let mut handle = HttpHandle::new(&mut response);
        handle.send_redirect("/foo").unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/foo");
    }
}
