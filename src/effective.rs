//! The client-perceived request view used as the resolution base.
//!
//! [`EffectiveRequest`] captures the scheme, host, port, and current
//! path the original client believes it requested, reconciled from
//! `Forwarded`/`X-Forwarded-*` headers by an upstream collaborator
//! (a proxy-aware extractor or framework middleware) and typically
//! handed over through `http::Extensions`. Signpost never parses
//! forwarding headers itself; it only consumes the reconciled view.

use http::uri::Authority;

/// What the client actually talked to, as opposed to what the origin
/// server sees behind one or more reverse proxies. Immutable for the
/// duration of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveRequest {
    /// Client-facing scheme (`http` or `https`, usually from
    /// `X-Forwarded-Proto`).
    pub scheme: String,
    /// Client-facing host, without port.
    pub host: String,
    /// Client-facing port, absent when the scheme default applies.
    pub port: Option<u16>,
    /// The request path as the client sent it, including any prefix a
    /// proxy stripped before forwarding.
    pub path: String,
}

impl EffectiveRequest {
    #[must_use]
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port: None,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// The `scheme://host[:port]` prefix every rewritten location
    /// starts from.
    pub(crate) fn base(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Derive the view for a request.
    ///
    /// Prefers the reconciled entry a forwarded-header collaborator
    /// installed in the request extensions. Falls back to the origin
    /// server's own view (`Host` header, request path, plain `http`),
    /// which is only correct when no proxy sits in front. Returns
    /// `None` when neither is available.
    #[must_use]
    pub fn from_request<B>(request: &http::Request<B>) -> Option<Self> {
        if let Some(reconciled) = request.extensions().get::<Self>() {
            return Some(reconciled.clone());
        }

        let authority = request
            .headers()
            .get(http::header::HOST)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Authority>().ok())?;

        Some(Self {
            scheme: "http".to_owned(),
            host: authority.host().to_owned(),
            port: authority.port_u16(),
            path: request.uri().path().to_owned(),
        })
    }
}
