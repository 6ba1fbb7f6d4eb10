//! Unified error types for Signpost.
//!
//! Defines [`SignpostError`], the single crate error enum, using
//! `thiserror` for `Display` and `Error` derives. There are exactly two
//! failure categories: a redirect status configured outside the 3xx
//! range (rejected at build time, before any traffic), and a redirect
//! target that cannot be resolved into a valid URI (surfaced to the
//! caller of the redirect operation, never retried).

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SignpostError {
    #[error("invalid redirect status {status}: expected a 3xx code")]
    InvalidRedirectStatus { status: u16 },

    #[error("cannot resolve redirect target '{target}': {source}")]
    MalformedTarget {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SignpostError {
    pub(crate) fn malformed(
        target: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MalformedTarget {
            target: target.into(),
            source: Box::new(source),
        }
    }
}
