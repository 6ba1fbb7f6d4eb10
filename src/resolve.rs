//! Redirect target resolution against the effective request.
//!
//! [`resolve_location`] turns the raw location string an application
//! redirects to into the absolute URI the client must receive. Targets
//! are classified into four shapes (absolute, network-path reference,
//! path-absolute, path-relative), and everything except an already
//! absolute target is rebuilt on top of the client-facing scheme, host,
//! and port from [`EffectiveRequest`]. Dot-segment collapsing and final
//! validation are delegated to `url::Url`.

use url::{ParseError, Url};

use crate::effective::EffectiveRequest;
use crate::error::SignpostError;

/// A classified redirect target. Evaluation order matters: a target
/// carrying its own scheme is never reinterpreted, and the `//` check
/// runs before the path shapes.
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    /// Has a scheme of its own; passed through untouched.
    Absolute,
    /// `//authority/...`, inheriting the client-facing scheme.
    NetworkPath,
    /// Rooted at `/`; replaces the request path wholesale.
    PathAbsolute(Reference<'a>),
    /// Resolved against the directory of the current request path.
    PathRelative(Reference<'a>),
}

/// Path, query, and fragment of a relative reference after extraction.
#[derive(Debug, PartialEq, Eq)]
struct Reference<'a> {
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

fn classify(target: &str) -> Result<Target<'_>, SignpostError> {
    match Url::parse(target) {
        // A parsed Url always has a scheme.
        Ok(_) => return Ok(Target::Absolute),
        Err(ParseError::RelativeUrlWithoutBase) => {}
        Err(source) => return Err(SignpostError::malformed(target, source)),
    }

    if target.starts_with("//") {
        return Ok(Target::NetworkPath);
    }

    let reference = split_reference(target);
    if reference.path.starts_with('/') {
        Ok(Target::PathAbsolute(reference))
    } else {
        Ok(Target::PathRelative(reference))
    }
}

/// Extract fragment and query from a target string. The first `#`
/// starts the fragment; the first `?` before it starts the query.
/// Either may be present and empty.
fn split_reference(target: &str) -> Reference<'_> {
    let (rest, fragment) = match target.find('#') {
        Some(index) => (&target[..index], Some(&target[index + 1..])),
        None => (target, None),
    };
    let (path, query) = match rest.find('?') {
        Some(index) => (&rest[..index], Some(&rest[index + 1..])),
        None => (rest, None),
    };
    Reference {
        path,
        query,
        fragment,
    }
}

/// Resolve `relative` against the directory of `path`: everything up
/// to and including the last `/` is kept as the base. A path without
/// any `/` is replaced entirely.
fn apply_relative_path(path: &str, relative: &str) -> String {
    match path.rfind('/') {
        Some(index) => {
            let mut resolved = path[..index].to_owned();
            if !relative.starts_with('/') {
                resolved.push('/');
            }
            resolved.push_str(relative);
            resolved
        }
        None => relative.to_owned(),
    }
}

/// Resolve a redirect target into the absolute URI to send back to the
/// client.
///
/// Absolute targets pass through verbatim. Network-path references
/// (`//host/...`) get the client-facing scheme prepended. Everything
/// else is rebuilt from the effective scheme, host, and port, with the
/// path taken as-is (`/...` targets), resolved against the directory of
/// the current request path (relative targets), or kept (empty target,
/// bare `?query` / `#fragment`).
///
/// # Errors
///
/// [`SignpostError::MalformedTarget`] when the target cannot be parsed
/// as a URI reference or the rebuilt URI does not validate.
pub fn resolve_location(
    target: &str,
    request: &EffectiveRequest,
) -> Result<String, SignpostError> {
    let (reference, path) = match classify(target)? {
        Target::Absolute => return Ok(target.to_owned()),
        Target::NetworkPath => {
            let with_scheme = format!("{}:{}", request.scheme, target);
            Url::parse(&with_scheme)
                .map_err(|source| SignpostError::malformed(target, source))?;
            return Ok(with_scheme);
        }
        Target::PathAbsolute(reference) => {
            let path = reference.path.to_owned();
            (reference, path)
        }
        Target::PathRelative(reference) => {
            let path = if reference.path.is_empty() {
                // Bare `?query` / `#fragment` targets keep the current path.
                request.path.clone()
            } else {
                apply_relative_path(&request.path, reference.path)
            };
            (reference, path)
        }
    };

    let mut assembled = request.base();
    if !path.is_empty() && !path.starts_with('/') {
        // A URI with an authority needs a rooted path.
        assembled.push('/');
    }
    assembled.push_str(&path);
    if let Some(query) = reference.query {
        assembled.push('?');
        assembled.push_str(query);
    }
    if let Some(fragment) = reference.fragment {
        assembled.push('#');
        assembled.push_str(fragment);
    }

    // Url::parse collapses `.` / `..` segments and validates the result.
    let resolved =
        Url::parse(&assembled).map_err(|source| SignpostError::malformed(target, source))?;
    Ok(resolved.to_string())
}
