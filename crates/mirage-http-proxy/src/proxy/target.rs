//! Upstream target handling.
//!
//! Targets arrive as already percent-decoded query parameter values, e.g.
//! `api.example.com/search?q=new york`. Before forwarding they get a scheme
//! (`https://` unless one is given) and their query is re-encoded so decoded
//! spaces and reserved characters survive the outbound request line.

use std::borrow::Cow;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,
    #[error("unsupported scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
}

/// Build the outbound URL for a target.
///
/// Targets without a scheme are prefixed with `https://`. An embedded query
/// string is re-encoded with [`reencode_query`]; a fragment is dropped.
pub fn normalize_target_url(target: &str) -> Result<String, TargetError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(TargetError::Empty);
    }

    let with_scheme = match split_scheme(target).0 {
        Some(scheme) => {
            if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
                return Err(TargetError::UnsupportedScheme(scheme.to_string()));
            }
            Cow::Borrowed(target)
        }
        None => Cow::Owned(format!("https://{target}")),
    };

    let without_fragment = with_scheme
        .split_once('#')
        .map(|(url, _)| url)
        .unwrap_or(&*with_scheme);

    Ok(match without_fragment.split_once('?') {
        Some((base, "")) => base.to_string(),
        Some((base, query)) => format!("{base}?{}", reencode_query(query)),
        None => without_fragment.to_string(),
    })
}

/// Re-encode a query string component by component.
///
/// Pairs keep their order and repeated keys are kept. Each key and value is
/// percent-decoded and then percent-encoded again, so applying this to its own
/// output changes nothing. Escapes that do not decode are kept verbatim and
/// their `%` is encoded.
pub fn reencode_query(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => format!("{}={}", reencode(key), reencode(value)),
            None => reencode(pair),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn reencode(component: &str) -> String {
    let decoded = urlencoding::decode(component).unwrap_or(Cow::Borrowed(component));
    urlencoding::encode(&decoded).into_owned()
}

/// Split an optional `scheme://` prefix from a target.
///
/// Only a leading run of scheme characters counts, so a `://` inside an
/// embedded query (`?next=http://...`) is not mistaken for the scheme.
pub fn split_scheme(target: &str) -> (Option<&str>, &str) {
    if let Some((scheme, rest)) = target.split_once("://") {
        let is_scheme = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if is_scheme {
            return (Some(scheme), rest);
        }
    }
    (None, target)
}

/// True when a target names only a host (and optional port), with no path or query.
pub fn is_bare_host(target: &str) -> bool {
    !split_scheme(target).1.contains(['/', '?', '#'])
}
