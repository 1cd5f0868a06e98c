//! Request fingerprinting.
//!
//! A fingerprint is a SHA-256 digest over the canonical form of a request and
//! is the storage key for recorded interactions. It must stay stable across
//! process restarts: playback reads fingerprints written by an earlier
//! record run.
//!
//! Canonical form (every field length-prefixed under a tag):
//! - method, ASCII-uppercased
//! - url, raw path and query as stored (no reordering, no decoding)
//! - headers, names lowercased and sorted; values of a name keep their order;
//!   names on the ignore list are skipped. Values are the stored UTF-8 text, so
//!   non-UTF-8 bytes have already been replaced with U+FFFD and values that
//!   differ only in those bytes share a fingerprint
//! - body, raw bytes
//!
//! The upstream target is deliberately not part of the fingerprint.

use super::types::{HeaderValues, RecordedRequest};
use sha2::{Digest as _, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Headers excluded from fingerprints by default: hop-by-hop headers and
/// headers derived from the transport rather than from the call itself.
pub const DEFAULT_IGNORED_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Computes request fingerprints with a fixed header ignore list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprinter {
    ignored_headers: BTreeSet<String>,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_HEADERS)
    }
}

impl Fingerprinter {
    /// Create a fingerprinter that skips the given header names (case-insensitive).
    pub fn new<I, S>(ignored_headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignored_headers: ignored_headers
                .into_iter()
                .map(|name| name.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn ignores(&self, header_name: &str) -> bool {
        self.ignored_headers
            .contains(&header_name.to_ascii_lowercase())
    }

    /// Compute the hex-encoded fingerprint of a request.
    pub fn fingerprint(&self, request: &RecordedRequest) -> String {
        let mut hasher = Sha256::new();

        hash_field(
            &mut hasher,
            b"method",
            request.method.to_ascii_uppercase().as_bytes(),
        );
        hash_field(&mut hasher, b"url", request.url.as_bytes());

        let headers = self.canonical_headers(&request.headers);
        hash_field(
            &mut hasher,
            b"headers",
            headers.len().to_string().as_bytes(),
        );
        for (name, values) in &headers {
            hash_field(&mut hasher, b"name", name.as_bytes());
            for value in values {
                hash_field(&mut hasher, b"value", value.as_bytes());
            }
        }

        hash_field(&mut hasher, b"body", &request.body);

        hex::encode(hasher.finalize())
    }

    /// Lowercase and merge header names, dropping ignored ones.
    fn canonical_headers<'a>(&self, headers: &'a HeaderValues) -> BTreeMap<String, Vec<&'a str>> {
        let mut canonical: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
        for (name, values) in headers {
            let name = name.to_ascii_lowercase();
            if self.ignored_headers.contains(&name) {
                continue;
            }
            canonical
                .entry(name)
                .or_default()
                .extend(values.iter().map(String::as_str));
        }
        canonical
    }
}

/// Fingerprint a request using the default header ignore list.
pub fn fingerprint(request: &RecordedRequest) -> String {
    Fingerprinter::default().fingerprint(request)
}

fn hash_field(hasher: &mut Sha256, tag: &[u8], bytes: &[u8]) {
    hasher.update((tag.len() as u64).to_be_bytes());
    hasher.update(tag);
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
