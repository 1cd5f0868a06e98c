//! Types for recorded interactions - requests, responses and capture metadata.

use chrono::{DateTime, Utc};
use hyper::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header name -> ordered header values. Multi-valued headers keep every value.
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// Request as seen by the intermediary, before target resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query exactly as received
    pub url: String,
    #[serde(default)]
    pub headers: HeaderValues,
    #[serde(default, with = "base64_bytes")]
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Create a recorded request from inbound request components.
    ///
    /// Recording and playback both build requests through here, so
    /// fingerprints computed on either side are comparable.
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Self {
        let url = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();

        Self {
            method: method.as_str().to_string(),
            url,
            headers: header_values(headers),
            body: body.to_vec(),
        }
    }
}

/// Response captured from the real upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HeaderValues,
    #[serde(default, with = "base64_bytes")]
    pub body: Vec<u8>,
}

impl RecordedResponse {
    pub fn from_parts(status: u16, headers: &HeaderMap, body: &[u8]) -> Self {
        Self {
            status_code: status,
            headers: header_values(headers),
            body: body.to_vec(),
        }
    }
}

/// Capture metadata. Never used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionMetadata {
    /// Upstream target exactly as supplied by the caller
    pub target: String,
    /// Round-trip latency observed while recording
    #[serde(default)]
    pub duration_ms: u64,
}

/// One recorded request/response pair plus capture metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub request: RecordedRequest,
    pub response: RecordedResponse,
    pub metadata: InteractionMetadata,
}

impl Interaction {
    /// Create a new interaction with a freshly generated id.
    pub fn new(
        timestamp: DateTime<Utc>,
        request: RecordedRequest,
        response: RecordedResponse,
        metadata: InteractionMetadata,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            request,
            response,
            metadata,
        }
    }
}

/// Convert a hyper header map, keeping every value of repeated headers in order.
///
/// Values are stored as text. Bytes that are not valid UTF-8 become U+FFFD, so
/// such values are neither fingerprinted nor replayed byte for byte.
pub fn header_values(headers: &HeaderMap) -> HeaderValues {
    let mut values = HeaderValues::new();
    for name in headers.keys() {
        let entry = values.entry(name.as_str().to_string()).or_default();
        for value in headers.get_all(name) {
            entry.push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
    }
    values
}

/// Serde adapter storing raw bytes as standard base64 text.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
