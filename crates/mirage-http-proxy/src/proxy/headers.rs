//! Header names and helpers for intermediated responses.
//!
//! Marker headers are static so inserting them never needs a runtime parse.

use hyper::header::{self, HeaderName, HeaderValue};
use hyper::Response;

pub static X_MIRAGE_RECORDED: HeaderName = HeaderName::from_static("x-mirage-recorded");
pub static X_MIRAGE_REPLAYED: HeaderName = HeaderName::from_static("x-mirage-replayed");

pub static VALUE_TRUE: HeaderValue = HeaderValue::from_static("true");

/// Headers that describe a single connection hop, plus `content-length`.
///
/// None of these are copied from a recorded response into the one sent to
/// the client; hyper frames the outgoing body itself.
pub static NON_REPLAYABLE_HEADERS: [HeaderName; 9] = [
    header::CONNECTION,
    header::CONTENT_LENGTH,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn is_replayable(name: &HeaderName) -> bool {
    !NON_REPLAYABLE_HEADERS.contains(name)
}

/// Extension trait for marking responses.
pub trait MirageHeadersExt {
    /// Insert a header with a static name and value.
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue);
}

impl<B> MirageHeadersExt for Response<B> {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
        self.headers_mut().insert(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::Bytes;

    #[test]
    fn test_static_header_names() {
        assert_eq!(X_MIRAGE_RECORDED.as_str(), "x-mirage-recorded");
        assert_eq!(X_MIRAGE_REPLAYED.as_str(), "x-mirage-replayed");
    }

    #[test]
    fn test_set_header_static() {
        let mut response = Response::new(Full::new(Bytes::new()));
        response.set_header(&X_MIRAGE_REPLAYED, &VALUE_TRUE);
        assert_eq!(response.headers().get(&X_MIRAGE_REPLAYED).unwrap(), "true");
    }

    #[test]
    fn test_replayable_headers() {
        assert!(is_replayable(&header::CONTENT_TYPE));
        assert!(is_replayable(&header::SET_COOKIE));
        assert!(!is_replayable(&header::CONTENT_LENGTH));
        assert!(!is_replayable(&header::TRANSFER_ENCODING));
        assert!(!is_replayable(&HeaderName::from_static("keep-alive")));
    }
}
