//! Response body to text decoding.

use encoding_rs::{Encoding, UTF_8};
use http::HeaderMap;
use http::header::CONTENT_TYPE;

/// Returns the encoding declared by the `charset` parameter of `Content-Type`.
///
/// Unknown labels and malformed media types yield `None`.
#[must_use]
pub fn declared_encoding(headers: &HeaderMap) -> Option<&'static Encoding> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let media: mime::Mime = content_type.parse().ok()?;
    let charset = media.get_param(mime::CHARSET)?;
    Encoding::for_label(charset.as_str().as_bytes())
}

/// Decodes a response body using the charset declared in `headers`.
///
/// A byte order mark overrides the declared charset. Without a usable
/// declaration the body is decoded as UTF-8. Malformed input yields an
/// empty string; the raw bytes remain the authoritative result.
#[must_use]
pub fn decode_body(headers: &HeaderMap, body: &[u8]) -> String {
    let (encoding, payload) = match Encoding::for_bom(body) {
        Some((encoding, bom_len)) => (encoding, &body[bom_len..]),
        None => (declared_encoding(headers).unwrap_or(UTF_8), body),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(payload)
        .map_or_else(String::new, std::borrow::Cow::into_owned)
}
