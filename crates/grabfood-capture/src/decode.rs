//! Filtering and decoding of intercepted search responses.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};

use crate::error::DecodeError;
use crate::types::{InterceptedExchange, SearchResponsePayload};

/// Recognises search exchanges and decodes their bodies.
#[derive(Debug, Clone)]
pub struct ResponseDecoder {
    search_url: String,
}

/// Result of decoding a batch of exchanges.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub payloads: Vec<SearchResponsePayload>,
    /// Exchanges that matched the search signature.
    pub matched: usize,
    /// Matched exchanges that failed to decode and were skipped.
    pub failed: usize,
}

impl ResponseDecoder {
    #[must_use]
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            search_url: search_url.into(),
        }
    }

    #[must_use]
    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    /// `true` for a `POST` to exactly the configured search URL.
    #[must_use]
    pub fn matches(&self, exchange: &InterceptedExchange) -> bool {
        exchange.method.eq_ignore_ascii_case("POST") && exchange.url == self.search_url
    }

    /// Decodes one exchange.
    ///
    /// Returns `Ok(None)` when the exchange is not a search request.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when a matching exchange has a non-2xx status,
    /// an unsupported or corrupt content encoding, a non-UTF-8 body, or JSON
    /// that does not have the search payload shape.
    pub fn decode(
        &self,
        exchange: &InterceptedExchange,
    ) -> Result<Option<SearchResponsePayload>, DecodeError> {
        if !self.matches(exchange) {
            return Ok(None);
        }

        if let Some(status) = exchange.status {
            if !(200..300).contains(&status) {
                return Err(DecodeError::UnexpectedStatus(status));
            }
        }

        let body = decode_body(&exchange.response_body, exchange.content_encoding())?;
        let text = std::str::from_utf8(&body)?;
        let payload = serde_json::from_str::<SearchResponsePayload>(text)?;
        Ok(Some(payload))
    }

    /// Decodes every matching exchange, skipping the ones that fail.
    pub fn decode_all<'a, I>(&self, exchanges: I) -> DecodedBatch
    where
        I: IntoIterator<Item = &'a InterceptedExchange>,
    {
        let mut batch = DecodedBatch::default();

        for exchange in exchanges {
            if !self.matches(exchange) {
                continue;
            }
            batch.matched += 1;

            match self.decode(exchange) {
                Ok(Some(payload)) => {
                    tracing::debug!(
                        url = %exchange.url,
                        status = ?exchange.status,
                        merchants = payload.search_result.search_merchants.len(),
                        "decoded search response"
                    );
                    batch.payloads.push(payload);
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        method = %exchange.method,
                        url = %exchange.url,
                        %error,
                        "skipping undecodable search response"
                    );
                    batch.failed += 1;
                }
            }
        }

        batch
    }
}

/// Undoes the `Content-Encoding` applied to a response body.
///
/// Codings listed in the header are removed in reverse order of
/// application. A missing header means `identity`.
///
/// # Errors
///
/// Returns [`DecodeError::UnsupportedEncoding`] for codings other than
/// `identity`, `gzip`, `x-gzip` and `deflate`, and
/// [`DecodeError::Decompress`] when the body is corrupt.
pub fn decode_body<'a>(
    body: &'a [u8],
    content_encoding: Option<&str>,
) -> Result<Cow<'a, [u8]>, DecodeError> {
    let Some(header) = content_encoding else {
        return Ok(Cow::Borrowed(body));
    };

    let codings: Vec<String> = header
        .split(',')
        .map(|coding| coding.trim().to_ascii_lowercase())
        .filter(|coding| !coding.is_empty())
        .collect();

    let mut data = Cow::Borrowed(body);
    for coding in codings.iter().rev() {
        data = match coding.as_str() {
            "identity" => data,
            "gzip" | "x-gzip" => {
                Cow::Owned(read_all(MultiGzDecoder::new(data.as_ref()), coding)?)
            }
            "deflate" => Cow::Owned(inflate(data.as_ref())?),
            other => return Err(DecodeError::UnsupportedEncoding(other.to_string())),
        };
    }

    Ok(data)
}

// Servers disagree on whether `deflate` means zlib-wrapped or raw.
fn inflate(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    match read_all(ZlibDecoder::new(data), "deflate") {
        Ok(bytes) => Ok(bytes),
        Err(_) => read_all(DeflateDecoder::new(data), "deflate"),
    }
}

fn read_all<R: Read>(mut reader: R, encoding: &str) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|source| DecodeError::Decompress {
            encoding: encoding.to_string(),
            source,
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use serde_json::json;

    use super::*;

    const SEARCH_URL: &str = "https://portal.grab.com/foodweb/v2/search";

    fn body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "searchResult": {
                "searchMerchants": [
                    {"id": "4-C2A", "address": {"name": "Kopi Corner"}, "latlng": {"latitude": 1.0, "longitude": 2.0}}
                ]
            }
        }))
        .unwrap()
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn exchange(method: &str, url: &str, encoding: Option<&str>, body: Vec<u8>) -> InterceptedExchange {
        InterceptedExchange {
            method: method.to_string(),
            url: url.to_string(),
            status: Some(200),
            response_headers: encoding
                .map(|e| vec![("Content-Encoding".to_string(), e.to_string())])
                .unwrap_or_default(),
            response_body: body,
        }
    }

    #[test]
    fn ignores_get_requests_to_search_url() {
        let decoder = ResponseDecoder::new(SEARCH_URL);
        let ex = exchange("GET", SEARCH_URL, None, body());
        assert!(decoder.decode(&ex).unwrap().is_none());
    }

    #[test]
    fn ignores_other_urls_even_with_matching_prefix() {
        let decoder = ResponseDecoder::new(SEARCH_URL);
        let ex = exchange("POST", &format!("{SEARCH_URL}?page=2"), None, body());
        assert!(decoder.decode(&ex).unwrap().is_none());
    }

    #[test]
    fn decodes_identity_body() {
        let decoder = ResponseDecoder::new(SEARCH_URL);
        let ex = exchange("POST", SEARCH_URL, None, body());
        let payload = decoder.decode(&ex).unwrap().expect("search exchange");
        assert_eq!(payload.search_result.search_merchants.len(), 1);
    }

    #[test]
    fn decodes_gzip_body_with_mixed_case_header() {
        let decoder = ResponseDecoder::new(SEARCH_URL);
        let mut ex = exchange("post", SEARCH_URL, None, gzip(&body()));
        ex.response_headers = vec![("content-encoding".to_string(), "GZIP".to_string())];
        let payload = decoder.decode(&ex).unwrap().expect("search exchange");
        assert_eq!(payload.search_result.search_merchants.len(), 1);
    }

    #[test]
    fn decodes_zlib_deflate_body() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body()).unwrap();
        let compressed = encoder.finish().unwrap();

        let decoded = decode_body(&compressed, Some("deflate")).unwrap();
        assert_eq!(decoded.as_ref(), body().as_slice());
    }

    #[test]
    fn rejects_unsupported_encoding() {
        let err = decode_body(b"abc", Some("br")).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedEncoding(ref e) if e == "br"));
    }

    #[test]
    fn corrupt_gzip_is_a_decode_error() {
        let err = decode_body(b"definitely not gzip", Some("gzip")).unwrap_err();
        assert!(matches!(err, DecodeError::Decompress { .. }));
    }

    #[test]
    fn non_success_status_is_a_decode_error() {
        let decoder = ResponseDecoder::new(SEARCH_URL);
        let mut ex = exchange("POST", SEARCH_URL, None, body());
        ex.status = Some(429);
        assert!(matches!(
            decoder.decode(&ex),
            Err(DecodeError::UnexpectedStatus(429))
        ));
    }

    #[test]
    fn decode_all_skips_failures_and_counts_them() {
        let decoder = ResponseDecoder::new(SEARCH_URL);
        let exchanges = vec![
            exchange("POST", SEARCH_URL, None, body()),
            exchange("POST", SEARCH_URL, None, b"{\"truncated\":".to_vec()),
            exchange("GET", "https://food.grab.com/sg/en/", None, Vec::new()),
            exchange("POST", SEARCH_URL, Some("gzip"), gzip(&body())),
        ];

        let batch = decoder.decode_all(&exchanges);
        assert_eq!(batch.matched, 3);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.payloads.len(), 2);
    }

    #[test]
    fn empty_merchant_list_decodes_when_null() {
        let decoder = ResponseDecoder::new(SEARCH_URL);
        let raw = serde_json::to_vec(&json!({"searchResult": {"searchMerchants": null}})).unwrap();
        let payload = decoder
            .decode(&exchange("POST", SEARCH_URL, None, raw))
            .unwrap()
            .expect("search exchange");
        assert!(payload.search_result.search_merchants.is_empty());
    }
}
