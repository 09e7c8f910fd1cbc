use crate::error::HttpTransportError;
use bytes::Bytes;
use http::Response;
use http_body_util::BodyExt;
use serde_json::Value;

/// Boxed response body; raw or decompressed (gzip/br/deflate).
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Box the body produced by the decompression layer.
pub(crate) fn box_response<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, body.map_err(Into::into).boxed())
}

/// Read the whole body, failing once more than `limit` (decompressed) bytes arrived.
pub(crate) async fn read_body_limited(
    body: ResponseBody,
    limit: usize,
) -> Result<Bytes, HttpTransportError> {
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpTransportError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpTransportError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}

/// Decode a response payload: JSON when it parses, text otherwise, `null` when empty.
pub(crate) fn decode_payload(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde_json::json;

    fn boxed(data: &'static [u8]) -> ResponseBody {
        Full::new(Bytes::from_static(data)).map_err(Into::into).boxed()
    }

    #[tokio::test]
    async fn test_read_within_limit() {
        let bytes = read_body_limited(boxed(b"hello"), 5).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_read_over_limit() {
        let err = read_body_limited(boxed(b"hello world"), 5).await.unwrap_err();
        assert!(matches!(
            err,
            HttpTransportError::BodyTooLarge {
                limit: 5,
                actual: 11
            }
        ));
    }

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload(br#"{"id": 1}"#), json!({"id": 1}));
        assert_eq!(decode_payload(b"42"), json!(42));
        assert_eq!(decode_payload(b"not json"), json!("not json"));
        assert_eq!(decode_payload(b""), Value::Null);
        assert_eq!(decode_payload(b" \n"), Value::Null);
    }
}
