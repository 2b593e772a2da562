use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Gzip-compresses `body` at the default level.
pub fn gzip_bytes(body: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    Ok(encoder.finish()?)
}

/// Uploads `body` to an S3 bucket.
///
/// With `gzip` set the body is compressed, `.gz` is appended to the key and
/// `Content-Encoding: gzip` is set so browsers still render the object.
pub async fn write_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    content_type: &str,
    gzip: bool,
) -> Result<()> {
    let (body, key) = if gzip {
        (gzip_bytes(&body)?, format!("{key}.gz"))
    } else {
        (body, key.to_string())
    };

    let mut request = client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .body(body.into())
        .content_type(content_type);
    if gzip {
        request = request.content_encoding("gzip");
    }
    request.send().await?;

    info!(bucket, key = %key, "Uploaded to S3");
    Ok(())
}

/// Serializes a value to JSON and uploads it with `application/json` content type.
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
    gzip: bool,
) -> Result<()> {
    let body = serde_json::to_vec(value)?;
    write_to_s3(client, bucket, key, body, "application/json", gzip).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_gzip_bytes_roundtrip() {
        let body = b"<html>dashboard</html>".repeat(20);
        let compressed = gzip_bytes(&body).unwrap();
        assert!(compressed.len() < body.len());

        let mut decoded = Vec::new();
        GzDecoder::new(&compressed[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, body);
    }
}
