//! Public-read object uploads to S3 or an S3-compatible service

use chrono::Utc;
use reqwest::{Client, Url};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::sigv4::{self, SigningParams};
use crate::config::StorageConfig;
use crate::error::{SnapError, SnapResult};

const PUBLIC_READ_ACL: &str = "public-read";

/// Public URL of a stored object: `https://<bucket>.<domain>/<key>`
pub fn public_url(bucket: &str, public_domain: &str, key: &str) -> String {
    format!("https://{}.{}/{}", bucket, public_domain, key)
}

/// Uploader for snapshot objects
#[derive(Clone)]
pub struct S3Client {
    client: Client,
}

impl S3Client {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Store `body` under `key` with a public-read ACL
    pub async fn put_public_object(
        &self,
        storage: &StorageConfig,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> SnapResult<()> {
        let fail = |reason: String| SnapError::SnapshotUploadFailed {
            bucket: storage.bucket_name.clone(),
            key: key.to_string(),
            reason,
        };

        let url = object_url(storage, key).map_err(&fail)?;
        let host = host_header(&url).ok_or_else(|| fail(format!("no host in {}", url)))?;

        let now = Utc::now();
        let payload_hash = sigv4::payload_hash(&body);
        let amz_date = sigv4::amz_date(&now);

        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        headers.insert("host".to_string(), host);
        headers.insert("x-amz-acl".to_string(), PUBLIC_READ_ACL.to_string());
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
        headers.insert("x-amz-date".to_string(), amz_date.clone());

        let params = SigningParams {
            access_key_id: &storage.access_key_id,
            secret_access_key: &storage.secret_access_key,
            region: &storage.region,
            time: now,
        };
        let authorization =
            sigv4::authorization(&params, "PUT", url.path(), &headers, &payload_hash)
                .map_err(&fail)?;

        let size = body.len();
        debug!("Uploading {} bytes to {}", size, url);

        let response = self
            .client
            .put(url)
            .header("Content-Type", content_type)
            .header("x-amz-acl", PUBLIC_READ_ACL)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .header("Authorization", authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(fail(format!("storage returned {}: {}", status, text.trim())));
        }

        info!(
            "Uploaded {} to bucket {} ({:.1} KB)",
            key,
            storage.bucket_name,
            size as f64 / 1024.0
        );
        Ok(())
    }
}

/// Request URL for an object. Virtual-hosted style unless an endpoint
/// override is configured, which uses path style.
fn object_url(storage: &StorageConfig, key: &str) -> Result<Url, String> {
    let encoded_key = sigv4::encode_key(key);
    let raw = match &storage.endpoint {
        Some(endpoint) => format!(
            "{}/{}/{}",
            endpoint.trim_end_matches('/'),
            storage.bucket_name,
            encoded_key
        ),
        None => format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            storage.bucket_name, storage.region, encoded_key
        ),
    };

    Url::parse(&raw).map_err(|e| format!("invalid storage URL {:?}: {}", raw, e))
}

/// `Host` header value as the HTTP client will send it
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn storage(endpoint: Option<String>) -> StorageConfig {
        StorageConfig {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            bucket_name: "prints".to_string(),
            endpoint,
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_public_url_format() {
        assert_eq!(
            public_url("prints", "s3.amazonaws.com", "10-19-2026_08:15:42.jpg"),
            "https://prints.s3.amazonaws.com/10-19-2026_08:15:42.jpg"
        );
    }

    #[test]
    fn test_virtual_hosted_url() {
        let url = object_url(&storage(None), "10-19-2026_08:15:42.jpg").unwrap();
        assert_eq!(
            url.as_str(),
            "https://prints.s3.us-east-1.amazonaws.com/10-19-2026_08%3A15%3A42.jpg"
        );
        assert_eq!(host_header(&url).unwrap(), "prints.s3.us-east-1.amazonaws.com");
    }

    #[test]
    fn test_endpoint_uses_path_style() {
        let url = object_url(&storage(Some("http://localhost:9000/".to_string())), "a.png").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/prints/a.png");
        assert_eq!(host_header(&url).unwrap(), "localhost:9000");
    }

    #[test]
    fn test_empty_bucket_is_rejected() {
        let mut config = storage(None);
        config.bucket_name.clear();
        assert!(object_url(&config, "a.jpg").is_err());
    }

    #[tokio::test]
    async fn test_put_sends_signed_public_read_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/prints/10-19-2026_08%3A15%3A42.jpg"))
            .and(header("x-amz-acl", "public-read"))
            .and(header("content-type", "image/jpeg"))
            .and(header_exists("x-amz-date"))
            .and(header_exists("x-amz-content-sha256"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = S3Client::new(Client::new());
        client
            .put_public_object(
                &storage(Some(mock_server.uri())),
                "10-19-2026_08:15:42.jpg",
                b"jpeg-bytes".to_vec(),
                "image/jpeg",
            )
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, b"jpeg-bytes");

        let auth = requests[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(auth.contains("/us-east-1/s3/aws4_request"));
        assert!(auth.contains(
            "SignedHeaders=content-type;host;x-amz-acl;x-amz-content-sha256;x-amz-date"
        ));
    }

    #[tokio::test]
    async fn test_rejected_upload_reports_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("<Error>AccessDenied</Error>"))
            .mount(&mock_server)
            .await;

        let client = S3Client::new(Client::new());
        let err = client
            .put_public_object(
                &storage(Some(mock_server.uri())),
                "a.jpg",
                vec![1, 2, 3],
                "image/jpeg",
            )
            .await
            .unwrap_err();

        match err {
            SnapError::SnapshotUploadFailed { bucket, key, reason } => {
                assert_eq!(bucket, "prints");
                assert_eq!(key, "a.jpg");
                assert!(reason.contains("403"));
                assert!(reason.contains("AccessDenied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
