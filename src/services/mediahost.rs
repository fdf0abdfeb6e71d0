// Media-hosting collaborator client.
//
// The service is opaque from our side: it accepts a binary upload and hands
// back a durable HTTPS URL. Requests are signed multipart POSTs to
// {base}/{cloud_name}/{resource_type}/upload; only `secure_url` is read from
// the response. Uploads are long-running, so the client carries its own
// generous timeout and never runs on the catalog request path unless the
// operator chose the server-proxied admin routes.

use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::MediaHostConfig;

/// Server-proxied uploads tolerate slow links (matches the legacy 2-minute
/// keep-alive window)
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Resource-type hint forwarded to the media host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Video,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
        }
    }

    /// Map a form field name to the resource type, the same way the legacy
    /// storage engine did: video/trailer fields carry video, the rest images
    pub fn for_field(field_name: &str) -> Self {
        if field_name.contains("video") || field_name.contains("trailer") {
            ResourceKind::Video
        } else {
            ResourceKind::Image
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Clone)]
pub struct MediaHostClient {
    client: Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl MediaHostClient {
    pub fn new(config: &MediaHostConfig) -> Self {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.upload_base_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    /// Signature over the timestamped request parameters plus the API secret
    fn sign(&self, timestamp: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("timestamp={}{}", timestamp, self.api_secret));
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Upload a file; returns the durable URL assigned by the media host
    pub async fn upload(
        &self,
        kind: ResourceKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.sign(timestamp);

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        let url = format!("{}/{}/{}/upload", self.base_url, self.cloud_name, kind.as_str());
        tracing::debug!("Uploading {} ({}) to media host", file_name, kind.as_str());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach media host")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Media host rejected upload ({}): {}", status, body);
        }

        let body: UploadResponse = response
            .json()
            .await
            .context("Media host returned an unreadable upload response")?;

        tracing::info!("Uploaded {} -> {}", file_name, body.secure_url);
        Ok(body.secure_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> MediaHostClient {
        MediaHostClient::new(&MediaHostConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            upload_base_url: "https://media.example/v1/".to_string(),
        })
    }

    #[test]
    fn test_field_to_resource_kind() {
        assert_eq!(ResourceKind::for_field("videoFile"), ResourceKind::Video);
        assert_eq!(ResourceKind::for_field("trailerFile"), ResourceKind::Video);
        assert_eq!(ResourceKind::for_field("imageFile"), ResourceKind::Image);
        assert_eq!(ResourceKind::for_field("seasonImageFile"), ResourceKind::Image);
    }

    #[test]
    fn test_signature_is_deterministic_and_secret_bound() {
        let client = test_client();
        let a = client.sign(1_700_000_000);
        let b = client.sign(1_700_000_000);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // hex sha256

        let other = MediaHostClient::new(&MediaHostConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "other-secret".to_string(),
            upload_base_url: "https://media.example/v1".to_string(),
        });
        assert_ne!(a, other.sign(1_700_000_000));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = test_client();
        assert_eq!(client.base_url, "https://media.example/v1");
    }
}
