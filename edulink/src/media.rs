//! External blob-storage collaborator.
//!
//! Uploads are delegated to a configured media store over HTTP. Failures
//! degrade to a null result which callers must check explicitly; nothing is
//! retried or recovered here.

use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::MediaConfig;
use crate::errors::Error;

/// Result of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    /// Public URL of the stored blob
    pub url: String,
    /// Media duration in seconds, when the store can derive one
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Client for the external media store.
#[derive(Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    config: MediaConfig,
}

impl MediaClient {
    pub fn new(config: &MediaConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal {
                operation: format!("build media HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Upload a blob to the media store.
    ///
    /// Returns `None` when uploads are disabled or the upload fails for any
    /// reason. Callers decide what a missing result means for their
    /// operation.
    pub async fn upload(&self, file_name: &str, bytes: Bytes) -> Option<UploadedMedia> {
        if !self.config.enabled {
            debug!("Media uploads are disabled, skipping upload of {file_name}");
            return None;
        }
        let url = self.config.upload_url.clone()?;

        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.http.post(url).multipart(form);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => match response.json::<UploadedMedia>().await {
                Ok(media) => {
                    debug!("Uploaded {file_name} to media store: {}", media.url);
                    Some(media)
                }
                Err(e) => {
                    warn!("Media store returned an unreadable response for {file_name}: {e}");
                    None
                }
            },
            Ok(response) => {
                warn!("Media store rejected upload of {file_name}: {}", response.status());
                None
            }
            Err(e) => {
                warn!("Media store upload of {file_name} failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn media_config(url: &str) -> MediaConfig {
        MediaConfig {
            enabled: true,
            upload_url: Some(format!("{url}/upload").parse().unwrap()),
            api_key: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_upload_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://cdn.example.com/lecture.mp4",
                "duration": 123.4,
            })))
            .mount(&server)
            .await;

        let client = MediaClient::new(&media_config(&server.uri())).unwrap();
        let media = client.upload("lecture.mp4", Bytes::from_static(b"fake bytes")).await.unwrap();
        assert_eq!(media.url, "https://cdn.example.com/lecture.mp4");
        assert_eq!(media.duration, Some(123.4));
    }

    #[tokio::test]
    async fn test_upload_failure_degrades_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = MediaClient::new(&media_config(&server.uri())).unwrap();
        let result = client.upload("lecture.mp4", Bytes::from_static(b"fake bytes")).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upload_disabled_returns_none() {
        let client = MediaClient::new(&MediaConfig::default()).unwrap();
        let result = client.upload("lecture.mp4", Bytes::from_static(b"fake bytes")).await;
        assert!(result.is_none());
    }
}
