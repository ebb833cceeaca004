use std::time::Duration;

use stamper_core::JobHandle;
use url::Url;

use crate::decode::DecodeMode;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid base url {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
}

/// Process-wide client configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Applies to the submission round trip only; the stream has no total timeout.
    pub submit_timeout: Duration,
    pub decode_mode: DecodeMode,
}

impl ClientSettings {
    pub fn new(base_url: &str) -> Result<Self, SettingsError> {
        let invalid = |message: &str| SettingsError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: message.to_string(),
        };
        let url = Url::parse(base_url.trim()).map_err(|err| invalid(&err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("url cannot be a base"));
        }
        Ok(Self {
            base_url: url,
            ..Self::default()
        })
    }

    /// `POST {base}/request`
    pub fn request_endpoint(&self) -> Url {
        self.endpoint(&["request"])
    }

    /// `GET {base}/stream/{request_id}`; the id is percent-encoded as one segment.
    pub fn stream_endpoint(&self, handle: &JobHandle) -> Url {
        self.endpoint(&["stream", handle.request_id()])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        // `new` rejects cannot-be-a-base urls, so segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            connect_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(30),
            decode_mode: DecodeMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_append_to_base_path() {
        let settings = ClientSettings::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(
            settings.request_endpoint().as_str(),
            "http://127.0.0.1:5000/request"
        );
        assert_eq!(
            settings.stream_endpoint(&JobHandle::new("abc123")).as_str(),
            "http://127.0.0.1:5000/stream/abc123"
        );

        let nested = ClientSettings::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            nested.request_endpoint().as_str(),
            "https://api.example.com/v1/request"
        );
    }

    #[test]
    fn request_id_is_a_single_segment() {
        let settings = ClientSettings::default();
        let url = settings.stream_endpoint(&JobHandle::new("a/b c"));
        assert_eq!(url.path(), "/stream/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(matches!(
            ClientSettings::new("ftp://example.com"),
            Err(SettingsError::InvalidBaseUrl { .. })
        ));
        assert!(ClientSettings::new("not a url").is_err());
    }
}
