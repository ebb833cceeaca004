use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use stamper_core::{JobHandle, JobRequest, MinuteIncrement};
use stamper_logging::{stamper_debug, stamper_info};

use crate::settings::ClientSettings;
use crate::{FailureKind, SubmitError, TransportError};

#[async_trait::async_trait]
pub trait RequestSubmitter: Send + Sync {
    /// Validates `request`, posts it, and returns the backend's correlation handle.
    ///
    /// A request that fails validation never reaches the network.
    async fn submit(&self, request: &JobRequest) -> Result<JobHandle, SubmitError>;
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    url: &'a str,
    minute_increment: &'a MinuteIncrement,
}

#[derive(Debug, Clone)]
pub struct HttpRequestSubmitter {
    client: reqwest::Client,
    settings: ClientSettings,
}

impl HttpRequestSubmitter {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let client = settings.build_client()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: reqwest::Client, settings: ClientSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait::async_trait]
impl RequestSubmitter for HttpRequestSubmitter {
    async fn submit(&self, request: &JobRequest) -> Result<JobHandle, SubmitError> {
        request.validate()?;

        let body = serde_json::to_vec(&SubmitBody {
            url: request.target_url(),
            minute_increment: request.minute_increment(),
        })
        .map_err(|err| TransportError::new(FailureKind::InvalidResponse, err.to_string()))?;

        let endpoint = self.settings.request_endpoint();
        stamper_info!(
            "Submitting job url={} minute_increment={} to {}",
            request.target_url(),
            request.minute_increment(),
            endpoint
        );

        let response = self
            .client
            .post(endpoint)
            .timeout(self.settings.submit_timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            )
            .into());
        }

        let payload = response.bytes().await.map_err(TransportError::from)?;
        let handle: JobHandle = serde_json::from_slice(&payload).map_err(|err| {
            TransportError::new(
                FailureKind::InvalidResponse,
                format!("unexpected submission response: {err}"),
            )
        })?;
        if handle.request_id().is_empty() {
            return Err(TransportError::new(
                FailureKind::InvalidResponse,
                "unexpected submission response: empty request_id",
            )
            .into());
        }

        stamper_debug!("Job accepted request_id={}", handle);
        Ok(handle)
    }
}
