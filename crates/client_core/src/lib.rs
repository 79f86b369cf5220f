use std::{future::Future, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::protocol::{
    PredictResponse, ServiceBanner, VisualizeResponse, PREDICT_PATH, UPLOAD_FIELD, VISUALIZE_PATH,
};
use tracing::{debug, warn};
use url::Url;

pub mod config;
pub mod controller;
pub mod error;
pub mod intake;
pub mod session;
pub mod types;
pub mod view;
pub mod workflow;

pub use config::{load_settings, ClientSettings};
pub use controller::{Completion, RequestTicket, ServiceRequest, WorkflowController, WorkflowEvent};
pub use error::{ServiceError, WorkflowError};
pub use intake::{ImagePayload, ImagePreview};
pub use session::Session;
pub use types::{Overlay, Prediction};
pub use view::{project, OutcomeView, ResultView, Tone};
pub use workflow::Workflow;

const MAX_ERROR_DETAIL_LEN: usize = 256;

/// Bounds `call` by `timeout`, mapping expiry to [`ServiceError::Timeout`].
pub async fn with_deadline<T, F>(timeout: Duration, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ServiceError::Timeout { after: timeout }),
    }
}

#[async_trait]
pub trait ClassifierService: Send + Sync {
    async fn predict(
        &self,
        image: &ImagePayload,
        timeout: Duration,
    ) -> Result<Prediction, ServiceError>;
    async fn visualize(&self, image: &ImagePayload, timeout: Duration)
        -> Result<Overlay, ServiceError>;
    async fn health(&self, timeout: Duration) -> Result<ServiceBanner, ServiceError>;
}

pub struct MissingClassifierService;

#[async_trait]
impl ClassifierService for MissingClassifierService {
    async fn predict(
        &self,
        _image: &ImagePayload,
        _timeout: Duration,
    ) -> Result<Prediction, ServiceError> {
        Err(ServiceError::NetworkFailure(
            "classifier service is unavailable".to_string(),
        ))
    }

    async fn visualize(
        &self,
        _image: &ImagePayload,
        _timeout: Duration,
    ) -> Result<Overlay, ServiceError> {
        Err(ServiceError::NetworkFailure(
            "classifier service is unavailable".to_string(),
        ))
    }

    async fn health(&self, _timeout: Duration) -> Result<ServiceBanner, ServiceError> {
        Err(ServiceError::NetworkFailure(
            "classifier service is unavailable".to_string(),
        ))
    }
}

/// `ClassifierService` over the HTTP API: `POST /predict`, `POST /visualize`
/// (multipart field `file`) and `GET /`.
#[derive(Clone)]
pub struct HttpClassifierClient {
    http: Client,
    base_url: Url,
}

impl HttpClassifierClient {
    pub fn new(service_url: &str) -> Result<Self, ServiceError> {
        Self::with_http_client(service_url, Client::new())
    }

    pub fn with_http_client(service_url: &str, http: Client) -> Result<Self, ServiceError> {
        let invalid = |reason: String| ServiceError::InvalidEndpoint {
            url: service_url.to_string(),
            reason,
        };
        let mut base_url = Url::parse(service_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base_url.scheme())));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::InvalidEndpoint {
                url: format!("{}{path}", self.base_url),
                reason: err.to_string(),
            })
    }

    fn upload_form(image: &ImagePayload) -> Result<Form, ServiceError> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())
            .map_err(|err| ServiceError::NetworkFailure(err.to_string()))?;
        Ok(Form::new().part(UPLOAD_FIELD, part))
    }

    async fn post_image<T: DeserializeOwned>(
        &self,
        path: &str,
        image: &ImagePayload,
        timeout: Duration,
    ) -> Result<T, ServiceError> {
        let url = self.endpoint(path)?;
        let form = Self::upload_form(image)?;
        debug!(%url, bytes = image.len(), "posting image to classifier service");
        with_deadline(timeout, async {
            let response = self
                .http
                .post(url)
                .multipart(form)
                .timeout(timeout)
                .send()
                .await
                .map_err(|err| ServiceError::from_transport(err, timeout))?;
            read_json(response, timeout).await
        })
        .await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    timeout: Duration,
) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let mut detail = response.text().await.unwrap_or_default();
        if detail.len() > MAX_ERROR_DETAIL_LEN {
            let mut cut = MAX_ERROR_DETAIL_LEN;
            while !detail.is_char_boundary(cut) {
                cut -= 1;
            }
            detail.truncate(cut);
        }
        warn!(status = status.as_u16(), "classifier service rejected request");
        return Err(ServiceError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    let body = response
        .bytes()
        .await
        .map_err(|err| ServiceError::from_transport(err, timeout))?;
    serde_json::from_slice(&body)
        .map_err(|err| ServiceError::malformed(format!("undecodable response body: {err}")))
}

#[async_trait]
impl ClassifierService for HttpClassifierClient {
    async fn predict(
        &self,
        image: &ImagePayload,
        timeout: Duration,
    ) -> Result<Prediction, ServiceError> {
        let response: PredictResponse = self.post_image(PREDICT_PATH, image, timeout).await?;
        Prediction::try_from(response)
    }

    async fn visualize(
        &self,
        image: &ImagePayload,
        timeout: Duration,
    ) -> Result<Overlay, ServiceError> {
        let response: VisualizeResponse = self.post_image(VISUALIZE_PATH, image, timeout).await?;
        Overlay::try_from(response)
    }

    async fn health(&self, timeout: Duration) -> Result<ServiceBanner, ServiceError> {
        let url = self.base_url.clone();
        with_deadline(timeout, async {
            let response = self
                .http
                .get(url)
                .timeout(timeout)
                .send()
                .await
                .map_err(|err| ServiceError::from_transport(err, timeout))?;
            read_json(response, timeout).await
        })
        .await
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
