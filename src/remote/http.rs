//! HTTP client for the vendor transform endpoints

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::PlacementConfig;
use crate::resolver::{IdPair, VendorDesign, VendorProduct};
use crate::storage::PositionRecord;

use super::error::RemoteError;
use super::types::{Envelope, Profile, TransformBatch};
use super::TransformBackend;

/// List responses come either bare or wrapped in `{ "data": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Wrapped { data } => data,
            ListBody::Bare(items) => items,
        }
    }
}

/// Blocking HTTP implementation of [`TransformBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &PlacementConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.remote_timeout)
            .build()
            .map_err(|e| RemoteError::network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.auth_token.clone(),
            timeout: config.remote_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, RemoteError> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(resource, status = status.as_u16(), "remote response");
        if status.is_success() {
            Ok(response)
        } else {
            Err(RemoteError::from_status(status.as_u16(), resource))
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let response = self.send(self.client.get(self.url(path)), path)?;
        response
            .json()
            .map_err(|e| RemoteError::decode(format!("{path}: {e}")))
    }

    fn transport_error(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout {
                millis: self.timeout.as_millis() as u64,
            }
        } else if err.is_decode() {
            RemoteError::decode(err.to_string())
        } else {
            RemoteError::network(err.to_string())
        }
    }
}

fn position_path(pair: IdPair) -> String {
    format!(
        "/api/vendor-products/{}/designs/{}/position/direct",
        pair.vendor_product_id, pair.design_id
    )
}

impl TransformBackend for HttpBackend {
    #[tracing::instrument(skip(self))]
    fn load_position(&self, pair: IdPair) -> Result<Option<PositionRecord>, RemoteError> {
        match self.get_json::<Envelope<PositionRecord>>(&position_path(pair)) {
            Ok(envelope) => Ok(envelope.data),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, record))]
    fn save_position(&self, pair: IdPair, record: &PositionRecord) -> Result<(), RemoteError> {
        let path = position_path(pair);
        self.send(self.client.put(self.url(&path)).json(record), &path)?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn load_transforms(
        &self,
        vendor_product_id: u64,
    ) -> Result<Option<TransformBatch>, RemoteError> {
        let path = format!("/vendor/design-transforms/{vendor_product_id}");
        match self.get_json::<Envelope<TransformBatch>>(&path) {
            Ok(envelope) => Ok(envelope.data),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self, batch), fields(vendor_product_id = batch.vendor_product_id))]
    fn save_transforms(&self, batch: &TransformBatch) -> Result<(), RemoteError> {
        let path = "/vendor/design-transforms/save";
        self.send(self.client.post(self.url(path)).json(batch), path)?;
        Ok(())
    }

    fn vendor_products(&self) -> Result<Vec<VendorProduct>, RemoteError> {
        self.get_json::<ListBody<VendorProduct>>("/vendor/products")
            .map(ListBody::into_vec)
    }

    fn vendor_designs(&self) -> Result<Vec<VendorDesign>, RemoteError> {
        self.get_json::<ListBody<VendorDesign>>("/vendor/designs?status=all")
            .map(ListBody::into_vec)
    }

    fn profile(&self) -> Result<Profile, RemoteError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ProfileBody {
            Wrapped { data: Profile },
            Bare(Profile),
        }

        match self.get_json::<ProfileBody>("/auth/profile")? {
            ProfileBody::Wrapped { data } | ProfileBody::Bare(data) => Ok(data),
        }
    }
}
