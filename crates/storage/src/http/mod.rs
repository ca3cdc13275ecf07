use std::time::Duration;

use learn_core::model::{ApiSettings, ApiSettingsError};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::repository::{Storage, StorageError};

mod attempt_repo;
mod course_repo;
mod dto;
mod enrollment_repo;
mod quiz_repo;

/// Repository backed by the course REST API.
#[derive(Clone)]
pub struct HttpRepository {
    client: Client,
    settings: ApiSettings,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpInitError {
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

impl HttpRepository {
    /// Build an HTTP client for the given API settings.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the TLS backend or client cannot be initialized.
    pub fn connect(settings: ApiSettings) -> Result<Self, HttpInitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs()))
            .build()?;
        Ok(Self { client, settings })
    }

    #[must_use]
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StorageError> {
        let url = self.settings.endpoint(path).map_err(settings_error)?;
        debug!(%method, %url, "course api request");
        let builder = self.client.request(method, url);
        Ok(match self.settings.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StorageError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        warn!(status = status.as_u16(), url = %response.url(), "course api rejected request");
        Err(status_error(status))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StorageError> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        response.json::<T>().await.map_err(transport_error)
    }

    pub(crate) async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), StorageError> {
        let mut builder = self.request(method, path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder).await?;
        Ok(())
    }
}

fn settings_error(e: ApiSettingsError) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn transport_error(e: reqwest::Error) -> StorageError {
    if e.is_decode() {
        StorageError::Serialization(e.to_string())
    } else {
        StorageError::Connection(e.to_string())
    }
}

pub(crate) fn status_error(status: StatusCode) -> StorageError {
    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::CONFLICT => StorageError::Conflict,
        other => StorageError::Rejected {
            status: other.as_u16(),
        },
    }
}

impl Storage {
    /// Build a `Storage` backed by the course REST API.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the HTTP client cannot be created.
    pub fn http(settings: ApiSettings) -> Result<Self, HttpInitError> {
        Ok(Self::from_repository(HttpRepository::connect(settings)?))
    }
}
