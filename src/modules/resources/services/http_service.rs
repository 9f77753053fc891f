use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{
    default_on_request_failure, policies::ExponentialBackoff, Retryable, RetryableStrategy,
    RetryTransientMiddleware,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::resource_service::ResourceService;
use crate::config::RemoteConfig;
use crate::core::{AppError, Result};
use crate::modules::resources::models::{Entity, ExportQuery, PaginatedResult, QueryState};

/// Record store client for one resource, speaking the `/api/{resource}` contract
///
/// GET, PUT and DELETE are retried on transient failures. POST requests
/// (create, restore and the batch routes) go out once: a write the store
/// committed before failing must not be sent again.
pub struct HttpResourceService<T, I> {
    client: ClientWithMiddleware,
    writes: ClientWithMiddleware,
    base_url: Url,
    resource: String,
    _marker: PhantomData<fn() -> (T, I)>,
}

#[derive(Serialize)]
struct IdsBody<'a> {
    ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody<'a> {
    ids: &'a [String],
    is_active: bool,
}

/// Retries what [`AppError::is_transient`] calls transient
struct TransientFailures;

impl RetryableStrategy for TransientFailures {
    fn handle(
        &self,
        res: &std::result::Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if response.status().is_success() => None,
            Ok(response) => {
                if AppError::remote(response.status().as_u16(), "").is_transient() {
                    Some(Retryable::Transient)
                } else {
                    Some(Retryable::Fatal)
                }
            }
            Err(e) => default_on_request_failure(e),
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl<T, I> HttpResourceService<T, I> {
    pub fn new(
        base_url: impl Into<String>,
        resource: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let inner = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .map_err(|e| AppError::Configuration(format!("base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration(format!(
                "base URL {} cannot carry a path",
                base_url
            )));
        }

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(5))
            .build_with_max_retries(max_retries);
        let client = ClientBuilder::new(inner.clone())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                TransientFailures,
            ))
            .build();
        let writes = ClientBuilder::new(inner).build();

        Ok(Self {
            client,
            writes,
            base_url,
            resource: resource.into(),
            _marker: PhantomData,
        })
    }

    pub fn from_config(config: &RemoteConfig, resource: impl Into<String>) -> Result<Self> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            AppError::Configuration("UPSTREAM_BASE_URL not set".to_string())
        })?;
        Self::new(base_url, resource, config.request_timeout(), config.max_retries)
    }

    /// `{base}/api/{resource}/{segments..}`, each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["api", self.resource.as_str()])
                .extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);

        tracing::debug!(
            resource = %self.resource,
            status = status.as_u16(),
            message = %message,
            "Record store rejected request"
        );

        Err(AppError::remote(status.as_u16(), message))
    }

    async fn send_json<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R> {
        let response = self.send(request).await?;
        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl<T, I> ResourceService<T, I> for HttpResourceService<T, I>
where
    T: Entity + DeserializeOwned,
    I: Serialize + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.resource
    }

    async fn get_page(&self, query: &QueryState) -> Result<PaginatedResult<T>> {
        let request = self.client.get(self.url(&[])).query(&query.to_query_pairs());
        self.send_json(request).await
    }

    async fn get_by_id(&self, id: &str) -> Result<T> {
        self.send_json(self.client.get(self.url(&[id]))).await
    }

    async fn create(&self, input: I) -> Result<T> {
        self.send_json(self.writes.post(self.url(&[])).json(&input))
            .await
    }

    async fn update(&self, id: &str, input: I) -> Result<T> {
        let request = self.client.put(self.url(&[id])).json(&input);
        self.send_json(request).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.send(self.client.delete(self.url(&[id]))).await?;
        Ok(())
    }

    async fn restore(&self, id: &str) -> Result<()> {
        self.send(self.writes.post(self.url(&[id, "restore"])))
            .await?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<()> {
        let request = self
            .writes
            .post(self.url(&["batch", "delete"]))
            .json(&IdsBody { ids });
        self.send(request).await?;
        Ok(())
    }

    async fn restore_many(&self, ids: &[String]) -> Result<()> {
        let request = self
            .writes
            .post(self.url(&["batch", "restore"]))
            .json(&IdsBody { ids });
        self.send(request).await?;
        Ok(())
    }

    async fn batch_update_status(&self, ids: &[String], is_active: bool) -> Result<()> {
        let request = self
            .writes
            .post(self.url(&["batch", "status"]))
            .json(&StatusBody { ids, is_active });
        self.send(request).await?;
        Ok(())
    }

    async fn get_all_for_export(&self, query: &ExportQuery) -> Result<Vec<T>> {
        let request = self
            .client
            .get(self.url(&["export"]))
            .query(&query.to_query_pairs());
        self.send_json(request).await
    }
}
