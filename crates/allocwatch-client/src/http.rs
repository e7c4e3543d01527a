use std::time::Duration;

use allocwatch_core::{ClusterApi, FetchError, QueryOptions};
use allocwatch_model::{Allocation, AllocationChecks, Indexed, Job, JobKey, Namespace, QueryIndex};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url, header::HeaderMap};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::{config::ClientConfig, errors::ClientError};

/// Response header carrying the version index of the returned data.
pub const INDEX_HEADER: &str = "X-Nomad-Index";

/// [`ClusterApi`] over the orchestrator's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base: Url,
    request_timeout: Duration,
    client: Client,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let base = Url::parse(&config.address)
            .map_err(|e| ClientError::InvalidConfig(format!("address: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "address {:?} cannot carry a path",
                config.address
            )));
        }
        Ok(Self {
            base,
            request_timeout: config.request_timeout(),
            client: Client::builder().build()?,
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Client-side deadline of a request.
    ///
    /// The server may hold a blocking read for up to `wait` plus wait/16 of jitter, so both are
    /// added on top of the plain request timeout.
    pub fn timeout_for(&self, query: &QueryOptions) -> Duration {
        match query.wait {
            Some(wait) => self.request_timeout + wait + wait / 16,
            None => self.request_timeout,
        }
    }

    /// Base address extended by `segments`, each percent-encoded as one path segment.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, segments: &[&str], query: &QueryOptions) -> RequestBuilder {
        let mut req = self
            .client
            .get(self.url(segments))
            .timeout(self.timeout_for(query));
        if let Some(index) = query.index {
            req = req.query(&[("index", index)]);
        }
        if let Some(wait) = query.wait {
            req = req.query(&[("wait", format!("{}ms", wait.as_millis()))]);
        }
        req
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<Indexed<T>, ClientError> {
        let response = req.send().await?;
        let status = response.status();
        let index = read_index(response.headers());
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match status {
                StatusCode::NOT_FOUND => ClientError::NotFound(body),
                StatusCode::FORBIDDEN => ClientError::Forbidden(body),
                _ => ClientError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let value = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(format!("failed to parse body: {e}")))?;
        trace!(index, "response decoded");
        Ok(Indexed::new(value, index))
    }
}

/// Version index from the response headers; 0 when absent or unparsable.
fn read_index(headers: &HeaderMap) -> QueryIndex {
    headers
        .get(INDEX_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl ClusterApi for HttpClient {
    async fn allocation(
        &self,
        id: &str,
        query: &QueryOptions,
    ) -> Result<Indexed<Allocation>, FetchError> {
        let req = self.get(&["v1", "allocation", id], query);
        Ok(self.fetch(req).await?)
    }

    async fn job(&self, key: &JobKey, query: &QueryOptions) -> Result<Indexed<Job>, FetchError> {
        let req = self
            .get(&["v1", "job", key.id.as_str()], query)
            .query(&[("namespace", key.namespace.as_str())]);
        Ok(self.fetch(req).await?)
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>, FetchError> {
        let req = self.get(&["v1", "namespaces"], &QueryOptions::plain());
        let list: Indexed<Option<Vec<Namespace>>> = self.fetch(req).await?;
        Ok(list.value.unwrap_or_default())
    }

    async fn allocation_checks(&self, id: &str) -> Result<AllocationChecks, FetchError> {
        let req = self.get(
            &["v1", "client", "allocation", id, "checks"],
            &QueryOptions::plain(),
        );
        let checks: Indexed<Option<AllocationChecks>> = self.fetch(req).await?;
        Ok(checks.value.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use allocwatch_model::CheckState;
    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode as AxumStatus,
        response::IntoResponse,
        routing::get,
    };
    use serde_json::json;

    use super::*;

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn allocation_handler(
        State(seen): State<Seen>,
        Path(id): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        seen.lock().unwrap().push(params);
        match id.as_str() {
            "missing" => (AxumStatus::NOT_FOUND, "alloc not found").into_response(),
            "secret" => (AxumStatus::FORBIDDEN, "Permission denied").into_response(),
            "broken" => (AxumStatus::INTERNAL_SERVER_ERROR, "boom").into_response(),
            "garbled" => ([(INDEX_HEADER, "3")], "{not json").into_response(),
            _ => (
                [(INDEX_HEADER, "42")],
                Json(json!({
                    "ID": id,
                    "Namespace": "prod",
                    "JobID": "web",
                    "TaskGroup": "frontend",
                    "ClientStatus": "running",
                    "TaskStates": null,
                })),
            )
                .into_response(),
        }
    }

    async fn job_handler(
        State(seen): State<Seen>,
        Path(id): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        seen.lock().unwrap().push(params);
        (
            [(INDEX_HEADER, "7")],
            Json(json!({ "ID": id, "Namespace": "prod", "TaskGroups": null })),
        )
    }

    async fn namespaces_handler() -> impl IntoResponse {
        Json(json!([
            { "Name": "default", "Description": "Default shared namespace" },
            { "Name": "prod" },
        ]))
    }

    async fn checks_handler(Path(id): Path<String>) -> impl IntoResponse {
        if id == "empty" {
            return Json(json!(null));
        }
        Json(json!({
            "c1": {
                "ID": "c1",
                "Check": "alive",
                "Group": "frontend",
                "Mode": "healthiness",
                "Status": "success",
                "StatusCode": 200,
                "Timestamp": 1700000000
            }
        }))
    }

    async fn serve() -> (HttpClient, Seen) {
        let seen: Seen = Arc::default();
        let router = Router::new()
            .route("/v1/allocation/{id}", get(allocation_handler))
            .route("/v1/job/{id}", get(job_handler))
            .route("/v1/namespaces", get(namespaces_handler))
            .route("/v1/client/allocation/{id}/checks", get(checks_handler))
            .with_state(Arc::clone(&seen));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = HttpClient::new(ClientConfig {
            address: format!("http://{addr}/"),
            ..Default::default()
        })
        .unwrap();
        (client, seen)
    }

    #[tokio::test]
    async fn blocking_read_sends_index_and_wait_and_reads_header() {
        let (client, seen) = serve().await;

        let alloc = client
            .allocation(
                "a1",
                &QueryOptions::blocking(41, Duration::from_millis(1_500)),
            )
            .await
            .unwrap();

        assert_eq!(alloc.index, 42);
        assert_eq!(alloc.value.id, "a1");
        assert_eq!(alloc.value.job_id, "web");
        assert!(alloc.value.task_states.is_none());

        let params = seen.lock().unwrap()[0].clone();
        assert_eq!(params.get("index").map(String::as_str), Some("41"));
        assert_eq!(params.get("wait").map(String::as_str), Some("1500ms"));
    }

    #[tokio::test]
    async fn plain_read_sends_no_blocking_params() {
        let (client, seen) = serve().await;

        client.allocation("a1", &QueryOptions::plain()).await.unwrap();
        assert!(seen.lock().unwrap()[0].is_empty());
    }

    #[tokio::test]
    async fn job_is_scoped_to_namespace() {
        let (client, seen) = serve().await;

        let job = client
            .job(&JobKey::new("prod", "web"), &QueryOptions::plain())
            .await
            .unwrap();

        assert_eq!(job.index, 7);
        assert_eq!(job.value.key(), JobKey::new("prod", "web"));
        let params = seen.lock().unwrap()[0].clone();
        assert_eq!(params.get("namespace").map(String::as_str), Some("prod"));
    }

    #[tokio::test]
    async fn status_codes_map_to_fetch_errors() {
        let (client, _) = serve().await;
        let plain = QueryOptions::plain();

        let err = client.allocation("missing", &plain).await.unwrap_err();
        assert_eq!(err, FetchError::NotFound("alloc not found".into()));

        let err = client.allocation("secret", &plain).await.unwrap_err();
        assert!(matches!(err, FetchError::Forbidden(_)));

        let err = client.allocation("broken", &plain).await.unwrap_err();
        assert!(matches!(err, FetchError::Server(ref m) if m.contains("500")));

        let err = client.allocation("garbled", &plain).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn namespaces_and_checks_decode() {
        let (client, _) = serve().await;

        let namespaces = client.namespaces().await.unwrap();
        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[1].name, "prod");
        assert!(namespaces[1].description.is_empty());

        let checks = client.allocation_checks("a1").await.unwrap();
        assert_eq!(checks.get("c1").unwrap().status, CheckState::Success);
        assert!(client.allocation_checks("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_agent_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpClient::new(ClientConfig {
            address: format!("http://{addr}"),
            request_timeout_ms: 2_000,
        })
        .unwrap();
        let err = client.namespaces().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn blocking_reads_get_wait_and_jitter_on_top_of_timeout() {
        let client = HttpClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:4646");
        assert_eq!(
            client.timeout_for(&QueryOptions::plain()),
            Duration::from_secs(10)
        );
        assert_eq!(
            client.timeout_for(&QueryOptions::blocking(1, Duration::from_secs(160))),
            Duration::from_secs(10 + 160 + 10)
        );
    }

    #[test]
    fn index_header_defaults_to_zero() {
        let mut headers = HeaderMap::new();
        assert_eq!(read_index(&headers), 0);
        headers.insert(INDEX_HEADER, "abc".parse().unwrap());
        assert_eq!(read_index(&headers), 0);
        headers.insert(INDEX_HEADER, "128".parse().unwrap());
        assert_eq!(read_index(&headers), 128);
    }

    #[tokio::test]
    async fn reserved_characters_in_ids_stay_in_one_segment() {
        let (client, _) = serve().await;

        for id in ["batch#1", "report?v2", "50%off", "nightly/etl"] {
            let job = client
                .job(&JobKey::new("default", id), &QueryOptions::plain())
                .await
                .unwrap();
            assert_eq!(job.value.id, id);
        }

        let alloc = client
            .allocation("a1#frag", &QueryOptions::plain())
            .await
            .unwrap();
        assert_eq!(alloc.value.id, "a1#frag");
    }

    #[test]
    fn url_keeps_base_path_and_encodes_segments() {
        let client = HttpClient::new(ClientConfig {
            address: "http://nomad.internal:4646/proxy/".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.url(&["v1", "job", "a/b?c#d"]).as_str(),
            "http://nomad.internal:4646/proxy/v1/job/a%2Fb%3Fc%23d"
        );
        assert_eq!(
            client.url(&["v1", "namespaces"]).as_str(),
            "http://nomad.internal:4646/proxy/v1/namespaces"
        );
    }
}
