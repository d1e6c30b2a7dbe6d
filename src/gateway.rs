//! HTTP plumbing for the shelter API.
//!
//! A thin typed wrapper around `reqwest` that attaches session credentials
//! (a cookie jar), applies a fixed request timeout, and maps non-2xx
//! responses into [`GatewayError`]s. Retry policy belongs to callers; this
//! layer performs none.

use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::ShelterClientConfig;
use crate::error::GatewayError;

/// Fixed per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest error body excerpt carried in a [`GatewayError::ErrorResponse`].
const ERROR_DETAIL_LIMIT: usize = 512;

/// Typed GET/POST access to the shelter service.
pub struct Gateway {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(config: &ShelterClientConfig) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = build_http_client(config)?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.get_with_query(path, &[]).await
    }

    /// GET with query pairs. Repeated keys are preserved, so
    /// `[("breeds", "A"), ("breeds", "B")]` encodes as `breeds=A&breeds=B`.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, GatewayError> {
        let url = self.endpoint(path)?;
        debug!(%url, pairs = query.len(), "GET");
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        decode(response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }

    /// POST whose 2xx response body is not JSON (login/logout return plain
    /// text); the body is discarded.
    pub async fn post_no_content<B>(&self, path: &str, body: &B) -> Result<(), GatewayError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        check_status(response).await.map(|_| ())
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.base_url.join(path)?)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let response = check_status(response).await?;
    response.json::<T>().await.map_err(GatewayError::Transport)
}

/// Maps non-2xx statuses: 401/403 become the distinguished session-invalid
/// error, everything else carries the status and a body excerpt.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(GatewayError::AuthExpired { status });
    }
    let detail: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(ERROR_DETAIL_LIMIT)
        .collect();
    Err(GatewayError::ErrorResponse { status, detail })
}

/// Build the HTTP client with JSON headers, the session cookie jar, and the
/// fixed timeout.
fn build_http_client(config: &ShelterClientConfig) -> Result<reqwest::Client, GatewayError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    for (key, value) in &config.extra_headers {
        headers.insert(
            HeaderName::from_str(key)
                .map_err(|e: header::InvalidHeaderName| GatewayError::Other(e.to_string()))?,
            HeaderValue::from_str(value)
                .map_err(|e: header::InvalidHeaderValue| GatewayError::Other(e.to_string()))?,
        );
    }

    debug!(
        base_url = %config.base_url,
        extra_headers = config.extra_headers.len(),
        "building shelter HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .timeout(REQUEST_TIMEOUT);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| GatewayError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn gateway(url: &str) -> Gateway {
        Gateway::new(&ShelterClientConfig::new(url)).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_expired() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/dogs/breeds");
            then.status(401);
        });

        let result = gateway(&server.base_url())
            .get::<Vec<String>>("/dogs/breeds")
            .await;
        assert!(
            matches!(result, Err(GatewayError::AuthExpired { status }) if status == StatusCode::UNAUTHORIZED),
            "expected AuthExpired, found: {result:?}"
        );
        mock.assert();
    }

    #[tokio::test]
    async fn forbidden_maps_to_auth_expired() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/dogs/breeds");
            then.status(403);
        });

        let result = gateway(&server.base_url())
            .get::<Vec<String>>("/dogs/breeds")
            .await;
        assert!(result.as_ref().err().is_some_and(GatewayError::is_auth_failure));
    }

    #[tokio::test]
    async fn other_error_statuses_carry_status_and_body() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/dogs/breeds");
            then.status(500).body("upstream on fire");
        });

        let result = gateway(&server.base_url())
            .get::<Vec<String>>("/dogs/breeds")
            .await;
        match result {
            Err(GatewayError::ErrorResponse { status, detail }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(detail, "upstream on fire");
            },
            other => panic!("expected ErrorResponse, found: {other:?}"),
        }
        mock.assert();
    }

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers = BTreeMap::new();
        extra_headers.insert("x-shelter-test".to_string(), "test-value".to_string());

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/dogs/breeds")
                .header("x-shelter-test", "test-value");
            then.status(200).json_body(json!([]));
        });

        let config = ShelterClientConfig {
            extra_headers,
            ..ShelterClientConfig::new(server.base_url())
        };
        let breeds: Vec<String> = Gateway::new(&config)
            .unwrap()
            .get("/dogs/breeds")
            .await
            .unwrap();
        assert!(breeds.is_empty());
        mock.assert();
    }

    #[tokio::test]
    async fn repeated_query_keys_are_preserved() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/dogs/search")
                .query_param("breeds", "Beagle")
                .query_param("breeds", "Akita");
            then.status(200)
                .json_body(json!({"resultIds": [], "total": 0}));
        });

        let query = vec![
            ("breeds".to_string(), "Beagle".to_string()),
            ("breeds".to_string(), "Akita".to_string()),
        ];
        let _: serde_json::Value = gateway(&server.base_url())
            .get_with_query("/dogs/search", &query)
            .await
            .unwrap();
        mock.assert();
    }
}
