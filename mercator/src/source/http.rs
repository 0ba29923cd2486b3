//! Network-backed resource source.
//!
//! Only the boundary contract of network loading lives in this crate: the source accepts
//! resources whose loading method allows the network, honors the shared cancellation semantics
//! and maps HTTP caching metadata onto [`Response::etag`] and [`Response::expires`]. Retry and
//! backoff policies belong to the application.

use log::info;
use reqwest::header::{HeaderMap, CACHE_CONTROL, ETAG};
use reqwest::StatusCode;

use crate::resource::Resource;
use crate::response::{ErrorKind, Response, ResponseError, Timestamp};
use crate::source::{RequestHandle, ResourceSource, ResponseCallback};

/// Resource source that loads resources with HTTP GET requests.
///
/// Requests are spawned onto the ambient tokio runtime; calling
/// [`request`](ResourceSource::request) outside of a runtime context produces an immediate error
/// response instead of panicking.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Creates a source with a default HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mercator/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Creates a source with a preconfigured HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn load(client: reqwest::Client, url: String) -> Response {
        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                info!("Failed to load {url}: {error}");
                return Response::from_error(ErrorKind::Connection, error.to_string());
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Response::no_content(ResponseError::new(
                ErrorKind::NotFound,
                format!("HTTP status code {}", status.as_u16()),
            ));
        }
        if !status.is_success() {
            info!("Failed to load {url}: {status}");
            return Response::from_error(
                ErrorKind::Other,
                format!("HTTP status code {}", status.as_u16()),
            );
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let expires = expires_from_headers(response.headers());

        match response.bytes().await {
            Ok(data) => Response {
                data: Some(data),
                etag,
                expires,
                ..Response::default()
            },
            Err(error) => Response::from_error(ErrorKind::Connection, error.to_string()),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSource for HttpSource {
    fn can_request(&self, resource: &Resource) -> bool {
        resource.uses_network_loading()
    }

    fn request(&self, resource: Resource, callback: ResponseCallback) -> RequestHandle {
        let (handle, slot) = RequestHandle::new(callback);

        let client = self.client.clone();
        let task_slot = slot.clone();
        let spawned = crate::async_runtime::spawn(async move {
            if task_slot.is_cancelled() {
                return;
            }
            log::trace!("Loading {}", resource.url);
            let response = Self::load(client, resource.url).await;
            task_slot.deliver(response);
        });

        if let Err(error) = spawned {
            slot.deliver(Response::from_error(ErrorKind::Other, error.to_string()));
        }

        handle
    }
}

/// Expiration derived from the response caching headers.
fn expires_from_headers(headers: &HeaderMap) -> Option<Timestamp> {
    let max_age = headers
        .get(CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_max_age)?;
    Some(Timestamp::from_secs(
        Timestamp::now().as_secs().saturating_add(max_age),
    ))
}

/// Value of the `max-age` directive of a `Cache-Control` header.
fn parse_max_age(value: &str) -> Option<i64> {
    value.split(',').find_map(|directive| {
        directive.trim().strip_prefix("max-age=")?.parse().ok()
    })
}
