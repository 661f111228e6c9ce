//! Fetching over HTTP.

use bytes::Bytes;
use futures::future::BoxFuture;
use reqwest::header::USER_AGENT;

use super::{Fetch, FetchError};

pub use reqwest::header::HeaderValue;

/// Controls how documents and icons are downloaded.
pub struct HttpOptions {
    /// User agent to be sent to the servers.
    pub user_agent: Option<HeaderValue>,

    /// Maximum number of parallel downloads.
    ///
    /// Many services have rate limits, and exceeding them may result in throttling, bans, or
    /// degraded service. Use the default value when in doubt.
    pub max_parallel_downloads: MaxParallelDownloads,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            user_agent: Some(HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))),
            max_parallel_downloads: MaxParallelDownloads::default(),
        }
    }
}

/// Maximum number of parallel downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxParallelDownloads(pub usize);

impl Default for MaxParallelDownloads {
    /// Following modern browsers' behavior.
    /// <https://stackoverflow.com/questions/985431/max-parallel-http-connections-in-a-browser>
    fn default() -> Self {
        Self(6)
    }
}

/// [`Fetch`] implementation backed by `reqwest`.
pub struct HttpFetch {
    client: reqwest::Client,
    user_agent: Option<HeaderValue>,
    max_parallel_downloads: usize,
}

impl HttpFetch {
    pub fn new(options: HttpOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: options.user_agent,
            max_parallel_downloads: options.max_parallel_downloads.0.max(1),
        }
    }
}

impl Fetch for HttpFetch {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, FetchError>> {
        Box::pin(async move {
            let mut request = self.client.get(url);
            if let Some(user_agent) = &self.user_agent {
                request = request.header(USER_AGENT, user_agent.clone());
            }

            let response = request.send().await?.error_for_status()?;
            Ok(response.bytes().await?)
        })
    }

    fn max_concurrency(&self) -> usize {
        self.max_parallel_downloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypermocker::{Server, StatusCode};

    #[tokio::test]
    async fn body_is_fetched_with_user_agent() {
        let _ = env_logger::try_init();

        let server = Server::bind().await;
        let url = format!("http://localhost:{}/markers.geojson", server.port());
        let mut request = server.anticipate("/markers.geojson").await;
        let fetch = HttpFetch::new(HttpOptions {
            user_agent: Some(HeaderValue::from_static("mapview-test")),
            ..Default::default()
        });

        let (result, ()) = futures::join!(fetch.fetch(&url), async {
            let incoming = request.expect().await;
            assert_eq!(
                Some(&HeaderValue::from_static("mapview-test")),
                incoming.headers().get(USER_AGENT)
            );
            request.respond(Bytes::from_static(b"{}")).await;
        });

        assert_eq!(Bytes::from_static(b"{}"), result.unwrap());
    }

    #[tokio::test]
    async fn error_status_is_a_failure() {
        let _ = env_logger::try_init();

        let server = Server::bind().await;
        let url = format!("http://localhost:{}/missing.geojson", server.port());
        let request = server.anticipate("/missing.geojson").await;
        let fetch = HttpFetch::new(HttpOptions::default());

        let (result, ()) = futures::join!(
            fetch.fetch(&url),
            request.respond_with_status(StatusCode::NOT_FOUND)
        );

        assert!(matches!(result, Err(FetchError::Http(_))));
    }

    #[test]
    fn parallelism_is_at_least_one() {
        let fetch = HttpFetch::new(HttpOptions {
            max_parallel_downloads: MaxParallelDownloads(0),
            ..Default::default()
        });
        assert_eq!(1, fetch.max_concurrency());
    }
}
