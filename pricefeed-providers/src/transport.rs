use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pricefeed_core::PricefeedError;
use serde_json::Value;
use url::Url;

/// JSON-over-HTTP GET abstraction (so we can inject fakes in tests).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET and decode the body as JSON.
    ///
    /// `provider` tags any error produced by the transport itself.
    async fn get_json(
        &self,
        provider: &'static str,
        url: Url,
        headers: &[(&'static str, String)],
    ) -> Result<Value, PricefeedError>;
}

/// Map a non-success HTTP status to the error taxonomy.
#[must_use]
pub fn status_error(provider: &str, status: u16, retry_after_ms: Option<u64>) -> PricefeedError {
    match status {
        429 => PricefeedError::RateLimited {
            provider: provider.to_string(),
            retry_after_ms,
        },
        404 => PricefeedError::not_found(format!("{provider} resource")),
        401 | 403 => PricefeedError::provider(provider, "invalid or missing API key"),
        s => PricefeedError::provider(provider, format!("HTTP {s}")),
    }
}

/// Join `base` and `path` and append query pairs.
///
/// # Errors
/// Returns `Provider` when the result is not a valid URL.
pub fn build_url(
    provider: &str,
    base: &str,
    path: &str,
    query: &[(&str, &str)],
) -> Result<Url, PricefeedError> {
    let mut url = Url::parse(&format!("{}{path}", base.trim_end_matches('/')))
        .map_err(|e| PricefeedError::provider(provider, format!("invalid url: {e}")))?;
    if !query.is_empty() {
        let mut qp = url.query_pairs_mut();
        for (k, v) in query {
            qp.append_pair(k, v);
        }
    }
    Ok(url)
}

/// Production transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ReqwestTransport {
    /// Build a client with a request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pricefeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Shared handle for providers.
    #[must_use]
    pub fn shared() -> Arc<dyn HttpTransport> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(
        &self,
        provider: &'static str,
        url: Url,
        headers: &[(&'static str, String)],
    ) -> Result<Value, PricefeedError> {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        for (k, v) in headers {
            request = request.header(*k, v.as_str());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PricefeedError::provider_timeout(provider, "http")
            } else {
                PricefeedError::provider(provider, format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            #[cfg(feature = "tracing")]
            tracing::debug!(provider, status = status.as_u16(), "upstream returned error status");
            return Err(status_error(provider, status.as_u16(), retry_after_ms));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| PricefeedError::Data(format!("{provider}: invalid JSON body: {e}")))
    }
}

impl dyn HttpTransport {
    /// Build a transport from a closure receiving the full request URL.
    pub fn from_fn<F>(f: F) -> Arc<dyn HttpTransport>
    where
        F: Send + Sync + 'static + Fn(&Url) -> Result<Value, PricefeedError>,
    {
        struct FnTransport<F>(F);
        #[async_trait]
        impl<F> HttpTransport for FnTransport<F>
        where
            F: Send + Sync + 'static + Fn(&Url) -> Result<Value, PricefeedError>,
        {
            async fn get_json(
                &self,
                _provider: &'static str,
                url: Url,
                _headers: &[(&'static str, String)],
            ) -> Result<Value, PricefeedError> {
                (self.0)(&url)
            }
        }
        Arc::new(FnTransport(f))
    }
}
