//! Blocking HTTP transport using hyper-util.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;
use url::Url;

use crate::{Call, Error, Headers, Response, Result, Wire, config::ClientConfig, connector::https_connector};

/// Real transport: hyper-util's pooled client over rustls.
///
/// [`Wire::send`] blocks the calling thread while a private tokio runtime
/// drives the exchange. Clones share the runtime and the connection pool.
///
/// The runtime cannot be entered from another one: use `HyperWire` from
/// plain threads (or `tokio::task::spawn_blocking`), and drop its last clone
/// there too.
///
/// # Example
///
/// ```ignore
/// use hawser::{HyperWire, Request};
///
/// let response = Request::new(HyperWire::new()?, "https://www.example.com/")?.dispatch()?;
/// ```
#[derive(Clone)]
pub struct HyperWire {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    runtime: Arc<Runtime>,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperWire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperWire")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperWire {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Fails if the runtime cannot be started.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Fails if the runtime cannot be started.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("hawser-wire")
            .enable_all()
            .build()
            .map_err(|e| Error::connection(format!("cannot start runtime: {e}")))?;

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(config.connect_timeout));

        Ok(Self {
            client,
            runtime: Arc::new(runtime),
            config,
        })
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a hyper request from a call.
    fn build_hyper_request(call: &Call) -> Result<http::Request<Full<Bytes>>> {
        let mut builder = http::Request::builder()
            .method(http::Method::from(call.method()))
            .uri(without_user_info(call.url()).as_str());

        for (name, value) in call.headers().iter() {
            builder = builder.header(name, value);
        }

        builder
            .body(Full::new(call.body().clone()))
            .map_err(|e| Error::configuration(e.to_string()))
    }

    /// Extract response headers, keeping repeated values.
    ///
    /// Values that are not valid UTF-8 are decoded lossily.
    fn extract_headers(headers: &http::HeaderMap) -> Headers {
        headers
            .iter()
            .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes())))
            .collect()
    }

    async fn execute(&self, call: &Call) -> Result<Response> {
        let hyper_request = Self::build_hyper_request(call)?;

        let exchange = async {
            let response = self
                .client
                .request(hyper_request)
                .await
                .map_err(Self::map_hyper_error)?;

            let status = response.status().as_u16();
            let headers = Self::extract_headers(response.headers());
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::protocol(e.to_string()))?
                .to_bytes();

            Ok(Response::new(status, headers, body))
        };

        tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::protocol(msg)
    }
}

impl Wire for HyperWire {
    fn send(&self, call: &Call) -> Result<Response> {
        debug!(method = %call.method(), url = %call.url(), "sending over hyper");
        self.runtime.block_on(self.execute(call))
    }
}

/// Credentials never travel in the request target.
fn without_user_info(url: &Url) -> Url {
    let mut url = url.clone();
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url
}
