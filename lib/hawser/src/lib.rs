//! Immutable fluent HTTP client.
//!
//! A [`Request`] is an immutable value bound to a [`Wire`]: every fluent call
//! returns a new request, the original is never touched. URI and body are
//! edited through nested views that come back to the request with `back()`.
//! Transport concerns are decorators stacked with [`Request::through`].
//!
//! # Example
//!
//! ```no_run
//! use hawser::wire::{LoggingLayer, RetryLayer};
//!
//! let response = hawser::request("https://api.example.com")?
//!     .uri()
//!     .path("users")
//!     .query_param("page", "2")
//!     .back()
//!     .with_header("Accept", "application/json")
//!     .through(RetryLayer::new(3))
//!     .through(LoggingLayer::new())
//!     .dispatch()?
//!     .view::<hawser::RestResponse>()
//!     .assert_status(200)?;
//! # Ok::<(), hawser::Error>(())
//! ```

mod config;
mod connector;
pub mod prelude;
mod transport;
pub mod wire;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use transport::HyperWire;

// Re-export tower for layer composition
pub use tower;

// Re-export core types
pub use hawser_core::{
    BodyView, Call, Error, Headers, JsonResponse, Layer, Method, MockWire, Part, Request,
    Response, RestResponse, Result, SharedWire, Uri, UriView, Wire, WireFn, from_json, layer_fn,
    to_form, to_json, wire_fn,
};

// Re-export url for callers building `Url` values
pub use url;

/// Start a request to `home` over a fresh [`HyperWire`].
///
/// # Errors
///
/// Fails if `home` is not a URI reference, or if the transport cannot be
/// started. A relative `home` builds a request that cannot be dispatched
/// until its URI is made absolute.
pub fn request(home: &str) -> Result<Request> {
    Request::new(HyperWire::new()?, home)
}
