//! Core types for the hawser fluent HTTP client.
//!
//! This crate provides the foundational types used by hawser:
//! - [`Request`] - immutable fluent request bound to a wire
//! - [`UriView`] and [`BodyView`] - nested views editing the URI and the body
//! - [`Uri`] - absolute URI or relative reference held by a request
//! - [`Wire`] - transport capability, decorated by stacking layers
//! - [`Call`] - the request as a wire receives it
//! - [`Response`], [`RestResponse`] and [`JsonResponse`] - the result of a dispatch
//! - [`Headers`] - ordered, case-insensitive header multimap
//! - [`Method`] - HTTP method enum
//! - [`Error`] and [`Result`] - Error handling
//! - [`MockWire`] - recording transport for tests

mod body;
mod call;
mod error;
mod headers;
mod method;
mod mock;
mod multipart;
pub mod prelude;
mod request;
mod request_body;
mod response;
mod uri;
mod wire;

pub use body::{from_json, to_form, to_json};
pub use call::Call;
pub use error::{Error, Result};
pub use headers::Headers;
pub use method::Method;
pub use mock::MockWire;
pub use multipart::Part;
pub use request::Request;
pub use request_body::BodyView;
pub use response::{JsonResponse, Response, RestResponse};
pub use uri::{Uri, UriView};
pub use wire::{SharedWire, Wire, WireFn, wire_fn};

// Layers are plain `tower` layers over `SharedWire`
pub use tower::Layer;
pub use tower::layer::layer_fn;
