//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use hawser::prelude::*;
//! ```

pub use crate::wire::{BasicAuthLayer, LoggingLayer, RedirectLayer, RetryLayer, UserAgentLayer};
pub use crate::{
    Call, ClientConfig, Error, Headers, HyperWire, JsonResponse, Layer, Method, MockWire, Part,
    Request, Response, Result, RestResponse, SharedWire, Wire, layer_fn, request, wire_fn,
};
