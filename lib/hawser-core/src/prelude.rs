//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use hawser_core::prelude::*;
//! ```

pub use crate::{
    Call, Error, Headers, JsonResponse, Layer, Method, MockWire, Request, Response, Result,
    RestResponse, SharedWire, Wire, layer_fn, wire_fn,
};
