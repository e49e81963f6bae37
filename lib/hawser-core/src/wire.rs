//! The transport capability.
//!
//! A [`Wire`] turns a [`Call`] into a [`Response`]. Transports implement it
//! directly; decorators implement it by wrapping another wire and adding one
//! behavior before or after delegating. Decorators are layered onto a
//! [`Request`](crate::Request) with
//! [`Request::through`](crate::Request::through) and any
//! [`tower::Layer`] over [`SharedWire`].

use std::sync::Arc;

use crate::{Call, Response, Result};

/// Core transport trait.
///
/// `send` blocks the calling thread until the exchange is over.
pub trait Wire: Send + Sync {
    /// Perform one exchange.
    ///
    /// # Errors
    ///
    /// Returns a transport error (see [`Error::is_transport`](crate::Error::is_transport))
    /// when the remote party cannot be reached or misbehaves, or whatever a
    /// decorator raises on top (e.g. too many redirects).
    fn send(&self, call: &Call) -> Result<Response>;
}

/// The wire a request holds: shared between request snapshots.
pub type SharedWire = Arc<dyn Wire>;

impl<W: Wire + ?Sized> Wire for Arc<W> {
    fn send(&self, call: &Call) -> Result<Response> {
        (**self).send(call)
    }
}

impl<W: Wire + ?Sized> Wire for Box<W> {
    fn send(&self, call: &Call) -> Result<Response> {
        (**self).send(call)
    }
}

/// Returns a [`Wire`] backed by a closure, in the manner of `tower::service_fn`.
pub fn wire_fn<F>(f: F) -> WireFn<F>
where
    F: Fn(&Call) -> Result<Response> + Send + Sync,
{
    WireFn { f }
}

/// Wire created by [`wire_fn`].
#[derive(Clone, Copy)]
pub struct WireFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for WireFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireFn").finish_non_exhaustive()
    }
}

impl<F> Wire for WireFn<F>
where
    F: Fn(&Call) -> Result<Response> + Send + Sync,
{
    fn send(&self, call: &Call) -> Result<Response> {
        (self.f)(call)
    }
}
