//! Follow redirect decorator.
//!
//! Follows 3xx responses carrying a `Location` header, relative or absolute,
//! up to a maximum number of hops.

use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::{Call, Error, Layer, Method, Response, Result, Wire};

/// Default maximum number of redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Layer that follows redirects.
///
/// # Example
///
/// ```
/// use hawser::{Headers, MockWire, Request, Response};
/// use hawser::wire::RedirectLayer;
///
/// let moved: Headers = [("Location", "/new")].into_iter().collect();
/// let mock = MockWire::new().answer(Response::new(301, moved, "".into()));
///
/// let response = Request::new(mock.clone(), "http://localhost/old")?
///     .through(RedirectLayer::new())
///     .dispatch()?;
///
/// assert_eq!(response.status(), 200);
/// assert_eq!(mock.calls()[1].url().as_str(), "http://localhost/new");
/// # Ok::<(), hawser::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RedirectLayer {
    max_redirects: usize,
}

impl Default for RedirectLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl RedirectLayer {
    /// Follow at most [`DEFAULT_MAX_REDIRECTS`] hops.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Follow at most `max_redirects` hops.
    #[must_use]
    pub const fn with_max_redirects(max_redirects: usize) -> Self {
        Self { max_redirects }
    }
}

impl<W> Layer<W> for RedirectLayer {
    type Service = RedirectWire<W>;

    fn layer(&self, inner: W) -> Self::Service {
        RedirectWire {
            inner,
            max_redirects: self.max_redirects,
        }
    }
}

/// Wire that follows redirects.
#[derive(Debug, Clone)]
pub struct RedirectWire<W> {
    inner: W,
    max_redirects: usize,
}

/// Every 3xx but 304 Not Modified.
const fn is_redirect(status: u16) -> bool {
    matches!(status, 300..=399) && status != 304
}

/// Resolve a redirect Location URL relative to the current call URL.
fn resolve_redirect_url(base_url: &Url, location: &str) -> Result<Url> {
    base_url.join(location).map_err(Error::InvalidUrl)
}

/// Headers that must not follow a redirect to another origin.
const CREDENTIAL_HEADERS: [&str; 3] = ["Authorization", "Proxy-Authorization", "Cookie"];

/// The call to send for the next hop.
///
/// 303 See Other switches to a body-less GET; every other status keeps the
/// method and body. A hop to another origin (scheme, host or port) drops the
/// credentials: the URI user-info and [`CREDENTIAL_HEADERS`].
fn next_call(call: &Call, status: u16, mut url: Url) -> Call {
    let (method, _, mut headers, body) = call.clone().into_parts();

    if url.origin() != call.url().origin() {
        for name in CREDENTIAL_HEADERS {
            headers.remove(name);
        }
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }

    if status == 303 {
        headers.remove("Content-Type");
        headers.remove("Content-Length");
        return Call::new(Method::Get, url, headers, Bytes::new());
    }
    Call::new(method, url, headers, body)
}

impl<W: Wire> Wire for RedirectWire<W> {
    fn send(&self, call: &Call) -> Result<Response> {
        let mut current = call.clone();
        let mut redirects = 0;

        loop {
            let response = self.inner.send(&current)?;
            if !is_redirect(response.status()) {
                return Ok(response);
            }

            let Some(location) = response.header("Location") else {
                return Ok(response);
            };

            if redirects >= self.max_redirects {
                return Err(Error::TooManyRedirects {
                    count: redirects,
                    max: self.max_redirects,
                });
            }

            let url = resolve_redirect_url(current.url(), location)?;
            debug!(status = response.status(), from = %current.url(), to = %url, "following redirect");
            current = next_call(&current, response.status(), url);
            redirects += 1;
        }
    }
}
