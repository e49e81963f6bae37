//! Basic authentication decorator.
//!
//! Turns the user-info of the call URI (or fixed credentials) into an
//! `Authorization: Basic <base64(user:pass)>` header, and strips the user-info
//! from the URI forwarded to the inner wire.

use std::sync::Arc;

use base64::Engine;
use percent_encoding::percent_decode_str;
use tracing::debug;
use url::Url;

use crate::{Call, Layer, Response, Result, Wire};

/// Layer that adds basic authentication to calls.
///
/// # Example
///
/// ```
/// use hawser::{MockWire, Request};
/// use hawser::wire::BasicAuthLayer;
///
/// let mock = MockWire::new();
/// Request::new(mock.clone(), "http://localhost/")?
///     .uri()
///     .user_info("Alice:secret")
///     .back()
///     .through(BasicAuthLayer::new())
///     .dispatch()?;
///
/// let call = mock.take().expect("one call");
/// assert_eq!(call.header("Authorization"), Some("Basic QWxpY2U6c2VjcmV0"));
/// assert_eq!(call.url().as_str(), "http://localhost/");
/// # Ok::<(), hawser::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct BasicAuthLayer {
    /// Base64-encoded "username:password", overriding the URI user-info.
    fixed: Option<Arc<str>>,
}

impl BasicAuthLayer {
    /// Take credentials from the user-info of each call URI.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always send the given credentials.
    #[must_use]
    pub fn with_credentials(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        Self {
            fixed: Some(Arc::from(encode(username.as_ref(), password.as_ref()))),
        }
    }
}

impl<W> Layer<W> for BasicAuthLayer {
    type Service = BasicAuthWire<W>;

    fn layer(&self, inner: W) -> Self::Service {
        BasicAuthWire {
            inner,
            fixed: self.fixed.clone(),
        }
    }
}

/// Wire that adds basic authentication to calls.
#[derive(Debug, Clone)]
pub struct BasicAuthWire<W> {
    inner: W,
    fixed: Option<Arc<str>>,
}

impl<W> BasicAuthWire<W> {
    /// Wrap `inner`, taking credentials from each call URI.
    pub const fn new(inner: W) -> Self {
        Self { inner, fixed: None }
    }
}

impl<W: Wire> Wire for BasicAuthWire<W> {
    fn send(&self, call: &Call) -> Result<Response> {
        let encoded = match &self.fixed {
            Some(fixed) => Some(fixed.to_string()),
            None => credentials(call.url()).map(|(user, pass)| encode(&user, &pass)),
        };

        let Some(encoded) = encoded else {
            return self.inner.send(call);
        };

        debug!(url = %call.url(), "adding basic authorization");
        let mut headers = call.headers().clone();
        headers.replace("Authorization", format!("Basic {encoded}"));

        let mut url = call.url().clone();
        let _ = url.set_username("");
        let _ = url.set_password(None);

        self.inner.send(&call.with_headers(headers).with_url(url))
    }
}

/// Decoded user and password from the URI user-info, if any.
///
/// `+` stays a plus sign: user-info is not form-encoded.
fn credentials(url: &Url) -> Option<(String, String)> {
    if url.username().is_empty() && url.password().is_none() {
        return None;
    }
    let decode = |raw: &str| percent_decode_str(raw).decode_utf8_lossy().into_owned();
    Some((decode(url.username()), decode(url.password().unwrap_or_default())))
}

fn encode(username: &str, password: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"))
}
