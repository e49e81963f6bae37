//! `User-Agent` decorator.

use std::sync::Arc;

use crate::{Call, Layer, Response, Result, Wire};

/// Default `User-Agent` value.
pub const DEFAULT_USER_AGENT: &str = concat!("hawser/", env!("CARGO_PKG_VERSION"));

/// Layer that adds a `User-Agent` header to calls lacking one.
#[derive(Debug, Clone)]
pub struct UserAgentLayer {
    value: Arc<str>,
}

impl Default for UserAgentLayer {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT)
    }
}

impl UserAgentLayer {
    /// Add `value` as `User-Agent`.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self {
            value: Arc::from(value.as_ref()),
        }
    }
}

impl<W> Layer<W> for UserAgentLayer {
    type Service = UserAgentWire<W>;

    fn layer(&self, inner: W) -> Self::Service {
        UserAgentWire {
            inner,
            value: Arc::clone(&self.value),
        }
    }
}

/// Wire that adds a `User-Agent` header to calls lacking one.
#[derive(Debug, Clone)]
pub struct UserAgentWire<W> {
    inner: W,
    value: Arc<str>,
}

impl<W: Wire> Wire for UserAgentWire<W> {
    fn send(&self, call: &Call) -> Result<Response> {
        if call.headers().contains("User-Agent") {
            return self.inner.send(call);
        }
        let mut headers = call.headers().clone();
        headers.append("User-Agent", &*self.value);
        self.inner.send(&call.with_headers(headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockWire, Request};

    #[test]
    fn adds_default_user_agent() {
        let mock = MockWire::new();
        Request::new(mock.clone(), "http://localhost/")
            .expect("request")
            .through(UserAgentLayer::default())
            .dispatch()
            .expect("dispatch");

        let call = mock.take().expect("call");
        assert_eq!(call.header("user-agent"), Some(DEFAULT_USER_AGENT));
    }

    #[test]
    fn keeps_caller_user_agent() {
        let mock = MockWire::new();
        Request::new(mock.clone(), "http://localhost/")
            .expect("request")
            .with_header("User-Agent", "curl/8")
            .through(UserAgentLayer::new("other"))
            .dispatch()
            .expect("dispatch");

        let call = mock.take().expect("call");
        assert_eq!(call.headers().get_all("User-Agent").collect::<Vec<_>>(), ["curl/8"]);
    }
}
