//! The immutable fluent request.
//!
//! Every method that changes a [`Request`] returns a new one; the original is
//! left untouched. The URI and the body are edited through nested views that
//! hand a new request back with [`UriView::back`] and [`BodyView::back`]:
//!
//! ```
//! use hawser_core::{MockWire, Method, Request};
//!
//! let request = Request::new(MockWire::new(), "http://localhost:8080/api")?
//!     .with_method(Method::Post)
//!     .with_header("Accept", "application/json")
//!     .uri().path("users").query_param("page", "2").back()
//!     .body().form_param("name", "Jeff").back();
//!
//! assert_eq!(request.url().as_str(), "http://localhost:8080/api/users?page=2");
//! assert_eq!(request.content().as_ref(), b"name=Jeff");
//! # Ok::<(), hawser_core::Error>(())
//! ```
//!
//! Transport behaviors are stacked with [`Request::through`]; only
//! [`Request::dispatch`] talks to the wire.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bytes::Bytes;
use tower::Layer;
use url::Url;

use crate::request_body::BodyView;
use crate::uri::{Uri, UriView};
use crate::{Call, Error, Headers, Method, Response, Result, SharedWire, Wire, multipart};

/// An HTTP request bound to the wire that will carry it.
///
/// Equality and hashing consider the method, the URI, the headers and the
/// body. The wire is not part of a request's identity.
///
/// The URI may be relative, even empty; such a request can be edited and
/// compared but not dispatched.
#[derive(Clone)]
pub struct Request {
    wire: SharedWire,
    method: Method,
    uri: Uri,
    headers: Headers,
    body: Bytes,
}

impl Request {
    /// Creates a `GET` request for `home` over `wire`.
    ///
    /// `home` is an absolute URI or a relative reference, possibly empty.
    ///
    /// # Errors
    ///
    /// Fails if `home` is neither.
    pub fn new(wire: impl Wire + 'static, home: &str) -> Result<Self> {
        Ok(Self::with_uri(wire, Uri::parse(home)?))
    }

    /// Creates a `GET` request for `url` over `wire`.
    #[must_use]
    pub fn from_url(wire: impl Wire + 'static, url: Url) -> Self {
        Self::with_uri(wire, Uri::from(url))
    }

    fn with_uri(wire: impl Wire + 'static, uri: Uri) -> Self {
        Self {
            wire: Arc::new(wire),
            method: Method::default(),
            uri,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URI.
    #[must_use]
    pub fn url(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Request body, possibly empty.
    #[must_use]
    pub fn content(&self) -> &Bytes {
        &self.body
    }

    /// The wire `dispatch` will use.
    #[must_use]
    pub fn wire(&self) -> &SharedWire {
        &self.wire
    }

    /// Same request with another method.
    #[must_use]
    pub fn with_method(self, method: Method) -> Self {
        Self { method, ..self }
    }

    /// Same request with one more header.
    ///
    /// Existing values with the same name are kept.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Same request without any header named `name`.
    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    /// Same request with another body.
    #[must_use]
    pub fn with_body(self, body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..self
        }
    }

    /// Edit the URI.
    #[must_use]
    pub fn uri(&self) -> UriView {
        UriView::new(self.clone())
    }

    /// Edit the body as plain or `application/x-www-form-urlencoded` content.
    #[must_use]
    pub fn body(&self) -> BodyView {
        BodyView::url_encoded(self.clone())
    }

    /// Edit the body as `multipart/form-data`.
    ///
    /// # Errors
    ///
    /// Fails right away with a configuration error unless the request
    /// already carries a `Content-Type: multipart/...; boundary=<token>` header.
    pub fn multipart_body(&self) -> Result<BodyView> {
        let boundary = multipart::boundary(&self.headers)?;
        Ok(BodyView::multipart(self.clone(), boundary))
    }

    /// Same request sent through one more wire decorator.
    ///
    /// The layer wraps the current wire; the last layer applied is the first
    /// to see the call.
    ///
    /// ```
    /// use hawser_core::{Call, MockWire, Request, SharedWire, Wire, layer_fn, wire_fn};
    ///
    /// let mock = MockWire::new();
    /// let request = Request::new(mock.clone(), "http://localhost/")?
    ///     .through(layer_fn(|inner: SharedWire| {
    ///         wire_fn(move |call: &Call| {
    ///             let mut headers = call.headers().clone();
    ///             headers.append("X-Trace", "1");
    ///             inner.send(&call.with_headers(headers))
    ///         })
    ///     }));
    ///
    /// request.dispatch()?;
    /// assert_eq!(mock.calls()[0].header("X-Trace"), Some("1"));
    /// # Ok::<(), hawser_core::Error>(())
    /// ```
    #[must_use]
    pub fn through<L>(self, layer: L) -> Self
    where
        L: Layer<SharedWire>,
        L::Service: Wire + 'static,
    {
        let wire: SharedWire = Arc::new(layer.layer(Arc::clone(&self.wire)));
        Self { wire, ..self }
    }

    /// The call `dispatch` would hand to the wire.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the URI is relative.
    pub fn to_call(&self) -> Result<Call> {
        let url = self.uri.as_url().cloned().ok_or_else(|| {
            Error::configuration(format!("cannot dispatch relative URI `{}`", self.uri))
        })?;
        Ok(Call::new(
            self.method,
            url,
            self.headers.clone(),
            self.body.clone(),
        ))
    }

    /// Send the request through its wire and wait for the response.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the URI is relative, otherwise
    /// returns whatever the wire chain fails with, typically a transport error.
    pub fn dispatch(&self) -> Result<Response> {
        self.wire.send(&self.to_call()?)
    }

    pub(crate) fn replace_uri(self, uri: Uri) -> Self {
        Self { uri, ..self }
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.uri == other.uri
            && self.headers == other.headers
            && self.body == other.body
    }
}

impl Eq for Request {}

impl Hash for Request {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.uri.hash(state);
        self.headers.hash(state);
        self.body.hash(state);
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.uri.as_str())
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert2::{check, let_assert};

    use super::*;
    use crate::{MockWire, layer_fn, wire_fn};

    fn request(home: &str) -> Request {
        Request::new(MockWire::new(), home).expect("valid request")
    }

    #[test]
    fn defaults_to_get_with_empty_body() {
        let request = request("http://localhost/x");

        check!(request.method() == Method::Get);
        check!(request.headers().is_empty());
        check!(request.content().is_empty());
    }

    #[test]
    fn accepts_relative_and_empty_uris() {
        for home in ["", "/relative/path", "items?page=2"] {
            let_assert!(Ok(request) = Request::new(MockWire::new(), home));
            check!(request.url().as_str() == home);
        }

        let_assert!(Err(Error::InvalidUrl(_)) = Request::new(MockWire::new(), "http://[::1"));
    }

    #[test]
    fn relative_request_is_not_dispatched() {
        let mock = MockWire::new();
        let request = Request::new(mock.clone(), "/relative").expect("valid request");

        let_assert!(Err(err) = request.dispatch());
        check!(err.is_configuration());
        check!(mock.calls().is_empty());
    }

    #[test]
    fn empty_uri_requests_identify_uniquely() {
        let wire = MockWire::new();
        let one = Request::new(wire.clone(), "")
            .expect("valid request")
            .with_header("header-1", "value-1");
        let two = Request::new(wire.clone(), "")
            .expect("valid request")
            .with_header("header-2", "value-2");
        check!(one != two);

        let plain = Request::new(wire.clone(), "").expect("valid request");
        check!(plain == Request::new(wire, "").expect("valid request"));
    }

    #[test]
    fn multipart_body_on_empty_uri_requires_boundary() {
        let plain = Request::new(MockWire::new(), "").expect("valid request");
        let_assert!(Err(err) = plain.multipart_body());
        check!(err.to_string().contains("Content-Type: multipart/form-data requires boundary"));

        let no_boundary = plain.with_header("Content-Type", "multipart/form-data");
        let_assert!(Err(err) = no_boundary.multipart_body());
        check!(err.is_configuration());
    }

    #[test]
    fn edits_leave_the_original_untouched() {
        let original = request("http://localhost/x");
        let edited = original
            .clone()
            .with_method(Method::Put)
            .with_header("Accept", "text/plain")
            .with_body("payload");

        check!(original.method() == Method::Get);
        check!(original.headers().is_empty());
        check!(edited.method() == Method::Put);
        check!(edited.content().as_ref() == b"payload");

        let viewed = original.uri().path("y").back();
        check!(original.url().as_str() == "http://localhost/x");
        check!(viewed.url().as_str() == "http://localhost/x/y");
    }

    #[test]
    fn headers_append_and_reset() {
        let request = request("http://localhost/")
            .with_header("X-Tag", "a")
            .with_header("x-tag", "b")
            .with_header("Accept", "*/*");

        check!(request.headers().get_all("X-TAG").collect::<Vec<_>>() == ["a", "b"]);

        let reset = request.without_header("x-Tag");
        check!(reset.headers().iter().collect::<Vec<_>>() == [("Accept", "*/*")]);
    }

    #[test]
    fn identifies_uniquely() {
        let wire = MockWire::new();
        let one = Request::new(wire.clone(), "http://localhost/")
            .expect("valid request")
            .with_header("header-1", "value-1");
        let two = Request::new(wire.clone(), "http://localhost/")
            .expect("valid request")
            .with_header("header-2", "value-2");
        check!(one != two);

        let plain = Request::new(wire.clone(), "http://localhost/").expect("valid request");
        let same = Request::new(wire, "http://localhost/").expect("valid request");
        check!(plain == same);
    }

    #[test]
    fn equality_ignores_the_wire() {
        let left = request("http://localhost/").with_header("a", "1");
        let right = Request::new(MockWire::new(), "http://localhost/")
            .expect("valid request")
            .with_header("a", "1")
            .through(layer_fn(|inner: SharedWire| inner));

        check!(left == right);

        let set: HashSet<Request> = [left, right].into_iter().collect();
        check!(set.len() == 1);
    }

    #[test]
    fn dispatch_sends_every_field() {
        let mock = MockWire::new();
        let request = Request::new(mock.clone(), "http://localhost:9090/a")
            .expect("valid request")
            .with_method(Method::Post)
            .with_header("Content-Type", "text/plain")
            .body()
            .set("hi")
            .back();

        let response = request.dispatch().expect("response");
        check!(response.status() == 200);

        let calls = mock.calls();
        let_assert!([call] = calls.as_slice());
        check!(call.method() == Method::Post);
        check!(call.url().as_str() == "http://localhost:9090/a");
        check!(call.header("content-type") == Some("text/plain"));
        check!(call.body().as_ref() == b"hi");
    }

    #[test]
    fn through_wraps_outermost_last() {
        let mock = MockWire::new();
        let tag = |name: &'static str| {
            layer_fn(move |inner: SharedWire| {
                wire_fn(move |call: &Call| {
                    let mut headers = call.headers().clone();
                    headers.append("X-Order", name);
                    inner.send(&call.with_headers(headers))
                })
            })
        };

        Request::new(mock.clone(), "http://localhost/")
            .expect("valid request")
            .through(tag("inner"))
            .through(tag("outer"))
            .dispatch()
            .expect("response");

        let calls = mock.calls();
        check!(calls[0].headers().get_all("X-Order").collect::<Vec<_>>() == ["outer", "inner"]);
    }

    #[test]
    fn debug_omits_the_wire() {
        let debug = format!("{:?}", request("http://localhost/"));
        check!(debug.starts_with("Request { method: Get, url: \"http://localhost/\""));
    }
}
