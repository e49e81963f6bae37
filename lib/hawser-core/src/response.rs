//! HTTP response handling.
//!
//! [`Response`] provides access to status, headers and body. It can be
//! reinterpreted as a richer view with [`Response::view`] without another
//! exchange:
//!
//! ```
//! use hawser_core::{Headers, Response, RestResponse};
//!
//! let response = Response::new(200, Headers::new(), "hello".into());
//! let rest = response.view::<RestResponse>().assert_status(200)?;
//! assert_eq!(rest.text(), "hello");
//! # Ok::<(), hawser_core::Error>(())
//! ```

use std::borrow::Cow;
use std::ops::Deref;

use bytes::Bytes;

use crate::{Error, Headers, Result};

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Canonical reason phrase of the status, if it has one.
    #[must_use]
    pub fn reason(&self) -> Option<&'static str> {
        http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Raw response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, Headers, Bytes) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 3xx.
    #[must_use]
    pub const fn is_redirection(&self) -> bool {
        self.status >= 300 && self.status < 400
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Reinterpret this response as a richer view.
    ///
    /// The view wraps the same status, headers and body; nothing is sent again.
    #[must_use]
    pub fn view<V: From<Self>>(self) -> V {
        V::from(self)
    }
}

// ============================================================================
// Assertion view
// ============================================================================

/// Response view with assertion helpers.
///
/// Every assertion returns the view back on success so checks can be chained,
/// and an [`Error::Assertion`] otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    response: Response,
}

impl RestResponse {
    /// Fails unless the status is `expected`.
    pub fn assert_status(self, expected: u16) -> Result<Self> {
        if self.response.status == expected {
            Ok(self)
        } else {
            Err(Error::assertion(
                format!("status {expected}"),
                format!("status {}", self.response.status),
            ))
        }
    }

    /// Fails unless some header `name` carries exactly `value`.
    pub fn assert_header(self, name: &str, value: &str) -> Result<Self> {
        if self.response.headers.get_all(name).any(|found| found == value) {
            Ok(self)
        } else {
            let actual = self.response.headers.get_all(name).collect::<Vec<_>>();
            Err(Error::assertion(
                format!("header {name}: {value}"),
                format!("header {name}: {actual:?}"),
            ))
        }
    }

    /// Fails unless the body text equals `expected`.
    pub fn assert_body(self, expected: &str) -> Result<Self> {
        if self.response.text() == expected {
            Ok(self)
        } else {
            let actual = self.response.text().into_owned();
            Err(Error::assertion(format!("body {expected:?}"), format!("body {actual:?}")))
        }
    }

    /// Fails unless the body text contains `fragment`.
    pub fn assert_body_contains(self, fragment: &str) -> Result<Self> {
        if self.response.text().contains(fragment) {
            Ok(self)
        } else {
            let actual = self.response.text().into_owned();
            Err(Error::assertion(
                format!("body containing {fragment:?}"),
                format!("body {actual:?}"),
            ))
        }
    }

    /// Back to the plain response.
    #[must_use]
    pub fn into_inner(self) -> Response {
        self.response
    }
}

impl From<Response> for RestResponse {
    fn from(response: Response) -> Self {
        Self { response }
    }
}

impl Deref for RestResponse {
    type Target = Response;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

// ============================================================================
// JSON view
// ============================================================================

/// Response view reading the body as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponse {
    response: Response,
}

impl JsonResponse {
    /// Deserialize the body, reporting the JSON path of any mismatch.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        crate::from_json(&self.response.body)
    }

    /// Parse the body as an untyped JSON document.
    pub fn value(&self) -> Result<serde_json::Value> {
        self.json()
    }

    /// Back to the plain response.
    #[must_use]
    pub fn into_inner(self) -> Response {
        self.response
    }
}

impl From<Response> for JsonResponse {
    fn from(response: Response) -> Self {
        Self { response }
    }
}

impl Deref for JsonResponse {
    type Target = Response;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    fn json_headers() -> Headers {
        [("Content-Type", "application/json")].into_iter().collect()
    }

    #[test]
    fn response_basic() {
        let response = Response::new(200, json_headers(), Bytes::from(r#"{"id":1}"#));

        check!(response.status() == 200);
        check!(response.reason() == Some("OK"));
        check!(response.header("content-type") == Some("application/json"));
        check!(response.is_success());
        check!(!response.is_client_error());
        check!(!response.is_server_error());
    }

    #[test]
    fn response_status_checks() {
        let response = Response::new(301, Headers::new(), Bytes::new());
        assert!(response.is_redirection());

        let response = Response::new(404, Headers::new(), Bytes::new());
        assert!(response.is_client_error());

        let response = Response::new(500, Headers::new(), Bytes::new());
        assert!(response.is_server_error());

        let response = Response::new(599, Headers::new(), Bytes::new());
        assert_eq!(response.reason(), None);
    }

    #[test]
    fn view_keeps_the_same_triple() {
        let response = Response::new(201, json_headers(), Bytes::from("created"));
        let rest: RestResponse = response.clone().view();

        assert_eq!(rest.status(), 201);
        assert_eq!(rest.into_inner(), response);
    }

    #[test]
    fn assert_status_passes_and_fails() {
        let response = Response::new(404, Headers::new(), Bytes::new());

        let_assert!(Ok(rest) = response.clone().view::<RestResponse>().assert_status(404));
        check!(rest.status() == 404);

        let_assert!(Err(err) = response.view::<RestResponse>().assert_status(200));
        check!(err.is_assertion());
        check!(err.to_string() == "assertion failed: expected status 200, got status 404");
    }

    #[test]
    fn assert_header_and_body() {
        let response = Response::new(200, json_headers(), Bytes::from("hello world"));
        let rest = response.view::<RestResponse>();

        let_assert!(
            Ok(rest) = rest
                .assert_header("CONTENT-TYPE", "application/json")
                .and_then(|r| r.assert_body("hello world"))
                .and_then(|r| r.assert_body_contains("world"))
        );
        check!(rest.assert_header("Content-Type", "text/plain").is_err());
    }

    #[test]
    fn assert_body_mismatch_reports_both_sides() {
        let response = Response::new(200, Headers::new(), Bytes::from("actual"));
        let_assert!(Err(Error::Assertion { expected, actual }) =
            response.view::<RestResponse>().assert_body("wanted"));
        check!(expected == r#"body "wanted""#);
        check!(actual == r#"body "actual""#);
    }

    #[test]
    fn json_view() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct User {
            id: u64,
            name: String,
        }

        let body = Bytes::from(r#"{"id":1,"name":"test"}"#);
        let json = Response::new(200, json_headers(), body).view::<JsonResponse>();

        let user: User = json.json().expect("deserialize");
        assert_eq!(
            user,
            User {
                id: 1,
                name: "test".to_string()
            }
        );
        assert_eq!(json.value().expect("value")["name"], "test");
    }

    #[test]
    fn response_text_is_lossy() {
        let response = Response::new(200, Headers::new(), Bytes::from_static(b"ok\xff"));
        assert_eq!(response.text(), "ok\u{fffd}");
    }
}
