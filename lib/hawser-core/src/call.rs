//! The wire-level request.
//!
//! A [`Call`] is what a [`Wire`](crate::Wire) receives: the fully specified
//! method, absolute URL, ordered headers and body of one exchange. Decorators
//! that need to change any of it build a new `Call` from the parts.

use bytes::Bytes;
use url::Url;

use crate::{Headers, Method};

/// One request as handed to a wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    method: Method,
    url: Url,
    headers: Headers,
    body: Bytes,
}

impl Call {
    /// Creates a call from its parts.
    #[must_use]
    pub fn new(method: Method, url: Url, headers: Headers, body: Bytes) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Absolute request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Request body, possibly empty.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Same call with different headers.
    #[must_use]
    pub fn with_headers(&self, headers: Headers) -> Self {
        Self {
            headers,
            ..self.clone()
        }
    }

    /// Same call against a different URL.
    #[must_use]
    pub fn with_url(&self, url: Url) -> Self {
        Self {
            url,
            ..self.clone()
        }
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, Headers, Bytes) {
        (self.method, self.url, self.headers, self.body)
    }
}
