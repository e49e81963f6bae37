//! Body editing view.

use std::borrow::Cow;

use bytes::Bytes;

use crate::multipart::{self, Part};
use crate::{Error, Request, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Encoding {
    UrlEncoded,
    Multipart { boundary: String },
}

/// Fluent view over the body of a [`Request`].
///
/// Obtained with [`Request::body`] or [`Request::multipart_body`];
/// [`BodyView::back`] returns the request with the edited body installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyView {
    request: Request,
    content: Bytes,
    encoding: Encoding,
}

impl BodyView {
    pub(crate) fn url_encoded(request: Request) -> Self {
        let content = request.content().clone();
        Self {
            request,
            content,
            encoding: Encoding::UrlEncoded,
        }
    }

    pub(crate) fn multipart(request: Request, boundary: String) -> Self {
        let content = request.content().clone();
        Self {
            request,
            content,
            encoding: Encoding::Multipart { boundary },
        }
    }

    /// Current content as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn get(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Current content.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.content
    }

    /// Replace the content wholesale.
    #[must_use]
    pub fn set(self, content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            ..self
        }
    }

    /// Replace the content with the JSON form of `value`.
    pub fn set_json<T: serde::Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let content = crate::to_json(value)?;
        Ok(self.set(content))
    }

    /// Append one form parameter.
    ///
    /// Plain bodies grow as `application/x-www-form-urlencoded` text; multipart
    /// bodies get one more `form-data` part.
    #[must_use]
    pub fn form_param(self, key: &str, value: &str) -> Self {
        match &self.encoding {
            Encoding::UrlEncoded => {
                let pair = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair(key, value)
                    .finish();
                self.push_pair(&pair)
            }
            Encoding::Multipart { boundary } => {
                let part = Part::new(key, value.to_string());
                let content = multipart::append(&self.content, boundary, &part);
                self.set(content)
            }
        }
    }

    /// Append every field of `value` as form parameters.
    pub fn form_params<T: serde::Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let encoded = crate::to_form(value)?;
        match self.encoding {
            Encoding::UrlEncoded if encoded.is_empty() => Ok(self),
            Encoding::UrlEncoded => Ok(self.push_pair(&encoded)),
            Encoding::Multipart { .. } => Ok(url::form_urlencoded::parse(encoded.as_bytes())
                .fold(self, |view, (key, value)| view.form_param(&key, &value))),
        }
    }

    /// Append an arbitrary part, such as a file upload.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error on a body that is not multipart.
    pub fn part(self, part: &Part) -> Result<Self> {
        match &self.encoding {
            Encoding::Multipart { boundary } => {
                let content = multipart::append(&self.content, boundary, part);
                Ok(self.set(content))
            }
            Encoding::UrlEncoded => Err(Error::configuration(
                "parts can only be added to a multipart body",
            )),
        }
    }

    /// Back to the request, with this body installed.
    #[must_use]
    pub fn back(self) -> Request {
        self.request.with_body(self.content)
    }

    fn push_pair(self, pair: &str) -> Self {
        let mut content = Vec::with_capacity(self.content.len() + pair.len() + 1);
        content.extend_from_slice(&self.content);
        if !content.is_empty() {
            content.push(b'&');
        }
        content.extend_from_slice(pair.as_bytes());
        self.set(content)
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::MockWire;

    const MULTIPART: &str = "multipart/form-data; boundary=AaB03x";

    fn request() -> Request {
        Request::new(MockWire::new(), "http://localhost:88/x").expect("valid request")
    }

    #[test]
    fn prints_json_in_body() {
        let_assert!(Ok(view) = request().body().set_json(&json!({"foo": "test 1"})));
        check!(view.get() == r#"{"foo":"test 1"}"#);
    }

    #[test]
    fn set_then_back_installs_content() {
        let request = request().body().set("hello").back();
        check!(request.content().as_ref() == b"hello");
        check!(request.body().get().into_owned() == "hello");
    }

    #[test]
    fn form_params_accumulate_url_encoded() {
        let body = request()
            .body()
            .form_param("name", "Jeff Lebowski")
            .form_param("drink", "white russian & co")
            .form_param("cur", "\u{20ac}");

        check!(body.get() == "name=Jeff+Lebowski&drink=white+russian+%26+co&cur=%E2%82%AC");
    }

    #[test]
    fn form_params_from_struct() {
        #[derive(serde::Serialize)]
        struct Login<'a> {
            user: &'a str,
            tags: Vec<&'a str>,
        }

        let login = Login {
            user: "bob",
            tags: vec!["a", "b"],
        };
        let_assert!(Ok(body) = request().body().form_param("x", "1").form_params(&login));
        check!(body.get() == "x=1&user=bob&tags=a&tags=b");
    }

    #[test]
    fn exception_when_missing_content_type() {
        let_assert!(Err(err) = request().multipart_body());
        check!(err.is_configuration());
        check!(err.to_string().contains("Content-Type: multipart/form-data requires boundary"));
    }

    #[test]
    fn exception_when_missing_boundary() {
        let request = request().with_header("Content-Type", "multipart/form-data");
        let_assert!(Err(err) = request.multipart_body());
        check!(err.to_string().contains("Content-Type: multipart/form-data requires boundary"));
    }

    #[test]
    fn multipart_form_params() {
        let_assert!(Ok(view) = request().with_header("Content-Type", MULTIPART).multipart_body());
        let request = view.form_param("a", "value").form_param("b", "val").back();

        check!(
            request.content().as_ref()
                == &b"--AaB03x\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nvalue\r\n\
                      --AaB03x\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\nval\r\n\
                      --AaB03x--\r\n"[..]
        );
    }

    #[test]
    fn multipart_struct_fields_become_parts() {
        #[derive(serde::Serialize)]
        struct Fields {
            first: u8,
            second: &'static str,
        }

        let_assert!(Ok(view) = request().with_header("Content-Type", MULTIPART).multipart_body());
        let_assert!(Ok(view) = view.form_params(&Fields { first: 1, second: "two words" }));

        let text = view.get();
        check!(text.contains("name=\"first\"\r\n\r\n1\r\n"));
        check!(text.contains("name=\"second\"\r\n\r\ntwo words\r\n"));
        check!(text.ends_with("--AaB03x--\r\n"));
    }

    #[test]
    fn file_parts_need_multipart() {
        let part = Part::file("doc", "notes.txt", "hello");

        let_assert!(Err(err) = request().body().part(&part));
        check!(err.is_configuration());

        let_assert!(Ok(view) = request().with_header("Content-Type", MULTIPART).multipart_body());
        let_assert!(Ok(view) = view.part(&part));
        check!(view.get().contains("filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n"));
    }
}
