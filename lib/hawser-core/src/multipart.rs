//! Multipart form data support.
//!
//! A multipart body is always kept closed: appending a [`Part`] strips the
//! closing `--boundary--` delimiter, writes the new part and closes the
//! document again. The boundary itself comes from the request's
//! `Content-Type: multipart/form-data; boundary=<token>` header.

use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Headers, Result};

const MISSING_BOUNDARY: &str = "Content-Type: multipart/form-data requires boundary";

/// A single part in a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// Create a plain form field.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Create a file part with filename.
    ///
    /// The content type is guessed from the filename extension, or defaults
    /// to `application/octet-stream` if unknown.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename);
        Self {
            name: name.into(),
            filename: Some(filename),
            content_type: Some(content_type.to_string()),
            data: data.into(),
        }
    }

    /// Set the content type for this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Get the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Get the content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Get the part data.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Guess the content type from a filename extension.
fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Extract the multipart boundary declared in `Content-Type`.
///
/// Fails when the header is missing, is not a `multipart/*` type, or has no
/// non-empty `boundary` parameter (quoted or not).
pub(crate) fn boundary(headers: &Headers) -> Result<String> {
    let content_type = headers
        .get("Content-Type")
        .ok_or_else(|| Error::configuration(MISSING_BOUNDARY))?;

    let mut params = content_type.split(';');
    let is_multipart = params.next().is_some_and(|media| {
        media
            .trim()
            .to_ascii_lowercase()
            .starts_with("multipart/")
    });
    if !is_multipart {
        return Err(Error::configuration(MISSING_BOUNDARY));
    }

    params
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::configuration(MISSING_BOUNDARY))
}

/// Append `part` to an encoded multipart document, keeping it closed.
pub(crate) fn append(content: &[u8], boundary: &str, part: &Part) -> Bytes {
    let closing = closing(boundary);
    let open = content.strip_suffix(closing.as_bytes()).unwrap_or(content);

    let mut buf = BytesMut::with_capacity(open.len() + part.data.len() + 128);
    buf.put_slice(open);

    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"\r\n");

    buf.put_slice(b"Content-Disposition: form-data; name=\"");
    buf.put_slice(escape_quoted(&part.name).as_bytes());
    buf.put_slice(b"\"");
    if let Some(filename) = &part.filename {
        buf.put_slice(b"; filename=\"");
        buf.put_slice(escape_quoted(filename).as_bytes());
        buf.put_slice(b"\"");
    }
    buf.put_slice(b"\r\n");

    if let Some(content_type) = &part.content_type {
        buf.put_slice(b"Content-Type: ");
        buf.put_slice(escape_quoted(content_type).as_bytes());
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(b"\r\n");
    buf.put_slice(&part.data);
    buf.put_slice(b"\r\n");

    buf.put_slice(closing.as_bytes());
    buf.freeze()
}

/// Percent-encode `"`, CR and LF so a value stays inside its quoted string
/// and on its header line.
fn escape_quoted(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '\r', '\n']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn closing(boundary: &str) -> String {
    format!("--{boundary}--\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(value: &str) -> Headers {
        [("Content-Type", value)].into_iter().collect()
    }

    #[test]
    fn boundary_from_header() {
        let headers = content_type("multipart/form-data; boundary=AaB03x");
        assert_eq!(boundary(&headers).expect("boundary"), "AaB03x");
    }

    #[test]
    fn boundary_quoted_and_case_insensitive() {
        let headers = content_type(r#"Multipart/Form-Data; charset=utf-8; Boundary="x-y-z""#);
        assert_eq!(boundary(&headers).expect("boundary"), "x-y-z");
    }

    #[test]
    fn boundary_missing_header() {
        let err = boundary(&Headers::new()).expect_err("no content type");
        assert!(err.is_configuration());
        assert!(err.to_string().contains(MISSING_BOUNDARY));
    }

    #[test]
    fn boundary_missing_parameter() {
        for value in [
            "multipart/form-data",
            "multipart/form-data; boundary=",
            "multipart/form-data; charset=utf-8",
            "application/x-www-form-urlencoded; boundary=abc",
        ] {
            let err = boundary(&content_type(value)).expect_err(value);
            assert!(err.is_configuration(), "{value}");
        }
    }

    #[test]
    fn append_keeps_document_closed() {
        let first = append(b"", "XyZ", &Part::new("a", "1"));
        assert_eq!(
            first.as_ref(),
            b"--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--XyZ--\r\n"
        );

        let second = append(&first, "XyZ", &Part::new("b", "2"));
        assert_eq!(
            second.as_ref(),
            b"--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n\
              --XyZ\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\n2\r\n--XyZ--\r\n"
        );
    }

    #[test]
    fn append_file_part() {
        let part = Part::file("avatar", "photo.JPG", &b"\xff\xd8"[..]);
        assert_eq!(part.content_type(), Some("image/jpeg"));

        let body = append(b"", "b", &part);
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("name=\"avatar\"; filename=\"photo.JPG\"\r\n"));
        assert!(text.contains("Content-Type: image/jpeg\r\n"));
    }

    #[test]
    fn append_escapes_names_that_would_break_the_part() {
        let part = Part::file("a\"\r\nX-Injected: 1", "evil\".txt", "x")
            .with_content_type("text/plain\r\nX-Other: 2");

        let body = append(b"", "b", &part);
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains(
            "name=\"a%22%0D%0AX-Injected: 1\"; filename=\"evil%22.txt\"\r\n"
        ));
        assert!(text.contains("Content-Type: text/plain%0D%0AX-Other: 2\r\n"));
        assert!(!text.contains("\r\nX-Injected"));
        assert!(!text.contains("\r\nX-Other"));
    }

    #[test]
    fn append_keeps_non_ascii_names() {
        let body = append(b"", "b", &Part::file("f", "caf\u{e9}.txt", "x"));
        assert!(String::from_utf8_lossy(&body).contains("filename=\"caf\u{e9}.txt\""));
    }

    #[test]
    fn guess_content_type_fallback() {
        assert_eq!(guess_content_type("archive.tar.zip"), "application/zip");
        assert_eq!(guess_content_type("README"), "application/octet-stream");
    }
}
