//! URI references and the URI editing view.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::{Error, Request, Result};

/// Characters escaped in query keys and values: everything but RFC 3986
/// unreserved characters.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters escaped in path segments. `%` is handled apart so that valid
/// escapes survive.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// Used only to check that a relative reference is well formed.
const PROBE_BASE: &str = "http://reference.invalid/";

/// A URI reference: an absolute URI, or a relative (possibly empty) one.
///
/// Only absolute URIs can be dispatched; relative references exist so that a
/// request can be built and compared before it knows where it goes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    repr: Repr,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum Repr {
    Absolute(Url),
    Relative(String),
}

impl Uri {
    /// Parse an absolute URI or a relative reference.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidUrl`] if `input` is neither.
    pub fn parse(input: &str) -> Result<Self> {
        match Url::parse(input) {
            Ok(url) => Ok(Self::from(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(PROBE_BASE)?.join(input)?;
                Ok(Self {
                    repr: Repr::Relative(input.to_string()),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The reference as written on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match &self.repr {
            Repr::Absolute(url) => url.as_str(),
            Repr::Relative(raw) => raw,
        }
    }

    /// The absolute URI, if this is one.
    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match &self.repr {
            Repr::Absolute(url) => Some(url),
            Repr::Relative(_) => None,
        }
    }

    /// Returns `true` for an absolute URI.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        matches!(self.repr, Repr::Absolute(_))
    }

    /// Path part, without query or fragment.
    #[must_use]
    pub fn path(&self) -> &str {
        match &self.repr {
            Repr::Absolute(url) => url.path(),
            Repr::Relative(raw) => split_reference(raw).0,
        }
    }

    /// Query part, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        match &self.repr {
            Repr::Absolute(url) => url.query(),
            Repr::Relative(raw) => split_reference(raw).1,
        }
    }

    fn append_path(&mut self, segment: &str) {
        match &mut self.repr {
            Repr::Absolute(url) => {
                // A URI that cannot be a base has no hierarchical path.
                if url.cannot_be_a_base() {
                    return;
                }
                if let Some(path) = appended_path(url.path(), segment) {
                    url.set_path(&path);
                }
            }
            Repr::Relative(raw) => {
                let (path, query, fragment) = split_reference(raw);
                if let Some(path) = appended_path(path, segment) {
                    *raw = join_reference(&path, query, fragment);
                }
            }
        }
    }

    fn append_query(&mut self, pair: &str) {
        let query = match self.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{pair}"),
            _ => pair.to_string(),
        };
        match &mut self.repr {
            Repr::Absolute(url) => url.set_query(Some(&query)),
            Repr::Relative(raw) => {
                let (path, _, fragment) = split_reference(raw);
                *raw = join_reference(path, Some(&query), fragment);
            }
        }
    }
}

impl From<Url> for Uri {
    fn from(url: Url) -> Self {
        Self {
            repr: Repr::Absolute(url),
        }
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Split a relative reference into path, query and fragment.
fn split_reference(raw: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, fragment) = match raw.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (raw, None),
    };
    match rest.split_once('?') {
        Some((path, query)) => (path, Some(query), fragment),
        None => (rest, None, fragment),
    }
}

fn join_reference(path: &str, query: Option<&str>, fragment: Option<&str>) -> String {
    let mut raw = path.to_string();
    if let Some(query) = query {
        raw.push('?');
        raw.push_str(query);
    }
    if let Some(fragment) = fragment {
        raw.push('#');
        raw.push_str(fragment);
    }
    raw
}

/// `path` extended with the non-empty segments of `segment`, one slash apart.
///
/// `None` when `segment` holds no segment at all.
fn appended_path(path: &str, segment: &str) -> Option<String> {
    let encoded: Vec<String> = segment
        .split('/')
        .filter(|s| !s.is_empty())
        .map(encode_segment)
        .collect();
    if encoded.is_empty() {
        return None;
    }

    let joined = encoded.join("/");
    Some(if path.is_empty() {
        if segment.starts_with('/') {
            format!("/{joined}")
        } else {
            joined
        }
    } else {
        format!("{}/{joined}", path.trim_end_matches('/'))
    })
}

/// Percent-encode one path segment, keeping valid `%XX` escapes.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(at) = rest.find('%') {
        let (plain, tail) = rest.split_at(at);
        out.extend(utf8_percent_encode(plain, PATH_SEGMENT));

        let escape = tail
            .get(..3)
            .filter(|e| e.bytes().skip(1).all(|b| b.is_ascii_hexdigit()));
        match escape {
            Some(escape) => {
                out.push_str(escape);
                rest = tail.get(3..).unwrap_or_default();
            }
            None => {
                out.push_str("%25");
                rest = tail.get(1..).unwrap_or_default();
            }
        }
    }
    out.extend(utf8_percent_encode(rest, PATH_SEGMENT));
    out
}

/// Fluent view over the URI of a [`Request`].
///
/// Obtained with [`Request::uri`]; [`UriView::back`] returns the request with
/// the edited URI installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriView {
    request: Request,
    uri: Uri,
}

impl UriView {
    pub(crate) fn new(request: Request) -> Self {
        let uri = request.url().clone();
        Self { request, uri }
    }

    /// Current URI.
    #[must_use]
    pub fn get(&self) -> &Uri {
        &self.uri
    }

    /// Replace the whole URI.
    ///
    /// # Errors
    ///
    /// Fails if `uri` is neither an absolute URI nor a relative reference.
    pub fn set(self, uri: &str) -> Result<Self> {
        Ok(Self {
            uri: Uri::parse(uri)?,
            ..self
        })
    }

    /// Append path segments.
    ///
    /// `segment` may hold several `/`-separated segments; leading, trailing and
    /// doubled slashes are dropped so exactly one slash separates segments.
    /// Valid `%XX` escapes are kept as they are.
    #[must_use]
    pub fn path(mut self, segment: &str) -> Self {
        self.uri.append_path(segment);
        self
    }

    /// Append one query parameter; an empty value renders as `key=`.
    #[must_use]
    pub fn query_param(mut self, key: &str, value: &str) -> Self {
        let pair = format!(
            "{}={}",
            utf8_percent_encode(key, QUERY_COMPONENT),
            utf8_percent_encode(value, QUERY_COMPONENT)
        );
        self.uri.append_query(&pair);
        self
    }

    /// Append every pair, in iteration order.
    #[must_use]
    pub fn query_params<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        params.into_iter().fold(self, |view, (key, value)| {
            view.query_param(key.as_ref(), value.as_ref())
        })
    }

    /// Replace the port.
    ///
    /// References without a host have no port and are left unchanged.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        if let Repr::Absolute(url) = &mut self.uri.repr {
            // Fails only without a host, leaving the URI as it was.
            let _ = url.set_port(Some(port));
        }
        self
    }

    /// Set the user-info part of the authority.
    ///
    /// `info` is split at the first `:` into user and password. Reserved and
    /// non-ASCII characters are percent-encoded, the separator is kept.
    /// An empty `info` removes the user-info. References without a host are
    /// left unchanged.
    #[must_use]
    pub fn user_info(mut self, info: &str) -> Self {
        let (user, password) = match info.split_once(':') {
            Some((user, password)) => (user, Some(password)),
            None => (info, None),
        };
        if let Repr::Absolute(url) = &mut self.uri.repr {
            // Fails only without a host, leaving the URI as it was.
            let _ = url.set_username(user);
            let _ = url.set_password(password);
        }
        self
    }

    /// Back to the request, with this URI installed.
    #[must_use]
    pub fn back(self) -> Request {
        self.request.replace_uri(self.uri)
    }
}
