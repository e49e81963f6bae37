//! In-process mock transport for tests.
//!
//! [`MockWire`] records every [`Call`] it receives and answers from a FIFO
//! script, falling back to a default response once the script runs out.
//! Clones share the same record and script, so a test can keep one handle
//! while the request owns another.
//!
//! ```
//! use hawser_core::{Headers, MockWire, Request, Response};
//!
//! let mock = MockWire::new().answer(Response::new(201, Headers::new(), "done".into()));
//! let response = Request::new(mock.clone(), "http://localhost/items")?.dispatch()?;
//!
//! assert_eq!(response.status(), 201);
//! assert_eq!(mock.calls().len(), 1);
//! # Ok::<(), hawser_core::Error>(())
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::{Call, Error, Headers, Response, Result, Wire};

#[derive(Debug, Clone)]
enum Answer {
    Respond(Response),
    Fail(String),
    Echo,
}

#[derive(Debug)]
struct State {
    calls: Vec<Call>,
    script: VecDeque<Answer>,
    fallback: Answer,
}

/// Mock wire recording calls and replaying scripted answers.
#[derive(Debug, Clone)]
pub struct MockWire {
    state: Arc<Mutex<State>>,
}

impl Default for MockWire {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWire {
    /// A mock answering `200` with an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(Answer::Respond(Response::new(200, Headers::new(), Bytes::new())))
    }

    /// A mock answering `200` with the call's headers and body.
    #[must_use]
    pub fn echo() -> Self {
        Self::with_fallback(Answer::Echo)
    }

    /// A mock whose every unscripted call fails with a connection error.
    #[must_use]
    pub fn refusing(message: impl Into<String>) -> Self {
        Self::with_fallback(Answer::Fail(message.into()))
    }

    fn with_fallback(fallback: Answer) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                script: VecDeque::new(),
                fallback,
            })),
        }
    }

    /// Queue a response for the next unanswered call.
    #[must_use]
    pub fn answer(self, response: Response) -> Self {
        self.push(Answer::Respond(response))
    }

    /// Queue a connection failure for the next unanswered call.
    #[must_use]
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Answer::Fail(message.into()))
    }

    /// Every call received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Remove and return the oldest recorded call.
    #[must_use]
    pub fn take(&self) -> Option<Call> {
        let mut state = self.lock();
        (!state.calls.is_empty()).then(|| state.calls.remove(0))
    }

    fn push(self, answer: Answer) -> Self {
        self.lock().script.push_back(answer);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Wire for MockWire {
    fn send(&self, call: &Call) -> Result<Response> {
        let answer = {
            let mut state = self.lock();
            state.calls.push(call.clone());
            state
                .script
                .pop_front()
                .unwrap_or_else(|| state.fallback.clone())
        };

        match answer {
            Answer::Respond(response) => Ok(response),
            Answer::Fail(message) => Err(Error::connection(message)),
            Answer::Echo => Ok(Response::new(
                200,
                call.headers().clone(),
                call.body().clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::Method;

    fn call(path: &str) -> Call {
        let url = Url::parse("http://localhost/")
            .and_then(|base| base.join(path))
            .expect("valid URL");
        Call::new(Method::Get, url, Headers::new(), Bytes::new())
    }

    #[test]
    fn records_calls_in_order() {
        let mock = MockWire::new();
        mock.send(&call("a")).expect("a");
        mock.send(&call("b")).expect("b");

        let paths: Vec<_> = mock.calls().iter().map(|c| c.url().path().to_string()).collect();
        assert_eq!(paths, ["/a", "/b"]);

        assert_eq!(mock.take().map(|c| c.url().path().to_string()).as_deref(), Some("/a"));
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn script_then_fallback() {
        let mock = MockWire::new()
            .answer(Response::new(503, Headers::new(), Bytes::new()))
            .fail("boom");

        assert_eq!(mock.send(&call("x")).expect("scripted").status(), 503);
        let err = mock.send(&call("x")).expect_err("scripted failure");
        assert!(err.is_connection());
        assert_eq!(mock.send(&call("x")).expect("fallback").status(), 200);
    }

    #[test]
    fn echo_returns_headers_and_body() {
        let mock = MockWire::echo();
        let headers: Headers = [("Authorization", "Basic x")].into_iter().collect();
        let call = call("e").with_headers(headers);

        let response = mock.send(&call).expect("echo");
        assert_eq!(response.header("authorization"), Some("Basic x"));
    }

    #[test]
    fn refusing_always_fails() {
        let mock = MockWire::refusing("connection refused");
        for _ in 0..3 {
            assert!(mock.send(&call("r")).expect_err("refused").is_connection());
        }
        assert_eq!(mock.calls().len(), 3);
    }

    #[test]
    fn clones_share_the_record() {
        let mock = MockWire::new();
        let handle = mock.clone();
        mock.send(&call("s")).expect("sent");
        assert_eq!(handle.calls().len(), 1);
    }
}
