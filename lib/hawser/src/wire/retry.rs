//! Retry decorator.
//!
//! Re-sends the same call when the inner wire fails with a transport error
//! or answers with a retryable status, up to a fixed number of attempts.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{Call, Error, Layer, Response, Result, Wire};

/// Default number of attempts, the first one included.
pub const DEFAULT_ATTEMPTS: usize = 3;

/// A simple retry policy for calls.
///
/// By default, retries:
/// - Transport errors (connection, TLS, timeout, protocol), whatever the method
/// - 5xx server errors, for idempotent methods
/// - 429 Too Many Requests, for idempotent methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: usize,
    statuses: Option<Arc<[u16]>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Create a policy making at most `attempts` calls in total.
    ///
    /// Zero is treated as one: the call is always attempted.
    #[must_use]
    pub fn new(attempts: usize) -> Self {
        Self {
            attempts: attempts.max(1),
            statuses: None,
        }
    }

    /// Retry exactly these statuses instead of 5xx and 429.
    ///
    /// An empty list disables status-based retries.
    #[must_use]
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            statuses: Some(statuses.into_iter().collect()),
            ..self
        }
    }

    /// Total number of attempts.
    #[must_use]
    pub const fn attempts(&self) -> usize {
        self.attempts
    }

    /// Returns `true` if the response should be retried.
    fn should_retry_response(&self, response: &Response) -> bool {
        let status = response.status();
        match &self.statuses {
            Some(statuses) => statuses.contains(&status),
            None => status >= 500 || status == 429,
        }
    }

    /// Returns `true` if the error should be retried.
    fn should_retry_error(error: &Error) -> bool {
        error.is_transport()
    }

    fn should_retry(&self, call: &Call, result: &Result<Response>) -> bool {
        match result {
            Ok(response) => call.method().is_idempotent() && self.should_retry_response(response),
            Err(error) => Self::should_retry_error(error),
        }
    }
}

/// Layer that retries failed calls.
///
/// # Example
///
/// ```
/// use hawser::{MockWire, Request};
/// use hawser::wire::RetryLayer;
///
/// let mock = MockWire::new().fail("reset by peer");
/// let response = Request::new(mock.clone(), "http://localhost/")?
///     .through(RetryLayer::new(2))
///     .dispatch()?;
///
/// assert_eq!(response.status(), 200);
/// assert_eq!(mock.calls().len(), 2);
/// # Ok::<(), hawser::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryLayer {
    policy: RetryPolicy,
}

impl RetryLayer {
    /// Retry with the default policy and `attempts` total attempts.
    #[must_use]
    pub fn new(attempts: usize) -> Self {
        Self::with_policy(RetryPolicy::new(attempts))
    }

    /// Retry following a custom policy.
    #[must_use]
    pub const fn with_policy(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl<W> Layer<W> for RetryLayer {
    type Service = RetryWire<W>;

    fn layer(&self, inner: W) -> Self::Service {
        RetryWire {
            inner,
            policy: self.policy.clone(),
        }
    }
}

/// Wire that retries failed calls.
#[derive(Debug, Clone)]
pub struct RetryWire<W> {
    inner: W,
    policy: RetryPolicy,
}

impl<W: Wire> Wire for RetryWire<W> {
    fn send(&self, call: &Call) -> Result<Response> {
        let mut attempt = 1;
        loop {
            let result = self.inner.send(call);
            if !self.policy.should_retry(call, &result) {
                return result;
            }
            if attempt >= self.policy.attempts {
                warn!(attempts = attempt, url = %call.url(), "giving up after retries");
                return result;
            }

            match &result {
                Ok(response) => debug!(attempt, status = response.status(), "retrying"),
                Err(err) => debug!(attempt, error = %err, "retrying"),
            }
            attempt += 1;
        }
    }
}
