//! Call/response logging decorator.
//!
//! Logs calls and their outcome using the `tracing` crate, then hands back the
//! inner result untouched.

use std::time::Instant;

use tracing::{Level, debug, info, span, warn};

use crate::{Call, Layer, Response, Result, Wire};

/// Log level for the logging decorator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level (call and response details).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

/// Layer that adds call/response logging.
///
/// # Example
///
/// ```
/// use hawser::{MockWire, Request};
/// use hawser::wire::LoggingLayer;
///
/// let response = Request::new(MockWire::new(), "http://localhost/")?
///     .through(LoggingLayer::new())
///     .dispatch()?;
/// assert_eq!(response.status(), 200);
/// # Ok::<(), hawser::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub const fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<W> Layer<W> for LoggingLayer {
    type Service = LoggingWire<W>;

    fn layer(&self, inner: W) -> Self::Service {
        LoggingWire {
            inner,
            level: self.level,
        }
    }
}

/// Wire that logs calls and responses.
#[derive(Debug, Clone)]
pub struct LoggingWire<W> {
    inner: W,
    level: LogLevel,
}

impl<W: Wire> Wire for LoggingWire<W> {
    fn send(&self, call: &Call) -> Result<Response> {
        let method = call.method();
        let url = call.url();
        let span = span!(Level::INFO, "http_call", %method, %url);
        let _entered = span.enter();

        match self.level {
            LogLevel::Debug => {
                debug!(
                    headers = ?call.headers(),
                    body_len = call.body().len(),
                    "sending call"
                );
            }
            LogLevel::Info => info!("sending call"),
        }

        let start = Instant::now();
        let result = self.inner.send(call);
        // Saturating conversion to u64
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(response) => {
                let status = response.status();
                if response.is_success() {
                    info!(status, elapsed_ms, "call completed");
                } else {
                    warn!(status, elapsed_ms, "call completed with HTTP error");
                }
                if self.level == LogLevel::Debug {
                    debug!(headers = ?response.headers(), body_len = response.body().len(), "response");
                }
            }
            Err(err) => warn!(error = %err, elapsed_ms, "call failed"),
        }

        result
    }
}
