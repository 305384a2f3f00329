//! The enable/disable boundary and span guards.
//!
//! All tracing entry points go through [`Tracer`], a cheap-to-clone
//! capability handle that either carries live configuration or nothing.
//! Every call on a disabled handle is a no-op, so instrumentation can be
//! left in place unconditionally and switched on at setup time.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{field, Span};

use crate::config::TracingConfig;
use crate::params::BindValue;
use crate::parser::Classification;

/// Setup-time configuration failure. Reported once, from [`Tracer::setup`];
/// no other call in the crate can fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("application name is empty")]
    MissingAppName,
    #[error("license key is empty")]
    MissingLicense,
}

#[derive(Debug)]
struct Inner {
    app_name: String,
    config: TracingConfig,
}

/// Handle to the tracing capability.
///
/// Constructed once by [`Tracer::setup`] and cloned into whatever needs to
/// emit spans. A handle from [`Tracer::disabled`] (or `Default`) makes every
/// operation a passthrough that records nothing.
#[derive(Debug, Clone, Default)]
pub struct Tracer {
    inner: Option<Arc<Inner>>,
}

impl Tracer {
    /// Configure tracing for the application.
    ///
    /// Both the application name and the license key must be non-empty; the
    /// license itself is only validated here, since span export is owned by
    /// whatever `tracing` subscriber the embedding application installs.
    pub fn setup(
        app_name: impl Into<String>,
        license: &str,
        config: TracingConfig,
    ) -> Result<Self, SetupError> {
        let app_name = app_name.into();
        if app_name.is_empty() {
            return Err(SetupError::MissingAppName);
        }
        if license.is_empty() {
            return Err(SetupError::MissingLicense);
        }
        Ok(Self {
            inner: Some(Arc::new(Inner { app_name, config })),
        })
    }

    /// A handle whose every operation is a no-op.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether this handle was configured via [`Tracer::setup`].
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// The active configuration, or `None` for a disabled handle.
    pub fn config(&self) -> Option<&TracingConfig> {
        self.inner.as_deref().map(|inner| &inner.config)
    }

    /// Open the correlation context for one logical request or job.
    ///
    /// Datastore segments started under the returned transaction become
    /// child spans of it. Call [`Transaction::end`] when the work finishes.
    pub fn start_transaction(&self, name: &str) -> Transaction {
        let inner = match &self.inner {
            Some(inner) => inner,
            None => return Transaction::noop(),
        };

        let span = tracing::info_span!(
            "transaction",
            otel.name = %name,
            service.name = %inner.app_name,
            duration_ms = field::Empty,
            otel.status_code = field::Empty,
        );
        Transaction {
            span: Some(span),
            start: Instant::now(),
        }
    }

    /// Open a datastore span for one SQL statement.
    ///
    /// The statement is classified into an operation and table name, and the
    /// bound parameters are flattened to `?_N` keys. Returns a no-op guard
    /// when either this handle is disabled or `tx` is not recording.
    pub fn start_segment(&self, tx: &Transaction, sql: &str, params: &[BindValue]) -> Segment {
        let (inner, tx_span) = match (&self.inner, &tx.span) {
            (Some(inner), Some(span)) => (inner, span),
            _ => return Segment::noop(),
        };
        let config = &inner.config;

        let classification = Classification::classify(sql, params);
        let span_name = classification.span_name();

        let span = tracing::info_span!(
            parent: tx_span,
            "db.query",
            otel.name = field::Empty,
            db.system = "mysql",
            db.operation = %classification.operation,
            db.sql.table = field::Empty,
            db.statement = field::Empty,
            db.params = field::Empty,
            db.name = field::Empty,
            server.address = %config.server_address,
            server.port = config.server_port as i64,
            duration_ms = field::Empty,
            otel.status_code = field::Empty,
            error.message = field::Empty,
            slow_query = field::Empty,
        );

        if !span_name.is_empty() {
            span.record("otel.name", span_name.as_str());
        }
        if !classification.collection.is_empty() {
            span.record("db.sql.table", classification.collection.as_str());
        }
        if let Some(db_name) = &config.database_name {
            span.record("db.name", db_name.as_str());
        }
        if config.log_statements {
            span.record("db.statement", sql);
        }
        if config.log_parameters && !classification.parameters.is_empty() {
            span.record("db.params", field::debug(&classification.parameters));
        }

        Segment {
            span: Some(span),
            start: Instant::now(),
            slow_threshold: config.slow_query_threshold,
        }
    }

    /// Open a span for one outbound HTTP call made on behalf of `tx`.
    pub fn start_external_segment(&self, tx: &Transaction, method: &str, url: &str) -> Segment {
        let (inner, tx_span) = match (&self.inner, &tx.span) {
            (Some(inner), Some(span)) => (inner, span),
            _ => return Segment::noop(),
        };

        let name = format!("{} {}", method, url);
        let span = tracing::info_span!(
            parent: tx_span,
            "http.client",
            otel.name = %name,
            http.request.method = %method,
            url.full = %url,
            duration_ms = field::Empty,
            otel.status_code = field::Empty,
            error.message = field::Empty,
            slow_query = field::Empty,
        );

        Segment {
            span: Some(span),
            start: Instant::now(),
            slow_threshold: inner.config.slow_query_threshold,
        }
    }
}

/// Correlation context for one logical request or operation.
#[must_use = "transactions record nothing unless ended"]
#[derive(Debug)]
pub struct Transaction {
    span: Option<Span>,
    start: Instant,
}

impl Transaction {
    /// A transaction that records nothing, for code paths outside any tracer.
    pub fn noop() -> Self {
        Self {
            span: None,
            start: Instant::now(),
        }
    }

    /// Whether segments started under this transaction will record.
    pub fn is_recording(&self) -> bool {
        self.span.is_some()
    }

    /// Close the transaction, recording its duration.
    pub fn end(self) {
        if let Some(span) = &self.span {
            span.record("duration_ms", self.start.elapsed().as_millis() as i64);
            span.record("otel.status_code", "OK");
        }
    }
}

/// Guard for one timed unit of work (a datastore call or an outbound
/// HTTP call). Close it with [`Segment::end`] or [`Segment::fail`].
#[must_use = "segments record nothing unless ended"]
#[derive(Debug)]
pub struct Segment {
    span: Option<Span>,
    start: Instant,
    slow_threshold: Duration,
}

impl Segment {
    fn noop() -> Self {
        Self {
            span: None,
            start: Instant::now(),
            slow_threshold: Duration::ZERO,
        }
    }

    /// Whether this segment is backed by a live span.
    pub fn is_recording(&self) -> bool {
        self.span.is_some()
    }

    /// Close the segment as successful.
    pub fn end(self) {
        if let Some(span) = &self.span {
            self.record_duration(span);
            span.record("otel.status_code", "OK");
        }
    }

    /// Close the segment as failed, recording the error message.
    pub fn fail(self, error: impl fmt::Display) {
        if let Some(span) = &self.span {
            self.record_duration(span);
            span.record("otel.status_code", "ERROR");
            span.record("error.message", error.to_string().as_str());
            tracing::error!(parent: span, error = %error, "datastore call failed");
        }
    }

    fn record_duration(&self, span: &Span) {
        let elapsed = self.start.elapsed();
        let duration_ms = elapsed.as_millis() as i64;
        span.record("duration_ms", duration_ms);

        if elapsed > self.slow_threshold {
            span.record("slow_query", true);
            tracing::warn!(
                parent: span,
                duration_ms = duration_ms,
                threshold_ms = self.slow_threshold.as_millis() as i64,
                "slow query detected"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BindValue;
    use std::io::Write;
    use std::sync::Mutex;

    fn with_subscriber(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, f);
    }

    #[derive(Clone)]
    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` under a subscriber whose formatted output is captured.
    fn capture_output(f: impl FnOnce()) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let writer = SharedWriter(buf.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let captured = buf.lock().unwrap().clone();
        String::from_utf8(captured).unwrap()
    }

    #[test]
    fn test_setup_rejects_empty_app_name() {
        let err = Tracer::setup("", "license-key", TracingConfig::default()).unwrap_err();
        assert_eq!(err, SetupError::MissingAppName);
    }

    #[test]
    fn test_setup_rejects_empty_license() {
        let err = Tracer::setup("my-app", "", TracingConfig::default()).unwrap_err();
        assert_eq!(err, SetupError::MissingLicense);
    }

    #[test]
    fn test_disabled_tracer_is_a_passthrough() {
        let tracer = Tracer::disabled();
        assert!(!tracer.is_enabled());
        assert!(tracer.config().is_none());

        let tx = tracer.start_transaction("GET /users");
        assert!(!tx.is_recording());

        let seg = tracer.start_segment(&tx, "SELECT * FROM users", &[]);
        assert!(!seg.is_recording());

        seg.end();
        tx.end();
    }

    #[test]
    fn test_default_tracer_is_disabled() {
        assert!(!Tracer::default().is_enabled());
    }

    #[test]
    fn test_enabled_tracer_records() {
        with_subscriber(|| {
            let tracer =
                Tracer::setup("my-app", "license-key", TracingConfig::development()).unwrap();
            assert!(tracer.is_enabled());

            let tx = tracer.start_transaction("POST /orders");
            assert!(tx.is_recording());

            let seg = tracer.start_segment(
                &tx,
                "INSERT INTO orders (id) VALUES (?)",
                &[BindValue::from(7)],
            );
            assert!(seg.is_recording());
            seg.end();

            let ext = tracer.start_external_segment(&tx, "GET", "http://payments.internal/ok");
            assert!(ext.is_recording());
            ext.end();

            tx.end();
        });
    }

    #[test]
    fn test_failed_segment_records_error() {
        let output = capture_output(|| {
            let tracer =
                Tracer::setup("my-app", "license-key", TracingConfig::default()).unwrap();
            let tx = tracer.start_transaction("GET /users");
            let seg = tracer.start_segment(&tx, "SELECT * FROM users WHERE id = ?", &[]);
            assert!(seg.is_recording());
            seg.fail("connection reset by peer");
            tx.end();
        });
        assert!(output.contains("datastore call failed"), "output: {output}");
        assert!(output.contains("connection reset by peer"), "output: {output}");
    }

    #[test]
    fn test_slow_query_warning_past_threshold() {
        let output = capture_output(|| {
            let config = TracingConfig::default().with_slow_query_threshold(Duration::ZERO);
            let tracer = Tracer::setup("my-app", "license-key", config).unwrap();
            let tx = tracer.start_transaction("GET /reports");
            let seg = tracer.start_segment(&tx, "SELECT * FROM reports", &[]);
            std::thread::sleep(Duration::from_millis(2));
            seg.end();
            tx.end();
        });
        assert!(output.contains("slow query detected"), "output: {output}");
    }

    #[test]
    fn test_fast_query_does_not_warn() {
        let output = capture_output(|| {
            let tracer =
                Tracer::setup("my-app", "license-key", TracingConfig::default()).unwrap();
            let tx = tracer.start_transaction("GET /users");
            tracer.start_segment(&tx, "SELECT 1", &[]).end();
            tx.end();
        });
        assert!(!output.contains("slow query detected"), "output: {output}");
    }

    #[test]
    fn test_segment_under_noop_transaction_is_noop() {
        with_subscriber(|| {
            let tracer =
                Tracer::setup("my-app", "license-key", TracingConfig::default()).unwrap();
            let tx = Transaction::noop();
            let seg = tracer.start_segment(&tx, "SELECT 1", &[]);
            assert!(!seg.is_recording());
            seg.fail("boom");
        });
    }
}
