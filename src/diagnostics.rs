use std::fmt;

/// Receives diagnostic messages from an upload session.
pub trait DiagnosticSink: Send {
    fn emit(&self, correlation_id: &str, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str, &str) + Send,
{
    fn emit(&self, correlation_id: &str, message: &str) {
        self(correlation_id, message)
    }
}

/// Forwards session diagnostics to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, correlation_id: &str, message: &str) {
        tracing::debug!(correlation_id, "{message}");
    }
}

/// Per-session diagnostic configuration: a correlation id threaded through
/// every message, and an optional sink. Without a sink nothing is formatted.
#[derive(Default)]
pub struct Diagnostics {
    correlation_id: String,
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl Diagnostics {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub(crate) fn emit(&self, message: impl FnOnce() -> String) {
        if let Some(sink) = &self.sink {
            sink.emit(&self.correlation_id, &message());
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("correlation_id", &self.correlation_id)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
