use std::marker::PhantomData;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

/// Structured log entry for testing and analysis
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

/// Test subscriber that captures log entries for verification
#[derive(Debug, Clone)]
pub struct TestLogSubscriber {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Default for TestLogSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLogSubscriber {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Entries whose message contains `needle`.
    pub fn matching(&self, needle: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.message.contains(needle))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn into_layer<S>(self) -> TestLayer<S>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        TestLayer {
            subscriber: self,
            _phantom: PhantomData,
        }
    }
}

pub struct TestLayer<S> {
    subscriber: TestLogSubscriber,
    _phantom: PhantomData<S>,
}

impl<S> Layer<S> for TestLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let entry = LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        };

        if let Ok(mut entries) = self.subscriber.entries.lock() {
            entries.push(entry);
        }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value_str = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value_str);
        } else {
            self.fields.push((field.name().to_string(), value_str));
        }
    }
}

/// Output style for process-wide logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Reads a `DICEHALL_LOG` value: `json` selects JSON lines, anything else is pretty.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
/// Returns false when a subscriber was already installed.
pub fn init_logging(format: LogFormat) -> bool {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dicehall_table=debug"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Pretty => builder.with_line_number(true).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

/// Captures logs for the whole test binary and clears them on every call.
pub fn init_test_logging() -> TestLogSubscriber {
    static SUBSCRIBER: OnceLock<TestLogSubscriber> = OnceLock::new();
    static REGISTERED: OnceLock<()> = OnceLock::new();

    let subscriber = SUBSCRIBER.get_or_init(TestLogSubscriber::new);

    REGISTERED.get_or_init(|| {
        let layer = subscriber.clone().into_layer::<Registry>();
        let registry = Registry::default().with(layer);
        // another global subscriber wins; captured entries then stay empty
        let _ = tracing::subscriber::set_global_default(registry);
    });

    subscriber.clear();
    subscriber.clone()
}
