use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::{format::Writer, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Span field shown in the collection column of the pretty format.
const COLLECTION_FIELD: &str = "collection";

/// Fields recorded on a span, stored in the span's extensions.
#[derive(Debug, Clone, Default)]
pub struct SpanFields(pub BTreeMap<String, String>);

struct SpanFieldVisitor<'a>(&'a mut BTreeMap<String, String>);

impl Visit for SpanFieldVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value).trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

/// Collects span fields so formatters can look them up.
pub struct FieldCollectorLayer;

impl<S> Layer<S> for FieldCollectorLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, id: &tracing::span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = SpanFields::default();
        attrs.record(&mut SpanFieldVisitor(&mut fields.0));
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &tracing::span::Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        let mut fields = extensions.remove::<SpanFields>().unwrap_or_default();
        values.record(&mut SpanFieldVisitor(&mut fields.0));
        extensions.insert(fields);
    }
}

/// Console format: `timestamp | LEVEL | collection | message (fields)`.
pub struct PrettyFormatter {
    ansi: bool,
}

impl PrettyFormatter {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    fn paint(&self, color: &'static str) -> &'static str {
        if self.ansi {
            color
        } else {
            ""
        }
    }
}

#[derive(Default)]
struct EventFieldVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for EventFieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let value = format!("{:?}", value).trim_matches('"').to_string();
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }
}

impl<S, N> FormatEvent<S, N> for PrettyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let meta = event.metadata();
        let now = Utc::now().format("%y-%m-%d %H:%M:%S").to_string();

        let ts_color = self.paint("\x1b[96m");
        let level_color = self.paint(match *meta.level() {
            Level::TRACE => "\x1b[90m",
            Level::DEBUG => "\x1b[34m",
            Level::INFO => "\x1b[32m",
            Level::WARN => "\x1b[33m",
            Level::ERROR => "\x1b[31m",
        });
        let collection_color = self.paint("\x1b[92m");
        let dim_color = self.paint("\x1b[90m");
        let reset = self.paint("\x1b[0m");

        // Innermost span carrying a collection wins
        let mut collection = None;
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(value) = extensions.get::<SpanFields>().and_then(|fields| fields.0.get(COLLECTION_FIELD)) {
                    collection = Some(value.clone());
                }
            }
        }
        let collection = collection.unwrap_or_else(|| "-".to_string());

        let mut visitor = EventFieldVisitor::default();
        event.record(&mut visitor);

        write!(writer, "{}{}{} ", ts_color, now, reset)?;
        write!(writer, "{}|{} ", dim_color, reset)?;
        write!(writer, "{}{:<5}{} ", level_color, *meta.level(), reset)?;
        write!(writer, "{}|{} ", dim_color, reset)?;
        write!(writer, "{}{:<14}{} ", collection_color, collection, reset)?;
        write!(writer, "{}|{} ", dim_color, reset)?;
        write!(writer, "{}", visitor.message)?;
        if !visitor.fields.is_empty() {
            write!(writer, " {}({}){}", dim_color, visitor.fields.join(", "), reset)?;
        }
        writeln!(writer)
    }
}

/// Initialize the tracing subscriber with
/// - PrettyFormatter for console readability (when LOG_FORMAT != "json")
/// - the JSON formatter of tracing-subscriber (when LOG_FORMAT = "json")
///
/// Logs go to stderr so that command output on stdout stays machine readable.
/// This will also install color_eyre to handle the panic in the application
pub fn init_logging() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Read from `RUST_LOG` environment variable, with fallback to default
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder().with_default_directive(Level::WARN.into()).parse("medauth_db=info")?,
    };

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        let fmt_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);
        let subscriber = Registry::default().with(env_filter).with(fmt_layer).with(ErrorLayer::default());
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer().event_format(PrettyFormatter::new(true)).with_writer(std::io::stderr);
        let subscriber = Registry::default()
            .with(env_filter)
            .with(FieldCollectorLayer)
            .with(fmt_layer)
            .with(ErrorLayer::default());
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
