use std::io::{self, Write};

use nu_ansi_term::{
    Color,
    Color::{Blue, Magenta, Red, Yellow},
};
use tracing::{field::Field, Event, Level, Metadata, Subscriber};
use tracing_subscriber::{
    fmt::{
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields, MakeWriter, Subscriber as FmtSubscriber,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

/// Message and structured fields of one event.
#[derive(Default)]
struct EventFields {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl EventFields {
    fn push(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => self.fields.push((name, value)),
        }
    }
}

impl tracing::field::Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }
}

fn level_tag(level: Level) -> Option<(Color, &'static str)> {
    match level {
        Level::TRACE => Some((Magenta, "[TRACE]")),
        Level::DEBUG => Some((Blue, "[DEBUG]")),
        Level::INFO => None,
        Level::WARN => Some((Yellow, "[WARN]")),
        Level::ERROR => Some((Red, "[ERROR]")),
    }
}

/// Plain status lines for `info`, tagged lines with fields otherwise.
pub struct StatusFormatter;

impl<S, N> FormatEvent<S, N> for StatusFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut recorded = EventFields::default();
        event.record(&mut recorded);

        let level = *event.metadata().level();
        if let Some((color, tag)) = level_tag(level) {
            write!(writer, "{} ", Colored(color, tag))?;
        }
        if let Some(message) = &recorded.message {
            write!(writer, "{message}")?;
        }
        if level != Level::INFO {
            for (name, value) in &recorded.fields {
                write!(writer, " {name}={value}")?;
            }
        }

        writeln!(writer)
    }
}

/// Sends status lines to stdout next to the documents and everything
/// else to stderr.
struct SplitWriter;

enum Stream {
    Out(io::Stdout),
    Err(io::Stderr),
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Out(out) => out.write(buf),
            Self::Err(err) => err.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Out(out) => out.flush(),
            Self::Err(err) => err.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for SplitWriter {
    type Writer = Stream;

    fn make_writer(&'a self) -> Self::Writer {
        Stream::Err(io::stderr())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        if *meta.level() == Level::INFO {
            Stream::Out(io::stdout())
        } else {
            Stream::Err(io::stderr())
        }
    }
}

pub fn filter_level(args: &Args) -> Level {
    match (args.quiet, args.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

pub fn setup_logging(args: &Args) {
    let builder = FmtSubscriber::builder()
        .with_env_filter(format!("packyard={}", filter_level(args)))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(SplitWriter)
        .compact()
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(StatusFormatter).finish())
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber was already installed");
    }
}
