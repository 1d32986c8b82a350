use std::io::{self, Stdout};

use tracing_subscriber::layer::Layer as LayerTrait;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    registry::LookupSpan,
};

use crate::logging::config::{ConsoleConfig, LogFormat};

/// Консольный formatter по конфигурации.
/// Возвращаем boxed trait-объект, чтобы стереть конкретный тип формата
/// (json/pretty/compact).
pub fn build_formatter_from_config<S>(
    console: &ConsoleConfig
) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stdout = io::stdout;

    match console.format {
        LogFormat::Json => {
            let json_fmt = fmt::format().json().with_current_span(true);
            let layer = fmt::layer()
                .event_format(json_fmt)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(console.with_target)
                .with_thread_ids(console.with_thread_ids)
                .with_line_number(console.with_line_numbers);
            Box::new(layer)
        }
        LogFormat::Pretty => {
            let pretty_fmt = fmt::format().pretty();
            let layer = fmt::layer()
                .event_format(pretty_fmt)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(writer)
                .with_ansi(console.with_ansi)
                .with_target(console.with_target)
                .with_thread_ids(console.with_thread_ids)
                .with_line_number(console.with_line_numbers);
            Box::new(layer)
        }
        LogFormat::Compact => {
            let compact_fmt = fmt::format().compact();
            let layer = fmt::layer()
                .event_format(compact_fmt)
                .with_writer(writer)
                .with_ansi(console.with_ansi)
                .with_target(console.with_target)
                .with_thread_ids(console.with_thread_ids)
                .with_line_number(console.with_line_numbers);
            Box::new(layer)
        }
    }
}
