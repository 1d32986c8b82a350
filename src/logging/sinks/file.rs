use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, Layer};

use crate::logging::config::LoggingConfig;

/// Файловый layer с ежедневной ротацией.
///
/// Guard нужно держать живым до завершения программы, иначе хвост
/// буфера потеряется.
pub fn layer_with_config<S>(config: &LoggingConfig) -> (impl Layer<S>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let file_appender = rolling::daily(&config.file.dir, &config.file.filename);
    let (writer, guard) = non_blocking(file_appender);

    let layer = fmt::layer().with_ansi(false).with_writer(writer);

    (layer, guard)
}
