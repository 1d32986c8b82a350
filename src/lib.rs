/// Application settings loading.
pub mod config;
/// Error types: usage errors and captured subscriber faults.
pub mod error;
/// Logging setup (formatting, filters, sinks).
pub mod logging;
/// Pub/Sub: Transmitter, Dispatcher, Callback, Token.
pub mod transmitter;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// config
pub use config::Settings;
/// Operation errors and result types.
pub use error::{BoxError, DeliveryError, FaultKind, TransmitterError, TransmitterResult};
/// Logging.
pub use logging::{init_logging, LoggingConfig, LoggingHandle};
/// Optional process-wide instance.
pub use transmitter::global;
/// Pub/Sub API.
pub use transmitter::{
    Callback, Delivery, Dispatcher, ErrorHook, Message, StatsSnapshot, Subscriber, Token,
    Transmitter, TransmitterBuilder, Unsubscribe,
};
