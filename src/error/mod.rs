pub mod delivery;
pub mod transmitter;

// Публичный экспорт всех типов ошибок, чтобы упростить доступ к ним из
// внешнего кода.
pub use delivery::{BoxError, DeliveryError, FaultKind};
pub(crate) use delivery::panic_message;
pub use transmitter::{TransmitterError, TransmitterResult};
