use thiserror::Error;

/// Ошибки публичных операций [`Transmitter`](crate::Transmitter).
///
/// Ни одна из них не связана с подписчиками: сбои колбэков никогда не
/// возвращаются вызывающей стороне, см. [`DeliveryError`](super::DeliveryError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransmitterError {
    #[error("topic name must not be empty")]
    EmptyTopic,

    #[error("transmitter is shut down")]
    Closed,

    #[error("shared transmitter is already installed")]
    AlreadyInstalled,
}

pub type TransmitterResult<T> = Result<T, TransmitterError>;
