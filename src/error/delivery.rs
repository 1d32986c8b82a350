use std::{any::Any, sync::Arc};

use thiserror::Error;

use crate::transmitter::Token;

/// Ошибка, которую вернул или выбросил (panic) колбэк подписчика.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Что именно случилось с подписчиком во время прохода доставки.
#[derive(Debug, Error)]
pub enum FaultKind {
    #[error("panicked: {0}")]
    Panicked(String),

    #[error("failed: {0}")]
    Failed(#[source] BoxError),
}

/// Сбой одного подписчика в одном проходе доставки.
///
/// Перехватывается диспетчером и передаётся в error hook уже после того,
/// как проход завершился. Издатель его никогда не видит.
#[derive(Debug, Error)]
#[error("subscriber {token} on topic '{topic}' {kind}")]
pub struct DeliveryError {
    pub topic: Arc<str>,
    pub token: Token,
    #[source]
    pub kind: FaultKind,
}

impl DeliveryError {
    pub(crate) fn failed(
        topic: Arc<str>,
        token: Token,
        err: BoxError,
    ) -> Self {
        Self {
            topic,
            token,
            kind: FaultKind::Failed(err),
        }
    }

    /// Строит ошибку из payload'а, пойманного `catch_unwind`.
    pub(crate) fn panicked(
        topic: Arc<str>,
        token: Token,
        payload: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            topic,
            token,
            kind: FaultKind::Panicked(panic_message(payload.as_ref())),
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self.kind, FaultKind::Panicked(_))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
