use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::DeliveryError;

type HookFn = dyn Fn(&DeliveryError) + Send + Sync;

/// Получатель сбоев подписчиков.
///
/// Вызывается диспетчером отдельной задачей после завершения прохода
/// доставки, по одному разу на каждый сбой.
#[derive(Clone)]
pub struct ErrorHook {
    inner: Arc<HookFn>,
}

impl ErrorHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&DeliveryError) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub(crate) fn call(
        &self,
        err: &DeliveryError,
    ) {
        (self.inner)(err)
    }
}

impl Default for ErrorHook {
    /// Пишет сбой в лог на уровне `error`.
    fn default() -> Self {
        Self::new(|err| {
            tracing::error!(
                topic = %err.topic,
                token = %err.token,
                panic = err.is_panic(),
                error = %err.kind,
                "Subscriber fault"
            );
        })
    }
}

impl std::fmt::Debug for ErrorHook {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str("ErrorHook")
    }
}

/// Заменяемый hook. Чтение клонирует `Arc` и сразу отпускает блокировку,
/// поэтому hook может заменить сам себя.
#[derive(Debug, Default)]
pub(crate) struct HookSlot {
    current: RwLock<ErrorHook>,
}

impl HookSlot {
    pub(crate) fn new(hook: ErrorHook) -> Self {
        Self {
            current: RwLock::new(hook),
        }
    }

    pub(crate) fn get(&self) -> ErrorHook {
        self.current.read().clone()
    }

    pub(crate) fn replace(
        &self,
        hook: ErrorHook,
    ) {
        *self.current.write() = hook;
    }
}
