//! Необязательный общий экземпляр шины на весь процесс.
//!
//! Шину по-прежнему создаёт корень композиции (обычно `main`) и сам
//! запускает её диспетчер; здесь её можно только один раз опубликовать для
//! кода, которому неудобно передавать `Transmitter` явно.

use once_cell::sync::OnceCell;
use serde_json::Value;

use super::Transmitter;
use crate::error::{TransmitterError, TransmitterResult};

static SHARED: OnceCell<Transmitter<Value>> = OnceCell::new();

/// Устанавливает общий экземпляр. Повторная установка возвращает ошибку.
pub fn install(transmitter: Transmitter<Value>) -> TransmitterResult<()> {
    SHARED
        .set(transmitter)
        .map_err(|_| TransmitterError::AlreadyInstalled)?;
    tracing::debug!("Shared transmitter installed");
    Ok(())
}

/// Общий экземпляр, если он был установлен.
pub fn shared() -> Option<&'static Transmitter<Value>> {
    SHARED.get()
}
