use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

/// Настройки приложения, в котором живёт шина.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Имя шины в логах.
    pub name: String,
    /// Публиковать ли шину как общий экземпляр процесса
    /// (см. [`crate::global`]).
    pub install_global: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Значения по умолчанию, затем необязательный `transmitter.toml`,
    /// затем переменные окружения `TRANSMITTER__*`
    /// (например `TRANSMITTER__LOGGING__LEVEL=debug`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("transmitter")
    }

    /// То же, что [`Settings::load`], но с явным именем файла (без расширения).
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .set_default("name", "transmitter")?
            .set_default("install_global", false)?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("TRANSMITTER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        cfg.try_deserialize()
    }
}
