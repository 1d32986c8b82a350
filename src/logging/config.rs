use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Формат вывода в консоль.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    #[default]
    Compact,
}

/// Настройки консольного sink'а.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

/// Настройки файлового sink'а (ежедневная ротация).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub filename: String,
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень: trace / debug / info / warn / error.
    pub level: String,
    /// Дополнительные директивы `EnvFilter`, например `transmitter::transmitter=trace`.
    pub directives: Vec<String>,
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: LogFormat::Compact,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("logs"),
            filename: "transmitter.log".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directives: Vec::new(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl LoggingConfig {
    /// Директива для `EnvFilter`: уровень плюс дополнительные директивы
    /// через запятую.
    pub fn build_filter_directive(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .filter(|d| !d.trim().is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => {}
            other => return Err(format!("unknown log level '{other}'")),
        }
        if self.file.enabled && self.file.filename.trim().is_empty() {
            return Err("file logging enabled but filename is empty".to_string());
        }
        Ok(())
    }

    /// Создаёт каталог для логов, если файловый sink включён.
    pub fn ensure_log_dir(&self) -> std::io::Result<()> {
        if self.file.enabled {
            std::fs::create_dir_all(&self.file.dir)?;
        }
        Ok(())
    }
}
