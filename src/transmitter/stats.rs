use std::sync::atomic::{AtomicU64, Ordering};

/// Счётчики шины.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    /// Все успешные вызовы `publish` (включая топики без подписчиков).
    published: AtomicU64,
    /// Поставленные в очередь проходы доставки.
    scheduled: AtomicU64,
    /// Вызовы колбэков, завершившиеся без сбоя.
    delivered: AtomicU64,
    /// Перехваченные сбои подписчиков.
    faults: AtomicU64,
    /// Проходы, которые к моменту запуска уже не нашли подписчиков.
    skipped_passes: AtomicU64,
}

/// Снимок счётчиков на момент вызова [`Transmitter::stats`](crate::Transmitter::stats).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub published: u64,
    pub scheduled: u64,
    pub delivered: u64,
    pub faults: u64,
    pub skipped_passes: u64,
}

impl Stats {
    pub(crate) fn record_publish(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            scheduled: self.scheduled.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            skipped_passes: self.skipped_passes.load(Ordering::Relaxed),
        }
    }
}
