//! Очередь отложенных задач и её обработчик.
//!
//! Все отложенные действия шины (проходы доставки, передача сбоев в
//! error hook, остановка) идут через одну FIFO-очередь и выполняются
//! по одному, в порядке постановки. Это и даёт гарантии порядка:
//!
//! - `publish` в один топик доставляются в порядке вызовов;
//! - отчёт о сбое попадает в hook только после завершения прохода, в
//!   котором сбой произошёл;
//! - всё, что колбэк сделал с подписками, видно следующим проходам, но не
//!   текущему (текущий работает по снимку).

use std::{
    ops::ControlFlow,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::sync::{mpsc, Notify};
use tracing::{debug, debug_span, error, trace, warn};

use super::{
    hook::{ErrorHook, HookSlot},
    registry::Registry,
    stats::Stats,
    Message,
};
use crate::error::{panic_message, DeliveryError};

pub(crate) enum Job<M> {
    Deliver(Message<M>),
    Report(DeliveryError),
    Shutdown,
}

/// Состояние, общее для всех клонов `Transmitter` и диспетчера.
pub(crate) struct Shared<M> {
    pub(crate) name: Arc<str>,
    pub(crate) registry: Registry<M>,
    pub(crate) hook: HookSlot,
    pub(crate) stats: Stats,
    queue: mpsc::UnboundedSender<Job<M>>,
    /// Задачи в очереди плюс выполняемая сейчас.
    pending: AtomicUsize,
    idle: Notify,
    closed: AtomicBool,
}

impl<M> Shared<M> {
    pub(crate) fn new(
        name: Arc<str>,
        hook: ErrorHook,
    ) -> (Self, mpsc::UnboundedReceiver<Job<M>>) {
        let (queue, rx) = mpsc::unbounded_channel();
        let shared = Self {
            name,
            registry: Registry::new(),
            hook: HookSlot::new(hook),
            stats: Stats::default(),
            queue,
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
            closed: AtomicBool::new(false),
        };
        (shared, rx)
    }

    /// Ставит задачу в конец очереди. Если диспетчер уже остановлен или
    /// уничтожен, задача возвращается обратно.
    pub(crate) fn enqueue(
        &self,
        job: Job<M>,
    ) -> Result<(), Job<M>> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        match self.queue.send(job) {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendError(job)) => {
                self.finish_one();
                Err(job)
            }
        }
    }

    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) async fn settled(&self) {
        loop {
            // `Notified` создаётся до проверки, иначе можно пропустить
            // notify_waiters между проверкой и ожиданием.
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Возвращает `true`, если шина была открыта до вызова.
    pub(crate) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}

/// Исполнитель отложенных задач шины.
///
/// Создаётся вместе с [`Transmitter`](crate::Transmitter) и должен быть
/// запущен вызывающей стороной: либо `tokio::spawn(dispatcher.run())`,
/// либо ручным вызовом [`run_pending`](Self::run_pending).
///
/// На current-thread рантайме (и при ручном вызове) доставка никогда не
/// вклинивается в синхронный код издателя: задачи выполняются только
/// когда издатель отдал управление. На multi-thread рантайме эта гарантия
/// не действует, остаётся только порядок задач.
///
/// Уничтожение диспетчера (в том числе отмена задачи `run`) закрывает шину
/// так же, как [`Transmitter::shutdown`](crate::Transmitter::shutdown):
/// поставленные отчёты о сбоях уходят в hook, недоставленные публикации
/// отбрасываются, `pending` возвращается к нулю.
pub struct Dispatcher<M> {
    shared: Arc<Shared<M>>,
    rx: mpsc::UnboundedReceiver<Job<M>>,
}

impl<M> Dispatcher<M>
where
    M: Send + Sync + 'static,
{
    pub(crate) fn new(
        shared: Arc<Shared<M>>,
        rx: mpsc::UnboundedReceiver<Job<M>>,
    ) -> Self {
        Self { shared, rx }
    }

    /// Обрабатывает задачи, пока не встретит задачу остановки
    /// (см. [`Transmitter::shutdown`](crate::Transmitter::shutdown)).
    pub async fn run(mut self) {
        debug!(bus = %self.shared.name, "Dispatcher started");

        while let Some(job) = self.rx.recv().await {
            if self.handle(job).is_break() {
                self.stop();
                break;
            }
        }

        debug!(bus = %self.shared.name, "Dispatcher stopped");
    }

    /// Синхронно выполняет всё, что есть в очереди, включая задачи,
    /// поставленные во время выполнения (публикации из колбэков, отчёты о
    /// сбоях). Возвращает число обработанных задач.
    pub fn run_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(job) = self.rx.try_recv() {
            handled += 1;
            if self.handle(job).is_break() {
                self.stop();
                break;
            }
        }
        handled
    }

    fn handle(
        &self,
        job: Job<M>,
    ) -> ControlFlow<()> {
        let flow = match job {
            Job::Deliver(message) => {
                self.deliver(message);
                ControlFlow::Continue(())
            }
            Job::Report(err) => {
                self.report(&err);
                ControlFlow::Continue(())
            }
            Job::Shutdown => ControlFlow::Break(()),
        };
        self.shared.finish_one();
        flow
    }

    /// Один проход доставки.
    fn deliver(
        &self,
        message: Message<M>,
    ) {
        let Message { topic, payload } = message;
        let span = debug_span!("delivery", bus = %self.shared.name, topic = %topic);
        let _enter = span.enter();

        // Подписчиков могли убрать между publish и этим моментом.
        let Some(subscribers) = self.shared.registry.snapshot(&topic) else {
            self.shared.stats.record_skipped();
            trace!("No subscribers left, pass skipped");
            return;
        };

        let mut faults = Vec::new();
        for sub in &subscribers {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| sub.callback.call(&topic, &payload)));
            match outcome {
                Ok(Ok(())) => self.shared.stats.record_delivered(),
                Ok(Err(err)) => faults.push(DeliveryError::failed(topic.clone(), sub.token, err)),
                Err(p) => faults.push(DeliveryError::panicked(topic.clone(), sub.token, p)),
            }
        }

        trace!(
            subscribers = subscribers.len(),
            faults = faults.len(),
            "Delivery pass complete"
        );

        for fault in faults {
            self.shared.stats.record_fault();
            warn!(token = %fault.token, error = %fault.kind, "Subscriber fault captured");
            if let Err(Job::Report(fault)) = self.shared.enqueue(Job::Report(fault)) {
                self.report(&fault);
            }
        }
    }

}

impl<M> Dispatcher<M> {
    fn report(
        &self,
        err: &DeliveryError,
    ) {
        let hook = self.shared.hook.get();
        if let Err(p) = panic::catch_unwind(AssertUnwindSafe(|| hook.call(err))) {
            error!(
                bus = %self.shared.name,
                panic = %panic_message(p.as_ref()),
                "Error hook panicked"
            );
        }
    }

    /// Закрывает очередь. Уже поставленные отчёты о сбоях ещё передаются в
    /// hook, недоставленные публикации отбрасываются.
    fn stop(&mut self) {
        self.shared.close();
        self.rx.close();

        while let Ok(job) = self.rx.try_recv() {
            match job {
                Job::Report(err) => self.report(&err),
                Job::Deliver(message) => {
                    debug!(topic = %message.topic, "Dropping delivery after shutdown");
                }
                Job::Shutdown => {}
            }
            self.shared.finish_one();
        }
    }
}

impl<M> Drop for Dispatcher<M> {
    fn drop(&mut self) {
        // После `run`/`run_pending`, дошедших до остановки, очередь уже пуста.
        self.stop();
    }
}

impl<M> std::fmt::Debug for Dispatcher<M> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bus", &self.shared.name)
            .field("pending", &self.shared.pending())
            .finish()
    }
}
