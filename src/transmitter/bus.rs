use std::{marker::PhantomData, sync::Arc};

use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::{
    dispatcher::{Dispatcher, Job, Shared},
    hook::ErrorHook,
    Callback, Message, StatsSnapshot, Token,
};
use crate::error::{DeliveryError, TransmitterError, TransmitterResult};

const DEFAULT_NAME: &str = "transmitter";

/// Результат успешного `publish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Проход доставки поставлен в очередь.
    Scheduled,
    /// У топика нет подписчиков, ничего не запланировано.
    NoSubscribers,
}

/// Цель для [`Transmitter::unsubscribe`].
///
/// Строка сначала проверяется как имя топика, затем как текстовая форма
/// токена.
#[derive(Debug)]
pub enum Unsubscribe<'a, M> {
    Name(&'a str),
    Token(Token),
    Callback(&'a Callback<M>),
}

impl<'a, M> From<&'a str> for Unsubscribe<'a, M> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a, M> From<&'a String> for Unsubscribe<'a, M> {
    fn from(name: &'a String) -> Self {
        Self::Name(name.as_str())
    }
}

impl<M> From<Token> for Unsubscribe<'_, M> {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl<M> From<&Token> for Unsubscribe<'_, M> {
    fn from(token: &Token) -> Self {
        Self::Token(*token)
    }
}

impl<'a, M> From<&'a Callback<M>> for Unsubscribe<'a, M> {
    fn from(callback: &'a Callback<M>) -> Self {
        Self::Callback(callback)
    }
}

/// Внутрипроцессная шина publish/subscribe.
///
/// Дешёвый `Clone`: все копии работают с одним реестром и одной очередью,
/// поэтому колбэк может захватить копию и подписываться/отписываться
/// прямо во время доставки.
///
/// Доставка отложенная: `publish` только ставит проход в очередь
/// [`Dispatcher`]. Проход берёт снимок подписчиков топика, вызывает их по
/// порядку подписки и изолирует сбои: паника или `Err` одного колбэка не
/// мешает остальным, а сама ошибка уходит в error hook после прохода.
pub struct Transmitter<M> {
    shared: Arc<Shared<M>>,
}

impl<M> Clone for Transmitter<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M> std::fmt::Debug for Transmitter<M> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Transmitter")
            .field("name", &self.shared.name)
            .field("topics", &self.shared.registry.topic_count())
            .field("pending", &self.shared.pending())
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}

impl<M> Transmitter<M>
where
    M: Send + Sync + 'static,
{
    pub fn builder() -> TransmitterBuilder<M> {
        TransmitterBuilder::default()
    }

    /// Шина с настройками по умолчанию. Диспетчер нужно запустить самому.
    pub fn new() -> (Self, Dispatcher<M>) {
        Self::builder().build()
    }

    /// Шина с настройками по умолчанию и диспетчером, запущенным через
    /// `tokio::spawn`.
    ///
    /// Доставка гарантированно не начнётся до того, как издатель отдаст
    /// управление, только на current-thread рантайме. На multi-thread
    /// рантайме диспетчер может вызвать подписчиков параллельно с кодом
    /// издателя, сразу после возврата из `publish`; порядок доставки при
    /// этом сохраняется.
    ///
    /// # Panics
    /// Вне контекста tokio-рантайма.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        Self::builder().spawn()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Подписывает колбэк на топик и возвращает новый уникальный токен.
    ///
    /// Доставку не запускает.
    pub fn subscribe(
        &self,
        topic: &str,
        callback: Callback<M>,
    ) -> TransmitterResult<Token> {
        validate_topic(topic)?;
        let token = self.shared.registry.insert(topic, callback);
        debug!(bus = %self.shared.name, topic, %token, "Subscribed");
        Ok(token)
    }

    /// Публикует сообщение.
    ///
    /// Возвращается сразу. Если у топика есть подписчики, ставит в очередь
    /// проход доставки; иначе ничего не планирует. Сбои подписчиков сюда
    /// никогда не попадают.
    pub fn publish(
        &self,
        topic: &str,
        message: M,
    ) -> TransmitterResult<Delivery> {
        validate_topic(topic)?;
        if self.shared.is_closed() {
            return Err(TransmitterError::Closed);
        }

        if !self.shared.registry.has_subscribers(topic) {
            self.shared.stats.record_publish();
            trace!(bus = %self.shared.name, topic, "Publish to topic without subscribers");
            return Ok(Delivery::NoSubscribers);
        }

        self.shared
            .enqueue(Job::Deliver(Message::new(topic, message)))
            .map_err(|_| TransmitterError::Closed)?;
        self.shared.stats.record_publish();
        self.shared.stats.record_scheduled();
        trace!(bus = %self.shared.name, topic, "Delivery scheduled");
        Ok(Delivery::Scheduled)
    }

    /// `publish` без содержимого: подписчики получают `M::default()`.
    pub fn signal(
        &self,
        topic: &str,
    ) -> TransmitterResult<Delivery>
    where
        M: Default,
    {
        self.publish(topic, M::default())
    }

    /// Отписка по имени топика, токену (или его текстовой форме) либо по
    /// колбэку.
    ///
    /// - имя существующего топика: удаляет топик целиком;
    /// - иная строка: ищется как текстовая форма токена;
    /// - токен: удаляет ровно одну подписку;
    /// - колбэк: удаляет его из всех топиков.
    ///
    /// Возвращает `true`, если что-то было удалено.
    pub fn unsubscribe<'a>(
        &self,
        target: impl Into<Unsubscribe<'a, M>>,
    ) -> bool
    where
        M: 'a,
    {
        match target.into() {
            Unsubscribe::Name(name) => {
                self.unsubscribe_topic(name)
                    || Token::parse(name).is_some_and(|token| self.unsubscribe_token(token))
            }
            Unsubscribe::Token(token) => self.unsubscribe_token(token),
            Unsubscribe::Callback(callback) => self.unsubscribe_callback(callback),
        }
    }

    pub fn unsubscribe_topic(
        &self,
        topic: &str,
    ) -> bool {
        let removed = self.shared.registry.remove_topic(topic);
        if removed {
            debug!(bus = %self.shared.name, topic, "Topic removed");
        }
        removed
    }

    pub fn unsubscribe_token(
        &self,
        token: Token,
    ) -> bool {
        let removed = self.shared.registry.remove_token(token);
        if removed {
            debug!(bus = %self.shared.name, %token, "Unsubscribed");
        }
        removed
    }

    pub fn unsubscribe_callback(
        &self,
        callback: &Callback<M>,
    ) -> bool {
        let removed = self.shared.registry.remove_callback(callback);
        if removed > 0 {
            debug!(bus = %self.shared.name, removed, "Callback unsubscribed");
        }
        removed > 0
    }

    /// Удаляет все подписки. Всегда `true`. Счётчик токенов не сбрасывается.
    pub fn clear_all_subscriptions(&self) -> bool {
        self.shared.registry.clear();
        debug!(bus = %self.shared.name, "All subscriptions cleared");
        true
    }

    pub fn has_subscribers(
        &self,
        topic: &str,
    ) -> bool {
        self.shared.registry.has_subscribers(topic)
    }

    pub fn subscriber_count(
        &self,
        topic: &str,
    ) -> usize {
        self.shared.registry.subscriber_count(topic)
    }

    /// Топики, у которых сейчас есть подписчики. Порядок не определён.
    pub fn topics(&self) -> Vec<String> {
        self.shared.registry.topics()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Число задач в очереди диспетчера, включая выполняемую.
    pub fn pending(&self) -> usize {
        self.shared.pending()
    }

    /// Ждёт, пока очередь диспетчера не опустеет, включая отчёты о сбоях,
    /// поставленные проходами доставки.
    pub async fn settled(&self) {
        self.shared.settled().await
    }

    pub fn set_error_hook<F>(
        &self,
        hook: F,
    ) where
        F: Fn(&DeliveryError) + Send + Sync + 'static,
    {
        self.shared.hook.replace(ErrorHook::new(hook));
    }

    pub fn reset_error_hook(&self) {
        self.shared.hook.replace(ErrorHook::default());
    }

    /// Останавливает шину.
    ///
    /// Новые `publish` после вызова возвращают [`TransmitterError::Closed`].
    /// Уже поставленные задачи выполняются, после них диспетчер
    /// завершается. Повторный вызов возвращает `false`.
    pub fn shutdown(&self) -> bool {
        if !self.shared.close() {
            return false;
        }
        // Очередь могла закрыться раньше (диспетчер уничтожен), это не ошибка.
        let _ = self.shared.enqueue(Job::Shutdown);
        info!(bus = %self.shared.name, "Transmitter shutdown requested");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

fn validate_topic(topic: &str) -> TransmitterResult<()> {
    if topic.is_empty() {
        return Err(TransmitterError::EmptyTopic);
    }
    Ok(())
}

/// Настройка [`Transmitter`].
pub struct TransmitterBuilder<M> {
    name: Option<String>,
    hook: Option<ErrorHook>,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Default for TransmitterBuilder<M> {
    fn default() -> Self {
        Self {
            name: None,
            hook: None,
            _marker: PhantomData,
        }
    }
}

impl<M> TransmitterBuilder<M>
where
    M: Send + Sync + 'static,
{
    /// Имя шины в логах.
    pub fn name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn error_hook<F>(
        mut self,
        hook: F,
    ) -> Self
    where
        F: Fn(&DeliveryError) + Send + Sync + 'static,
    {
        self.hook = Some(ErrorHook::new(hook));
        self
    }

    pub fn build(self) -> (Transmitter<M>, Dispatcher<M>) {
        let name: Arc<str> = Arc::from(self.name.as_deref().unwrap_or(DEFAULT_NAME));
        let (shared, rx) = Shared::new(name, self.hook.unwrap_or_default());
        let shared = Arc::new(shared);
        let dispatcher = Dispatcher::new(Arc::clone(&shared), rx);
        (Transmitter { shared }, dispatcher)
    }

    /// Собирает шину и запускает диспетчер через `tokio::spawn`.
    ///
    /// Отложенность доставки относительно кода издателя гарантируется
    /// только на current-thread рантайме, см. [`Transmitter::spawn`].
    ///
    /// # Panics
    /// Вне контекста tokio-рантайма.
    pub fn spawn(self) -> (Transmitter<M>, JoinHandle<()>) {
        let (transmitter, dispatcher) = self.build();
        let handle = tokio::spawn(dispatcher.run());
        (transmitter, handle)
    }
}
