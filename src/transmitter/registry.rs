use std::sync::Arc;

use dashmap::DashMap;

use super::{token::TokenCounter, Callback, Token};

/// Запись подписки: токен и колбэк, привязанные к одному топику.
#[derive(Debug)]
pub struct Subscriber<M> {
    pub token: Token,
    pub callback: Callback<M>,
}

impl<M> Clone for Subscriber<M> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            callback: self.callback.clone(),
        }
    }
}

/// Топик → подписчики в порядке подписки.
///
/// Топик без подписчиков в карте не хранится: последняя отписка удаляет
/// его целиком, поэтому `contains_key` равносильно "есть подписчики".
pub(crate) struct Registry<M> {
    topics: DashMap<Arc<str>, Vec<Subscriber<M>>>,
    tokens: TokenCounter,
}

impl<M> Registry<M> {
    pub(crate) fn new() -> Self {
        Self {
            topics: DashMap::new(),
            tokens: TokenCounter::default(),
        }
    }

    pub(crate) fn insert(
        &self,
        topic: &str,
        callback: Callback<M>,
    ) -> Token {
        let token = self.tokens.next();
        let sub = Subscriber { token, callback };

        // Arc<str> под ключ создаём только для нового топика.
        if let Some(mut list) = self.topics.get_mut(topic) {
            list.value_mut().push(sub);
        } else {
            self.topics.entry(Arc::from(topic)).or_default().push(sub);
        }
        token
    }

    pub(crate) fn has_subscribers(
        &self,
        topic: &str,
    ) -> bool {
        self.topics
            .get(topic)
            .is_some_and(|list| !list.value().is_empty())
    }

    pub(crate) fn subscriber_count(
        &self,
        topic: &str,
    ) -> usize {
        self.topics.get(topic).map_or(0, |list| list.value().len())
    }

    /// Копия списка подписчиков на момент вызова. Блокировка шарда
    /// отпускается до возврата, колбэки под ней не вызываются.
    pub(crate) fn snapshot(
        &self,
        topic: &str,
    ) -> Option<Vec<Subscriber<M>>> {
        self.topics
            .get(topic)
            .map(|list| list.value().clone())
            .filter(|list| !list.is_empty())
    }

    pub(crate) fn remove_topic(
        &self,
        topic: &str,
    ) -> bool {
        self.topics.remove(topic).is_some()
    }

    pub(crate) fn remove_token(
        &self,
        token: Token,
    ) -> bool {
        let mut found = false;
        let mut emptied: Option<Arc<str>> = None;

        for mut entry in self.topics.iter_mut() {
            let list = entry.value_mut();
            if let Some(pos) = list.iter().position(|s| s.token == token) {
                list.remove(pos);
                found = true;
                if list.is_empty() {
                    emptied = Some(entry.key().clone());
                }
                break;
            }
        }

        if let Some(key) = emptied {
            self.topics.remove_if(&key, |_, list| list.is_empty());
        }
        found
    }

    /// Удаляет колбэк из всех топиков. Возвращает число удалённых подписок.
    pub(crate) fn remove_callback(
        &self,
        callback: &Callback<M>,
    ) -> usize {
        let mut removed = 0;
        let mut emptied = Vec::new();

        for mut entry in self.topics.iter_mut() {
            let list = entry.value_mut();
            let before = list.len();
            list.retain(|s| !s.callback.ptr_eq(callback));
            removed += before - list.len();
            if before > 0 && list.is_empty() {
                emptied.push(entry.key().clone());
            }
        }

        for key in emptied {
            self.topics.remove_if(&key, |_, list| list.is_empty());
        }
        removed
    }

    pub(crate) fn clear(&self) {
        self.topics.clear();
    }

    pub(crate) fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|e| e.key().to_string()).collect()
    }

    pub(crate) fn topic_count(&self) -> usize {
        self.topics.len()
    }
}
