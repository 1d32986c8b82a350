use std::{fmt, sync::Arc};

use crate::error::BoxError;

type Handler<M> = dyn Fn(&str, &M) -> Result<(), BoxError> + Send + Sync;

/// Колбэк подписчика.
///
/// Дешёвый `Clone`: все копии указывают на один и тот же обработчик.
/// Сравнение: только по идентичности (`Arc::ptr_eq`), именно по нему
/// работает отписка по колбэку. Два разных `Callback`, собранных из
/// одинаковых замыканий, не равны.
pub struct Callback<M> {
    inner: Arc<Handler<M>>,
}

impl<M: 'static> Callback<M> {
    /// Обработчик, который не может вернуть ошибку. Паника внутри
    /// перехватывается диспетчером.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &M) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(move |topic: &str, message: &M| {
                f(topic, message);
                Ok(())
            }),
        }
    }

    /// Обработчик, который сообщает о сбое через `Err`.
    pub fn fallible<F, E>(f: F) -> Self
    where
        F: Fn(&str, &M) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            inner: Arc::new(move |topic: &str, message: &M| f(topic, message).map_err(Into::into)),
        }
    }
}

impl<M> Callback<M> {
    pub(crate) fn call(
        &self,
        topic: &str,
        message: &M,
    ) -> Result<(), BoxError> {
        (self.inner)(topic, message)
    }

    pub fn ptr_eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<M> Clone for Callback<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> PartialEq for Callback<M> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.ptr_eq(other)
    }
}

impl<M> Eq for Callback<M> {}

impl<M> fmt::Debug for Callback<M> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Callback")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_clone_is_identical() {
        let a = Callback::<u32>::new(|_, _| {});
        let b = a.clone();
        assert_eq!(a, b);
    }

    /// Одинаковые замыкания дают разные колбэки.
    #[test]
    fn test_distinct_callbacks_not_equal() {
        let a = Callback::<u32>::new(|_, _| {});
        let b = Callback::<u32>::new(|_, _| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_call_passes_topic_and_message() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let cb = Callback::new(move |topic: &str, msg: &u32| {
            assert_eq!(topic, "t");
            h.fetch_add(*msg as usize, Ordering::SeqCst);
        });
        cb.call("t", &5).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_fallible_maps_error() {
        let cb = Callback::<()>::fallible(|_, _| Err::<(), _>("nope"));
        let err = cb.call("t", &()).unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }
}
