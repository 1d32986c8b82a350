use std::sync::Arc;

/// Одна публикация: топик и непрозрачный payload.
///
/// Живёт в очереди диспетчера между `publish` и проходом доставки.
/// Payload не клонируется и не инспектируется: каждый подписчик получает
/// ссылку на одно и то же значение.
#[derive(Debug, Clone)]
pub struct Message<M> {
    pub topic: Arc<str>,
    pub payload: M,
}

impl<M> Message<M> {
    pub fn new(
        topic: impl Into<Arc<str>>,
        payload: M,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет создание сообщения с &str и Vec<u8>
    #[test]
    fn test_message_creation_with_str() {
        let msg = Message::new("news", b"hello world".to_vec());

        assert_eq!(&*msg.topic, "news");
        assert_eq!(msg.payload, b"hello world".to_vec());
    }

    /// Тест проверяет создание сообщения с String и пустым payload
    #[test]
    fn test_message_creation_with_string_and_unit() {
        let msg = Message::new(String::from("updates"), ());

        assert_eq!(&*msg.topic, "updates");
    }
}
