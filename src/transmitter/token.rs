use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

const TOKEN_PREFIX: &str = "transmitter_uid_";

/// Уникальный хэндл подписки.
///
/// Выдаётся только [`Transmitter::subscribe`](crate::Transmitter::subscribe)
/// и больше никогда не повторяется в пределах одного экземпляра, даже после
/// отписки или `clear_all_subscriptions`.
///
/// Текстовая форма: `transmitter_uid_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Разбирает текстовую форму токена. Используется `unsubscribe` по
    /// строке, когда строка не совпала с именем топика.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix(TOKEN_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Только каноническая форма: "transmitter_uid_05" не равен "transmitter_uid_5".
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        digits.parse().ok().map(Self)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{TOKEN_PREFIX}{}", self.0)
    }
}

/// Монотонный счётчик токенов. Никогда не сбрасывается.
#[derive(Debug, Default)]
pub(crate) struct TokenCounter {
    next: AtomicU64,
}

impl TokenCounter {
    pub(crate) fn next(&self) -> Token {
        Token::from_raw(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
