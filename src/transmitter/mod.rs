//! Шина publish/subscribe внутри процесса.
//!
//! - `bus`: [`Transmitter`]: подписка, публикация, отписка.
//! - `dispatcher`: очередь отложенных задач и её исполнитель.
//! - `registry` (приватный): топики и их подписчики.
//! - `callback`, `token`, `message`: типы, которые видит пользователь шины.
//! - `hook`: заменяемый получатель сбоев подписчиков.
//! - `global`: необязательный общий экземпляр.

pub mod bus;
pub mod callback;
pub mod dispatcher;
pub mod global;
pub mod hook;
pub mod message;
mod registry;
mod stats;
pub mod token;

pub use bus::{Delivery, Transmitter, TransmitterBuilder, Unsubscribe};
pub use callback::Callback;
pub use dispatcher::Dispatcher;
pub use hook::ErrorHook;
pub use message::Message;
pub use registry::Subscriber;
pub use stats::StatsSnapshot;
pub use token::Token;
