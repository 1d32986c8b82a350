//! Property-based tests для реестра подписок
//!
//! Случайные последовательности subscribe/unsubscribe/publish прогоняются
//! одновременно через шину и через простую модель (вектор подписок), после
//! каждого шага состояние сравнивается.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex},
};

use proptest::prelude::*;
use transmitter::{Callback, Delivery, Token, Transmitter};

const PROPTEST_CASES: u32 = 256;

const TOPICS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];
const CALLBACKS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Subscribe { topic: usize, callback: usize },
    UnsubscribeTopic(usize),
    UnsubscribeToken(usize),
    UnsubscribeTokenText(usize),
    UnsubscribeCallback(usize),
    Publish(usize),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..TOPICS.len(), 0..CALLBACKS)
            .prop_map(|(topic, callback)| Op::Subscribe { topic, callback }),
        1 => (0..TOPICS.len()).prop_map(Op::UnsubscribeTopic),
        2 => any::<usize>().prop_map(Op::UnsubscribeToken),
        1 => any::<usize>().prop_map(Op::UnsubscribeTokenText),
        1 => (0..CALLBACKS).prop_map(Op::UnsubscribeCallback),
        3 => (0..TOPICS.len()).prop_map(Op::Publish),
        1 => Just(Op::Clear),
    ]
}

/// Модельная подписка: топик, токен и номер колбэка.
#[derive(Debug, Clone)]
struct ModelSub {
    topic: &'static str,
    token: Token,
    callback: usize,
}

type Hits = Arc<Mutex<HashMap<(usize, String), usize>>>;

fn counting_callbacks(hits: &Hits) -> Vec<Callback<u8>> {
    (0..CALLBACKS)
        .map(|id| {
            let hits = hits.clone();
            Callback::new(move |topic: &str, _: &u8| {
                *hits.lock().unwrap().entry((id, topic.to_string())).or_default() += 1;
            })
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        ..ProptestConfig::default()
    })]

    /// Реестр шины всегда совпадает с моделью, а доставка вызывает ровно
    /// подписчиков, бывших в модели на момент публикации.
    #[test]
    fn prop_registry_matches_model(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let (bus, mut dispatcher) = Transmitter::<u8>::new();
        let hits: Hits = Arc::default();
        let callbacks = counting_callbacks(&hits);

        let mut model: Vec<ModelSub> = Vec::new();
        let mut issued: Vec<Token> = Vec::new();
        let mut expected: HashMap<(usize, String), usize> = HashMap::new();

        for op in ops {
            match op {
                Op::Subscribe { topic, callback } => {
                    let token = bus.subscribe(TOPICS[topic], callbacks[callback].clone()).unwrap();
                    prop_assert!(!issued.contains(&token));
                    issued.push(token);
                    model.push(ModelSub { topic: TOPICS[topic], token, callback });
                }
                Op::UnsubscribeTopic(topic) => {
                    let existed = model.iter().any(|s| s.topic == TOPICS[topic]);
                    prop_assert_eq!(bus.unsubscribe(TOPICS[topic]), existed);
                    model.retain(|s| s.topic != TOPICS[topic]);
                }
                Op::UnsubscribeToken(_) | Op::UnsubscribeTokenText(_) if issued.is_empty() => {}
                Op::UnsubscribeToken(i) => {
                    let token = issued[i % issued.len()];
                    let existed = model.iter().any(|s| s.token == token);
                    prop_assert_eq!(bus.unsubscribe(token), existed);
                    model.retain(|s| s.token != token);
                }
                Op::UnsubscribeTokenText(i) => {
                    let token = issued[i % issued.len()];
                    let existed = model.iter().any(|s| s.token == token);
                    prop_assert_eq!(bus.unsubscribe(&token.to_string()), existed);
                    model.retain(|s| s.token != token);
                }
                Op::UnsubscribeCallback(callback) => {
                    let existed = model.iter().any(|s| s.callback == callback);
                    prop_assert_eq!(bus.unsubscribe(&callbacks[callback]), existed);
                    model.retain(|s| s.callback != callback);
                }
                Op::Publish(topic) => {
                    let subs: Vec<_> = model.iter().filter(|s| s.topic == TOPICS[topic]).collect();
                    let outcome = bus.publish(TOPICS[topic], 0).unwrap();
                    if subs.is_empty() {
                        prop_assert_eq!(outcome, Delivery::NoSubscribers);
                    } else {
                        prop_assert_eq!(outcome, Delivery::Scheduled);
                    }
                    for sub in subs {
                        *expected.entry((sub.callback, sub.topic.to_string())).or_default() += 1;
                    }
                    dispatcher.run_pending();
                }
                Op::Clear => {
                    prop_assert!(bus.clear_all_subscriptions());
                    model.clear();
                }
            }

            for topic in TOPICS {
                let count = model.iter().filter(|s| s.topic == topic).count();
                prop_assert_eq!(bus.has_subscribers(topic), count > 0);
                prop_assert_eq!(bus.subscriber_count(topic), count);
            }
            let model_topics: BTreeSet<String> = model.iter().map(|s| s.topic.to_string()).collect();
            let bus_topics: BTreeSet<String> = bus.topics().into_iter().collect();
            prop_assert_eq!(bus_topics, model_topics);
        }

        let actual = hits.lock().unwrap().clone();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(bus.pending(), 0);
    }

    /// Токен переживает цикл Display → unsubscribe по строке.
    #[test]
    fn prop_token_text_form_is_stable(n in 1usize..32) {
        let (bus, _dispatcher) = Transmitter::<u8>::new();
        let cb = Callback::new(|_: &str, _: &u8| {});
        let tokens: Vec<Token> = (0..n).map(|_| bus.subscribe("t", cb.clone()).unwrap()).collect();

        for token in &tokens {
            let text = token.to_string();
            prop_assert!(text.starts_with("transmitter_uid_"));
            prop_assert!(bus.unsubscribe(text.as_str()));
            prop_assert!(!bus.unsubscribe(text.as_str()));
        }
        prop_assert!(!bus.has_subscribers("t"));
    }
}
