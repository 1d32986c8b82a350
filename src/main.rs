use serde_json::{json, Value};
use tracing::info;
use transmitter::{global, init_logging, Callback, Settings, Transmitter};

/// Пример корня композиции: шина создаётся здесь и раздаётся компонентам.
///
/// Один компонент подписывается на топик "a", другой публикует в него,
/// как кнопки в исходном UI.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let logging = init_logging(settings.logging.clone()).map_err(|e| anyhow::anyhow!("{e}"))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT"),
        built = env!("BUILD_TIME"),
        bus = %settings.name,
        "Starting transmitter demo"
    );

    let (bus, dispatcher) = Transmitter::<Value>::builder()
        .name(settings.name.clone())
        .spawn();

    if settings.install_global {
        global::install(bus.clone())?;
    }

    let status = Callback::new(|topic: &str, message: &Value| {
        info!(topic, %message, "Status panel received message");
    });
    let token = bus.subscribe("a", status)?;

    bus.publish("a", json!({ "r": "rtrtrt" }))?;
    bus.signal("a")?;
    bus.settled().await;

    bus.unsubscribe(token);
    info!(stats = ?bus.stats(), "Demo finished");

    bus.shutdown();
    dispatcher.await?;
    logging.shutdown();
    Ok(())
}
