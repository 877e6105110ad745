use idem_redis::{connect, Coordinator, CoordinatorConfig, CoordinatorShutdown, RedisConnConfig};
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::Redis;

pub struct RedisHarness {
    pub coordinator: Coordinator,
    pub shutdown: CoordinatorShutdown,
    pub redis_url: String,
    _container: ContainerAsync<Redis>,
}

/// Start a disposable Redis container and build a `Coordinator` against it.
/// Installs a `tracing_subscriber` so `tracing::debug!`/`warn!` calls are
/// visible under `RUST_LOG`. `try_init` avoids a double-install panic
/// when multiple tests call `start`.
pub async fn start(config: CoordinatorConfig) -> RedisHarness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let container = Redis::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(6379).await.unwrap();
    let url = format!("redis://{host}:{port}");

    let conn = connect(&RedisConnConfig::new().with_url(&url))
        .await
        .expect("connect to test redis");

    let (coordinator, shutdown) = Coordinator::new(conn, config);

    RedisHarness {
        coordinator,
        shutdown,
        redis_url: url,
        _container: container,
    }
}
