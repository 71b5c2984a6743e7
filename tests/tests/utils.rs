use mock_service::{AppState, ServiceConfig};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub const IMPORT_PATH: &str = mock_service::IMPORT_PATH;

/// Start the mock import service once per test binary and return its import URL.
///
/// The service runs on its own runtime so it outlives the runtime of the test that started it.
#[allow(unused)]
pub fn init() -> String {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();

    let addr = ADDR.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new(
                "fxload=debug,deal_load=debug,mock_service=debug,axum::rejection=trace",
            ))
            .try_init();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let state = AppState::new(&ServiceConfig::default());
                if let Err(err) = mock_service::serve(listener, state).await {
                    error!("Mock service stopped: {err}");
                }
            });
        });

        addr
    });

    format!("http://{addr}{IMPORT_PATH}")
}
