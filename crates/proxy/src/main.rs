#![deny(unsafe_code)]

use folio_proxy::{build_router, init_tracing, AppState, ProxyConfig};
use tokio::net::TcpListener;
use tracing::info;

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ProxyConfig::from_env().map_err(|e| e.to_string())?;
    init_tracing(config.log_json);

    let bind = config.bind;
    let upstream = config.upstream.clone();
    let timeout_ms = config.timeout.as_millis() as u64;
    let state = AppState::new(config).map_err(|e| e.to_string())?;
    let app = build_router(state);

    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| format!("bind failed: {e}"))?;
    info!(%bind, %upstream, timeout_ms, "folio-proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
