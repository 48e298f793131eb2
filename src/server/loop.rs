// Server loop module
// Accepts connections until a shutdown signal arrives, then drains

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How often the drain checks the active connection count
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` resolves.
///
/// After the signal the listener is closed and in-flight connections get up
/// to `drain_timeout` to finish before the loop returns.
pub async fn start_server_loop<S>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: S,
    drain_timeout: Duration,
) -> std::io::Result<()>
where
    S: Future<Output = ()>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = &mut shutdown => {
                logger::log_info("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    drop(listener);
    drain_connections(&active_connections, drain_timeout).await;
    Ok(())
}

/// Wait for active connections to finish, giving up at the deadline
async fn drain_connections(active: &AtomicUsize, drain_timeout: Duration) {
    let deadline = tokio::time::Instant::now() + drain_timeout;

    loop {
        let remaining = active.load(Ordering::SeqCst);
        if remaining == 0 {
            logger::log_info("All connections closed");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Drain timeout reached with {remaining} connection(s) still open"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Assets;
    use crate::config::{
        AssetsConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig,
    };
    use crate::server::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn test_state() -> Arc<AppState> {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            logging: LoggingConfig {
                level: "error".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 0,
                read_timeout: 5,
                write_timeout: 5,
                max_connections: None,
            },
            assets: AssetsConfig::default(),
        };
        let src = std::env::temp_dir();
        let assets = Assets::new(AssetsConfig {
            paths: vec![src],
            ..AssetsConfig::default()
        })
        .unwrap();
        Arc::new(AppState::new(&config, Arc::new(assets)))
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(start_server_loop(
            listener,
            test_state(),
            async {
                let _ = rx.await;
            },
            Duration::from_secs(1),
        ));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /nothing HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 404"));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_drain_returns_at_deadline() {
        let active = AtomicUsize::new(1);
        let started = tokio::time::Instant::now();
        drain_connections(&active, Duration::from_millis(100)).await;
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
