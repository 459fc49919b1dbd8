use std::sync::Arc;
use tracing::info;

use job_scout::{config, http, AppState};

/// `--port N` or `--port=N`; unparsable values are ignored.
fn parse_port(args: impl IntoIterator<Item = String>) -> Option<u16> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let value = match arg.strip_prefix("--port=") {
            Some(rest) => Some(rest.to_string()),
            None if arg == "--port" => args.next(),
            None => None,
        };
        if let Some(port) = value.and_then(|v| v.parse::<u16>().ok()) {
            return Some(port);
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = config::load_scout_config();
    let port = parse_port(std::env::args()).unwrap_or_else(|| config.server.resolve_port());

    let state = Arc::new(AppState::new(config));
    info!(
        "browser sessions capped at {}",
        state.session_limit.available_permits()
    );

    let app = http::router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Address already in use: {}. Stop the existing process or run with --port {} (or set PORT).",
                bind_addr,
                port.saturating_add(1)
            )
        }
        Err(e) => return Err(e.into()),
    };
    info!("job-scout listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received; draining in-flight searches");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_port_flag_forms() {
        assert_eq!(parse_port(args(&["job-scout", "--port", "9100"])), Some(9100));
        assert_eq!(parse_port(args(&["job-scout", "--port=9200"])), Some(9200));
        assert_eq!(parse_port(args(&["job-scout"])), None);
    }

    #[test]
    fn test_unparsable_port_is_ignored() {
        assert_eq!(parse_port(args(&["job-scout", "--port", "http"])), None);
        assert_eq!(parse_port(args(&["job-scout", "--port=99999", "--port", "8080"])), Some(8080));
    }
}
