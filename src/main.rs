use std::sync::Arc;
use std::time::Duration;

use idp_gateway::config::Config;
use idp_gateway::gateway::{Gateway, RoutingTable, UpstreamDispatcher};
use idp_gateway::host::{self, ContextPathOverride, HashProviderSettings, HostContext, StaticContext};
use idp_gateway::server;
use idp_gateway::warmup;

/// `RUST_LOG` sets the filter; `GATEWAY_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("idp_gateway=info"));

    let json = std::env::var("GATEWAY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = Arc::new(Config::load()?);

    let hash_settings = HashProviderSettings::from_config(&cfg.password_hash);
    tracing::info!(
        provider = hash_settings.provider_id,
        log_rounds = hash_settings.log_rounds,
        "Password hash provider configured"
    );

    let host_context = ContextPathOverride::new(
        StaticContext::new(cfg.server.root_context_path.clone()),
        cfg.server.context_path.clone(),
    );

    let dispatcher = UpstreamDispatcher::new(
        &cfg.server.upstream_url,
        Duration::from_secs(cfg.server.connect_timeout_secs),
        Duration::from_secs(cfg.server.request_timeout_secs),
    )?;
    let gateway = Arc::new(Gateway::new(
        RoutingTable::new(&cfg.forward),
        Arc::new(dispatcher),
    ));

    let ready_cfg = Arc::clone(&cfg);
    let on_ready = move |addr: std::net::SocketAddr| {
        // Both tasks are detached; only their log lines report the outcome.
        let _ = warmup::on_ready(&ready_cfg.warmup, &ready_cfg.server.upstream_url);

        let provision_cfg = Arc::clone(&ready_cfg);
        tokio::spawn(async move { host::provision(&provision_cfg).await });

        tracing::info!(
            "Identity gateway started: http://localhost:{}{}{} to use the identity server",
            addr.port(),
            ready_cfg.server.root_context_path,
            host_context.context_path()
        );
    };

    tokio::select! {
        res = server::listener::run(&cfg.server.listen_addr, gateway, on_ready) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
