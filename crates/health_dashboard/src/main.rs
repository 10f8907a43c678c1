use std::sync::Arc;

use anyhow::Context;
use health_dashboard::{AuthorizationState, DashboardService};
use health_platform::config::Config;
use health_platform::http_client::ReqwestHealthPlatform;
use health_dashboard::Notice;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log filter from `HEALTH_DASHBOARD_LOG_LEVEL`, else `RUST_LOG`, else `info`.
    let log_env = std::env::var("HEALTH_DASHBOARD_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // Keep the HTTP stack quiet unless asked for explicitly
    let combined_filter = format!("{},hyper=warn,reqwest=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("health_dashboard: log filter: {}", log_env);

    let config = Config::from_env().context("loading bridge configuration")?;
    tracing::info!(
        "health_dashboard: bridge at {} (remediation {})",
        config.bridge_url,
        if config.remediation { "on" } else { "off" }
    );
    let platform = ReqwestHealthPlatform::from_config(&config).context("building bridge client")?;
    let service = DashboardService::new(Arc::new(platform));

    let printer = spawn_notice_printer(service.notices());

    let outcome = service.on_platform_ready().await;
    let state = service.state();
    drop(service);
    finish_printer(printer).await;

    println!("{}", serde_json::to_string_pretty(&state)?);

    if outcome != AuthorizationState::Authorized {
        anyhow::bail!("health access not granted: {:?}", outcome);
    }
    Ok(())
}

/// Prints notices to stderr until every sender is gone.
fn spawn_notice_printer(mut notices: broadcast::Receiver<Notice>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => eprintln!("{notice}"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notice printer fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Waits for the printer; a panicked or cancelled task is logged, not fatal.
async fn finish_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "notice printer task failed");
            false
        }
    }
}
