// EchoBoard entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build the HTTP client and probe the backend
// 4. Create mpsc channels
// 5. Spawn the board controller task
// 6. Run the TUI until the user quits
// 7. Cleanup on exit

use std::sync::Arc;

use echoboard::api::client::{FeedbackApi, HttpFeedbackClient};
use echoboard::app;
use echoboard::config;
use echoboard::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Upper bound on the startup health probe so a silent host cannot delay
/// the TUI.
const PING_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("EchoBoard starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: api={}, reconcile after {:?} ms, toast {} ms",
        config.api.base_url, config.board.reconcile_delays_ms, config.board.toast_ms
    );

    // 3. Build the HTTP client. An unreachable backend is not fatal: the
    //    board starts and shows the load error inline.
    let client = HttpFeedbackClient::from_config(&config.api);
    match tokio::time::timeout(PING_TIMEOUT, client.ping()).await {
        Ok(Ok(())) => info!("Backend reachable at {}", client.base_url()),
        Ok(Err(e)) => warn!("Backend check failed for {}: {}", client.base_url(), e),
        Err(_) => warn!(
            "Backend at {} did not answer within {:?}",
            client.base_url(),
            PING_TIMEOUT
        ),
    }
    let api: Arc<dyn FeedbackApi> = Arc::new(client);

    // 4. Create mpsc channels
    let (api_tx, api_rx) = mpsc::channel(256);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let board = app::BoardController::new(config.board.clone(), api, api_tx);

    // 5. Spawn the board controller task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, api_rx, ui_tx, board).await {
            error!("Board loop error: {}", e);
        }
    });

    // 6. Run the TUI (blocks until the user quits)
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 7. Cleanup: wait for the controller to dispose (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("EchoBoard shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("echoboard.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("echoboard=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
