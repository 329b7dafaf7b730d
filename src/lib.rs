//! Order Desk
//!
//! Watches the order service for pending orders, lets counter staff inspect
//! an order's line items, and either prints its receipt and releases it or
//! deletes it. The desk runs as a single-task loop in the terminal.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod app;
mod config;
mod console;
mod detail;
mod error;
mod escpos;
mod modal;
mod models;
mod order_list;
mod printer;
mod receipt;
mod runtime;
mod sync;
#[cfg(test)]
mod testing;

pub use app::{Command, OrderDesk, UiUpdate};
pub use config::Settings;
pub use error::DeskError;

/// Rolling log files kept in the log directory.
const MAX_LOG_FILES: usize = 10;

const LOG_FILE_PREFIX: &str = "desk";

/// Keep only the newest `MAX_LOG_FILES` desk log files in `log_dir`.
fn prune_old_logs(log_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };
    let mut log_files: Vec<(std::path::PathBuf, std::time::SystemTime)> = entries
        .flatten()
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        })
        .filter(|entry| entry.path().is_file())
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(std::time::UNIX_EPOCH);
            (entry.path(), modified)
        })
        .collect();

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));
    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to prune log file {}: {e}", path.display());
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,order_desk_lib=debug"));

    let log_dir = config::log_dir();
    prune_old_logs(&log_dir);
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    // stdout belongs to the order list.
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // The desk runs until process exit; dropping the guard would stop file logging.
    std::mem::forget(guard);
}

/// Forward stdin lines to the dispatch loop until EOF.
async fn read_stdin(tx: mpsc::Sender<String>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                break;
            }
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    init_logging();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_sha = env!("BUILD_GIT_SHA"),
        built_at = env!("BUILD_TIMESTAMP"),
        "Starting Order Desk"
    );

    let settings = Settings::load().context("failed to load settings")?;
    let api = api::HttpOrderApi::new(&settings.api).context("failed to build order API client")?;
    info!(
        base_url = api.base_url(),
        poll_secs = settings.sync.poll_interval_secs,
        diff_mode = ?settings.sync.diff_mode,
        "Configuration loaded"
    );

    let sink = printer::sink_from_settings(&settings.printer);
    info!(device = %sink.describe(), "Receipt printer configured");
    let layout = receipt::LayoutConfig::from_settings(&settings.receipt, &settings.printer);
    let mut desk = OrderDesk::new(
        Arc::new(api),
        printer::ReceiptPrinter::new(sink, layout),
        settings.sync.diff_mode,
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    rt.block_on(async {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(read_stdin(tx));

        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_signal.cancel();
            }
        });

        let mut presenter = console::ConsolePresenter::new(std::io::stdout());
        console::Presenter::show_help(&mut presenter);
        runtime::run_loop(
            &mut desk,
            rx,
            &mut presenter,
            Duration::from_secs(settings.sync.poll_interval_secs),
            cancel,
        )
        .await;
    });
    // The stdin reader sits in a blocking read that never returns on its own.
    rt.shutdown_timeout(Duration::from_millis(200));

    info!("Order Desk stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "order-desk-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn prune_keeps_newest_desk_logs_only() {
        let dir = scratch_dir("prune");
        for day in 1..=12 {
            std::fs::write(dir.join(format!("desk.2026-01-{day:02}")), "x").unwrap();
        }
        std::fs::write(dir.join("other.log"), "x").unwrap();

        prune_old_logs(&dir);

        let remaining: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        assert_eq!(
            remaining.iter().filter(|n| n.starts_with("desk")).count(),
            MAX_LOG_FILES
        );
        assert!(remaining.contains(&"other.log".to_string()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn prune_ignores_missing_directory() {
        prune_old_logs(Path::new("/nonexistent/order-desk/logs"));
    }
}
