mod cli;

use segwatch::config::{self, Settings};
use segwatch::scanner::EligibilityFilter;
use segwatch::segmenter::FfmpegSegmenter;
use segwatch::watch::{LoopConfig, WatchLoop};
use segwatch_av::ToolPaths;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "segwatch=debug,segwatch_av=debug".to_string()
        } else {
            "segwatch=info,segwatch_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let file_config = config::load_config_or_default(cli.config.as_deref())?;
    let settings = Settings::resolve(file_config, cli.overrides())?;

    let tools = ToolPaths::discover(
        settings.tools.ffmpeg_path.as_deref(),
        settings.tools.ffprobe_path.as_deref(),
    )
    .map_err(config::ConfigError::from)?;
    settings.prepare_directories()?;
    for (name, version) in tools.versions() {
        tracing::debug!("{}: {}", name, version.as_deref().unwrap_or("unknown version"));
    }

    tracing::info!(
        "Splitting into {} segments: {:?} -> {:?}",
        settings.duration,
        settings.input_dir,
        settings.output_dir
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    rt.block_on(run(settings, tools))
}

async fn run(settings: Settings, tools: ToolPaths) -> Result<()> {
    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let filter = EligibilityFilter::new(&settings.extensions, settings.settle_time);
    let segmenter = FfmpegSegmenter::from_settings(tools, &settings);
    let mut watch = WatchLoop::new(LoopConfig::from_settings(&settings), filter, segmenter);

    let summary = watch.run(cancel).await;

    tracing::info!(
        "Done: {} poll(s), {} video(s) split into {} segments, {} failed attempt(s)",
        summary.cycles,
        summary.processed,
        summary.segments,
        summary.failed_attempts
    );

    Ok(())
}

/// Cancel `cancel` on Ctrl+C or SIGTERM. The loop notices between files.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Interrupt received, stopping after the current file (Ctrl+C again to abort)");
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Aborting immediately");
        std::process::exit(130);
    }
}
