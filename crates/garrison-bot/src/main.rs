//! Garrison Bot - scheduled game automation over adb

use adb_transport::AdbTransport;
use anyhow::Context;
use clap::{Parser, Subcommand};
use game_control::{GameConfig, GameContext, TemplateLibrary, VideoCapture};
use routine_engine::{AutomationConfig, AutomationEngine, StateStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "garrison-bot", version, about = "Scheduled game automation over adb")]
struct Cli {
    /// Path to the game configuration file
    #[arg(long, global = true, default_value = "config/config.json")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the automation engine until interrupted
    Run {
        /// Path to the automation schedule file
        #[arg(long, default_value = "config/automation.json")]
        automation: PathBuf,
        /// Path to the persisted run state
        #[arg(long, default_value = "data/state.json")]
        state: PathBuf,
    },
    /// List connected devices
    Devices,
    /// Capture a screenshot from the device
    Screenshot {
        /// Local output path
        #[arg(short, long, default_value = "screen.png")]
        output: PathBuf,
    },
    /// Launch the game package
    Launch,
    /// Force-stop the game package
    ForceStop,
    /// Record the device screen for a fixed duration
    Record {
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = GameConfig::load(&cli.config)
        .await
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    match cli.command {
        Command::Run { automation, state } => run(&cli.config, config, &automation, &state).await,
        Command::Devices => devices(&config).await,
        Command::Screenshot { output } => screenshot(&config, &output).await,
        Command::Launch => launch(&config).await,
        Command::ForceStop => force_stop(&config).await,
        Command::Record { seconds } => record(&config, seconds).await,
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "garrison_bot=debug,routine_engine=debug,game_control=debug,adb_transport=debug,info"
    } else {
        "garrison_bot=info,routine_engine=info,game_control=info,adb_transport=info,warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

/// Connect to the device named by the config
async fn connect(config: &GameConfig) -> anyhow::Result<AdbTransport> {
    let endpoint = config.adb.endpoint();
    if config.adb.enforce_connection && endpoint.is_none() {
        anyhow::bail!("adb host/port must be configured when enforce_connection is set");
    }

    let transport = AdbTransport::connect(&config.adb.binary_path, endpoint.as_ref())
        .await
        .context("failed to connect to device")?;
    tracing::info!("Connected to device {}", transport.serial());
    Ok(transport)
}

async fn run(
    config_path: &Path,
    config: GameConfig,
    automation_path: &Path,
    state_path: &Path,
) -> anyhow::Result<()> {
    tracing::info!("Starting Garrison Bot automation engine");

    let transport = connect(&config).await?;

    // Template paths in the config are relative to the config file
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let templates = TemplateLibrary::load(&config, base_dir);
    if templates.is_empty() {
        tracing::warn!("No templates loaded; most routines will not find anything");
    }

    let tmp_dir = PathBuf::from("tmp");
    tokio::fs::create_dir_all(&tmp_dir).await?;

    let ctx = GameContext::new(config, transport, templates, tmp_dir);
    let automation = AutomationConfig::load(automation_path).await?;
    let store = StateStore::load(state_path).await;
    let mut engine = AutomationEngine::new(ctx, &automation, store)?;

    tokio::select! {
        result = engine.run() => {
            result.context("automation engine stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received ctrl-c, shutting down");
        }
    }
    Ok(())
}

async fn devices(config: &GameConfig) -> anyhow::Result<()> {
    let endpoint = config.adb.endpoint();
    let devices = AdbTransport::list_devices(&config.adb.binary_path, endpoint.as_ref()).await?;
    if devices.is_empty() {
        println!("No devices connected");
    } else {
        for serial in devices {
            println!("{serial}");
        }
    }
    Ok(())
}

async fn screenshot(config: &GameConfig, output: &Path) -> anyhow::Result<()> {
    let transport = connect(config).await?;
    transport.screencap_to(output).await?;
    println!("Saved screenshot to {}", output.display());
    Ok(())
}

async fn launch(config: &GameConfig) -> anyhow::Result<()> {
    let transport = connect(config).await?;
    transport.launch_package(&config.package_name).await?;
    tracing::info!("Launched {}", config.package_name);
    Ok(())
}

async fn force_stop(config: &GameConfig) -> anyhow::Result<()> {
    let transport = connect(config).await?;
    transport.force_stop(&config.package_name).await?;
    tracing::info!("Stopped {}", config.package_name);
    Ok(())
}

async fn record(config: &GameConfig, seconds: u64) -> anyhow::Result<()> {
    let transport = connect(config).await?;
    let mut video = VideoCapture::new(&config.recording);

    let filename = format!(
        "manual_recording_{}.mp4",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    video.start(&transport, &filename).await?;
    println!("Recording for {seconds} seconds (ctrl-c to abort)...");

    tokio::select! {
        _ = tokio::time::sleep(std::time::Duration::from_secs(seconds)) => {
            let path = video.stop(&transport).await?;
            println!("Recording saved to {}", path.display());
        }
        _ = tokio::signal::ctrl_c() => {
            video.abort(&transport).await;
            println!("Recording aborted");
        }
    }
    Ok(())
}
