use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dranik::config::{self, RobotConfig};
use dranik::input::script::{self, Script};
use dranik::input::{keyboard, GamepadFeed};
use dranik::programs::Program;
use dranik::registry;
use dranik::runtime::Runtime;

// Publish rate for scripted input when the loop is unpaced
const SCRIPT_PERIOD: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputSource {
    /// No gamepad; input reads neutral
    Idle,
    /// Drive from the terminal
    Keyboard,
    /// Replay a JSON gamepad script
    Script,
}

/// Run one op mode against simulated motors
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Op mode to register and run
    #[arg(long, value_enum, default_value_t = Program::ButtonEcho)]
    program: Program,

    /// Where gamepad input comes from
    #[arg(long, value_enum, default_value_t = InputSource::Idle)]
    input: InputSource,

    /// Gamepad script for `--input script`
    #[arg(long, required_if_eq("input", "script"))]
    script: Option<PathBuf>,

    /// Directory holding `<config>.json` robot configurations
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Override the control loop rate (0 = unpaced)
    #[arg(long)]
    hz: Option<u64>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=debug to see per-tick motor commands)
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(config::log_filter(directives.as_deref()))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the op reported success
async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    cli.program.registration().register()?;
    let descriptor = registry::registered().ok_or("registration slot is empty")?;

    let mut config = RobotConfig::resolve(cli.config_dir.as_deref(), descriptor.config.as_deref())?;
    if let Some(hz) = cli.hz {
        config.loop_hz = hz;
    }
    info!(
        "Robot \"{}\": {} motors at {} Hz",
        config.name,
        config.motors.len(),
        config.loop_hz
    );

    let (hardware, _probes) = config.sim_hardware()?;
    let feed = GamepadFeed::new();
    let mut runtime = Runtime::new(hardware, feed.clone()).with_config(&config);
    let stop = runtime.stop_handle();

    let producer = match cli.input {
        InputSource::Idle => None,
        InputSource::Keyboard => {
            let (feed, stop) = (feed.clone(), stop.clone());
            Some(tokio::task::spawn_blocking(move || {
                if let Err(e) = keyboard::run(feed, stop) {
                    warn!("Keyboard input failed: {}", e);
                }
            }))
        }
        InputSource::Script => {
            let path = cli.script.ok_or("--script is required with --input script")?;
            let script = Script::load(&path)?;
            let period = config.loop_period().unwrap_or(SCRIPT_PERIOD);
            Some(tokio::spawn(script::replay(script, feed.clone(), period, stop.clone())))
        }
    };

    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping op");
                stop.stop();
            }
        });
    }

    // The op is blocking code; keep it off the async workers
    let joined = tokio::task::spawn_blocking(move || runtime.invoke()).await;

    // Producers exit on the stop flag; wait even after a failed op so the terminal is restored
    stop.stop();
    if let Some(producer) = producer {
        producer.await?;
    }
    let report = joined??;

    println!("{}", serde_json::to_string(&report)?);
    if !report.outcome.is_ok() {
        warn!("Program exited unsuccessfully: {}", report.outcome);
    }
    Ok(report.outcome.is_ok())
}
