use anyhow::Context;
use clap::Parser;
use tracing::info;

use hardline_core::bridge::{BridgeConfig, Supervisor};

#[derive(Parser, Debug)]
#[command(
    name = "hardline",
    version,
    about = "Bridge between the flight-software radio link and ground station software"
)]
struct Cli {
    /// Simulator serial port overriding the flight data port (e.g. /dev/pts/7)
    #[arg(short = 's', long = "simulator-port", value_name = "PORT")]
    simulator_port: Option<String>,

    /// Enable per-frame debug output
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = BridgeConfig::default().with_simulator_port(cli.simulator_port);
    let supervisor = Supervisor::new(config);

    let control = supervisor.control();
    ctrlc::set_handler(move || {
        info!("interrupt received, closing ground-station sockets...");
        control.shutdown();
    })
    .context("signal handler setup failed")?;

    supervisor.run().context("bridge terminated abnormally")?;
    Ok(())
}
