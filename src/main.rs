//! Command line front end: stream L3 events, profile the generator, or
//! run the WebSocket broadcaster.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lobsim::{MarketGenerator, SimConfig};
use std::io::Write;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lobsim", version, about = "Limit order book market simulator")]
struct Cli {
    #[command(flatten)]
    config: ConfigOpts,

    #[command(subcommand)]
    command: Command,
}

/// Simulation options shared by every subcommand.
#[derive(Args)]
struct ConfigOpts {
    /// Price quantum (real price per tick).
    #[arg(long, global = true)]
    tick_size: Option<f64>,

    /// RNG seed; omit for a random seed.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Base order intents per simulation tick.
    #[arg(long, global = true)]
    orders_per_tick: Option<u32>,

    /// Fraction of intents that are cancellations, in [0, 1].
    #[arg(long, global = true)]
    cancel_ratio: Option<f64>,

    /// Snapshot depth cap per side.
    #[arg(long, global = true)]
    depth: Option<u16>,

    /// Broadcast cadence in snapshots per second.
    #[arg(long, global = true)]
    target_hz: Option<u16>,

    /// Maximum concurrent WebSocket subscribers.
    #[arg(long, global = true)]
    max_subscribers: Option<u16>,

    /// Intraday session length in seconds.
    #[arg(long, global = true)]
    session_length_s: Option<u32>,

    /// Check book invariants after every mutation (fatal on violation).
    #[arg(long, global = true)]
    validate_orders: bool,
}

impl ConfigOpts {
    fn build(&self) -> Result<SimConfig, lobsim::ConfigError> {
        let mut config = SimConfig {
            seed: self.seed.unwrap_or_else(rand::random),
            validate_orders: self.validate_orders,
            ..SimConfig::default()
        };
        if let Some(tick_size) = self.tick_size {
            config.tick_size = tick_size;
        }
        if let Some(orders_per_tick) = self.orders_per_tick {
            config.orders_per_tick = orders_per_tick;
        }
        if let Some(cancel_ratio) = self.cancel_ratio {
            config.cancel_ratio = cancel_ratio;
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(target_hz) = self.target_hz {
            config.target_hz = target_hz;
        }
        if let Some(max_subscribers) = self.max_subscribers {
            config.max_subscribers = max_subscribers;
        }
        if let Some(session_length_s) = self.session_length_s {
            config.session_length_s = session_length_s;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run generator ticks, writing L3 events to stdout as JSON lines.
    Stream {
        /// Number of ticks to run.
        #[arg(long, default_value_t = 1_000)]
        steps: u64,

        /// Seconds to sleep between ticks.
        #[arg(long = "sleep-sec", default_value_t = 0.0)]
        sleep_sec: f64,
    },
    /// Run ticks silently and report throughput on stderr.
    Profile {
        /// Number of ticks to run.
        #[arg(long, default_value_t = 100_000)]
        steps: u64,
    },
    /// Serve snapshots over WebSocket at /ws (plus GET /health).
    Ws {
        /// Bind address.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Bind port.
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(parse_error) => {
            let _ = parse_error.print();
            // Help and version land here too; only real parse errors are
            // invalid arguments.
            return if parse_error.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match cli.config.build() {
        Ok(config) => config,
        Err(config_error) => {
            error!("invalid configuration: {config_error}");
            return ExitCode::from(1);
        }
    };

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(runtime_error) => {
            error!("{runtime_error:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(command: Command, config: SimConfig) -> anyhow::Result<()> {
    match command {
        Command::Stream { steps, sleep_sec } => stream(config, steps, sleep_sec),
        Command::Profile { steps } => profile(config, steps),
        Command::Ws { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid bind address {host}:{port}"))?;
            lobsim::stream::serve(config, addr)
                .await
                .context("broadcast server failed")
        }
    }
}

fn stream(config: SimConfig, steps: u64, sleep_sec: f64) -> anyhow::Result<()> {
    let mut generator = MarketGenerator::new(config);
    let mut stdout = std::io::stdout().lock();

    for event in generator.seed_book() {
        writeln!(stdout, "{}", serde_json::to_string(&event)?)?;
    }
    for _ in 0..steps {
        for event in generator.step() {
            writeln!(stdout, "{}", serde_json::to_string(&event)?)?;
        }
        if sleep_sec > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(sleep_sec));
        }
    }
    Ok(())
}

fn profile(config: SimConfig, steps: u64) -> anyhow::Result<()> {
    let mut generator = MarketGenerator::new(config);
    generator.seed_book();

    let started = Instant::now();
    for _ in 0..steps {
        generator.step();
    }
    let elapsed = started.elapsed();
    let stats = generator.stats();

    let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
    eprintln!("{steps} ticks in {elapsed:.2?}");
    eprintln!(
        "{:.0} ticks/s, {:.0} events/s ({} events, {} trades, {} cancels)",
        steps as f64 / seconds,
        stats.events as f64 / seconds,
        stats.events,
        stats.trades,
        stats.cancels
    );
    Ok(())
}
