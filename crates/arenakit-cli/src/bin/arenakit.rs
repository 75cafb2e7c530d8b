use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};

use arenakit_cli::{Classic, describe_types};
use arenakit_events::{
    EventBus, EventSource, LoggingConsumer, MatchEvent, MatchId, Team, run_consumer,
};
use arenakit_host::{ArenaHost, ArenakitConfig, ConfigLoadError, PhaseGate, init_logging};
use arenakit_scheduler::{Countdown, TokioScheduler};
use arenakit_types::{MatchContext, VictoryCondition};

#[derive(Parser)]
#[command(version = env!("VERSION_STRING"), about, long_about = None)]
pub struct Cli {
    /// Also write logs to the data directory (overrides config file)
    #[arg(long)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered arena and victory kinds
    Types,

    /// Run a countdown and log each tick
    ///
    /// Usage: arenakit countdown --seconds 7 --interval 3
    Countdown {
        /// Total length in seconds
        #[arg(short, long)]
        seconds: u32,

        /// Seconds between ticks (defaults to the total)
        #[arg(short, long)]
        interval: Option<u32>,

        /// Keep ticking past zero until interrupted
        #[arg(long)]
        no_expire: bool,
    },

    /// Run a match prestart with the configured timing and log its events
    Prestart {
        /// Match number
        #[arg(short, long, default_value_t = 1)]
        id: u64,

        /// Victory kind whose condition follows the match events
        #[arg(short, long, default_value = "LastManStanding")]
        victory: String,

        /// Team names in seeding order
        #[arg(required = true)]
        teams: Vec<String>,
    },

    /// Write a default config file if none exists
    InitConfig,
}

fn load_config() -> anyhow::Result<ArenakitConfig> {
    match ArenakitConfig::load() {
        Ok(config) => Ok(config),
        Err(ConfigLoadError::NotFound(_)) | Err(ConfigLoadError::NoConfigDir) => {
            Ok(ArenakitConfig::default())
        }
        Err(err) => Err(err).context("Failed to load config"),
    }
}

fn init_config() -> anyhow::Result<()> {
    let path = ArenakitConfig::config_path().context("Failed to determine config directory")?;
    if path.exists() {
        bail!(
            "Config file already exists at {}. Edit it manually or delete it to create a new one.",
            path.display()
        );
    }

    ArenakitConfig::default().save_to(&path)?;
    eprintln!("Config file created at: {}", path.display());
    Ok(())
}

fn list_types() -> anyhow::Result<()> {
    let mut host = ArenaHost::new();
    host.load_extension(Box::new(Classic))?;
    for line in describe_types(&host) {
        println!("{}", line);
    }
    Ok(())
}

async fn run_countdown(
    config: &ArenakitConfig,
    seconds: u32,
    interval: Option<u32>,
    no_expire: bool,
) -> anyhow::Result<()> {
    let scheduler = Arc::new(TokioScheduler::new(config.scheduler.tick_duration()));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut builder = Countdown::builder(seconds).cancel_on_expire(!no_expire);
    if let Some(interval) = interval {
        builder = builder.interval(interval);
    }
    let countdown = builder.start(scheduler, config.scheduler, move |remaining: i64| {
        info!("{}s remaining", remaining);
        let _ = tx.send(remaining);
        true
    })?;
    info!("Started {}", countdown);

    loop {
        tokio::select! {
            tick = rx.recv() => match tick {
                Some(remaining) if remaining <= 0 && !no_expire => break,
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                break;
            }
        }
    }

    countdown.stop();
    info!("Countdown finished after {} tick(s)", countdown.ticks_fired());
    Ok(())
}

async fn run_prestart(
    config: &ArenakitConfig,
    id: u64,
    victory: &str,
    team_names: Vec<String>,
) -> anyhow::Result<()> {
    let mut host = ArenaHost::new();
    host.load_extension(Box::new(Classic))?;
    let victory_type = host
        .victories()
        .lookup(victory)
        .with_context(|| format!("Unknown victory kind '{}'", victory))?;

    let scheduler = Arc::new(TokioScheduler::new(config.scheduler.tick_duration()));
    let (bus, receiver) = EventBus::new(64);
    let mut watcher = bus.subscribe();
    let consumer = tokio::spawn(run_consumer(receiver, LoggingConsumer));

    let gate = PhaseGate::new(
        scheduler,
        config.scheduler,
        config.match_phase,
        bus.create_sender(EventSource::Host),
    );

    let match_id = MatchId(id);
    let teams: Vec<Team> = team_names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Team::new(i as u32 + 1, name))
        .collect();
    let ctx = MatchContext::new(match_id, victory_type, teams.clone());
    let mut conditions: Vec<Box<dyn VictoryCondition>> =
        vec![host.victories().try_create(&ctx)?];
    gate.begin_prestart(match_id, teams)?;

    loop {
        tokio::select! {
            envelope = watcher.recv() => match envelope {
                Ok(envelope) => {
                    host.victories().dispatch(&envelope.event, &mut conditions);
                    if matches!(envelope.event, MatchEvent::Start(_)) {
                        break;
                    }
                }
                Err(err) => bail!("event bus closed: {}", err),
            },
            _ = tokio::signal::ctrl_c() => {
                gate.cancel(match_id, "interrupted");
                break;
            }
        }
    }

    drop(gate);
    drop(bus);
    consumer.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;

    let _guard = init_logging("cli", cli.log_file || config.logging.file)?;
    info!("arenakit {}", env!("VERSION_STRING"));

    match cli.command {
        Commands::Types => list_types(),
        Commands::Countdown {
            seconds,
            interval,
            no_expire,
        } => run_countdown(&config, seconds, interval, no_expire).await,
        Commands::Prestart { id, victory, teams } => {
            run_prestart(&config, id, &victory, teams).await
        }
        Commands::InitConfig => init_config(),
    }
}
