use anyhow::Context;
use clap::{Parser, ValueEnum};
use rustyline::error::ReadlineError;
use sentia_core::{AgentConfig, AgentState};
use sentia_limbic::perception::describe_visual_scene;
use sentia_limbic::{Agent, Heartbeat, HeartbeatConfig, Stimulus};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

mod scenarios;
mod simulator;

use scenarios::{Scenario, ScenarioKind};
use simulator::Simulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run a scripted scenario for a fixed number of cycles.
    Simulate,
    /// Tick in real time and feed console input as heard speech.
    Live,
}

#[derive(Parser, Debug)]
#[command(name = "sentia", author, version, about, long_about = None)]
struct Args {
    #[arg(long, value_enum, default_value = "simulate")]
    mode: Mode,

    /// Path to the agent config file
    #[arg(short, long, env = "SENTIA_CONFIG", default_value = "config/agent.toml")]
    config: PathBuf,

    /// Disable chemical noise and use a fixed seed
    #[arg(long)]
    deterministic: bool,

    /// Seed for the agent's random stream
    #[arg(long)]
    seed: Option<u64>,

    /// Number of simulation cycles
    #[arg(long, default_value_t = 100)]
    cycles: u64,

    #[arg(long, value_enum, default_value = "structured")]
    scenario: ScenarioKind,

    /// Delay between simulated cycles in milliseconds
    #[arg(long, default_value_t = 0)]
    tick_ms: u64,

    /// Heartbeat interval for live mode in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Print the full state as JSON after every cycle
    #[arg(short, long)]
    verbose: bool,

    /// Resume from a snapshot file instead of a fresh agent
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Write a snapshot of the agent on exit
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _guard = init_logging(&args)?;

    info!("Starting Sentia...");
    let agent = build_agent(&args)?;
    info!(step = agent.step(), stage = %agent.stage(), "agent ready");

    let agent = match args.mode {
        Mode::Simulate => {
            let scenario = Scenario::build(args.scenario, args.cycles);
            info!(
                "Running {} scenario for {} cycles ({} events)",
                scenario.name,
                args.cycles,
                scenario.event_count()
            );
            let mut sim = Simulator::new(agent)
                .with_tick_delay(Duration::from_millis(args.tick_ms))
                .verbose(args.verbose);
            let report = sim.run(&scenario, args.cycles).await?;
            println!(
                "\n{} cycles, {} events, {} decisions, mean regret {:.4}",
                report.steps, report.events, report.decisions, report.mean_regret
            );
            for (action, count) in &report.action_counts {
                println!("  {:<10} {}", action, count);
            }
            let agent = sim.into_agent();
            println!("{}", describe(&agent.get_state()));
            agent
        }
        Mode::Live => run_live(agent, Duration::from_millis(args.interval_ms.max(1))).await?,
    };

    if let Some(path) = &args.save {
        agent
            .save_snapshot(path)
            .with_context(|| format!("Failed to save snapshot to {}", path.display()))?;
    }

    info!("Shutting down Sentia.");
    Ok(())
}

fn init_logging(args: &Args) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let (writer, guard) = match &args.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("--log-file must name a file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(args.log_file.is_none())
        .with_writer(writer);
    let installed = if args.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;
    Ok(guard)
}

fn build_agent(args: &Args) -> anyhow::Result<Agent> {
    if let Some(path) = &args.resume {
        info!("Resuming from snapshot {}", path.display());
        if args.deterministic || args.seed.is_some() {
            tracing::warn!("--deterministic and --seed are ignored when resuming; the snapshot's config applies");
        }
        let agent = Agent::load_snapshot(path)
            .with_context(|| format!("Failed to load snapshot from {}", path.display()))?;
        return Ok(agent.with_configured_environment());
    }

    let mut config = AgentConfig::load_or_default(&args.config);
    if args.deterministic {
        config.agent.deterministic = true;
    }
    if args.seed.is_some() {
        config.agent.seed = args.seed;
    }
    let agent = Agent::new(config).context("Invalid agent config")?;
    Ok(agent.with_configured_environment())
}

async fn run_live(agent: Agent, interval: Duration) -> anyhow::Result<Agent> {
    let heartbeat = Heartbeat::spawn(
        agent,
        HeartbeatConfig {
            interval,
            ..HeartbeatConfig::default()
        },
    );
    let mut state_rx = heartbeat.subscribe();

    // rustyline blocks, so input is read on its own thread.
    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    let reader = tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut editor = rustyline::DefaultEditor::new()?;
        loop {
            match editor.readline(">> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    let done = is_exit(&line);
                    if line_tx.blocking_send(line).is_err() || done {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    });

    println!("Sentia live mode. Type 'state' to inspect, 'look <0-255>' to show a scene, 'exit' to quit.\n");

    while let Some(line) = line_rx.recv().await {
        let input = line.trim();
        if is_exit(input) {
            break;
        }
        match input {
            "" => continue,
            "state" => println!("{}", serde_json::to_string_pretty(&heartbeat.state())?),
            _ => {
                let stimulus = match input.strip_prefix("look ").map(|b| b.trim().parse::<f64>()) {
                    Some(Ok(brightness)) => Stimulus::Perception {
                        modality: "vision".into(),
                        content: describe_visual_scene(brightness).to_string(),
                        source: "camera".into(),
                    },
                    Some(Err(_)) => {
                        println!("usage: look <brightness 0-255>");
                        continue;
                    }
                    None => Stimulus::Perception {
                        modality: "hearing".into(),
                        content: input.to_string(),
                        source: "terminal".into(),
                    },
                };
                state_rx.borrow_and_update();
                heartbeat.send(stimulus).await?;
                state_rx.changed().await?;
                println!("{}\n", describe(&state_rx.borrow_and_update()));
            }
        }
    }

    reader.await??;
    heartbeat.stop().await
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "exit" | "quit")
}

fn describe(state: &AgentState) -> String {
    let signals = state
        .signals
        .iter()
        .map(|(k, v)| format!("{}={:.1}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    let traits = state
        .traits
        .iter()
        .map(|(k, v)| format!("{}={:.2}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "[{}] {}\n  traits: {}\n  stage={} wisdom={:.3} risk={:.2} fatigue={:.2}\n  narrative: {}",
        chrono::Local::now().format("%H:%M:%S"),
        signals,
        traits,
        state.development_stage,
        state.wisdom,
        state.risk_tolerance,
        state.fatigue,
        state.self_narrative
    )
}
