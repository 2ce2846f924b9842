use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use evochora::{ProgramArtifact, SimulationConfig};

#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Simulation config JSON file (worldShape, seed, energyStrategies, ...)
    config: PathBuf,

    /// Program artifact JSON file to place at every initial organism sharing
    /// its programId; may be repeated for multiple programs
    #[arg(long = "artifact")]
    artifacts: Vec<PathBuf>,

    /// Overrides the config's maxTicks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Prints one raw tick snapshot as a JSON line per tick on stdout
    #[arg(long)]
    emit_snapshots: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_text = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("reading config file {}", cli.config.display()))?;
    let mut config: SimulationConfig =
        serde_json::from_str(&config_text).context("parsing simulation config")?;
    if let Some(max_ticks) = cli.max_ticks {
        config.max_ticks = Some(max_ticks);
    }

    let mut sim = evochora::Simulation::from_config(&config).context("building simulation")?;

    for artifact_path in &cli.artifacts {
        let artifact_text = std::fs::read_to_string(artifact_path)
            .with_context(|| format!("reading artifact file {}", artifact_path.display()))?;
        let artifact: ProgramArtifact =
            serde_json::from_str(&artifact_text).context("parsing program artifact")?;
        sim.place_artifact(&artifact)
            .with_context(|| format!("placing artifact {}", artifact_path.display()))?;
    }

    let start = Instant::now();
    let mut ticks = 0u64;

    let all_dead = loop {
        if let Some(max_ticks) = config.max_ticks {
            if sim.current_tick() >= max_ticks {
                break false;
            }
        }

        let snapshot = sim.tick();
        ticks += 1;
        if cli.emit_snapshots {
            println!("{}", serde_json::to_string(&snapshot)?);
        }

        if sim.organisms().iter().all(|o| o.is_dead) {
            break true;
        }
    };

    if all_dead {
        println!("--------\nAll organisms dead, halting.");
    } else {
        println!("--------\nTick limit reached, halting.");
    }

    let elapsed = start.elapsed();
    println!("Runtime: {elapsed:?}");
    println!("Ticks completed: {ticks}");
    if ticks > 0 {
        println!("Average time per tick: {:?}", elapsed / ticks as u32);
        println!(
            "Average ticks per second: {:.1}",
            (ticks as f64) / elapsed.as_secs_f64()
        );
    }

    Ok(())
}
