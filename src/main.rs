use std::{env, process};

use anyhow::{bail, Context, Result};
use neural_nexus::{
    export::{self, EXPORT_FILE_NAME},
    NetworkStore, SimulationConfig, TrainingSimulator,
};
use tokio::time;

const USAGE: &str =
    "Usage: neural-nexus <store|epoch> [--epochs N] [--config FILE] [--export FILE]";

/// Epochs the epoch-oriented simulator runs for when `--epochs` is not given.
const DEFAULT_EPOCHS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Store,
    Epoch,
}

#[derive(Debug)]
struct Args {
    mode: Mode,
    epochs: u32,
    config: Option<String>,
    export: String,
}

fn parse_args(argv: &[String]) -> Result<Args> {
    let mode = match argv.get(1).map(String::as_str) {
        Some("store") => Mode::Store,
        Some("epoch") => Mode::Epoch,
        Some(other) => bail!("unknown mode: {other}"),
        None => bail!("missing mode"),
    };

    let mut args = Args {
        mode,
        epochs: DEFAULT_EPOCHS,
        config: None,
        export: EXPORT_FILE_NAME.to_string(),
    };

    let mut rest = argv[2..].iter();
    while let Some(flag) = rest.next() {
        let mut value = || {
            rest.next()
                .cloned()
                .with_context(|| format!("{flag} requires a value"))
        };

        match flag.as_str() {
            "--epochs" => {
                args.epochs = value()?
                    .parse::<u32>()
                    .ok()
                    .filter(|&epochs| epochs > 0)
                    .context("--epochs must be a positive integer")?;
            }
            "--config" => args.config = Some(value()?),
            "--export" => args.export = value()?,
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(args)
}

fn load_config(base: SimulationConfig, path: Option<&str>) -> Result<SimulationConfig> {
    match path {
        Some(path) => base
            .merge_file(path)
            .with_context(|| format!("cannot load config '{path}'")),
        None => Ok(base),
    }
}

/// Runs the store-integrated training until it stops by itself.
async fn run_store(config: SimulationConfig, export_path: &str) -> Result<()> {
    let store = NetworkStore::with_config(config);
    let summary = store.summary();
    log::info!(
        "architecture: {} layers, {} neurons, {} connections ({:?})",
        summary.layers,
        summary.total_neurons,
        summary.total_connections,
        summary.complexity
    );

    store.start_training();
    let mut poll = time::interval(store.config().tick_interval());

    let finished = async {
        let mut reported = 0;
        while store.is_training() {
            poll.tick().await;
            let progress = store.training_progress();
            if progress >= reported + 10 {
                reported = progress;
                log::info!(
                    "progress {progress}: loss={:.4} accuracy={:.1}%",
                    store.current_loss(),
                    store.current_accuracy() * 100.0
                );
            }
        }
    };

    tokio::select! {
        _ = finished => {}
        _ = tokio::signal::ctrl_c() => log::warn!("interrupted, stopping training"),
    }
    store.stop_training();

    let state = store.snapshot();
    println!(
        "steps: {}  final loss: {:.4}  final accuracy: {:.1}%",
        state.training_progress,
        store.current_loss(),
        store.current_accuracy() * 100.0
    );

    export::write_json(export_path, &export::records(&state.loss, &state.accuracy))?;
    Ok(())
}

/// Runs the epoch-oriented simulator until it stops by itself after `epochs` epochs.
async fn run_epoch(mut config: SimulationConfig, epochs: u32, export_path: &str) -> Result<()> {
    config.max_steps = Some(epochs);
    let sim = TrainingSimulator::with_config(config);
    sim.start_training();
    let mut poll = time::interval(sim.config().tick_interval());

    let finished = async {
        while sim.is_training() {
            poll.tick().await;
        }
    };

    tokio::select! {
        _ = finished => {}
        _ = tokio::signal::ctrl_c() => log::warn!("interrupted, stopping simulation"),
    }
    sim.stop_training();

    let state = sim.state();
    let insights = sim.insights();
    println!(
        "epoch: {}  progress: {:.0}%  loss: {:.4}  accuracy: {:.1}%",
        state.epoch,
        sim.progress(),
        state.loss,
        state.accuracy * 100.0
    );
    println!(
        "status: {}  learning speed: {}  remaining: {}",
        insights.status,
        insights.learning_speed_label(),
        insights.time_remaining_label()
    );

    let history = sim.history();
    export::write_json(export_path, &export::records(&history.loss, &history.accuracy))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            process::exit(1);
        }
    };

    match args.mode {
        Mode::Store => {
            let config = load_config(SimulationConfig::store(), args.config.as_deref())?;
            run_store(config, &args.export).await
        }
        Mode::Epoch => {
            let config = load_config(SimulationConfig::epoch(), args.config.as_deref())?;
            run_epoch(config, args.epochs, &args.export).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("neural-nexus")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_mode_and_flags() {
        let args = parse_args(&argv(&["epoch", "--epochs", "5", "--export", "out.json"])).unwrap();

        assert_eq!(args.mode, Mode::Epoch);
        assert_eq!(args.epochs, 5);
        assert_eq!(args.export, "out.json");
        assert!(args.config.is_none());
    }

    #[test]
    fn defaults_export_name() {
        let args = parse_args(&argv(&["store"])).unwrap();
        assert_eq!(args.export, EXPORT_FILE_NAME);
        assert_eq!(args.epochs, DEFAULT_EPOCHS);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&argv(&[])).is_err());
        assert!(parse_args(&argv(&["train"])).is_err());
        assert!(parse_args(&argv(&["epoch", "--epochs"])).is_err());
        assert!(parse_args(&argv(&["epoch", "--epochs", "x"])).is_err());
        assert!(parse_args(&argv(&["epoch", "--epochs", "0"])).is_err());
        assert!(parse_args(&argv(&["epoch", "--epochs", "-2"])).is_err());
        assert!(parse_args(&argv(&["store", "--verbose"])).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn epoch_run_stops_at_the_requested_epoch() {
        let path = std::env::temp_dir().join(format!("nexus-cli-{}.json", process::id()));
        let path = path.to_string_lossy().into_owned();

        run_epoch(SimulationConfig::epoch().with_seed(4), 3, &path)
            .await
            .unwrap();

        let records = export::read_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(records.len(), 3);
        assert_eq!(records.last().map(|r| r.epoch), Some(3));
    }
}
