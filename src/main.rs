use std::{env, io};

use anyhow::Context;
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use tokio::{signal, sync::mpsc, task};
use tokio_util::sync::CancellationToken;

use instrumented_trainer::{
    arch::loss::Mse,
    config::OptimizerConfig,
    optimization::{GradientDescent, GradientDescentWithMomentum, Optimizer},
    telemetry::{ChannelObserver, JsonLines, Observer, Record},
    training::FixedDelay,
    Dataset, Mlp, TrainReport, Trainer, TrainingConfig,
};

const CONFIG_VAR: &str = "TRAINING_CONFIG";
const RECORDS_CAPACITY: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = load_config()?;
    let cancel = CancellationToken::new();
    let (observer, rx) = ChannelObserver::channel(RECORDS_CAPACITY);

    let token = cancel.clone();
    let mut training = task::spawn_blocking(move || run(config, observer, token));
    let writer = tokio::spawn(write_records(rx));

    let report = tokio::select! {
        res = &mut training => res,
        _ = signal::ctrl_c() => {
            warn!("interrupted, stopping after the current batch");
            cancel.cancel();
            training.await
        }
    };

    let report = report.context("training task panicked")??;
    writer.await.context("writer task panicked")??;

    info!(
        epochs = report.epochs_completed(),
        cancelled = report.cancelled;
        "final loss {:?}",
        report.epoch_losses.last()
    );

    Ok(())
}

fn load_config() -> anyhow::Result<TrainingConfig> {
    let path = env::args().nth(1).or_else(|| env::var(CONFIG_VAR).ok());

    let Some(path) = path else {
        info!("no config given, using defaults");
        return Ok(TrainingConfig::default());
    };

    info!("loading config from {path}");
    TrainingConfig::from_path(&path).with_context(|| format!("invalid config at {path}"))
}

async fn write_records(mut rx: mpsc::Receiver<Record>) -> anyhow::Result<()> {
    let mut out = JsonLines::new(io::stdout());

    while let Some(record) = rx.recv().await {
        out.observe(record)
            .map_err(|e| anyhow::anyhow!("failed to write record: {e}"))?;
    }

    Ok(())
}

fn run(
    config: TrainingConfig,
    mut observer: ChannelObserver,
    cancel: CancellationToken,
) -> anyhow::Result<TrainReport> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let model = config.model;
    let data = config.data;

    let dataset = Dataset::synthetic(
        &mut rng,
        data.num_points,
        model.input_size,
        model.output_size,
        data.noise,
        data.batch_size,
    )?;
    let mut mlp = Mlp::new(
        model.input_size,
        model.hidden_size,
        model.output_size,
        &mut rng,
    )?;

    info!(
        params = mlp.size(),
        batches = dataset.len();
        "built a {}x{}x{} network",
        model.input_size,
        model.hidden_size,
        model.output_size
    );

    let report = match config.optimizer {
        OptimizerConfig::GradientDescent { learning_rate } => fit(
            GradientDescent::new(learning_rate),
            &config,
            &mut mlp,
            &dataset,
            &mut observer,
            cancel,
        ),
        OptimizerConfig::GradientDescentWithMomentum {
            learning_rate,
            momentum,
        } => fit(
            GradientDescentWithMomentum::new(mlp.size(), learning_rate, momentum),
            &config,
            &mut mlp,
            &dataset,
            &mut observer,
            cancel,
        ),
    }?;

    Ok(report)
}

fn fit<O: Optimizer>(
    optimizer: O,
    config: &TrainingConfig,
    mlp: &mut Mlp,
    dataset: &Dataset,
    observer: &mut ChannelObserver,
    cancel: CancellationToken,
) -> instrumented_trainer::Result<TrainReport> {
    Trainer::new(optimizer, Mse)
        .with_pacer(FixedDelay(config.batch_delay()))
        .with_cancellation(cancel)
        .train(mlp, dataset, config.epochs, observer)
}
