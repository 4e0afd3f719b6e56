use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::{Clock, NoDelay, Pacer, SystemClock};
use crate::{
    arch::{
        loss::{LossFn, Mse},
        Mlp,
    },
    dataset::{Batch, Dataset},
    optimization::{GradientDescent, Optimizer},
    telemetry::{
        BackwardSnapshot, ForwardSnapshot, Observer, Record, RecordKind, Snapshot,
        WeightsSnapshot,
    },
    Result, TrainErr,
};

/// The outcome of a `train` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    /// The average loss of every completed epoch.
    pub epoch_losses: Vec<f32>,
    /// Whether the training stopped early because it was cancelled.
    pub cancelled: bool,
}

impl TrainReport {
    pub fn epochs_completed(&self) -> usize {
        self.epoch_losses.len()
    }
}

/// Trains `model` over `dataset` for `epochs` epochs with plain gradient descent and the mean
/// squared error, reporting every batch and epoch to `observer`.
///
/// # Arguments
/// * `model` - The model to train, its parameters are updated in place.
/// * `dataset` - The batches, visited in the same order every epoch.
/// * `epochs` - The amount of passes over the dataset.
/// * `learning_rate` - The gradient descent step length.
/// * `observer` - The receiver of the telemetry.
///
/// # Returns
/// The training report or the first error found.
pub fn train<Ob>(
    model: &mut Mlp,
    dataset: &Dataset,
    epochs: usize,
    learning_rate: f32,
    observer: &mut Ob,
) -> Result<TrainReport>
where
    Ob: Observer + ?Sized,
{
    Trainer::new(GradientDescent::new(learning_rate), Mse).train(model, dataset, epochs, observer)
}

enum EpochState {
    Init,
    RunningEpoch(usize),
    EmitEpochSummary(usize, EpochProgress),
    Done,
}

enum EpochOutcome {
    Finished(EpochProgress),
    Cancelled,
}

#[derive(Default)]
struct EpochProgress {
    loss_sum: f32,
    batches: usize,
    last: Option<Snapshot>,
}

/// Drives the training loop and instruments every batch with timings and snapshots of the
/// model's activations, gradients and parameters.
pub struct Trainer<O, L, P = NoDelay, C = SystemClock> {
    optimizer: O,
    loss_fn: L,
    pacer: P,
    clock: C,
    cancel: Option<CancellationToken>,
}

impl<O, L> Trainer<O, L>
where
    O: Optimizer,
    L: LossFn,
{
    /// Creates a new `Trainer` that neither waits between batches nor can be cancelled.
    ///
    /// # Arguments
    /// * `optimizer` - Updates the parameters after each batch.
    /// * `loss_fn` - The loss minimized by the training.
    pub fn new(optimizer: O, loss_fn: L) -> Self {
        Self {
            optimizer,
            loss_fn,
            pacer: NoDelay,
            clock: SystemClock::new(),
            cancel: None,
        }
    }
}

impl<O, L, P, C> Trainer<O, L, P, C> {
    /// Replaces the strategy used to wait before each batch.
    pub fn with_pacer<P2: Pacer>(self, pacer: P2) -> Trainer<O, L, P2, C> {
        Trainer {
            optimizer: self.optimizer,
            loss_fn: self.loss_fn,
            pacer,
            clock: self.clock,
            cancel: self.cancel,
        }
    }

    /// Replaces the clock used to time the forward and backward passes.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Trainer<O, L, P, C2> {
        Trainer {
            optimizer: self.optimizer,
            loss_fn: self.loss_fn,
            pacer: self.pacer,
            clock,
            cancel: self.cancel,
        }
    }

    /// Makes the training stop once `token` is cancelled. The token is checked between batches,
    /// before and after waiting on the pacer. A batch that already started always runs to
    /// completion.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl<O, L, P, C> Trainer<O, L, P, C>
where
    O: Optimizer,
    L: LossFn,
    P: Pacer,
    C: Clock,
{
    /// Trains `model` for `epochs` epochs over `dataset`.
    ///
    /// For each batch, in order, `observer` receives a record with the batch's loss and
    /// snapshots taken before the optimizer updates the parameters. After the last batch of
    /// each epoch it receives one more record with the epoch's average loss.
    ///
    /// # Arguments
    /// * `model` - The model to train, its parameters are updated in place.
    /// * `dataset` - The batches, visited in the same order every epoch.
    /// * `epochs` - The amount of passes over the dataset.
    /// * `observer` - The receiver of the telemetry.
    ///
    /// # Returns
    /// The training report.
    ///
    /// # Errors
    /// - `ShapeMismatch` if a batch doesn't fit the model.
    /// - `EmptyDataset` if the dataset has no batches.
    /// - `Observer` if the observer fails, the current batch's parameter update is not applied.
    /// - `ShapeMismatch` if the optimizer was built for a different amount of parameters.
    pub fn train<Ob>(
        &mut self,
        model: &mut Mlp,
        dataset: &Dataset,
        epochs: usize,
        observer: &mut Ob,
    ) -> Result<TrainReport>
    where
        Ob: Observer + ?Sized,
    {
        let mut report = TrainReport::default();
        let mut state = EpochState::Init;

        info!(epochs = epochs, batches = dataset.len(); "starting training");

        loop {
            state = match state {
                EpochState::Init if epochs == 0 => EpochState::Done,
                EpochState::Init => EpochState::RunningEpoch(0),
                EpochState::RunningEpoch(epoch) => {
                    match self.run_epoch(model, dataset, epoch, observer)? {
                        EpochOutcome::Finished(progress) => {
                            EpochState::EmitEpochSummary(epoch, progress)
                        }
                        EpochOutcome::Cancelled => {
                            warn!(epoch = epoch; "training cancelled");
                            report.cancelled = true;
                            EpochState::Done
                        }
                    }
                }
                EpochState::EmitEpochSummary(epoch, progress) => {
                    let loss = Self::emit_epoch_summary(epoch, epochs, progress, observer)?;
                    report.epoch_losses.push(loss);

                    if epoch + 1 < epochs {
                        EpochState::RunningEpoch(epoch + 1)
                    } else {
                        EpochState::Done
                    }
                }
                EpochState::Done => break,
            };
        }

        info!(epochs = report.epochs_completed(); "training finished");
        Ok(report)
    }

    fn run_epoch<Ob>(
        &mut self,
        model: &mut Mlp,
        dataset: &Dataset,
        epoch: usize,
        observer: &mut Ob,
    ) -> Result<EpochOutcome>
    where
        Ob: Observer + ?Sized,
    {
        let mut progress = EpochProgress::default();

        for (index, batch) in dataset.iter().enumerate() {
            if self.is_cancelled() {
                return Ok(EpochOutcome::Cancelled);
            }

            self.pacer.pace();
            if self.is_cancelled() {
                return Ok(EpochOutcome::Cancelled);
            }

            let (loss, snapshot) = self.run_batch(model, batch)?;
            progress.loss_sum += loss;
            progress.batches += 1;

            debug!(
                epoch = epoch,
                batch = index,
                loss = loss,
                forward_time = snapshot.forward.forward_time,
                backward_time = snapshot.backward.backward_time;
                "batch done"
            );

            let record = Record::new(epoch, RecordKind::Batch { batch: index }, &snapshot, loss);
            observer.observe(record).map_err(TrainErr::Observer)?;

            model.step(&mut self.optimizer)?;
            progress.last = Some(snapshot);
        }

        Ok(EpochOutcome::Finished(progress))
    }

    /// Runs the forward and backward passes of a single batch and snapshots the model before
    /// its parameters get updated.
    fn run_batch(&mut self, model: &mut Mlp, batch: &Batch) -> Result<(f32, Snapshot)> {
        model.zero_grad();

        let t0 = self.clock.now();
        let (output, hidden) = model.forward(batch.x())?;
        let forward_time = secs(self.clock.now()) - secs(t0);

        if batch.y().dim() != output.dim() {
            return Err(TrainErr::ShapeMismatch {
                what: "target features",
                got: batch.y().ncols(),
                expected: output.ncols(),
            });
        }

        let loss = self.loss_fn.loss(output.view(), batch.y());
        model.backward(self.loss_fn.loss_prime(output.view(), batch.y()))?;

        // Measured from t0 on purpose, whatever happened between the passes counts as backward.
        let backward_time = secs(self.clock.now()) - secs(t0) - forward_time;

        let snapshot = Snapshot::new(
            ForwardSnapshot {
                input: batch.x().to_owned(),
                hidden_activation: hidden,
                output,
                forward_time,
            },
            BackwardSnapshot::capture(model, backward_time)?,
            WeightsSnapshot::capture(model)?,
        );

        Ok((loss, snapshot))
    }

    fn emit_epoch_summary<Ob>(
        epoch: usize,
        epochs: usize,
        progress: EpochProgress,
        observer: &mut Ob,
    ) -> Result<f32>
    where
        Ob: Observer + ?Sized,
    {
        let EpochProgress {
            loss_sum,
            batches,
            last: Some(last),
        } = progress
        else {
            return Err(TrainErr::EmptyDataset { epoch });
        };

        let avg_loss = loss_sum / batches as f32;
        info!("epoch {}/{epochs} average loss {avg_loss}", epoch + 1);

        let record = Record::new(epoch, RecordKind::EpochSummary { batches }, &last, avg_loss);
        observer.observe(record).map_err(TrainErr::Observer)?;

        Ok(avg_loss)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

fn secs(t: Duration) -> f64 {
    t.as_secs_f64()
}
