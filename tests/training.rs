use ndarray::array;
use rand::{rngs::StdRng, SeedableRng};

use instrumented_trainer::{
    arch::loss::Mse,
    optimization::GradientDescentWithMomentum,
    telemetry::{JsonLines, Recorder, RecordKind},
    train, Dataset, Mlp, TrainErr, Trainer,
};

// W_h = [[0.5]], b_h = [0], W_o = [[0.5]], b_o = [0]
fn tiny() -> Mlp {
    Mlp::from_params(1, 1, 1, vec![0.5, 0., 0.5, 0.]).unwrap()
}

fn seeded_run(seed: u64) -> (Vec<f32>, Vec<f32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let dataset = Dataset::synthetic(&mut rng, 40, 3, 1, 0.1, 8).unwrap();
    let mut model = Mlp::new(3, 5, 1, &mut rng).unwrap();
    let mut recorder = Recorder::new();

    let report = train(&mut model, &dataset, 4, 0.01, &mut recorder).unwrap();
    let losses = recorder.records().iter().map(|r| r.loss).collect();

    assert_eq!(report.epochs_completed(), 4);
    (losses, model.params().to_vec())
}

#[test]
fn single_step_moves_the_output_towards_the_target() {
    let mut model = tiny();
    let dataset = Dataset::from_samples(array![[2.]], array![[5.]], 1).unwrap();
    let mut recorder = Recorder::new();

    let report = train(&mut model, &dataset, 1, 0.1, &mut recorder).unwrap();

    let batch = &recorder.records()[0];
    assert_eq!(batch.kind, RecordKind::Batch { batch: 0 });
    assert_eq!(batch.forward.hidden_activation, array![[1.]]);
    assert_eq!(batch.forward.output, array![[0.5]]);
    assert_eq!(batch.loss, 20.25);
    assert_eq!(report.epoch_losses, [20.25]);

    let (after, _) = model.forward(array![[2.]].view()).unwrap();
    assert!((after[[0, 0]] - 5.).abs() < 4.5);
}

#[test]
fn reapplying_a_step_keeps_changing_the_parameters() {
    let mut model = tiny();
    let dataset = Dataset::from_samples(array![[2.]], array![[5.]], 1).unwrap();

    train(&mut model, &dataset, 1, 0.1, &mut Recorder::new()).unwrap();
    let once = model.params().to_vec();
    train(&mut model, &dataset, 1, 0.1, &mut Recorder::new()).unwrap();

    assert_ne!(model.params(), once);
}

#[test]
fn momentum_sized_for_fewer_parameters_fails() {
    let mut model = tiny();
    let dataset = Dataset::from_samples(array![[2.]], array![[5.]], 1).unwrap();
    let mut trainer = Trainer::new(GradientDescentWithMomentum::new(2, 0.1, 0.9), Mse);

    let err = trainer
        .train(&mut model, &dataset, 1, &mut Recorder::new())
        .unwrap_err();

    assert!(matches!(
        err,
        TrainErr::ShapeMismatch {
            what: "optimizer velocity",
            got: 2,
            expected: 4,
        }
    ));
    assert_eq!(model.params(), [0.5, 0., 0.5, 0.]);
}

#[test]
fn same_seed_same_run() {
    let (losses_a, params_a) = seeded_run(42);
    let (losses_b, params_b) = seeded_run(42);

    assert_eq!(losses_a, losses_b);
    assert_eq!(params_a, params_b);
}

#[test]
fn training_reduces_the_loss() {
    let mut rng = StdRng::seed_from_u64(3);
    let dataset = Dataset::synthetic(&mut rng, 64, 2, 1, 0., 4).unwrap();
    let mut model = Mlp::new(2, 8, 1, &mut rng).unwrap();
    let mut trainer = Trainer::new(
        GradientDescentWithMomentum::new(model.size(), 0.01, 0.9),
        Mse,
    );

    let report = trainer
        .train(&mut model, &dataset, 30, &mut Recorder::new())
        .unwrap();

    let first = report.epoch_losses[0];
    let last = report.epoch_losses[29];
    assert!(last < first, "loss went from {first} to {last}");
}

#[test]
fn json_lines_carry_every_record() {
    let mut model = tiny();
    let dataset = Dataset::from_samples(array![[1.], [2.]], array![[2.], [4.]], 1).unwrap();
    let mut out = JsonLines::new(Vec::new());

    let report = train(&mut model, &dataset, 2, 0.05, &mut out).unwrap();

    let text = String::from_utf8(out.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 2 * (2 + 1));

    let summary = &lines[5];
    assert_eq!(summary["epoch"], 1);
    assert_eq!(summary["kind"], "epoch_summary");
    assert_eq!(summary["batches"], 2);
    assert!((summary["loss"].as_f64().unwrap() - report.epoch_losses[1] as f64).abs() < 1e-6);
    assert_eq!(summary["forward_data"], lines[4]["forward_data"]);
    assert_eq!(summary["weights_biases_data"], lines[4]["weights_biases_data"]);
}
