use std::sync::Arc;

use ndarray::{Array1, Array2};
use serde::Serialize;

use super::matrix::{serialize_rows, serialize_vec};
use crate::{arch::Mlp, Result};

/// What the forward pass of a batch saw and produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardSnapshot {
    #[serde(serialize_with = "serialize_rows")]
    pub input: Array2<f32>,
    #[serde(serialize_with = "serialize_rows")]
    pub hidden_activation: Array2<f32>,
    #[serde(serialize_with = "serialize_rows")]
    pub output: Array2<f32>,
    /// Seconds spent in the forward pass.
    pub forward_time: f64,
}

/// The magnitude of the weight gradients right after backpropagation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackwardSnapshot {
    #[serde(serialize_with = "serialize_rows")]
    pub hidden_grad: Array2<f32>,
    #[serde(serialize_with = "serialize_rows")]
    pub output_grad: Array2<f32>,
    /// Seconds spent from the end of the forward pass to the end of backpropagation, measured
    /// from the same origin as `ForwardSnapshot::forward_time`. Never clamped, so a skewed
    /// clock may make it negative.
    pub backward_time: f64,
}

impl BackwardSnapshot {
    /// Copies the absolute value of the model's current weight gradients.
    pub fn capture(model: &Mlp, backward_time: f64) -> Result<Self> {
        Ok(Self {
            hidden_grad: model.hidden_weights_grad()?.mapv(f32::abs),
            output_grad: model.output_weights_grad()?.mapv(f32::abs),
            backward_time,
        })
    }
}

/// A copy of every parameter of the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightsSnapshot {
    #[serde(serialize_with = "serialize_rows")]
    pub hidden_weights: Array2<f32>,
    #[serde(serialize_with = "serialize_vec")]
    pub hidden_biases: Array1<f32>,
    #[serde(serialize_with = "serialize_rows")]
    pub output_weights: Array2<f32>,
    #[serde(serialize_with = "serialize_vec")]
    pub output_biases: Array1<f32>,
}

impl WeightsSnapshot {
    /// Copies the model's current parameters, later updates leave the copy untouched.
    pub fn capture(model: &Mlp) -> Result<Self> {
        let (w_h, b_h) = model.hidden_params()?;
        let (w_o, b_o) = model.output_params()?;

        Ok(Self {
            hidden_weights: w_h.to_owned(),
            hidden_biases: b_h.to_owned(),
            output_weights: w_o.to_owned(),
            output_biases: b_o.to_owned(),
        })
    }
}

/// The three snapshots taken for a single batch, shared between every record that refers to it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub forward: Arc<ForwardSnapshot>,
    pub backward: Arc<BackwardSnapshot>,
    pub weights: Arc<WeightsSnapshot>,
}

impl Snapshot {
    pub fn new(
        forward: ForwardSnapshot,
        backward: BackwardSnapshot,
        weights: WeightsSnapshot,
    ) -> Self {
        Self {
            forward: Arc::new(forward),
            backward: Arc::new(backward),
            weights: Arc::new(weights),
        }
    }
}
