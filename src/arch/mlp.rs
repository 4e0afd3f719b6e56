use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use super::{activations::Relu, layers::Dense};
use crate::{optimization::Optimizer, Result, TrainErr};

/// A two layer perceptron: `output = relu(x·W_hᵀ + b_h)·W_oᵀ + b_o`.
///
/// The network owns a flat parameter buffer laid out as `[W_h, b_h, W_o, b_o]` and a gradient
/// buffer with the very same layout. Both are allocated once and never resized.
#[derive(Clone, Debug)]
pub struct Mlp {
    hidden: Dense,
    output: Dense,
    params: Vec<f32>,
    grad: Vec<f32>,
}

impl Mlp {
    /// Creates a new `Mlp` with a rectified hidden layer, sampling every parameter of a layer
    /// from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
    ///
    /// # Arguments
    /// * `input_size` - The amount of features of each sample.
    /// * `hidden_size` - The amount of hidden units.
    /// * `output_size` - The amount of outputs of each sample.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// A new `Mlp` or `InvalidConfig` if any of the sizes is zero.
    pub fn new<R: Rng>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Self::check_sizes(input_size, hidden_size, output_size)?;

        let hidden = Dense::new((input_size, hidden_size), Some(Relu));
        let output = Dense::new((hidden_size, output_size), None);

        let mut params = Vec::with_capacity(hidden.size() + output.size());
        for layer in [&hidden, &output] {
            let range = 1. / (layer.dim_in() as f32).sqrt();
            let distribution = Uniform::new_inclusive(-range, range)
                .map_err(|e| TrainErr::InvalidConfig(e.to_string()))?;

            params.extend(distribution.sample_iter(&mut *rng).take(layer.size()));
        }

        Ok(Self::assemble(hidden, output, params))
    }

    /// Creates a new `Mlp` with a rectified hidden layer and the given parameters.
    ///
    /// # Arguments
    /// * `input_size` - The amount of features of each sample.
    /// * `hidden_size` - The amount of hidden units.
    /// * `output_size` - The amount of outputs of each sample.
    /// * `params` - The parameters, laid out as `[W_h, b_h, W_o, b_o]` with row-major weights.
    ///
    /// # Returns
    /// A new `Mlp`, `InvalidConfig` if any of the sizes is zero or `ShapeMismatch` if `params`
    /// has the wrong length.
    pub fn from_params(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        params: Vec<f32>,
    ) -> Result<Self> {
        Self::check_sizes(input_size, hidden_size, output_size)?;

        let hidden = Dense::new((input_size, hidden_size), Some(Relu));
        let output = Dense::new((hidden_size, output_size), None);

        let expected = hidden.size() + output.size();
        if params.len() != expected {
            return Err(TrainErr::ShapeMismatch {
                what: "model parameters",
                got: params.len(),
                expected,
            });
        }

        Ok(Self::assemble(hidden, output, params))
    }

    fn check_sizes(input_size: usize, hidden_size: usize, output_size: usize) -> Result<()> {
        if input_size == 0 || hidden_size == 0 || output_size == 0 {
            return Err(TrainErr::InvalidConfig(format!(
                "layer sizes must be non-zero, got {input_size}x{hidden_size}x{output_size}"
            )));
        }

        Ok(())
    }

    fn assemble(hidden: Dense, output: Dense, params: Vec<f32>) -> Self {
        let grad = vec![0.; params.len()];

        Self {
            hidden,
            output,
            params,
            grad,
        }
    }

    pub fn input_size(&self) -> usize {
        self.hidden.dim_in()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden.dim_out()
    }

    pub fn output_size(&self) -> usize {
        self.output.dim_out()
    }

    /// Returns the amount of parameters in the model.
    pub fn size(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    pub fn grad(&self) -> &[f32] {
        &self.grad
    }

    /// Makes a forward pass through the network, keeping what the next `backward` call needs.
    ///
    /// # Arguments
    /// * `x` - The input batch, one sample per row.
    ///
    /// # Returns
    /// The `(output, hidden_activation)` pair, or `ShapeMismatch` if the amount of columns of
    /// `x` differs from the model's input size.
    pub fn forward(&mut self, x: ArrayView2<f32>) -> Result<(Array2<f32>, Array2<f32>)> {
        let (hidden_params, output_params) = self.params.split_at(self.hidden.size());

        let h = self.hidden.forward(hidden_params, x).map_err(|e| match e {
            TrainErr::ShapeMismatch { got, expected, .. } => TrainErr::ShapeMismatch {
                what: "input features",
                got,
                expected,
            },
            e => e,
        })?;
        let y = self.output.forward(output_params, h.view())?;

        Ok((y, h))
    }

    /// Backpropagates the derivative of the loss with respect to the output of the last
    /// `forward` call, **adding** the result to the model's gradient.
    ///
    /// # Arguments
    /// * `d` - The derivative of the loss with respect to the output.
    ///
    /// # Returns
    /// `ShapeMismatch` if `d` is not shaped like the last output.
    pub fn backward(&mut self, d: Array2<f32>) -> Result<()> {
        let split = self.hidden.size();
        let (hidden_params, output_params) = self.params.split_at(split);
        let (hidden_grad, output_grad) = self.grad.split_at_mut(split);

        let d = self.output.backward(output_params, output_grad, d)?;
        self.hidden.backward(hidden_params, hidden_grad, d)?;
        Ok(())
    }

    /// Resets the gradient buffer.
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.);
    }

    /// Updates the parameters with the current gradient.
    ///
    /// # Returns
    /// `ShapeMismatch` if the optimizer was built for a different amount of parameters.
    pub fn step<O: Optimizer>(&mut self, optimizer: &mut O) -> Result<()> {
        optimizer.update_params(&mut self.params, &self.grad)
    }

    /// Returns the `(weights, biases)` of the hidden layer.
    pub fn hidden_params(&self) -> Result<(ArrayView2<'_, f32>, ArrayView1<'_, f32>)> {
        let (hidden_params, _) = self.params.split_at(self.hidden.size());
        self.hidden.view_params(hidden_params)
    }

    /// Returns the `(weights, biases)` of the output layer.
    pub fn output_params(&self) -> Result<(ArrayView2<'_, f32>, ArrayView1<'_, f32>)> {
        let (_, output_params) = self.params.split_at(self.hidden.size());
        self.output.view_params(output_params)
    }

    /// Returns the gradient of the hidden layer's weights.
    pub fn hidden_weights_grad(&self) -> Result<ArrayView2<'_, f32>> {
        let (hidden_grad, _) = self.grad.split_at(self.hidden.size());
        let (dw, _) = self.hidden.view_params(hidden_grad)?;
        Ok(dw)
    }

    /// Returns the gradient of the output layer's weights.
    pub fn output_weights_grad(&self) -> Result<ArrayView2<'_, f32>> {
        let (_, output_grad) = self.grad.split_at(self.hidden.size());
        let (dw, _) = self.output.view_params(output_grad)?;
        Ok(dw)
    }
}
