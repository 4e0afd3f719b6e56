use ndarray::{linalg, prelude::*};

use crate::{arch::activations::Relu, Result, TrainErr};

/// A fully connected layer computing `x·Wᵀ + b`, optionally rectified.
///
/// The layer does not own its parameters, it views a slice of `[W, b]` where `W` has shape
/// `(dim_out, dim_in)` in row-major order and `b` has `dim_out` elements. The gradient slice
/// follows the same layout.
///
/// The inputs and weighted sums of the last forward pass are kept so that `backward` can
/// compute the parameter gradients without re-evaluating the layer.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<Relu>,
    size: usize,

    // Forward metadata
    x: Array2<f32>,
    z: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The `(dim_in, dim_out)` dimensions of the layer.
    /// * `act_fn` - The rectifier applied to the weighted sums, if any.
    ///
    /// # Returns
    /// A new `Dense` instance.
    pub fn new(dim: (usize, usize), act_fn: Option<Relu>) -> Self {
        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
            x: Array2::zeros((0, dim.0)),
            z: Array2::zeros((0, dim.1)),
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dim_in(&self) -> usize {
        self.dim.0
    }

    pub fn dim_out(&self) -> usize {
        self.dim.1
    }

    /// Evaluates the layer over a batch.
    ///
    /// # Arguments
    /// * `params` - This layer's parameter slice.
    /// * `x` - The input batch, one sample per row.
    ///
    /// # Returns
    /// The layer's output for each sample or `ShapeMismatch` if `x` has the wrong amount of
    /// columns.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(TrainErr::ShapeMismatch {
                what: "layer input features",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w.t(), 0.0, &mut z);
        z += &b;

        self.x = x.to_owned();

        let a = match &self.act_fn {
            Some(act_fn) => z.mapv(|z| act_fn.f(z)),
            None => z.clone(),
        };

        self.z = z;
        Ok(a)
    }

    /// Propagates the error signal `d` (the derivative of the loss with respect to this
    /// layer's output) through the layer.
    ///
    /// Gradients are **added** to `grad`, the caller resets them between steps.
    ///
    /// # Arguments
    /// * `params` - This layer's parameter slice.
    /// * `grad` - This layer's gradient slice.
    /// * `d` - The error signal, shaped like the last forward output.
    ///
    /// # Returns
    /// The error signal with respect to this layer's input.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        if d.dim() != self.z.dim() {
            return Err(TrainErr::ShapeMismatch {
                what: "layer error signal",
                got: d.len(),
                expected: self.z.len(),
            });
        }

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&self.z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &d.t(), &self.x, 1.0, &mut dw);
        db += &d.sum_axis(Axis(0));

        let (w, _) = self.view_params(params)?;
        Ok(d.dot(&w))
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    ///
    /// # Arguments
    /// * `grad` - A gradient slice.
    ///
    /// # Returns
    /// A tuple containing the delta weights and delta biases.
    pub fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        let len = grad.len();
        let mismatch = || self.size_mismatch("layer gradient", len);

        let w_size = self.size - self.dim.1;
        if len != self.size {
            return Err(mismatch());
        }

        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape((self.dim.1, self.dim.0), dw_raw)
            .map_err(|_| mismatch())?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw).map_err(|_| mismatch())?;
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    pub fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        let mismatch = || self.size_mismatch("layer parameters", params.len());

        let w_size = self.size - self.dim.1;
        if params.len() != self.size {
            return Err(mismatch());
        }

        let weights = ArrayView2::from_shape((self.dim.1, self.dim.0), &params[..w_size])
            .map_err(|_| mismatch())?;
        let biases =
            ArrayView1::from_shape(self.dim.1, &params[w_size..]).map_err(|_| mismatch())?;
        Ok((weights, biases))
    }

    fn size_mismatch(&self, what: &'static str, got: usize) -> TrainErr {
        TrainErr::ShapeMismatch {
            what,
            got,
            expected: self.size,
        }
    }
}
