use ndarray::{Array2, ArrayView2};

/// A scalar loss over a batch of predictions.
///
/// Both arguments are expected to have the same shape, callers check it beforehand.
pub trait LossFn {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32>;
}
