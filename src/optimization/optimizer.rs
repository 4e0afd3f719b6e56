use crate::Result;

/// Defines the strategy for updating model parameters based on calculated gradients.
pub trait Optimizer {
    /// Updates the parameters using the accumulated gradient.
    ///
    /// # Arguments
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient, with the same layout as `params`.
    ///
    /// # Returns
    /// `ShapeMismatch` if `grad`, or any state the optimizer keeps per parameter, doesn't have
    /// the length of `params`. The parameters are left untouched in that case.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()>;
}
