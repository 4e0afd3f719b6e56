use super::Optimizer;
use crate::{Result, TrainErr};

/// Gradient descent optimization algorithm.
#[derive(Debug, Clone)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Returns a new `GradientDescent`.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `update_params`.
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    /// Updates the parameters according to the algorithm's learning rule, that is, making a step in
    /// the opposite direction of the gradient, with a length of `learning_rate`.
    ///
    /// # Arguments
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient used for taking the step.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()> {
        if grad.len() != params.len() {
            return Err(TrainErr::ShapeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: params.len(),
            });
        }

        let lr = self.learning_rate;

        for (w, g) in params.iter_mut().zip(grad) {
            *w -= lr * g;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_against_the_gradient() {
        let mut params = [1., 2., 3.];
        let mut optimizer = GradientDescent::new(0.5);

        optimizer.update_params(&mut params, &[2., 0., -4.]).unwrap();
        assert_eq!(params, [0., 2., 5.]);
    }

    #[test]
    fn short_gradient_is_rejected() {
        let mut params = [1., 2., 3.];
        let mut optimizer = GradientDescent::new(0.5);

        let res = optimizer.update_params(&mut params, &[1., 1.]);
        assert!(matches!(
            res,
            Err(TrainErr::ShapeMismatch {
                got: 2,
                expected: 3,
                ..
            })
        ));
        assert_eq!(params, [1., 2., 3.]);
    }
}
