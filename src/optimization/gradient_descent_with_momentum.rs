use super::Optimizer;
use crate::{Result, TrainErr};

#[derive(Debug, Clone)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    velocity: Box<[f32]>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - How much of the previous velocity is kept on each update.
    ///
    /// # Returns
    /// A new `GradientDescentWithMomentum` instance.
    pub fn new(len: usize, learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: vec![0.; len].into_boxed_slice(),
        }
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()> {
        if grad.len() != params.len() {
            return Err(TrainErr::ShapeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: params.len(),
            });
        }

        if self.velocity.len() != params.len() {
            return Err(TrainErr::ShapeMismatch {
                what: "optimizer velocity",
                got: self.velocity.len(),
                expected: params.len(),
            });
        }

        let lr = self.learning_rate;
        let mu = self.momentum;

        params
            .iter_mut()
            .zip(grad)
            .zip(self.velocity.iter_mut())
            .for_each(|((p, g), v)| {
                *v = (mu * *v) + g;
                *p -= lr * *v;
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_builds_up() {
        let mut params = [0.];
        let mut optimizer = GradientDescentWithMomentum::new(1, 1., 0.5);

        optimizer.update_params(&mut params, &[1.]).unwrap();
        assert_eq!(params, [-1.]);

        // v = 0.5 * 1 + 1
        optimizer.update_params(&mut params, &[1.]).unwrap();
        assert_eq!(params, [-2.5]);
    }

    #[test]
    fn velocity_must_cover_every_parameter() {
        let mut params = [0.5, 0., 0.5, 0.];
        let mut optimizer = GradientDescentWithMomentum::new(2, 0.1, 0.9);

        let res = optimizer.update_params(&mut params, &[1., 1., 1., 1.]);
        assert!(matches!(
            res,
            Err(TrainErr::ShapeMismatch {
                what: "optimizer velocity",
                got: 2,
                expected: 4,
            })
        ));
        assert_eq!(params, [0.5, 0., 0.5, 0.]);
    }
}
