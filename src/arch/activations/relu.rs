/// The rectified linear unit, `max(0, z)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relu;

impl Relu {
    pub fn f(&self, z: f32) -> f32 {
        z.max(0.)
    }

    /// The derivative is taken as 0 at `z == 0`.
    pub fn df(&self, z: f32) -> f32 {
        if z > 0. {
            1.
        } else {
            0.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_negatives() {
        let relu = Relu;
        assert_eq!(relu.f(-2.5), 0.);
        assert_eq!(relu.f(0.), 0.);
        assert_eq!(relu.f(3.), 3.);
    }

    #[test]
    fn derivative_is_a_step() {
        let relu = Relu;
        assert_eq!(relu.df(-1.), 0.);
        assert_eq!(relu.df(0.), 0.);
        assert_eq!(relu.df(0.5), 1.);
    }
}
