use ndarray::{Array2, ArrayView2, Axis};
use rand::{distr::StandardUniform, Rng};
use rand_distr::{Distribution, StandardNormal};

use crate::{Result, TrainErr};

/// An `(input, target)` pair of matrices sharing their amount of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    x: Array2<f32>,
    y: Array2<f32>,
}

impl Batch {
    /// Creates a new `Batch`.
    ///
    /// # Arguments
    /// * `x` - The inputs, one sample per row.
    /// * `y` - The targets, one sample per row.
    ///
    /// # Returns
    /// A new `Batch`, `EmptyBatch` if there are no rows or `ShapeMismatch` if `x` and `y`
    /// have a different amount of rows.
    pub fn new(x: Array2<f32>, y: Array2<f32>) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(TrainErr::ShapeMismatch {
                what: "target rows",
                got: y.nrows(),
                expected: x.nrows(),
            });
        }

        if x.nrows() == 0 {
            return Err(TrainErr::EmptyBatch);
        }

        Ok(Self { x, y })
    }

    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView2<'_, f32> {
        self.y.view()
    }

    /// Returns the amount of samples in the batch.
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An ordered, finite sequence of batches.
///
/// The dataset is iterated in the same order every epoch.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    batches: Vec<Batch>,
}

impl Dataset {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }

    /// Groups samples into consecutive batches, the last one may be smaller.
    ///
    /// # Arguments
    /// * `x` - The inputs, one sample per row.
    /// * `y` - The targets, one sample per row.
    /// * `batch_size` - The maximum amount of samples per batch.
    ///
    /// # Returns
    /// A new `Dataset`, `ShapeMismatch` if `x` and `y` have a different amount of rows or
    /// `InvalidConfig` if `batch_size` is zero.
    pub fn from_samples(x: Array2<f32>, y: Array2<f32>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(TrainErr::InvalidConfig("batch size must be non-zero".into()));
        }

        if x.nrows() != y.nrows() {
            return Err(TrainErr::ShapeMismatch {
                what: "target rows",
                got: y.nrows(),
                expected: x.nrows(),
            });
        }

        let batches = x
            .axis_chunks_iter(Axis(0), batch_size)
            .zip(y.axis_chunks_iter(Axis(0), batch_size))
            .map(|(x, y)| Batch::new(x.to_owned(), y.to_owned()))
            .collect::<Result<_>>()?;

        Ok(Self { batches })
    }

    /// Generates a noisy regression problem where each target is the sum of the sample's
    /// features: `y = sum(x) + noise * N(0, 1)`, with `x ~ U[0, 1)`.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `num_points` - The amount of samples.
    /// * `input_size` - The amount of features per sample.
    /// * `output_size` - The amount of targets per sample, all of them share the same sum.
    /// * `noise` - The standard deviation of the noise.
    /// * `batch_size` - The maximum amount of samples per batch.
    pub fn synthetic<R: Rng>(
        rng: &mut R,
        num_points: usize,
        input_size: usize,
        output_size: usize,
        noise: f32,
        batch_size: usize,
    ) -> Result<Self> {
        let x = Array2::<f32>::from_shape_simple_fn((num_points, input_size), || {
            StandardUniform.sample(&mut *rng)
        });

        let sums = x.sum_axis(Axis(1));
        let mut y = Array2::zeros((num_points, output_size));
        for (mut row, sum) in y.rows_mut().into_iter().zip(&sums) {
            row.mapv_inplace(|_| {
                let n: f32 = StandardNormal.sample(&mut *rng);
                sum + noise * n
            });
        }

        Self::from_samples(x, y, batch_size)
    }

    /// Returns the amount of batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Iterates the batches from the start.
    pub fn iter(&self) -> std::slice::Iter<'_, Batch> {
        self.batches.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Batch;
    type IntoIter = std::slice::Iter<'a, Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
