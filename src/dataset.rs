use crate::prelude::*;

/// Number of samples the trainer fits and evaluates on.
pub const SAMPLES: usize = 100;

/// Ordered `(x, y)` pairs stored as two `(N, 1)` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Array2<f32>,
    targets: Array2<f32>,
}

impl Dataset {
    /// Both arrays must be single columns with the same number of rows.
    pub fn new(inputs: Array2<f32>, targets: Array2<f32>) -> Result<Self> {
        let rows = inputs.nrows();
        for column in [&inputs, &targets] {
            if column.dim() != (rows, 1) {
                return Err(Error::ShapeMismatch {
                    expected: vec![rows, 1],
                    actual: column.shape().to_vec(),
                });
            }
        }
        Ok(Self { inputs, targets })
    }

    /// `x = 0, 1, ..., n - 1` paired with `y = x²`.
    pub fn squares(n: usize) -> Self {
        let inputs = Array::from_shape_fn((n, 1), |(i, _)| i as f32);
        let targets = inputs.mapv(|x| x * x);
        Self { inputs, targets }
    }

    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inputs(&self) -> &Array2<f32> {
        &self.inputs
    }

    pub fn targets(&self) -> &Array2<f32> {
        &self.targets
    }
}

/// Standardizes inputs to zero mean and unit variance and divides targets by
/// their largest magnitude.
///
/// Fitting on raw squares (targets up to 9801) with a 0.01 step size diverges
/// within one update, so the trainer works in scaled units and converts
/// losses and predictions back. Centering the inputs keeps x = 0 off the
/// point where every hidden pre-activation collapses to its bias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaler {
    input_mean: f32,
    input_std: f32,
    target_scale: f32,
}

impl Default for Scaler {
    fn default() -> Self {
        Self {
            input_mean: 0.0,
            input_std: 1.0,
            target_scale: 1.0,
        }
    }
}

impl Scaler {
    pub fn fit(dataset: &Dataset) -> Self {
        if dataset.is_empty() {
            return Self::default();
        }
        let inputs = dataset.inputs();
        let input_mean = inputs.mean().filter(|m| m.is_finite()).unwrap_or(0.0);
        Self {
            input_mean,
            input_std: positive_or_one(inputs.std(0.0)),
            target_scale: positive_or_one(dataset.targets().fold(0.0f32, |acc, v| acc.max(v.abs()))),
        }
    }

    pub fn input_mean(&self) -> f32 {
        self.input_mean
    }

    pub fn input_std(&self) -> f32 {
        self.input_std
    }

    pub fn target_scale(&self) -> f32 {
        self.target_scale
    }

    pub fn scale_inputs(&self, inputs: &Array2<f32>) -> Array2<f32> {
        inputs.mapv(|x| (x - self.input_mean) / self.input_std)
    }

    pub fn scale_targets(&self, targets: &Array2<f32>) -> Array2<f32> {
        targets / self.target_scale
    }

    pub fn unscale_targets(&self, targets: &Array2<f32>) -> Array2<f32> {
        targets * self.target_scale
    }

    /// Converts a mean-squared error measured in scaled units back to target units.
    pub fn unscale_loss(&self, loss: f32) -> f32 {
        loss * self.target_scale * self.target_scale
    }
}

fn positive_or_one(value: f32) -> f32 {
    if value > 0.0 && value.is_finite() {
        value
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squares_pairs_x_with_x_squared() {
        let ds = Dataset::squares(SAMPLES);
        assert_eq!(ds.len(), 100);
        assert_eq!(ds.inputs().shape(), &[100, 1]);
        assert_eq!(ds.inputs()[[0, 0]], 0.0);
        assert_eq!(ds.inputs()[[99, 0]], 99.0);
        assert_eq!(ds.targets()[[7, 0]], 49.0);
        assert_eq!(ds.targets()[[99, 0]], 9801.0);
    }

    #[test]
    fn squares_is_regenerated_identically() {
        assert_eq!(Dataset::squares(SAMPLES), Dataset::squares(SAMPLES));
    }

    #[test]
    fn new_rejects_mismatched_rows() {
        let err = Dataset::new(Array2::zeros((3, 1)), Array2::zeros((2, 1))).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn new_rejects_wide_inputs() {
        let err = Dataset::new(Array2::zeros((3, 2)), Array2::zeros((3, 1))).unwrap_err();
        match err {
            Error::ShapeMismatch { expected, actual } => {
                assert_eq!(expected, vec![3, 1]);
                assert_eq!(actual, vec![3, 2]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn new_rejects_wide_targets() {
        let err = Dataset::new(Array2::zeros((3, 1)), Array2::ones((3, 4))).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { ref actual, .. } if *actual == vec![3, 4]));
    }

    #[test]
    fn new_accepts_matching_columns() {
        let ds = Dataset::new(array![[1.0], [2.0]], array![[1.0], [4.0]]).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn scaler_centers_inputs_and_bounds_targets() {
        let ds = Dataset::squares(SAMPLES);
        let scaler = Scaler::fit(&ds);
        assert!((scaler.input_mean() - 49.5).abs() < 1e-4);
        // population std of 0..99 is sqrt((100² - 1) / 12)
        assert!((scaler.input_std() - 28.866_07).abs() < 1e-3);
        assert_eq!(scaler.target_scale(), 9801.0);

        let x = scaler.scale_inputs(ds.inputs());
        let y = scaler.scale_targets(ds.targets());
        assert!(x.mean().unwrap().abs() < 1e-5);
        assert!((x.std(0.0) - 1.0).abs() < 1e-4);
        assert!(x[[0, 0]] < -1.7);
        assert_eq!(y[[99, 0]], 1.0);
        assert!((scaler.unscale_targets(&y)[[50, 0]] - 2500.0).abs() < 1e-2);
        assert_eq!(scaler.unscale_loss(1.0), 9801.0 * 9801.0);
    }

    #[test]
    fn scaler_falls_back_to_identity_on_zero_columns() {
        let ds = Dataset::new(Array2::zeros((4, 1)), Array2::zeros((4, 1))).unwrap();
        assert_eq!(Scaler::fit(&ds), Scaler::default());
        assert_eq!(Scaler::fit(&Dataset::squares(0)), Scaler::default());
    }
}
