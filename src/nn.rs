use crate::prelude::*;

pub trait Module {
    fn forward(&self, input: &Tensor) -> Tensor;

    /// Trainable tensors, in a fixed order.
    fn parameters(&self) -> Vec<Tensor>;
}

/// Fully connected layer: `y = x·W + b`, with `b` broadcast over rows.
pub struct Linear {
    weight: Tensor,
    bias: Tensor,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Weights and biases are drawn from `Uniform(-1/√in, 1/√in)`.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features as f32).sqrt();
        Self {
            weight: rand_tensor!(rng, bound; in_features, out_features).requires_grad(true),
            bias: rand_tensor!(rng, bound; 1, out_features).requires_grad(true),
            in_features,
            out_features,
        }
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Module for Linear {
    fn forward(&self, input: &Tensor) -> Tensor {
        input.dot(&self.weight) + &self.bias
    }

    fn parameters(&self) -> Vec<Tensor> {
        vec![self.weight.clone(), self.bias.clone()]
    }
}

/// `Linear(1, hidden) -> ReLU -> Linear(hidden, 1)`.
pub struct SquareNet {
    hidden: Linear,
    output: Linear,
}

impl SquareNet {
    pub fn new<R: Rng + ?Sized>(hidden_units: usize, rng: &mut R) -> Self {
        Self {
            hidden: Linear::new(1, hidden_units, rng),
            output: Linear::new(hidden_units, 1, rng),
        }
    }

    pub fn hidden_units(&self) -> usize {
        self.hidden.out_features()
    }

    /// Forward pass over an `(N, 1)` batch without recording a graph.
    pub fn predict(&self, inputs: &Array2<f32>) -> Result<Array2<f32>> {
        let expected = self.hidden.in_features();
        if inputs.ncols() != expected {
            return Err(Error::ShapeMismatch {
                expected: vec![inputs.nrows(), expected],
                actual: inputs.shape().to_vec(),
            });
        }
        let out = no_grad!({ self.forward(&tensor!(inputs.clone())) });
        out.data()
            .into_dimensionality::<Ix2>()
            .map_err(|_| Error::ShapeMismatch {
                expected: vec![inputs.nrows(), self.output.out_features()],
                actual: out.shape(),
            })
    }
}

impl Module for SquareNet {
    fn forward(&self, input: &Tensor) -> Tensor {
        self.output.forward(&relu(&self.hidden.forward(input)))
    }

    fn parameters(&self) -> Vec<Tensor> {
        let mut params = self.hidden.parameters();
        params.extend(self.output.parameters());
        params
    }
}
