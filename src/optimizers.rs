use crate::prelude::*;
use tracing::instrument;

pub trait TensorOptimize {
    /// Subtracts `delta` from the tensor's data in place.
    fn optimize(&self, delta: Tensor);
}

pub trait Optimizer {
    fn step(&mut self, parameters: &[Tensor]);

    fn zero_grad(&self, parameters: &[Tensor]) {
        parameters.iter().for_each(Tensor::zero_grad);
    }
}

/// Plain gradient descent: `param = param - learning_rate * grad`.
/// No momentum, no decay.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for Sgd {
    #[instrument(level = "trace", skip_all, fields(num_params = parameters.len(), lr = self.learning_rate))]
    fn step(&mut self, parameters: &[Tensor]) {
        for param in parameters {
            if let Some(grad) = param.grad() {
                param.optimize(grad * self.learning_rate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_against_gradient() {
        let w = tensor!(array![[1.0, -2.0]]).requires_grad(true);
        (&w * 2.0).mean().backward();

        let mut sgd = Sgd::new(0.5);
        sgd.step(&[w.clone()]);

        // grad = 2 / 2 for each element
        assert_eq!(w.data(), array![[0.5, -2.5]].into_dyn());
    }

    #[test]
    fn parameters_without_grad_are_left_alone() {
        let w = tensor!(array![[1.0]]).requires_grad(true);
        Sgd::new(0.1).step(&[w.clone()]);
        assert_eq!(w.data(), array![[1.0]].into_dyn());
    }

    #[test]
    fn zero_grad_clears_every_parameter() {
        let a = tensor!(array![[1.0]]).requires_grad(true);
        let b = tensor!(array![[2.0]]).requires_grad(true);
        (&a * &b).mean().backward();

        let sgd = Sgd::new(0.1);
        sgd.zero_grad(&[a.clone(), b.clone()]);
        assert!(a.grad().is_none() && b.grad().is_none());
    }
}
