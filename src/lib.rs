//! A two-layer ReLU network trained by full-batch gradient descent to fit
//! `f(x) = x²`, on top of a small reverse-mode autodiff tensor.

pub mod prelude;

pub mod config;
pub mod dataset;
pub mod errors;
pub mod functional;
pub mod nn;
pub mod optimizers;
pub mod tensors;
pub mod trainer;
pub mod utils;
