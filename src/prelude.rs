pub use std::cell::Cell;
pub use std::collections::HashSet;
pub use std::fmt;
pub use std::io::Write;
pub use std::ops::{Add, Mul, Sub};
pub use std::sync::{Arc, Mutex};

pub use ndarray::prelude::*;
pub use ndarray::*;
pub use ndarray_rand::rand_distr::Uniform;
pub use ndarray_rand::RandomExt;
pub use rand::rngs::StdRng;
pub use rand::{Rng, SeedableRng};

pub use crate::config::*;
pub use crate::dataset::*;
pub use crate::errors::*;
pub use crate::functional::*;
pub use crate::nn::*;
pub use crate::optimizers::*;
pub use crate::tensors::*;
pub use crate::trainer::*;
pub use crate::utils::*;

pub use crate::no_grad;
pub use crate::rand_tensor;
pub use crate::tensor;
