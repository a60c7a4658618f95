//! Training configuration.

use crate::prelude::*;

/// Hyperparameters of a training run. Configured in code only.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Number of full-batch gradient-descent iterations.
    pub epochs: usize,
    /// Step size of the SGD update.
    pub learning_rate: f32,
    /// Width of the hidden layer.
    pub hidden_units: usize,
    /// A progress line is written every `log_every` epochs, starting at 0.
    pub log_every: usize,
    /// Seed for parameter initialization; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 5000,
            learning_rate: 0.01,
            hidden_units: 100,
            log_every: 500,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn hidden_units(mut self, units: usize) -> Self {
        self.hidden_units = units;
        self
    }

    pub fn log_every(mut self, every: usize) -> Self {
        self.log_every = every;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(Error::InvalidConfig {
                message: message.to_string(),
            })
        };
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid("learning rate must be a positive finite number");
        }
        if self.hidden_units == 0 {
            return invalid("hidden layer needs at least one unit");
        }
        if self.log_every == 0 {
            return invalid("log_every must be at least 1");
        }
        Ok(())
    }

    /// RNG for parameter initialization.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
