//! Training loop and evaluation.

use crate::prelude::*;
use tracing::{debug, info, instrument, warn};

/// Losses observed during a run, one per epoch, in original target units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub loss_history: Vec<f32>,
}

impl TrainingReport {
    pub fn initial_loss(&self) -> Option<f32> {
        self.loss_history.first().copied()
    }

    pub fn final_loss(&self) -> Option<f32> {
        self.loss_history.last().copied()
    }
}

/// Owns the model and optimizer for one run.
pub struct Trainer {
    config: TrainingConfig,
    model: SquareNet,
    optimizer: Sgd,
    scaler: Scaler,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = config.rng();
        let model = SquareNet::new(config.hidden_units, &mut rng);
        let optimizer = Sgd::new(config.learning_rate);
        Ok(Self {
            config,
            model,
            optimizer,
            scaler: Scaler::default(),
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Snapshot of every parameter, in [`Module::parameters`] order.
    pub fn parameters(&self) -> Vec<DynArray> {
        self.model.parameters().iter().map(Tensor::data).collect()
    }

    /// Full-batch gradient descent over `dataset` for the configured number of
    /// epochs. The loss recorded for an epoch is measured before that epoch's
    /// update. Every `log_every` epochs a line `Epoch <n>, Loss: <value>` is
    /// written to `progress`.
    #[instrument(skip_all, fields(samples = dataset.len(), epochs = self.config.epochs))]
    pub fn fit<W: Write>(&mut self, dataset: &Dataset, progress: &mut W) -> Result<TrainingReport> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        self.scaler = Scaler::fit(dataset);
        debug!(scaler = ?self.scaler, "scaling inputs and targets");

        let inputs = tensor!(self.scaler.scale_inputs(dataset.inputs()));
        let targets = tensor!(self.scaler.scale_targets(dataset.targets()));
        let parameters = self.model.parameters();

        let mut report = TrainingReport {
            loss_history: Vec::with_capacity(self.config.epochs),
        };
        let mut diverged = false;

        for epoch in 0..self.config.epochs {
            let predictions = self.model.forward(&inputs);
            let loss = mse_loss(&predictions, &targets);
            let value = self.scaler.unscale_loss(loss.item());
            report.loss_history.push(value);

            if !value.is_finite() && !diverged {
                warn!(epoch, loss = value, "loss is no longer finite");
                diverged = true;
            }

            self.optimizer.zero_grad(&parameters);
            loss.backward();
            self.optimizer.step(&parameters);

            if epoch % self.config.log_every == 0 {
                writeln!(progress, "Epoch {epoch}, Loss: {value:.6}")?;
            }
        }

        info!(
            initial = ?report.initial_loss(),
            last = ?report.final_loss(),
            "training finished"
        );
        Ok(report)
    }

    /// Mean-squared error of the current model on `dataset`, in target units.
    /// Records no graph and leaves the parameters untouched.
    #[instrument(skip_all, fields(samples = dataset.len()))]
    pub fn evaluate(&self, dataset: &Dataset) -> Result<f32> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let inputs = tensor!(self.scaler.scale_inputs(dataset.inputs()));
        let targets = tensor!(self.scaler.scale_targets(dataset.targets()));
        let loss = no_grad!({ mse_loss(&self.model.forward(&inputs), &targets) });
        let value = self.scaler.unscale_loss(loss.item());
        debug!(loss = value, "evaluated");
        Ok(value)
    }

    /// Predictions for an `(N, 1)` batch of raw inputs, in target units.
    pub fn predict(&self, inputs: &Array2<f32>) -> Result<Array2<f32>> {
        let scaled = self.model.predict(&self.scaler.scale_inputs(inputs))?;
        Ok(self.scaler.unscale_targets(&scaled))
    }
}
