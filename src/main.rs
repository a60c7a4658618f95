use squarenet::prelude::*;
use std::io;
use tracing::info;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let mut trainer = Trainer::new(TrainingConfig::default())?;
    info!(config = ?trainer.config(), "model built");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    trainer.fit(&Dataset::squares(SAMPLES), &mut out)?;

    // test set is the training set, regenerated
    let test_loss = trainer.evaluate(&Dataset::squares(SAMPLES))?;
    writeln!(out, "Test Loss: {test_loss:.6}")?;
    Ok(())
}
