use squarenet::prelude::*;

fn train(config: TrainingConfig) -> (Trainer, TrainingReport, String) {
    let mut trainer = Trainer::new(config).expect("valid config");
    let mut out = Vec::<u8>::new();
    let report = trainer
        .fit(&Dataset::squares(SAMPLES), &mut out)
        .expect("training should succeed");
    (trainer, report, String::from_utf8(out).expect("utf-8 progress"))
}

fn full_run(seed: u64) -> (Trainer, TrainingReport, String) {
    train(TrainingConfig::default().seed(seed))
}

#[test]
fn loss_is_finite_and_non_negative_every_epoch() {
    let (_, report, _) = full_run(11);
    assert_eq!(report.loss_history.len(), 5000);
    for (epoch, loss) in report.loss_history.iter().enumerate() {
        assert!(loss.is_finite() && *loss >= 0.0, "epoch {epoch}: loss {loss}");
    }
}

#[test]
fn training_substantially_reduces_loss() {
    let (trainer, report, _) = full_run(12);
    let initial = report.initial_loss().unwrap();
    let test_loss = trainer.evaluate(&Dataset::squares(SAMPLES)).unwrap();
    assert!(
        test_loss < initial / 10.0,
        "initial loss {initial}, test loss {test_loss}"
    );
}

#[test]
fn evaluation_reproduces_last_training_loss() {
    let (trainer, report, _) = full_run(13);
    let last = report.final_loss().unwrap();
    let test_loss = trainer.evaluate(&Dataset::squares(SAMPLES)).unwrap();
    // one SGD step separates the two measurements
    let relative = (test_loss - last).abs() / last;
    assert!(relative < 1e-2, "last {last}, test {test_loss}");
}

#[test]
fn trained_model_maps_zero_near_zero() {
    let (trainer, _, _) = full_run(14);
    let prediction = trainer.predict(&array![[0.0]]).unwrap()[[0, 0]];
    // 5% of the largest target, 99²
    assert!(prediction.abs() < 490.05, "f(0) = {prediction}");
}

#[test]
fn progress_lines_every_500_epochs() {
    let (_, report, out) = full_run(15);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 10);
    for (i, line) in lines.iter().enumerate() {
        let epoch = i * 500;
        assert_eq!(
            *line,
            format!("Epoch {epoch}, Loss: {:.6}", report.loss_history[epoch])
        );
    }
}

#[test]
fn fixed_seed_is_deterministic() {
    let config = TrainingConfig::new().epochs(300).seed(21);
    let (a, report_a, out_a) = train(config.clone());
    let (b, report_b, out_b) = train(config);

    assert_eq!(report_a, report_b);
    assert_eq!(out_a, out_b);
    assert_eq!(a.parameters(), b.parameters());
    assert_eq!(
        a.evaluate(&Dataset::squares(SAMPLES)).unwrap(),
        b.evaluate(&Dataset::squares(SAMPLES)).unwrap()
    );
}

#[test]
fn different_seeds_start_differently() {
    let a = Trainer::new(TrainingConfig::new().seed(1)).unwrap();
    let b = Trainer::new(TrainingConfig::new().seed(2)).unwrap();
    assert_ne!(a.parameters(), b.parameters());
}
