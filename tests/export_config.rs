use std::{fs, path::PathBuf, time::Duration};

use neural_nexus::{
    export::{self, MetricRecord},
    NetworkStore, NexusError, SimulationConfig,
};
use tokio::time;
use tokio_test::{assert_err, assert_ok};

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("nexus-{}-{name}", std::process::id()))
}

#[test]
fn export_of_two_epochs() {
    let records = export::records(&[0.9, 0.5], &[0.2, 0.8]);

    assert_eq!(
        records,
        [
            MetricRecord {
                epoch: 1,
                loss: 0.9,
                accuracy: 20.0,
            },
            MetricRecord {
                epoch: 2,
                loss: 0.5,
                accuracy: 80.0,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn finished_run_exports_every_step() {
    let store = NetworkStore::with_config(SimulationConfig::store().with_seed(3));
    store.start_training();
    time::sleep(Duration::from_millis(10_050)).await;

    let state = store.snapshot();
    let path = scratch_file("run.json");
    assert_ok!(export::write_json(&path, &export::records(&state.loss, &state.accuracy)));

    let read = assert_ok!(export::read_json(&path));
    let _ = fs::remove_file(&path);

    assert_eq!(read.len(), 100);
    assert_eq!(read[0].epoch, 1);
    assert_eq!(read[99].epoch, 100);
    for (record, (&loss, &accuracy)) in read.iter().zip(state.loss.iter().zip(&state.accuracy)) {
        assert_eq!(record.loss, loss);
        assert!((record.accuracy - accuracy * 100.0).abs() < 1e-9);
    }
}

#[test]
fn config_file_overrides_preset() {
    let path = scratch_file("config.json");
    fs::write(&path, r#"{ "tick_interval_ms": 250, "max_steps": 0, "seed": 8 }"#).unwrap();

    let config = assert_ok!(SimulationConfig::store().merge_file(&path));
    let _ = fs::remove_file(&path);

    assert_eq!(config.tick_interval(), Duration::from_millis(250));
    assert_eq!(config.max_steps, None);
    assert_eq!(config.seed, Some(8));
    assert_eq!(config.curve, SimulationConfig::store().curve);
}

#[test]
fn config_with_inverted_noise_is_rejected() {
    let json = r#"{
        "curve": {
            "loss_decay": 20.0,
            "loss_noise": { "low": 0.1, "high": 0.0 },
            "accuracy_decay": 25.0,
            "accuracy_noise": { "low": 0.0, "high": 0.1 }
        }
    }"#;

    let err = assert_err!(SimulationConfig::epoch().merge_json(json));
    assert!(matches!(err, NexusError::InvalidConfig(_)));
}
