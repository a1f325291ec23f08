//! Real signal delivery to this test process. Kept in its own test binary so
//! the process-wide handlers cannot interfere with other tests.
#![cfg(unix)]

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use status_messaging::MemoryBus;
use status_persistence::MemoryStore;
use status_updater::signals::spawn_bridge;
use status_updater::{IngestorSettings, LifecycleState, StatusIngestor};

#[tokio::test]
async fn sighup_stops_a_running_ingestor() {
    let bus = MemoryBus::default();
    let ingestor = Arc::new(StatusIngestor::new(
        Arc::new(bus.clone()),
        Arc::new(MemoryStore::new("status")),
        IngestorSettings {
            heartbeat_interval: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(1),
            sweep_interval: None,
            ..IngestorSettings::default()
        },
    ));

    let for_signal = ingestor.clone();
    let bridge = spawn_bridge(move |signal| for_signal.stop(signal.name())).unwrap();

    let running = tokio::spawn({
        let ingestor = ingestor.clone();
        async move { ingestor.start().await }
    });
    timeout(Duration::from_secs(5), async {
        while bus.subscriber_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("ingestor did not subscribe");

    let status = Command::new("kill")
        .args(["-HUP", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    timeout(Duration::from_secs(2), running)
        .await
        .expect("start did not return after SIGHUP")
        .unwrap()
        .unwrap();
    assert_eq!(ingestor.state(), LifecycleState::Stopped);
    bridge.abort();
}
