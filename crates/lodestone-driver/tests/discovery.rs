//! Controller-level discovery and name lookup across several readers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use lodestone_core::constants::SCAN_INTERVAL_MS;
use lodestone_core::{DeviceName, DevicePath};
use lodestone_driver::mock::{MockConnections, MockOpener, MockPortHandle};
use lodestone_driver::{ControllerConfig, DiscoveryConfig, ReaderController};

use common::{Callback, RecordingHandler, wait_until};

fn controller_over(
    root: std::path::PathBuf,
) -> (Arc<ReaderController>, Arc<RecordingHandler>, MockConnections) {
    let (opener, connections) = MockOpener::new();
    let handler = RecordingHandler::new();
    let config = ControllerConfig {
        discovery: DiscoveryConfig {
            root,
            patterns: vec!["ttyUSB*".to_string(), "ttyACM*".to_string()],
        },
        ..ControllerConfig::default()
    };
    let controller = ReaderController::with_opener(config, handler.clone(), opener);
    (controller, handler, connections)
}

#[tokio::test(start_paused = true)]
async fn discovery_adopts_each_matching_port_once() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ttyUSB0"), b"").unwrap();
    std::fs::write(dir.path().join("ttyACM3"), b"").unwrap();
    std::fs::write(dir.path().join("README.txt"), b"").unwrap();

    let (controller, _handler, _connections) = controller_over(dir.path().to_path_buf());
    controller.start();

    wait_until("both ports to be adopted", || {
        controller.devices().len() == 2
    })
    .await;
    let paths: Vec<String> = controller.devices().iter().map(|s| s.path().to_string()).collect();
    assert!(paths[0].ends_with("ttyACM3"));
    assert!(paths[1].ends_with("ttyUSB0"));

    // Further scans re-see the same entries without duplicating them.
    tokio::time::sleep(Duration::from_millis(SCAN_INTERVAL_MS * 3)).await;
    assert_eq!(controller.devices().len(), 2);

    controller.stop().await;
    assert!(controller.devices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn discovery_survives_a_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("bus");

    let (controller, _handler, _connections) = controller_over(root.clone());
    controller.start();

    // Scans fail while the root does not exist; the scanner keeps going.
    tokio::time::sleep(Duration::from_millis(SCAN_INTERVAL_MS * 2)).await;
    assert!(controller.devices().is_empty());

    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("ttyUSB7"), b"").unwrap();
    wait_until("adoption after the root appears", || {
        controller.devices().len() == 1
    })
    .await;

    controller.stop().await;
}

/// Feed both connected readers, returning (V0 handle, V1 handle).
async fn two_attached(
    controller: &Arc<ReaderController>,
    connections: &mut MockConnections,
) -> (MockPortHandle, MockPortHandle) {
    controller.attach(DevicePath::new("/dev/ttyV0").unwrap()).unwrap();
    controller.attach(DevicePath::new("/dev/ttyV1").unwrap()).unwrap();
    let first = connections.next().await.unwrap();
    let second = connections.next().await.unwrap();
    if first.path().as_str() == "/dev/ttyV0" {
        (first, second)
    } else {
        (second, first)
    }
}

#[tokio::test(start_paused = true)]
async fn distinct_names_resolve_to_their_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, handler, mut connections) = controller_over(dir.path().to_path_buf());
    let (mut v0, mut v1) = two_attached(&controller, &mut connections).await;

    v0.feed_line("Name:Gate-1").await.unwrap();
    v1.feed_line("Name:Gate-2").await.unwrap();
    wait_until("both readers to identify", || {
        controller.devices().iter().filter(|s| s.name().is_some()).count() == 2
    })
    .await;

    let gate1 = controller
        .device_by_name(&DeviceName::new("Gate-1").unwrap())
        .unwrap();
    let gate2 = controller
        .device_by_name(&DeviceName::new("Gate-2").unwrap())
        .unwrap();
    assert_eq!(gate1.path().as_str(), "/dev/ttyV0");
    assert_eq!(gate2.path().as_str(), "/dev/ttyV1");

    // Callbacks carry the right name per reader.
    v1.feed_line("Tag found: X7 BLOOD INCREASING KRYSTAL WEAK")
        .await
        .unwrap();
    wait_until("the detection", || !handler.calls().is_empty()).await;
    assert_eq!(
        handler.calls()[0],
        Callback::Detected {
            reader: "Gate-2".to_string(),
            card: "X7".to_string(),
        }
    );

    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn duplicate_names_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _handler, mut connections) = controller_over(dir.path().to_path_buf());
    let (mut v0, mut v1) = two_attached(&controller, &mut connections).await;

    v0.feed_line("Name:Gate-1").await.unwrap();
    v1.feed_line("Name:Gate-1").await.unwrap();
    wait_until("both readers to identify", || {
        controller.devices().iter().filter(|s| s.name().is_some()).count() == 2
    })
    .await;

    // Two readers claim the same name; picking one would be a guess.
    assert!(
        controller
            .device_by_name(&DeviceName::new("Gate-1").unwrap())
            .is_none()
    );

    controller.stop().await;
}
