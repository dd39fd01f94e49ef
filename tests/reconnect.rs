//! Disconnect supervisor: bounded auto-reconnect, the stale-timer
//! re-check, and persisted-session freshness gating.

mod common;

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use common::{MemoryStore, MockDevice, MockPicker};
use pretty_assertions::assert_eq;
use printer_link::core::bluetooth::constants::STORAGE_KEY;
use printer_link::{
    ConnectionStatus, DeviceFilter, PersistedConnection, PrinterEvent, PrinterManager,
};

/// Poll until the manager reaches `status`; paused-clock sleeps
/// auto-advance, so this also drives pending timers.
async fn wait_for_status(manager: &PrinterManager, status: ConnectionStatus) {
    for _ in 0..200 {
        if manager.status().await == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("manager never reached {status:?}");
}

#[tokio::test(start_paused = true)]
async fn unsolicited_drop_triggers_targeted_reconnect() {
    let picker = MockPicker::new();
    let store = MemoryStore::new();
    let (first, _) = MockDevice::printer("dev-1", "BlueTooth Printer");
    let (second, _) = MockDevice::printer("dev-1", "BlueTooth Printer");
    picker.enqueue(first.clone());
    picker.enqueue(second);

    let manager = PrinterManager::new(picker.clone(), store);
    manager.connect_manual().await.unwrap();

    first.drop_link().await;

    wait_for_status(&manager, ConnectionStatus::Connected).await;

    // One reconnect happened, with the targeted filter, and the counter
    // reset on success.
    assert_eq!(
        picker.calls(),
        vec![DeviceFilter::Permissive, DeviceFilter::Targeted]
    );
    assert_eq!(manager.snapshot().await.reconnect_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn reconnect_attempts_never_exceed_the_cap() {
    let picker = MockPicker::new();
    let (device, _) = MockDevice::printer("dev-1", "BlueTooth Printer");
    picker.enqueue(device.clone());
    // Nothing else queued: every reconnect scan comes up empty.

    let manager = PrinterManager::new(picker.clone(), MemoryStore::new());
    let mut events = manager.subscribe();
    manager.connect_manual().await.unwrap();

    device.drop_link().await;

    for _ in 0..200 {
        if picker.calls().len() >= 4 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // Give the loop room to (incorrectly) keep going; it must not.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(picker.calls().len(), 4); // 1 manual + 3 reconnects

    let mut scheduled = Vec::new();
    let mut exhausted = false;
    while let Ok(event) = events.try_recv() {
        match event {
            PrinterEvent::ReconnectScheduled { attempt } => scheduled.push(attempt),
            PrinterEvent::ReconnectExhausted => exhausted = true,
            _ => {}
        }
    }
    assert_eq!(scheduled, vec![1, 2, 3]);
    assert!(exhausted);

    // Budget reset, nothing left in flight.
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.reconnect_attempts, 0);
    assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn explicit_disconnect_cancels_a_pending_reconnect() {
    let picker = MockPicker::new();
    let (device, _) = MockDevice::printer("dev-1", "BlueTooth Printer");
    picker.enqueue(device.clone());

    let manager = PrinterManager::new(picker.clone(), MemoryStore::new());
    let mut events = manager.subscribe();
    manager.connect_manual().await.unwrap();

    device.drop_link().await;

    // Wait for the supervisor to schedule its attempt, then beat the timer.
    loop {
        match events.recv().await.unwrap() {
            PrinterEvent::ReconnectScheduled { attempt } => {
                assert_eq!(attempt, 1);
                break;
            }
            _ => continue,
        }
    }
    manager.disconnect().await;

    // Let the reconnect timer fire; the loop must notice the user's
    // disconnect and abort without another pick.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(picker.calls().len(), 1);
    assert_eq!(manager.status().await, ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn dropped_link_clears_handles_and_fails_sends() {
    let picker = MockPicker::new();
    let (device, _) = MockDevice::printer("dev-1", "BlueTooth Printer");
    picker.enqueue(device.clone());

    let manager = PrinterManager::new(picker, MemoryStore::new());
    manager.connect_manual().await.unwrap();

    device.drop_link().await;
    wait_for_status(&manager, ConnectionStatus::Disconnected).await;

    assert!(matches!(
        manager.send(b"x").await.unwrap_err(),
        printer_link::PrinterError::NotConnected
    ));
}

#[tokio::test]
async fn stale_persisted_record_skips_session_resume() {
    let picker = MockPicker::new();
    let store = MemoryStore::new();

    let mut record = PersistedConnection::new("dev-1".into(), "BlueTooth Printer".into());
    record.timestamp = Utc::now() - TimeDelta::hours(25);
    record.save(store.as_ref(), STORAGE_KEY).unwrap();

    let manager = PrinterManager::new(picker.clone(), store);
    let resumed = manager.try_resume_session().await.unwrap();

    assert!(!resumed);
    assert!(picker.calls().is_empty(), "no discovery may be started");
    assert_eq!(manager.status().await, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn fresh_persisted_record_resumes_with_targeted_discovery() {
    let picker = MockPicker::new();
    let store = MemoryStore::new();
    let (device, _) = MockDevice::printer("dev-1", "BlueTooth Printer");
    picker.enqueue(device);

    PersistedConnection::new("dev-1".into(), "BlueTooth Printer".into())
        .save(store.as_ref(), STORAGE_KEY)
        .unwrap();

    let manager = PrinterManager::new(picker.clone(), store);
    let resumed = manager.try_resume_session().await.unwrap();

    assert!(resumed);
    assert_eq!(picker.calls(), vec![DeviceFilter::Targeted]);
    assert_eq!(manager.status().await, ConnectionStatus::Connected);
}

#[tokio::test]
async fn missing_record_means_no_resume() {
    let picker = MockPicker::new();
    let manager = PrinterManager::new(picker.clone(), MemoryStore::new());

    assert!(!manager.try_resume_session().await.unwrap());
    assert!(picker.calls().is_empty());
}
