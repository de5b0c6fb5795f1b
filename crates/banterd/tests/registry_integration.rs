//! Integration tests for the Registry Actor.
//!
//! These tests verify the registry works correctly as a complete system,
//! testing the spawn_registry() function and RegistryHandle interface.
//! Plain mpsc channels stand in for the per-connection writer queues.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.
//! We test the panic-free behavior of production code through assertions.

use std::time::Duration;

use banter_core::{RoomName, SessionId};
use banterd::registry::{spawn_registry, RegistryError, RegistryHandle};
use tokio::sync::mpsc;
use tokio::time::timeout;

// ============================================================================
// Constants
// ============================================================================

/// Maximum time to wait for a broadcast line to arrive
const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Time to wait before declaring that no line will arrive
const SILENCE_WINDOW: Duration = Duration::from_millis(100);

// ============================================================================
// Test Helpers
// ============================================================================

/// Registers a session and returns the receive side of its outbound queue.
async fn register(handle: &RegistryHandle, id: u64) -> mpsc::Receiver<String> {
    let (out_tx, out_rx) = mpsc::channel(64);
    handle
        .register(SessionId::new(id), out_tx)
        .await
        .expect("registration should succeed");
    out_rx
}

/// Receives one line or panics after the timeout.
async fn recv_line(rx: &mut mpsc::Receiver<String>) -> String {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("line should arrive")
        .expect("queue should be open")
}

/// Asserts no line arrives within the silence window.
async fn assert_silent(rx: &mut mpsc::Receiver<String>) {
    let result = timeout(SILENCE_WINDOW, rx.recv()).await;
    assert!(result.is_err(), "expected no line, got {result:?}");
}

// ============================================================================
// Basic Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_basic_lifecycle() {
    let handle = spawn_registry();

    let _rx = register(&handle, 1).await;

    let info = handle.get_session(SessionId::new(1)).await;
    assert!(info.is_some(), "session should be found");

    let info = info.unwrap();
    assert_eq!(info.id, SessionId::new(1));
    assert_eq!(info.name, "1"); // Default name is the decimal id
    assert_eq!(info.current_room, None); // New sessions start in the lobby

    assert!(handle.is_connected());
}

#[tokio::test]
async fn test_register_and_unregister() {
    let handle = spawn_registry();

    let _rx = register(&handle, 1).await;
    assert!(handle.get_session(SessionId::new(1)).await.is_some());

    handle.unregister(SessionId::new(1)).await;
    assert!(handle.get_session(SessionId::new(1)).await.is_none());

    // Unregister is idempotent
    handle.unregister(SessionId::new(1)).await;
    assert!(handle.is_connected());
}

#[tokio::test]
async fn test_set_name() {
    let handle = spawn_registry();
    let _rx = register(&handle, 1).await;

    handle
        .set_name(SessionId::new(1), "bob".to_string())
        .await
        .expect("name change should succeed");

    let info = handle.get_session(SessionId::new(1)).await.unwrap();
    assert_eq!(info.name, "bob");
}

#[tokio::test]
async fn test_set_name_empty_fails() {
    let handle = spawn_registry();
    let _rx = register(&handle, 1).await;

    let result = handle.set_name(SessionId::new(1), String::new()).await;
    assert!(matches!(result, Err(RegistryError::InvalidName)));

    // Display name unchanged
    let info = handle.get_session(SessionId::new(1)).await.unwrap();
    assert_eq!(info.name, "1");
}

// ============================================================================
// Room Semantics Tests
// ============================================================================

#[tokio::test]
async fn test_create_room_enters_creator() {
    let handle = spawn_registry();
    let _rx = register(&handle, 1).await;

    handle
        .create_room(SessionId::new(1), RoomName::from("r1"))
        .await
        .expect("room creation should succeed");

    let info = handle.get_session(SessionId::new(1)).await.unwrap();
    assert_eq!(info.current_room, Some(RoomName::from("r1")));
}

#[tokio::test]
async fn test_duplicate_create_fails_and_membership_unchanged() {
    let handle = spawn_registry();
    let _rx1 = register(&handle, 1).await;
    let _rx2 = register(&handle, 2).await;

    handle
        .create_room(SessionId::new(1), RoomName::from("r1"))
        .await
        .expect("first create should succeed");

    let result = handle
        .create_room(SessionId::new(2), RoomName::from("r1"))
        .await;
    assert!(matches!(result, Err(RegistryError::RoomAlreadyExists(_))));

    // Second session is still in the lobby
    let info = handle.get_session(SessionId::new(2)).await.unwrap();
    assert_eq!(info.current_room, None);
}

#[tokio::test]
async fn test_join_before_create_fails() {
    let handle = spawn_registry();
    let _rx = register(&handle, 1).await;

    let result = handle
        .join_room(SessionId::new(1), RoomName::from("r1"))
        .await;
    assert!(matches!(result, Err(RegistryError::RoomNotFound(_))));
}

#[tokio::test]
async fn test_create_empty_room_name_fails() {
    let handle = spawn_registry();
    let _rx = register(&handle, 1).await;

    let result = handle
        .create_room(SessionId::new(1), RoomName::from(""))
        .await;
    assert!(matches!(result, Err(RegistryError::InvalidName)));
}

#[tokio::test]
async fn test_room_persists_after_last_member_leaves() {
    let handle = spawn_registry();
    let _rx1 = register(&handle, 1).await;
    let _rx2 = register(&handle, 2).await;

    handle
        .create_room(SessionId::new(1), RoomName::from("r1"))
        .await
        .unwrap();
    handle.leave_room(SessionId::new(1)).await.unwrap();

    // The room is empty but still known
    handle
        .join_room(SessionId::new(2), RoomName::from("r1"))
        .await
        .expect("empty room should still be joinable");
}

#[tokio::test]
async fn test_leave_room_returns_to_lobby() {
    let handle = spawn_registry();
    let _rx = register(&handle, 1).await;

    handle
        .create_room(SessionId::new(1), RoomName::from("r1"))
        .await
        .unwrap();
    handle.leave_room(SessionId::new(1)).await.unwrap();

    let info = handle.get_session(SessionId::new(1)).await.unwrap();
    assert_eq!(info.current_room, None);

    // Leaving from the lobby is a harmless no-op
    handle.leave_room(SessionId::new(1)).await.unwrap();
}

// ============================================================================
// Broadcast Tests
// ============================================================================

#[tokio::test]
async fn test_broadcast_scoping() {
    let handle = spawn_registry();
    let mut rx_a = register(&handle, 1).await;
    let mut rx_b = register(&handle, 2).await;
    let mut rx_c = register(&handle, 3).await;

    handle
        .create_room(SessionId::new(1), RoomName::from("r1"))
        .await
        .unwrap();
    handle
        .join_room(SessionId::new(2), RoomName::from("r1"))
        .await
        .unwrap();
    handle
        .create_room(SessionId::new(3), RoomName::from("r2"))
        .await
        .unwrap();

    handle
        .broadcast(SessionId::new(1), RoomName::from("r1"), "hello".to_string())
        .await;

    // Delivered to B only: never to C (other room), never echoed to A
    assert_eq!(recv_line(&mut rx_b).await, "hello");
    assert_silent(&mut rx_c).await;
    assert_silent(&mut rx_a).await;
}

#[tokio::test]
async fn test_broadcast_stops_after_leave() {
    let handle = spawn_registry();
    let _rx_a = register(&handle, 1).await;
    let mut rx_b = register(&handle, 2).await;

    handle
        .create_room(SessionId::new(1), RoomName::from("r1"))
        .await
        .unwrap();
    handle
        .join_room(SessionId::new(2), RoomName::from("r1"))
        .await
        .unwrap();

    handle.leave_room(SessionId::new(2)).await.unwrap();

    handle
        .broadcast(SessionId::new(1), RoomName::from("r1"), "anyone?".to_string())
        .await;

    assert_silent(&mut rx_b).await;
}

#[tokio::test]
async fn test_broadcast_per_recipient_fifo() {
    let handle = spawn_registry();
    let _rx_a = register(&handle, 1).await;
    let mut rx_b = register(&handle, 2).await;

    handle
        .create_room(SessionId::new(1), RoomName::from("r1"))
        .await
        .unwrap();
    handle
        .join_room(SessionId::new(2), RoomName::from("r1"))
        .await
        .unwrap();

    for i in 0..10 {
        handle
            .broadcast(SessionId::new(1), RoomName::from("r1"), format!("msg {i}"))
            .await;
    }

    for i in 0..10 {
        assert_eq!(recv_line(&mut rx_b).await, format!("msg {i}"));
    }
}

#[tokio::test]
async fn test_broadcast_to_unregistered_session_dropped() {
    let handle = spawn_registry();
    let _rx_a = register(&handle, 1).await;
    let mut rx_b = register(&handle, 2).await;

    handle
        .create_room(SessionId::new(1), RoomName::from("r1"))
        .await
        .unwrap();
    handle
        .join_room(SessionId::new(2), RoomName::from("r1"))
        .await
        .unwrap();

    handle.unregister(SessionId::new(2)).await;

    handle
        .broadcast(SessionId::new(1), RoomName::from("r1"), "gone".to_string())
        .await;

    assert_silent(&mut rx_b).await;
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_broadcast_and_membership_churn() {
    let handle = spawn_registry();

    // Session 1 creates the room and broadcasts into it
    let mut rx_sender = register(&handle, 1).await;
    handle
        .create_room(SessionId::new(1), RoomName::from("stress"))
        .await
        .unwrap();

    // Sessions 2..=9 churn in and out of the room
    let mut churn_queues = Vec::new();
    for id in 2..=9u64 {
        churn_queues.push(register(&handle, id).await);
    }

    let mut tasks = Vec::new();
    for id in 2..=9u64 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..50 {
                handle
                    .join_room(SessionId::new(id), RoomName::from("stress"))
                    .await
                    .expect("join should succeed");
                handle.leave_room(SessionId::new(id)).await.expect("leave should succeed");
            }
        }));
    }

    let sender = handle.clone();
    tasks.push(tokio::spawn(async move {
        for i in 0..100 {
            sender
                .broadcast(
                    SessionId::new(1),
                    RoomName::from("stress"),
                    format!("msg {i}"),
                )
                .await;
        }
    }));

    for task in tasks {
        task.await.expect("task should not panic");
    }

    // The registry survived and is still responsive
    assert!(handle.is_connected());
    let info = handle.get_session(SessionId::new(1)).await.unwrap();
    assert_eq!(info.current_room, Some(RoomName::from("stress")));

    // Whatever was delivered went only to then-current members, and the
    // sender was never echoed
    assert!(timeout(SILENCE_WINDOW, rx_sender.recv()).await.is_err());
    for mut rx in churn_queues {
        while let Ok(Some(line)) = timeout(SILENCE_WINDOW, rx.recv()).await {
            assert!(line.starts_with("msg "), "unexpected line: {line}");
        }
    }
}
