//! Integration tests for playmeterd
//!
//! These tests verify the end-to-end behavior of the daemon.

use playmeter_api::{
    Command, ErrorCode, EventPayload, HistoryOrder, ImagePayload, ResponsePayload, ResponseResult,
    Stats, TerminalState,
};
use playmeter_config::Config;
use playmeter_core::SessionEngine;
use playmeter_imaging::{MockImageEditor, MockOutcome};
use playmeter_ipc::{EventStream, IpcClient};
use playmeter_store::{
    KvStore, SqliteStore, load_history, load_hourly_rate, save_history, save_hourly_rate,
};
use playmeter_util::{ManualClock, TerminalId, Timestamp};
use playmeterd::Service;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const HOUR_MS: i64 = 3_600_000;
const T1: TerminalId = TerminalId::new(1);
const T2: TerminalId = TerminalId::new(2);

fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.service.socket_path = dir.join("playmeterd.sock");
    config.service.data_dir = dir.to_path_buf();
    config.service.tick_interval = Duration::from_millis(20);
    config
}

struct Harness {
    _dir: TempDir,
    socket_path: PathBuf,
    clock: ManualClock,
    editor: MockImageEditor,
    store: Arc<SqliteStore>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl Harness {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let clock = ManualClock::new(Timestamp::from_millis(1_700_000_000_000));
        let editor = MockImageEditor::default();
        let store = Arc::new(SqliteStore::open(dir.path().join("playmeter.db")).unwrap());

        let service = Service::with_parts(
            &config,
            store.clone(),
            Arc::new(clock.clone()),
            Some(Arc::new(editor.clone())),
        )
        .await
        .unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(service.run_until(async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            socket_path: config.service.socket_path.clone(),
            _dir: dir,
            clock,
            editor,
            store,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    async fn client(&self) -> IpcClient {
        IpcClient::connect(&self.socket_path).await.unwrap()
    }

    async fn subscriber(&self) -> EventStream {
        self.client().await.subscribe().await.unwrap()
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.unwrap().unwrap();
        }
    }
}

async fn next_event(stream: &mut EventStream) -> EventPayload {
    tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for event")
        .unwrap()
        .payload
}

#[tokio::test]
async fn test_restart_restores_rate_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let db_path = dir.path().join("playmeter.db");
    let clock = ManualClock::new(Timestamp::from_millis(0));

    {
        let store = SqliteStore::open(&db_path).unwrap();
        let mut engine = SessionEngine::new(&config, Arc::new(clock.clone()));

        let rate = engine.set_hourly_rate(80.0);
        save_hourly_rate(&store, rate.get()).unwrap();

        engine.start(T1).unwrap();
        clock.advance_millis(HOUR_MS / 2);
        engine.stop(T1).unwrap();

        // Left running at shutdown
        engine.start(T2).unwrap();
        save_history(&store, engine.history().all()).unwrap();
    }

    let store = SqliteStore::open(&db_path).unwrap();
    let mut engine = SessionEngine::new(&config, Arc::new(clock.clone()));
    engine.restore(load_hourly_rate(&store), load_history(&store));

    assert_eq!(engine.hourly_rate().get(), 80.0);
    assert_eq!(engine.history().count(), 1);
    assert!((engine.stats().total_revenue - 40.0).abs() < 1e-9);
    assert!(engine.registry().iter().all(|t| !t.is_occupied()));
}

#[tokio::test]
async fn test_session_lifecycle_over_ipc() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let payload = client.call(Command::StartSession { terminal_id: T1 }).await.unwrap();
    assert!(matches!(
        payload,
        ResponsePayload::SessionStarted { terminal_id, .. } if terminal_id == T1
    ));

    harness.clock.advance_millis(HOUR_MS);

    let record = match client.call(Command::StopSession { terminal_id: T1 }).await.unwrap() {
        ResponsePayload::SessionStopped(record) => record,
        other => panic!("Expected SessionStopped, got {:?}", other),
    };
    assert_eq!(record.terminal_id(), T1);
    assert!((record.duration_minutes() - 60.0).abs() < 1e-9);
    assert!((record.cost() - 50.0).abs() < 1e-9);

    match client
        .call(Command::GetHistory {
            order: HistoryOrder::OldestFirst,
        })
        .await
        .unwrap()
    {
        ResponsePayload::History { records } => assert_eq!(records, vec![record]),
        other => panic!("Expected History, got {:?}", other),
    }

    match client.call(Command::GetStats).await.unwrap() {
        ResponsePayload::Stats(stats) => {
            assert_eq!(stats.total_sessions, 1);
            assert!((stats.total_revenue - 50.0).abs() < 1e-9);
        }
        other => panic!("Expected Stats, got {:?}", other),
    }

    // Persisted as soon as the session ended
    assert_eq!(load_history(harness.store.as_ref()).len(), 1);

    match client.call(Command::ClearHistory).await.unwrap() {
        ResponsePayload::HistoryCleared { removed } => assert_eq!(removed, 1),
        other => panic!("Expected HistoryCleared, got {:?}", other),
    }
    match client.call(Command::GetStats).await.unwrap() {
        ResponsePayload::Stats(stats) => assert_eq!(stats, Stats::default()),
        other => panic!("Expected Stats, got {:?}", other),
    }
    assert!(load_history(harness.store.as_ref()).is_empty());

    harness.stop().await;
}

#[tokio::test]
async fn test_rate_change_applies_to_running_session() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.call(Command::StartSession { terminal_id: T2 }).await.unwrap();
    harness.clock.advance_millis(HOUR_MS / 2);

    match client.call(Command::SetHourlyRate { rate: 100.0 }).await.unwrap() {
        ResponsePayload::HourlyRateSet { rate } => assert_eq!(rate, 100.0),
        other => panic!("Expected HourlyRateSet, got {:?}", other),
    }
    assert_eq!(load_hourly_rate(harness.store.as_ref()), Some(100.0));

    harness.clock.advance_millis(HOUR_MS / 2);

    match client.call(Command::StopSession { terminal_id: T2 }).await.unwrap() {
        ResponsePayload::SessionStopped(record) => {
            assert!((record.cost() - 100.0).abs() < 1e-9);
        }
        other => panic!("Expected SessionStopped, got {:?}", other),
    }

    // Negative input is clamped
    match client.call(Command::SetHourlyRate { rate: -5.0 }).await.unwrap() {
        ResponsePayload::HourlyRateSet { rate } => assert_eq!(rate, 0.0),
        other => panic!("Expected HourlyRateSet, got {:?}", other),
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_history_listing_order() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let mut stopped = Vec::new();
    for terminal_id in [T1, T2] {
        client.call(Command::StartSession { terminal_id }).await.unwrap();
        harness.clock.advance_millis(HOUR_MS / 3);
        match client.call(Command::StopSession { terminal_id }).await.unwrap() {
            ResponsePayload::SessionStopped(record) => stopped.push(record),
            other => panic!("Expected SessionStopped, got {:?}", other),
        }
    }

    match client
        .call(Command::GetHistory {
            order: HistoryOrder::OldestFirst,
        })
        .await
        .unwrap()
    {
        ResponsePayload::History { records } => assert_eq!(records, stopped),
        other => panic!("Expected History, got {:?}", other),
    }

    stopped.reverse();
    match client
        .call(Command::GetHistory {
            order: HistoryOrder::NewestFirst,
        })
        .await
        .unwrap()
    {
        ResponsePayload::History { records } => assert_eq!(records, stopped),
        other => panic!("Expected History, got {:?}", other),
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_invalid_commands_return_errors() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let response = client.send(Command::StopSession { terminal_id: T1 }).await.unwrap();
    match response.result {
        ResponseResult::Err(e) => assert_eq!(e.code, ErrorCode::InvalidState),
        ResponseResult::Ok(p) => panic!("Expected error, got {:?}", p),
    }

    client.call(Command::StartSession { terminal_id: T1 }).await.unwrap();
    let response = client.send(Command::StartSession { terminal_id: T1 }).await.unwrap();
    match response.result {
        ResponseResult::Err(e) => assert_eq!(e.code, ErrorCode::InvalidState),
        ResponseResult::Ok(p) => panic!("Expected error, got {:?}", p),
    }

    let response = client
        .send(Command::StartSession {
            terminal_id: TerminalId::new(99),
        })
        .await
        .unwrap();
    match response.result {
        ResponseResult::Err(e) => assert_eq!(e.code, ErrorCode::UnknownTerminal),
        ResponseResult::Ok(p) => panic!("Expected error, got {:?}", p),
    }

    // Rejected commands leave history untouched
    match client
        .call(Command::GetHistory {
            order: HistoryOrder::OldestFirst,
        })
        .await
        .unwrap()
    {
        ResponsePayload::History { records } => assert!(records.is_empty()),
        other => panic!("Expected History, got {:?}", other),
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_state_and_terminal_listing() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.call(Command::StartSession { terminal_id: T1 }).await.unwrap();
    harness.clock.advance_millis(HOUR_MS / 4);

    match client.call(Command::ListTerminals).await.unwrap() {
        ResponsePayload::Terminals { terminals } => {
            assert_eq!(terminals.len(), 3);
            assert_eq!(terminals[0].state, TerminalState::Occupied);
            assert_eq!(terminals[0].elapsed_ms, HOUR_MS / 4);
            assert!((terminals[0].projected_cost - 12.5).abs() < 1e-9);
            assert_eq!(terminals[1].state, TerminalState::Idle);
            assert_eq!(terminals[1].elapsed_ms, 0);
        }
        other => panic!("Expected Terminals, got {:?}", other),
    }

    match client.call(Command::GetState).await.unwrap() {
        ResponsePayload::State(state) => {
            assert_eq!(state.active_terminals, 1);
            assert_eq!(state.hourly_rate, 50.0);
        }
        other => panic!("Expected State, got {:?}", other),
    }

    match client.call(Command::GetHealth).await.unwrap() {
        ResponsePayload::Health(health) => {
            assert!(health.store_ok);
            assert!(health.image_editor_configured);
        }
        other => panic!("Expected Health, got {:?}", other),
    }

    assert!(matches!(
        client.call(Command::Ping).await.unwrap(),
        ResponsePayload::Pong
    ));

    harness.stop().await;
}

#[tokio::test]
async fn test_events_follow_commands() {
    let harness = Harness::start().await;
    let mut events = harness.subscriber().await;
    let mut client = harness.client().await;

    client.call(Command::StartSession { terminal_id: T1 }).await.unwrap();

    match next_event(&mut events).await {
        EventPayload::SessionStarted { terminal_id, name, .. } => {
            assert_eq!(terminal_id, T1);
            assert_eq!(name, "Screen 1 (PS5)");
        }
        other => panic!("Expected SessionStarted, got {:?}", other),
    }
    match next_event(&mut events).await {
        EventPayload::StateChanged(state) => assert_eq!(state.active_terminals, 1),
        other => panic!("Expected StateChanged, got {:?}", other),
    }

    // Live readings once a tick is due
    harness.clock.advance_millis(1_000);
    match next_event(&mut events).await {
        EventPayload::Tick { readings } => {
            assert_eq!(readings.len(), 1);
            assert_eq!(readings[0].terminal_id, T1);
            assert_eq!(readings[0].elapsed_ms, 1_000);
        }
        other => panic!("Expected Tick, got {:?}", other),
    }

    client.call(Command::StopSession { terminal_id: T1 }).await.unwrap();
    match next_event(&mut events).await {
        EventPayload::SessionEnded(record) => assert_eq!(record.terminal_id(), T1),
        other => panic!("Expected SessionEnded, got {:?}", other),
    }
    match next_event(&mut events).await {
        EventPayload::StateChanged(state) => {
            assert_eq!(state.active_terminals, 0);
            assert_eq!(state.stats.total_sessions, 1);
        }
        other => panic!("Expected StateChanged, got {:?}", other),
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_edit_image_passthrough() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let input = ImagePayload::new("image/jpeg", "/9j/4AAQSkZJRg==");
    let output = ImagePayload::new("image/png", "iVBORw0KGgo=");
    harness.editor.set_outcome(MockOutcome::Image(output.clone()));

    let payload = client
        .call(Command::EditImage {
            image: input,
            instruction: "add a retro filter".into(),
        })
        .await
        .unwrap();
    match payload {
        ResponsePayload::ImageEdited(image) => assert_eq!(image, output),
        other => panic!("Expected ImageEdited, got {:?}", other),
    }
    assert_eq!(harness.editor.requests()[0].instruction, "add a retro filter");

    harness.editor.set_outcome(MockOutcome::NoImage);
    let response = client
        .send(Command::EditImage {
            image: output.clone(),
            instruction: "again".into(),
        })
        .await
        .unwrap();
    match response.result {
        ResponseResult::Err(e) => assert_eq!(e.code, ErrorCode::ImageEditFailed),
        ResponseResult::Ok(p) => panic!("Expected error, got {:?}", p),
    }

    let response = client
        .send(Command::EditImage {
            image: output,
            instruction: "   ".into(),
        })
        .await
        .unwrap();
    match response.result {
        ResponseResult::Err(e) => assert_eq!(e.code, ErrorCode::InvalidRequest),
        ResponseResult::Ok(p) => panic!("Expected error, got {:?}", p),
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_service_without_image_editor() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store: Arc<dyn KvStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let clock = ManualClock::new(Timestamp::from_millis(0));

    let service = Service::with_parts(&config, store, Arc::new(clock), None)
        .await
        .unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(service.run_until(async move {
        let _ = rx.await;
    }));

    let mut client = IpcClient::connect(&config.service.socket_path).await.unwrap();
    let response = client
        .send(Command::EditImage {
            image: ImagePayload::new("image/png", "iVBORw0KGgo="),
            instruction: "brighter".into(),
        })
        .await
        .unwrap();
    match response.result {
        ResponseResult::Err(e) => assert_eq!(e.code, ErrorCode::ImageEditUnavailable),
        ResponseResult::Ok(p) => panic!("Expected error, got {:?}", p),
    }

    let _ = tx.send(());
    task.await.unwrap().unwrap();
    assert!(!config.service.socket_path.exists());
}
