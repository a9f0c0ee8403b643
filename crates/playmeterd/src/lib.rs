//! playmeterd service wiring
//!
//! Ties together:
//! - Configuration
//! - Store (hourly rate and history survive restarts; occupancy does not)
//! - Session engine
//! - Image-edit collaborator
//! - IPC server

use anyhow::{Context, Result};
use playmeter_api::{
    API_VERSION, Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, HistoryOrder,
    ImagePayload, Response, ResponsePayload,
};
use playmeter_config::Config;
use playmeter_core::{CoreEvent, SessionEngine, SessionError};
use playmeter_imaging::{GeminiImageEditor, ImageEditError, ImageEditRequest, ImageEditor};
use playmeter_ipc::{IpcServer, ServerMessage};
use playmeter_store::{
    KvStore, SqliteStore, load_history, load_hourly_rate, save_history, save_hourly_rate,
};
use playmeter_util::{ClientId, Clock, JobId, SystemClock};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Database file inside the data directory
pub const DB_FILE_NAME: &str = "playmeter.db";

/// Main service state
pub struct Service {
    engine: Arc<Mutex<SessionEngine>>,
    ipc: Arc<IpcServer>,
    store: Arc<dyn KvStore>,
    editor: Option<Arc<dyn ImageEditor>>,
    tick_interval: Duration,
}

impl Service {
    /// Build the production service: SQLite store, wall clock, Gemini editor
    pub async fn new(config: &Config) -> Result<Self> {
        let data_dir = &config.service.data_dir;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join(DB_FILE_NAME);
        let store: Arc<dyn KvStore> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );
        info!(db_path = %db_path.display(), "Store initialized");

        let editor: Option<Arc<dyn ImageEditor>> =
            match GeminiImageEditor::from_config(&config.imaging) {
                Ok(editor) => {
                    info!(model = %config.imaging.model, "Image editor configured");
                    Some(Arc::new(editor))
                }
                Err(e) => {
                    warn!(error = %e, "Image editing unavailable");
                    None
                }
            };

        Self::with_parts(config, store, Arc::new(SystemClock), editor).await
    }

    /// Build the service from explicit collaborators
    pub async fn with_parts(
        config: &Config,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        editor: Option<Arc<dyn ImageEditor>>,
    ) -> Result<Self> {
        let mut engine = SessionEngine::new(config, clock);
        engine.restore(
            load_hourly_rate(store.as_ref()),
            load_history(store.as_ref()),
        );

        let socket_path = &config.service.socket_path;
        let mut ipc = IpcServer::new(socket_path);
        ipc.start()
            .await
            .with_context(|| format!("Failed to start IPC server at {:?}", socket_path))?;

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            ipc: Arc::new(ipc),
            store,
            editor,
            tick_interval: config.service.tick_interval,
        })
    }

    /// Run until SIGTERM, SIGINT or SIGHUP
    pub async fn run(self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        self.run_until(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
                _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
            }
        })
        .await
    }

    /// Run the main loop until `shutdown` completes
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let mut ipc_messages = self
            .ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let ipc_accept = self.ipc.clone();
        let accept_task = tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        let mut tick_timer = tokio::time::interval(self.tick_interval);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);

        info!(
            socket_path = %self.ipc.socket_path().display(),
            tick_ms = self.tick_interval.as_millis() as u64,
            "Service running"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,

                // Live readings for occupied terminals
                _ = tick_timer.tick() => {
                    let readings = self.engine.lock().await.tick();
                    if !readings.is_empty() {
                        self.ipc.broadcast_event(Event::new(EventPayload::Tick { readings }));
                    }
                }

                Some(msg) = ipc_messages.recv() => {
                    self.handle_ipc_message(msg).await;
                }
            }
        }

        info!("Shutting down playmeterd");

        let active = self.engine.lock().await.registry().occupied_count();
        if active > 0 {
            warn!(active, "Running sessions are discarded; terminals restart idle");
        }

        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));
        accept_task.abort();
        self.ipc.shutdown();

        info!("Shutdown complete");
        Ok(())
    }

    async fn handle_ipc_message(&self, msg: ServerMessage) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                let response = if request.api_version != API_VERSION {
                    warn!(
                        client_id = %client_id,
                        api_version = request.api_version,
                        "Unsupported API version"
                    );
                    Some(Response::error(
                        request.request_id,
                        ErrorInfo::new(
                            ErrorCode::InvalidRequest,
                            format!(
                                "Unsupported API version {} (expected {})",
                                request.api_version, API_VERSION
                            ),
                        ),
                    ))
                } else {
                    self.handle_command(&client_id, request.request_id, request.command)
                        .await
                };

                if let Some(response) = response
                    && let Err(e) = self.ipc.send_response(&client_id, response).await
                {
                    debug!(client_id = %client_id, error = %e, "Failed to send response");
                }
            }

            ServerMessage::ClientConnected { client_id } => {
                debug!(client_id = %client_id, "Client registered");
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");
            }
        }
    }

    /// Execute one command. Returns `None` when the response is sent later.
    async fn handle_command(
        &self,
        client_id: &ClientId,
        request_id: u64,
        command: Command,
    ) -> Option<Response> {
        let response = match command {
            Command::GetState => {
                let state = self.engine.lock().await.snapshot();
                Response::success(request_id, ResponsePayload::State(state))
            }

            Command::ListTerminals => {
                let terminals = self.engine.lock().await.terminal_views();
                Response::success(request_id, ResponsePayload::Terminals { terminals })
            }

            Command::StartSession { terminal_id } => {
                let mut engine = self.engine.lock().await;
                match engine.start(terminal_id) {
                    Ok(started) => {
                        let started_at = started.started_at;
                        self.publish(&engine, started.into());
                        Response::success(
                            request_id,
                            ResponsePayload::SessionStarted {
                                terminal_id,
                                started_at,
                            },
                        )
                    }
                    Err(e) => session_error(request_id, e),
                }
            }

            Command::StopSession { terminal_id } => {
                let mut engine = self.engine.lock().await;
                match engine.stop(terminal_id) {
                    Ok(record) => {
                        self.persist_history(&engine);
                        self.publish(&engine, CoreEvent::SessionEnded(record.clone()));
                        Response::success(request_id, ResponsePayload::SessionStopped(record))
                    }
                    Err(e) => session_error(request_id, e),
                }
            }

            Command::SetHourlyRate { rate } => {
                let mut engine = self.engine.lock().await;
                let rate = engine.set_hourly_rate(rate);
                if let Err(e) = save_hourly_rate(self.store.as_ref(), rate.get()) {
                    error!(error = %e, "Failed to persist hourly rate");
                }
                self.publish(&engine, CoreEvent::HourlyRateChanged { rate });
                Response::success(request_id, ResponsePayload::HourlyRateSet { rate: rate.get() })
            }

            Command::GetHistory { order } => {
                let engine = self.engine.lock().await;
                let history = engine.history();
                let records = match order {
                    HistoryOrder::OldestFirst => history.all().to_vec(),
                    HistoryOrder::NewestFirst => history.newest_first().cloned().collect(),
                };
                Response::success(request_id, ResponsePayload::History { records })
            }

            Command::GetStats => {
                let stats = self.engine.lock().await.stats();
                Response::success(request_id, ResponsePayload::Stats(stats))
            }

            Command::ClearHistory => {
                let mut engine = self.engine.lock().await;
                let removed = engine.clear_history();
                self.persist_history(&engine);
                self.publish(&engine, CoreEvent::HistoryCleared { removed });
                Response::success(request_id, ResponsePayload::HistoryCleared { removed })
            }

            Command::EditImage { image, instruction } => {
                self.spawn_image_edit(client_id.clone(), request_id, image, instruction);
                return None;
            }

            Command::SubscribeEvents => Response::success(
                request_id,
                ResponsePayload::Subscribed {
                    client_id: client_id.clone(),
                },
            ),

            Command::UnsubscribeEvents => {
                Response::success(request_id, ResponsePayload::Unsubscribed)
            }

            Command::GetHealth => {
                let health = HealthStatus {
                    live: true,
                    ready: true,
                    store_ok: self.store.is_healthy(),
                    image_editor_configured: self.editor.is_some(),
                };
                Response::success(request_id, ResponsePayload::Health(health))
            }

            Command::Ping => Response::success(request_id, ResponsePayload::Pong),
        };

        Some(response)
    }

    /// Broadcast a core event followed by the new state
    fn publish(&self, engine: &SessionEngine, event: CoreEvent) {
        self.ipc.broadcast_event(Event::new(event.into()));
        self.ipc
            .broadcast_event(Event::new(EventPayload::StateChanged(engine.snapshot())));
    }

    fn persist_history(&self, engine: &SessionEngine) {
        if let Err(e) = save_history(self.store.as_ref(), engine.history().all()) {
            error!(error = %e, "Failed to persist history");
        }
    }

    /// Run an image edit off the main loop and reply when it finishes
    fn spawn_image_edit(
        &self,
        client_id: ClientId,
        request_id: u64,
        image: ImagePayload,
        instruction: String,
    ) {
        let ipc = self.ipc.clone();
        let editor = self.editor.clone();
        let job_id = JobId::new();

        tokio::spawn(async move {
            let response = match editor {
                None => Response::error(
                    request_id,
                    ErrorInfo::new(ErrorCode::ImageEditUnavailable, "Image editing is not configured"),
                ),
                Some(editor) => {
                    info!(job_id = %job_id, editor = editor.name(), "Image edit started");
                    match editor.edit(ImageEditRequest::new(image, instruction)).await {
                        Ok(image) => {
                            info!(job_id = %job_id, "Image edit finished");
                            Response::success(request_id, ResponsePayload::ImageEdited(image))
                        }
                        Err(e) => {
                            warn!(job_id = %job_id, error = %e, "Image edit failed");
                            image_edit_error(request_id, e)
                        }
                    }
                }
            };

            if let Err(e) = ipc.send_response(&client_id, response).await {
                debug!(job_id = %job_id, error = %e, "Client left before image edit finished");
            }
        });
    }
}

fn session_error(request_id: u64, err: SessionError) -> Response {
    warn!(error = %err, "Session command rejected");
    let code = match err {
        SessionError::UnknownTerminal(_) => ErrorCode::UnknownTerminal,
        SessionError::InvalidState { .. } => ErrorCode::InvalidState,
    };
    Response::error(request_id, ErrorInfo::new(code, err.to_string()))
}

fn image_edit_error(request_id: u64, err: ImageEditError) -> Response {
    let code = match err {
        ImageEditError::Unavailable(_) => ErrorCode::ImageEditUnavailable,
        ImageEditError::InvalidRequest(_) => ErrorCode::InvalidRequest,
        _ => ErrorCode::ImageEditFailed,
    };
    Response::error(request_id, ErrorInfo::new(code, err.to_string()))
}
