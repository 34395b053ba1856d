//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{execute, EventSink, FileBackend, HttpFileBackend, UploadEvent};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use storage::{MemorySessionStore, SessionStore, SqliteSessionStore};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub backend_url: String,
    pub session_db_url: String,
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: BackendSettings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_worker(cmd_rx, ui_tx, settings));
    });
}

async fn open_session_store(url: &str, ui_tx: &Sender<UiEvent>) -> Arc<dyn SessionStore> {
    let opened = match SqliteSessionStore::new(url).await {
        Ok(store) => store.health_check().await.map(|()| store),
        Err(err) => Err(err),
    };
    match opened {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(database_url = url, "failed to open session store: {err:#}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("failed to open session store {url}; dashboard data will not survive this screen: {err}"),
            )));
            Arc::new(MemorySessionStore::new())
        }
    }
}

async fn run_worker(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: BackendSettings) {
    let backend: Arc<dyn FileBackend> = Arc::new(HttpFileBackend::new(settings.backend_url.clone()));
    let session = open_session_store(&settings.session_db_url, &ui_tx).await;
    let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));
    tracing::info!(backend_url = %settings.backend_url, "backend worker ready");

    let sink = upload_sink(ui_tx.clone());

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::Upload(command) => {
                let backend = backend.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    execute(backend.as_ref(), command, sink).await;
                });
            }
            BackendCommand::LoadSnapshot => match storage::load_snapshot(session.as_ref()).await {
                Ok(load) => send(&ui_tx, UiEvent::SnapshotLoaded(load)),
                Err(err) => send(&ui_tx, dashboard_error(format!("failed to read session store: {err:#}"))),
            },
            BackendCommand::SaveSnapshot(snapshot) => {
                match storage::save_snapshot(session.as_ref(), &snapshot).await {
                    Ok(()) => send(&ui_tx, UiEvent::SnapshotSaved),
                    Err(err) => send(&ui_tx, dashboard_error(format!("failed to write session store: {err:#}"))),
                }
            }
            BackendCommand::ClearSnapshot => match storage::clear_snapshot(session.as_ref()).await {
                Ok(()) => send(&ui_tx, UiEvent::SnapshotCleared),
                Err(err) => send(&ui_tx, dashboard_error(format!("failed to clear session store: {err:#}"))),
            },
        }
    }

    tracing::info!("ui command queue closed; backend worker exiting");
}

fn dashboard_error(message: String) -> UiEvent {
    UiEvent::Error(UiError::from_message(UiErrorContext::Dashboard, message))
}

fn upload_sink(ui_tx: Sender<UiEvent>) -> EventSink {
    Arc::new(move |event: UploadEvent| {
        // Progress ticks are dropped when the queue is full; outcomes are not.
        let is_progress = matches!(event, UploadEvent::Progress { .. });
        match ui_tx.try_send(UiEvent::Upload(event)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) if is_progress => {}
            Err(TrySendError::Full(event)) => {
                if ui_tx.send(event).is_err() {
                    tracing::warn!("ui event queue closed; dropping upload outcome");
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("ui event queue closed; dropping upload event");
            }
        }
    })
}

fn send(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if let Err(err) = ui_tx.try_send(event) {
        tracing::warn!("failed to deliver backend event to ui: {err}");
    }
}
