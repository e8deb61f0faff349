//! Command Dispatcher: routes UI messages to the supervisor and the broker.
//!
//! Notifications (no `id`) are handled synchronously on the event loop.
//! Requests that touch the disk or open a dialog run on the tokio runtime;
//! their results come back as [`Completion`] events and are matched to the
//! pending table by `(generation, id)`. A page reload or window teardown
//! starts a new generation, so a result for the old page is dropped.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use jspaint_broker::FileBroker;
use jspaint_common::protocol::{is_kind_allowed, EnvironmentInfo, ErrorResponse};
use jspaint_common::{Command, ResponseCode};
use jspaint_webview::{IpcMessage, OutboundMessage};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;

use super::supervisor::WindowSupervisor;
use super::surface::Surface;
use super::types::{Completion, CompletionSink};

/// What the event loop must do after a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Handled,
    /// The UI sent `close-window`: tear the surface down.
    CloseConfirmed,
}

pub struct Dispatcher {
    broker: Arc<FileBroker>,
    runtime: Handle,
    completions: CompletionSink,
    /// In-flight requests, with their kind for logging.
    pending: HashMap<(u64, u64), &'static str>,
    generation: u64,
    is_dev: bool,
}

impl Dispatcher {
    pub fn new(
        broker: Arc<FileBroker>,
        runtime: Handle,
        completions: CompletionSink,
        is_dev: bool,
    ) -> Self {
        Self {
            broker,
            runtime,
            completions,
            pending: HashMap::new(),
            generation: 0,
            is_dev,
        }
    }

    #[cfg(test)]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Handle one raw message posted by the UI.
    pub fn handle<S: Surface>(
        &mut self,
        body: &str,
        supervisor: &mut WindowSupervisor<S>,
    ) -> Dispatched {
        let msg = match IpcMessage::from_json(body) {
            Ok(msg) => msg,
            Err(rejected) => {
                tracing::warn!(body_len = body.len(), "IPC message rejected: {}", rejected.error);
                if let Some(id) = rejected.id {
                    reject(supervisor, id, ResponseCode::InvalidRequest, rejected.error);
                }
                return Dispatched::Handled;
            }
        };

        if !is_kind_allowed(&msg.kind) {
            tracing::warn!(kind = %msg.kind, "IPC message rejected: unknown kind");
            if let Some(id) = msg.id {
                let reason = format!("unknown kind: {}", msg.kind);
                reject(supervisor, id, ResponseCode::InvalidRequest, reason);
            }
            return Dispatched::Handled;
        }

        let command = match Command::parse(&msg.kind, &msg.payload) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(kind = %msg.kind, "IPC message rejected: {e}");
                if let Some(id) = msg.id {
                    reject(supervisor, id, ResponseCode::InvalidRequest, e);
                }
                return Dispatched::Handled;
            }
        };

        tracing::debug!(kind = %msg.kind, id = ?msg.id, "IPC message dispatched");

        if command.expects_response() {
            let Some(id) = msg.id else {
                tracing::warn!(kind = %msg.kind, "Request without id ignored");
                return Dispatched::Handled;
            };
            self.handle_request(id, command, supervisor);
            return Dispatched::Handled;
        }

        let outcome = match command {
            Command::SetRepresentedPath(path) => {
                supervisor.set_represented_path(Path::new(&path));
                Dispatched::Handled
            }
            Command::SetEditedState(edited) => {
                supervisor.set_document_edited(edited);
                Dispatched::Handled
            }
            Command::CloseWindow => Dispatched::CloseConfirmed,
            other => {
                tracing::debug!(kind = other.kind(), "Unexpected notification");
                Dispatched::Handled
            }
        };

        // Answer notifications sent as requests so the caller is not left waiting.
        if let Some(id) = msg.id {
            supervisor.send(&OutboundMessage::response(id, &Value::Null));
        }
        outcome
    }

    fn handle_request<S: Surface>(
        &mut self,
        id: u64,
        command: Command,
        supervisor: &mut WindowSupervisor<S>,
    ) {
        let kind = command.kind();
        // A reply under a live id would settle the first caller; drop it.
        if self.pending.contains_key(&(self.generation, id)) {
            tracing::warn!(id, kind, "Duplicate request id ignored");
            return;
        }
        match command {
            Command::GetEnvironmentInfo => {
                let info = EnvironmentInfo {
                    is_dev: self.is_dev,
                    is_desktop_os: cfg!(target_os = "macos"),
                    is_mac_os: cfg!(target_os = "macos"),
                    initial_file_path: supervisor.take_initial_file_path(),
                };
                supervisor.send(&OutboundMessage::response(id, &info));
            }
            Command::ShowSaveDialog(options) => {
                let dialog = self.broker.show_save_dialog(&options);
                self.spawn(id, kind, async move { to_payload(&dialog.await) });
            }
            Command::ShowOpenDialog(options) => {
                let dialog = self.broker.show_open_dialog(&options);
                self.spawn(id, kind, async move { to_payload(&dialog.await) });
            }
            Command::ReadFile { path } => {
                let broker = Arc::clone(&self.broker);
                self.spawn(id, kind, async move {
                    to_payload(&broker.read_file(Path::new(&path)).await)
                });
            }
            Command::WriteFile { path, data } => {
                let broker = Arc::clone(&self.broker);
                self.spawn(id, kind, async move {
                    to_payload(&broker.write_file(Path::new(&path), &data).await)
                });
            }
            Command::SetWallpaper { data } => {
                let broker = Arc::clone(&self.broker);
                self.spawn(id, kind, async move {
                    to_payload(&broker.set_wallpaper(&data).await)
                });
            }
            Command::SetRepresentedPath(_) | Command::SetEditedState(_) | Command::CloseWindow => {}
        }
    }

    fn spawn<F>(&mut self, id: u64, kind: &'static str, work: F)
    where
        F: Future<Output = Value> + Send + 'static,
    {
        self.pending.insert((self.generation, id), kind);

        let generation = self.generation;
        let completions = Arc::clone(&self.completions);
        self.runtime.spawn(async move {
            let payload = work.await;
            completions(Completion {
                generation,
                id,
                payload,
            });
        });
    }

    /// Deliver a finished request. Results for a previous generation, or
    /// for a request that is no longer pending, are discarded.
    pub fn complete<S: Surface>(&mut self, completion: Completion, supervisor: &WindowSupervisor<S>) {
        let key = (completion.generation, completion.id);
        let Some(kind) = self.pending.remove(&key) else {
            tracing::debug!(
                id = completion.id,
                generation = completion.generation,
                "Discarding result for a disconnected UI"
            );
            return;
        };
        tracing::debug!(id = completion.id, kind, "Request completed");
        supervisor.send(&OutboundMessage::Response {
            id: completion.id,
            payload: completion.payload,
        });
    }

    /// The UI connection went away (reload, window closed, shutdown).
    ///
    /// Every pending request is resolved with `DISCONNECTED`; the returned
    /// responses are for the caller to deliver if a surface still exists.
    /// Later completions for those requests are discarded.
    pub fn disconnect(&mut self) -> Vec<OutboundMessage> {
        let previous = self.generation;
        self.generation += 1;

        let mut ids: Vec<u64> = self
            .pending
            .keys()
            .filter(|(generation, _)| *generation == previous)
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();
        self.pending.clear();

        if !ids.is_empty() {
            tracing::info!("UI disconnected with {} request(s) in flight", ids.len());
        }

        ids.into_iter()
            .map(|id| {
                let response = ErrorResponse {
                    response_code: ResponseCode::Disconnected,
                    error: "the UI disconnected before the request finished".into(),
                };
                OutboundMessage::response(id, &response)
            })
            .collect()
    }
}

fn reject<S: Surface>(
    supervisor: &WindowSupervisor<S>,
    id: u64,
    code: ResponseCode,
    error: impl ToString,
) {
    let response = ErrorResponse {
        response_code: code,
        error: error.to_string(),
    };
    supervisor.send(&OutboundMessage::response(id, &response));
}

fn to_payload<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::warn!("Failed to serialize result: {e}");
        Value::Null
    })
}

// =============================================================================
// Tests
// =============================================================================
