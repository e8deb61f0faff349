//! Events delivered to the winit event loop.

use std::sync::{Arc, Mutex};

use jspaint_common::ForwardedLaunch;
use jspaint_webview::{EventSink, WebViewEvent};
use serde_json::Value;
use tokio::sync::oneshot;
use winit::event_loop::EventLoopProxy;

/// User events for `EventLoop<AppEvent>`.
#[derive(Debug)]
pub enum AppEvent {
    /// A later launch forwarded its arguments. `taken` answers whether the
    /// launch was accepted; the sender retries on `false`.
    SecondInstance {
        launch: ForwardedLaunch,
        taken: oneshot::Sender<bool>,
    },
    WebView(WebViewEvent),
    /// A request finished on the runtime.
    Completed(Completion),
    /// SIGTERM, Ctrl+C or session end: close without asking the UI.
    ForceQuit,
}

/// Result of one in-flight request.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Connection the request arrived on.
    pub generation: u64,
    pub id: u64,
    pub payload: Value,
}

/// Thread-safe sender into the event loop.
#[derive(Clone)]
pub struct AppEventSender {
    proxy: Arc<Mutex<EventLoopProxy<AppEvent>>>,
}

impl AppEventSender {
    pub fn new(proxy: EventLoopProxy<AppEvent>) -> Self {
        Self {
            proxy: Arc::new(Mutex::new(proxy)),
        }
    }

    /// Returns `false` once the event loop has exited.
    pub fn send(&self, event: AppEvent) -> bool {
        let Ok(proxy) = self.proxy.lock() else {
            return false;
        };
        proxy.send_event(event).is_ok()
    }

    /// Sink for WebView callbacks.
    pub fn webview_sink(&self) -> EventSink {
        let sender = self.clone();
        Arc::new(move |event: WebViewEvent| {
            sender.send(AppEvent::WebView(event));
        })
    }

    /// Sink for finished requests.
    pub fn completion_sink(&self) -> CompletionSink {
        let sender = self.clone();
        Arc::new(move |completion: Completion| {
            if !sender.send(AppEvent::Completed(completion)) {
                tracing::debug!("Event loop gone, dropping completion");
            }
        })
    }
}

pub type CompletionSink = Arc<dyn Fn(Completion) + Send + Sync>;
