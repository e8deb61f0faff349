//! `ApplicationHandler` implementation for the winit event loop.

use jspaint_common::ForwardedLaunch;
use jspaint_webview::navigation::is_app_url;
use jspaint_webview::{PageLoadState, WebViewEvent};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

use super::core::JsPaintApp;
use super::dispatch::Dispatched;
use super::supervisor::Activation;
use super::types::AppEvent;

impl ApplicationHandler<AppEvent> for JsPaintApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.supervisor.is_creating() && !self.quitting {
            self.create_surface(event_loop);
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                self.supervisor.on_close_requested();
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(surface) = self.supervisor.surface() {
                        surface.resize(size);
                    }
                }
            }

            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::SecondInstance { launch, taken } => {
                let accepted = self.handle_second_instance(event_loop, launch);
                // The receiver may have given up waiting.
                let _ = taken.send(accepted);
            }
            AppEvent::WebView(event) => self.handle_webview_event(event_loop, event),
            AppEvent::Completed(completion) => {
                self.dispatcher.complete(completion, &self.supervisor);
            }
            AppEvent::ForceQuit => self.force_quit(event_loop),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

impl JsPaintApp {
    /// A later launch forwarded its arguments: raise (or recreate) the
    /// editor and hand it the file, if any.
    ///
    /// Returns `false` when this process is on its way out; the launch is
    /// then left to the sender, which takes over once the lock is free.
    fn handle_second_instance(
        &mut self,
        event_loop: &ActiveEventLoop,
        launch: ForwardedLaunch,
    ) -> bool {
        if self.quitting {
            tracing::info!("Second launch while exiting, handing it back");
            return false;
        }
        if self.supervisor.forwarded_launch(launch) == Activation::Create {
            self.create_surface(event_loop);
        }
        !self.quitting
    }

    fn handle_webview_event(&mut self, event_loop: &ActiveEventLoop, event: WebViewEvent) {
        match event {
            WebViewEvent::Ipc { body } => {
                if self.dispatcher.handle(&body, &mut self.supervisor) == Dispatched::CloseConfirmed {
                    self.close_surface(event_loop);
                }
            }

            WebViewEvent::PageLoad { state, url } => {
                if !is_app_url(&url) {
                    return;
                }
                match state {
                    PageLoadState::Started => {
                        // Reload: the old page and its pending requests are gone.
                        let failed = self.dispatcher.disconnect();
                        if !failed.is_empty() {
                            tracing::info!("Page reloaded with {} request(s) pending", failed.len());
                        }
                        self.supervisor.ui_unloaded();
                    }
                    PageLoadState::Finished => {
                        tracing::debug!(url = %url, "UI loaded");
                        self.supervisor.ui_loaded();
                    }
                }
            }

            WebViewEvent::TitleChanged { title } => {
                if let Some(surface) = self.supervisor.surface() {
                    surface.set_title(&title);
                }
            }

            WebViewEvent::ExternalLink { url } => {
                tracing::debug!(url = %url, "Opened in system browser");
            }
        }
    }
}
