//! Top-level application state.
//!
//! Implements `winit::application::ApplicationHandler` to drive the main
//! event loop. Owns the Window Supervisor and the Command Dispatcher; every
//! background result reaches them as an [`AppEvent`] on this thread.

mod core;
mod dispatch;
mod event_handler;
mod init;
mod shutdown;
mod signals;
mod supervisor;
mod surface;
mod types;

pub use core::JsPaintApp;
pub use signals::spawn_signal_listener;
pub use types::{AppEvent, AppEventSender};
