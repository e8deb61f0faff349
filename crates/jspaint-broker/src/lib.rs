//! Filesystem access on behalf of the paint UI.
//!
//! The UI never touches the disk directly. Every read or write goes through
//! [`FileBroker`], which only honors paths recorded in the
//! [`CapabilityStore`]: paths given on the command line, paths the user
//! picked in a native dialog, and files the mediator writes itself.

mod broker;
mod capability;
mod dialogs;

pub use broker::{FileBroker, PNG_SIGNATURE};
pub use capability::CapabilityStore;
pub use dialogs::DialogProvider;
