//! Commands the UI process may send and the responses it gets back.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bytes::ByteBuffer;
use crate::errors::ProtocolError;

// =============================================================================
// KINDS
// =============================================================================

pub const GET_ENVIRONMENT_INFO: &str = "get-environment-info";
pub const SET_REPRESENTED_PATH: &str = "set-represented-path";
pub const SET_EDITED_STATE: &str = "set-edited-state";
pub const CLOSE_WINDOW: &str = "close-window";
pub const SHOW_SAVE_DIALOG: &str = "show-save-dialog";
pub const SHOW_OPEN_DIALOG: &str = "show-open-dialog";
pub const WRITE_FILE: &str = "write-file";
pub const READ_FILE: &str = "read-file";
pub const SET_WALLPAPER: &str = "set-wallpaper";

/// Notifications the mediator pushes to the UI.
pub const CLOSE_WINDOW_PROMPT: &str = "close-window-prompt";
pub const OPEN_FILE: &str = "open-file";

/// Every kind the UI is allowed to send. Anything else is rejected.
pub const ALLOWED_KINDS: &[&str] = &[
    GET_ENVIRONMENT_INFO,
    SET_REPRESENTED_PATH,
    SET_EDITED_STATE,
    CLOSE_WINDOW,
    SHOW_SAVE_DIALOG,
    SHOW_OPEN_DIALOG,
    WRITE_FILE,
    READ_FILE,
    SET_WALLPAPER,
];

pub fn is_kind_allowed(kind: &str) -> bool {
    ALLOWED_KINDS.contains(&kind)
}

// =============================================================================
// RESPONSE CODES
// =============================================================================

/// Outcome of a broker operation, as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Success,
    AccessDenied,
    InvalidData,
    InvalidPngData,
    ReadFailed,
    WriteFailed,
    WriteTempFailed,
    SetWallpaperFailed,
    XfconfFailed,
    InvalidRequest,
    Disconnected,
}

// =============================================================================
// REQUEST PAYLOADS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveDialogOptions {
    pub title: Option<String>,
    pub default_path: Option<String>,
    pub default_file_name: Option<String>,
    pub filters: Vec<FileFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpenDialogOptions {
    pub title: Option<String>,
    pub default_path: Option<String>,
    pub filters: Vec<FileFilter>,
    /// `openFile`, `openDirectory`, `multiSelections`.
    pub properties: Vec<String>,
}

impl OpenDialogOptions {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }
}

/// A parsed request from the UI process.
///
/// Byte payloads stay as raw JSON here: deciding whether they are a byte
/// buffer is the broker's job, so that a wrong shape becomes an
/// `INVALID_DATA` response instead of a protocol error.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetEnvironmentInfo,
    SetRepresentedPath(String),
    SetEditedState(bool),
    CloseWindow,
    ShowSaveDialog(SaveDialogOptions),
    ShowOpenDialog(OpenDialogOptions),
    WriteFile { path: String, data: Value },
    ReadFile { path: String },
    SetWallpaper { data: Value },
}

impl Command {
    pub fn parse(kind: &str, payload: &Value) -> Result<Self, ProtocolError> {
        let invalid = |reason: &str| ProtocolError::InvalidPayload {
            kind: kind.to_string(),
            reason: reason.to_string(),
        };

        match kind {
            GET_ENVIRONMENT_INFO => Ok(Self::GetEnvironmentInfo),
            SET_REPRESENTED_PATH => payload
                .as_str()
                .map(|p| Self::SetRepresentedPath(p.to_string()))
                .ok_or_else(|| invalid("expected a path string")),
            SET_EDITED_STATE => payload
                .as_bool()
                .map(Self::SetEditedState)
                .ok_or_else(|| invalid("expected a boolean")),
            CLOSE_WINDOW => Ok(Self::CloseWindow),
            SHOW_SAVE_DIALOG => options_from(payload)
                .map(Self::ShowSaveDialog)
                .map_err(|e| invalid(&e)),
            SHOW_OPEN_DIALOG => options_from(payload)
                .map(Self::ShowOpenDialog)
                .map_err(|e| invalid(&e)),
            WRITE_FILE => {
                let path = path_field(payload).ok_or_else(|| invalid("missing path"))?;
                let data = payload.get("data").cloned().unwrap_or(Value::Null);
                Ok(Self::WriteFile { path, data })
            }
            READ_FILE => {
                let path = path_field(payload).ok_or_else(|| invalid("missing path"))?;
                Ok(Self::ReadFile { path })
            }
            SET_WALLPAPER => {
                let data = payload.get("data").cloned().unwrap_or(Value::Null);
                Ok(Self::SetWallpaper { data })
            }
            other => Err(ProtocolError::UnknownKind(other.to_string())),
        }
    }

    /// Whether the UI is waiting on a response for this command.
    pub fn expects_response(&self) -> bool {
        !matches!(
            self,
            Self::SetRepresentedPath(_) | Self::SetEditedState(_) | Self::CloseWindow
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetEnvironmentInfo => GET_ENVIRONMENT_INFO,
            Self::SetRepresentedPath(_) => SET_REPRESENTED_PATH,
            Self::SetEditedState(_) => SET_EDITED_STATE,
            Self::CloseWindow => CLOSE_WINDOW,
            Self::ShowSaveDialog(_) => SHOW_SAVE_DIALOG,
            Self::ShowOpenDialog(_) => SHOW_OPEN_DIALOG,
            Self::WriteFile { .. } => WRITE_FILE,
            Self::ReadFile { .. } => READ_FILE,
            Self::SetWallpaper { .. } => SET_WALLPAPER,
        }
    }
}

fn path_field(payload: &Value) -> Option<String> {
    payload.get("path")?.as_str().map(str::to_string)
}

fn options_from<T: DeserializeOwned + Default>(payload: &Value) -> Result<T, String> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload.clone()).map_err(|e| e.to_string())
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Response to `read-file`, `write-file` and `set-wallpaper`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub response_code: ResponseCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ByteBuffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl FileResponse {
    pub fn code(response_code: ResponseCode) -> Self {
        Self {
            response_code,
            error: None,
            data: None,
            file_name: None,
        }
    }

    pub fn success() -> Self {
        Self::code(ResponseCode::Success)
    }

    pub fn failed(response_code: ResponseCode, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::code(response_code)
        }
    }

    pub fn read(data: Vec<u8>, file_name: String) -> Self {
        Self {
            data: Some(ByteBuffer::new(data)),
            file_name: Some(file_name),
            ..Self::success()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDialogResponse {
    pub path: Option<PathBuf>,
    pub file_name: Option<String>,
    pub canceled: bool,
}

impl SaveDialogResponse {
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpenDialogResponse {
    pub paths: Vec<PathBuf>,
    pub canceled: bool,
}

/// Response to `get-environment-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    #[serde(rename = "isDev")]
    pub is_dev: bool,
    #[serde(rename = "isDesktopOS")]
    pub is_desktop_os: bool,
    /// Same value as `isDesktopOS`; the paint UI reads this name.
    #[serde(rename = "isMacOS")]
    pub is_mac_os: bool,
    #[serde(rename = "initialFilePath")]
    pub initial_file_path: Option<PathBuf>,
}

/// Response for requests that never reached a handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub response_code: ResponseCode,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_codes_use_wire_names() {
        let cases = [
            (ResponseCode::Success, "SUCCESS"),
            (ResponseCode::AccessDenied, "ACCESS_DENIED"),
            (ResponseCode::InvalidPngData, "INVALID_PNG_DATA"),
            (ResponseCode::WriteTempFailed, "WRITE_TEMP_FAILED"),
            (ResponseCode::XfconfFailed, "XFCONF_FAILED"),
            (ResponseCode::SetWallpaperFailed, "SET_WALLPAPER_FAILED"),
        ];
        for (code, name) in cases {
            assert_eq!(serde_json::to_value(code).unwrap(), json!(name));
        }
    }

    #[test]
    fn allowlist_is_case_sensitive_and_exact() {
        assert!(is_kind_allowed("read-file"));
        assert!(is_kind_allowed("set-wallpaper"));
        assert!(!is_kind_allowed("READ-FILE"));
        assert!(!is_kind_allowed("read-file "));
        assert!(!is_kind_allowed("exec"));
        // Outbound notifications are not requests.
        assert!(!is_kind_allowed(OPEN_FILE));
        assert!(!is_kind_allowed(CLOSE_WINDOW_PROMPT));
    }

    #[test]
    fn parse_write_file_keeps_raw_data() {
        let cmd = Command::parse(
            WRITE_FILE,
            &json!({ "path": "/tmp/a.png", "data": { "encoding": "utf8" } }),
        )
        .unwrap();
        match cmd {
            Command::WriteFile { path, data } => {
                assert_eq!(path, "/tmp/a.png");
                assert_eq!(data, json!({ "encoding": "utf8" }));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_write_file_without_data_yields_null() {
        let cmd = Command::parse(WRITE_FILE, &json!({ "path": "/tmp/a.png" })).unwrap();
        assert_eq!(
            cmd,
            Command::WriteFile {
                path: "/tmp/a.png".into(),
                data: Value::Null
            }
        );
    }

    #[test]
    fn parse_read_file_requires_path() {
        let err = Command::parse(READ_FILE, &json!({})).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { .. }));
        let err = Command::parse(READ_FILE, &json!({ "path": 12 })).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { .. }));
    }

    #[test]
    fn parse_dialog_options() {
        let cmd = Command::parse(
            SHOW_SAVE_DIALOG,
            &json!({
                "title": "Save As",
                "defaultFileName": "untitled.png",
                "filters": [{ "name": "PNG", "extensions": ["png"] }]
            }),
        )
        .unwrap();
        let Command::ShowSaveDialog(opts) = cmd else {
            panic!("expected save dialog");
        };
        assert_eq!(opts.title.as_deref(), Some("Save As"));
        assert_eq!(opts.default_file_name.as_deref(), Some("untitled.png"));
        assert_eq!(opts.filters[0].extensions, vec!["png".to_string()]);

        let cmd = Command::parse(SHOW_OPEN_DIALOG, &Value::Null).unwrap();
        assert_eq!(cmd, Command::ShowOpenDialog(OpenDialogOptions::default()));
    }

    #[test]
    fn parse_notifications() {
        assert_eq!(
            Command::parse(SET_EDITED_STATE, &json!(true)).unwrap(),
            Command::SetEditedState(true)
        );
        assert!(Command::parse(SET_EDITED_STATE, &json!("yes")).is_err());
        assert!(!Command::SetEditedState(true).expects_response());
        assert!(!Command::CloseWindow.expects_response());
        assert!(Command::GetEnvironmentInfo.expects_response());
    }

    #[test]
    fn parse_unknown_kind() {
        let err = Command::parse("eval", &Value::Null).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownKind(k) if k == "eval"));
    }

    #[test]
    fn file_response_omits_empty_fields() {
        let value = serde_json::to_value(FileResponse::code(ResponseCode::AccessDenied)).unwrap();
        assert_eq!(value, json!({ "responseCode": "ACCESS_DENIED" }));

        let value = serde_json::to_value(FileResponse::read(vec![1, 2, 3], "a.png".into())).unwrap();
        assert_eq!(
            value,
            json!({
                "responseCode": "SUCCESS",
                "data": { "$bytes": "AQID" },
                "fileName": "a.png"
            })
        );
    }

    #[test]
    fn environment_info_field_names() {
        let info = EnvironmentInfo {
            is_dev: true,
            is_desktop_os: false,
            is_mac_os: false,
            initial_file_path: None,
        };
        let value = serde_json::to_value(info).unwrap();
        assert_eq!(
            value,
            json!({
                "isDev": true,
                "isDesktopOS": false,
                "isMacOS": false,
                "initialFilePath": null
            })
        );
    }
}
