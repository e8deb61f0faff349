//! Launch requests and the message a secondary launch forwards to the
//! running instance.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::InstanceError;

/// Version of the [`ForwardedLaunch`] wire format.
pub const FORWARD_PROTOCOL_VERSION: u32 = 1;

/// What one OS-level launch asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Absolute path of the file to open, already resolved against `cwd`.
    pub file_path: Option<PathBuf>,
    pub cwd: PathBuf,
}

impl LaunchRequest {
    /// Build a request from a raw (possibly relative) path argument.
    pub fn new(file_arg: Option<&str>, cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let file_path = file_arg
            .filter(|arg| !arg.is_empty())
            .map(|arg| resolve_launch_path(&cwd, arg));
        Self { file_path, cwd }
    }
}

/// Message sent from a secondary launch to the primary instance.
///
/// The argument list is carried verbatim and in order as an explicit field.
/// It is always present on the wire: a launch with no arguments sends
/// `"args": []`, which is a different message from "nothing was forwarded".
/// A payload without `args` (or with `"args": null`) fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedLaunch {
    pub version: u32,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl ForwardedLaunch {
    pub fn new(args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            version: FORWARD_PROTOCOL_VERSION,
            args,
            cwd: cwd.into(),
        }
    }

    /// Encode as a single newline-terminated JSON line.
    pub fn to_line(&self) -> Result<String, InstanceError> {
        let mut line =
            serde_json::to_string(self).map_err(|e| InstanceError::Malformed(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }

    /// Decode one JSON line, rejecting unknown protocol versions.
    pub fn from_line(line: &str) -> Result<Self, InstanceError> {
        let msg: Self = serde_json::from_str(line.trim_end())
            .map_err(|e| InstanceError::Malformed(e.to_string()))?;
        if msg.version != FORWARD_PROTOCOL_VERSION {
            return Err(InstanceError::UnsupportedVersion(msg.version));
        }
        Ok(msg)
    }
}

/// Resolve a command-line path argument against the launch's working
/// directory and normalize `.` / `..` lexically.
///
/// The file does not have to exist: a launch may name a file that is about
/// to be created by a save.
pub fn resolve_launch_path(cwd: &Path, arg: &str) -> PathBuf {
    let joined = cwd.join(arg);
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root, matching `/..` == `/`.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_launch_round_trips_with_empty_args() {
        let msg = ForwardedLaunch::new(Vec::new(), "/home/user");
        let line = msg.to_line().unwrap();
        assert!(line.ends_with('\n'));
        assert!(line.contains("\"args\":[]"));

        let decoded = ForwardedLaunch::from_line(&line).unwrap();
        assert_eq!(decoded, msg);
        assert!(decoded.args.is_empty());
    }

    #[test]
    fn forwarded_launch_preserves_argument_order() {
        let args = vec!["b.png".to_string(), "--x".to_string(), "a.png".to_string()];
        let msg = ForwardedLaunch::new(args.clone(), "/tmp");
        let decoded = ForwardedLaunch::from_line(&msg.to_line().unwrap()).unwrap();
        assert_eq!(decoded.args, args);
    }

    #[test]
    fn missing_or_null_args_is_rejected() {
        let missing = r#"{"version":1,"cwd":"/tmp"}"#;
        assert!(matches!(
            ForwardedLaunch::from_line(missing),
            Err(InstanceError::Malformed(_))
        ));

        let null = r#"{"version":1,"args":null,"cwd":"/tmp"}"#;
        assert!(matches!(
            ForwardedLaunch::from_line(null),
            Err(InstanceError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let line = r#"{"version":2,"args":[],"cwd":"/tmp"}"#;
        assert!(matches!(
            ForwardedLaunch::from_line(line),
            Err(InstanceError::UnsupportedVersion(2))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_relative_path_against_cwd() {
        let p = resolve_launch_path(Path::new("/home/user/pics"), "photo.png");
        assert_eq!(p, PathBuf::from("/home/user/pics/photo.png"));

        let p = resolve_launch_path(Path::new("/home/user/pics"), "../docs/./scan.png");
        assert_eq!(p, PathBuf::from("/home/user/docs/scan.png"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_absolute_path_ignores_cwd() {
        let p = resolve_launch_path(Path::new("/home/user"), "/tmp/a/../b.png");
        assert_eq!(p, PathBuf::from("/tmp/b.png"));
    }

    #[cfg(unix)]
    #[test]
    fn launch_request_ignores_empty_argument() {
        let req = LaunchRequest::new(Some(""), "/tmp");
        assert!(req.file_path.is_none());

        let req = LaunchRequest::new(Some("x.png"), "/tmp");
        assert_eq!(req.file_path, Some(PathBuf::from("/tmp/x.png")));
    }
}
