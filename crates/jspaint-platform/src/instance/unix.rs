use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use jspaint_common::InstanceError;
use tokio::net::{UnixListener, UnixStream};

pub(super) type ServerStream = UnixStream;
pub(super) type ClientStream = UnixStream;

/// Exclusive `flock` on `<dir>/<identity>.lock`. The kernel drops it when
/// the file is closed, including when the process dies.
#[derive(Debug)]
pub(super) struct InstanceLock {
    _file: File,
}

/// Listening side of the forwarding channel.
pub(super) struct Endpoint {
    listener: UnixListener,
}

impl Endpoint {
    pub(super) async fn accept(&mut self) -> io::Result<ServerStream> {
        self.listener.accept().await.map(|(stream, _)| stream)
    }
}

pub(super) fn lock_path(dir: &Path, identity: &str) -> PathBuf {
    dir.join(format!("{identity}.lock"))
}

pub(super) fn socket_path(dir: &Path, identity: &str) -> PathBuf {
    dir.join(format!("{identity}.sock"))
}

/// Try to become the primary. `Ok(None)` means another process holds the lock.
pub(super) fn try_claim(
    dir: &Path,
    identity: &str,
) -> Result<Option<(InstanceLock, Endpoint)>, InstanceError> {
    std::fs::create_dir_all(dir).map_err(InstanceError::Lock)?;

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(dir, identity))
        .map_err(InstanceError::Lock)?;

    // SAFETY: the descriptor stays valid for as long as `file` is alive.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock {
            return Ok(None);
        }
        return Err(InstanceError::Lock(err));
    }

    // Informational only.
    let _ = file.set_len(0);
    let _ = writeln!(file, "{}", std::process::id());

    // Anything at the socket path was left by a previous primary: we hold the lock.
    let socket = socket_path(dir, identity);
    match std::fs::remove_file(&socket) {
        Ok(()) => tracing::debug!("Removed stale socket {}", socket.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(InstanceError::Channel(e)),
    }
    let listener = UnixListener::bind(&socket).map_err(InstanceError::Channel)?;

    Ok(Some((InstanceLock { _file: file }, Endpoint { listener })))
}

pub(super) async fn connect(dir: &Path, identity: &str) -> io::Result<ClientStream> {
    UnixStream::connect(socket_path(dir, identity)).await
}
