//! Single-instance coordination.
//!
//! Every launch contends for one per-user lock. The winner becomes the
//! primary and listens on a local channel; every later launch forwards its
//! argument list and working directory to the primary, waits for an
//! acknowledgement, and exits.
//!
//! The channel is a Unix domain socket next to the lock file, or a named
//! pipe on Windows. Messages are single JSON lines in both directions.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as sys;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as sys;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use jspaint_common::{ForwardedLaunch, InstanceError};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;

/// Upper bound on one forwarded message.
const MAX_LINE_BYTES: u64 = 64 * 1024;

/// Reply the primary sends once it has taken a forwarded launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ForwardAck {
    ok: bool,
    /// Set when the launch was valid but not delivered; try again.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    retry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ForwardAck {
    fn accepted() -> Self {
        Self {
            ok: true,
            retry: false,
            error: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            retry: false,
            error: Some(reason.into()),
        }
    }

    fn undelivered() -> Self {
        Self {
            ok: false,
            retry: true,
            error: Some("instance is shutting down".into()),
        }
    }

    fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| r#"{"ok":false}"#.into());
        line.push('\n');
        line
    }
}

/// Outcome of [`InstanceCoordinator::acquire`].
pub enum Acquired {
    /// This process holds the lock and must run the UI.
    Primary(PrimaryInstance),
    /// The launch was delivered to the running primary; this process should exit.
    Secondary,
}

impl std::fmt::Debug for Acquired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary(_) => f.write_str("Primary"),
            Self::Secondary => f.write_str("Secondary"),
        }
    }
}

/// Decides whether this launch is the primary instance.
#[derive(Debug, Clone)]
pub struct InstanceCoordinator {
    identity: String,
    dir: PathBuf,
    attempts: u32,
    retry_delay: Duration,
    ack_timeout: Duration,
}

impl InstanceCoordinator {
    /// `dir` holds the lock file (and the socket on Unix).
    pub fn new(identity: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            identity: identity.into(),
            dir: dir.into(),
            attempts: 10,
            retry_delay: Duration::from_millis(200),
            ack_timeout: Duration::from_secs(3),
        }
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Become the primary, or forward `launch` to the one already running.
    ///
    /// A secondary that cannot reach the primary (it may still be binding its
    /// channel, or it may have just exited) tries to take the lock again
    /// before each retry. A primary that is shutting down answers "not
    /// delivered" and is retried the same way. Once the attempts run out the launch fails with
    /// [`InstanceError::ForwardExhausted`]. Lock errors other than
    /// "already held" and an explicit rejection from the primary are fatal
    /// immediately.
    pub async fn acquire(&self, launch: &ForwardedLaunch) -> Result<Acquired, InstanceError> {
        let line = launch.to_line()?;

        for attempt in 1..=self.attempts {
            if let Some((lock, endpoint)) = sys::try_claim(&self.dir, &self.identity)? {
                tracing::info!("Acquired instance lock '{}'", self.identity);
                return Ok(Acquired::Primary(PrimaryInstance {
                    _lock: lock,
                    endpoint: Some(endpoint),
                    receiver: None,
                }));
            }

            match self.forward_once(&line).await {
                Ok(()) => {
                    tracing::info!("Forwarded launch to running instance");
                    return Ok(Acquired::Secondary);
                }
                Err(e @ (InstanceError::Channel(_) | InstanceError::Unavailable(_))) => {
                    tracing::debug!(
                        "Running instance did not take the launch (attempt {attempt}/{}): {e}",
                        self.attempts
                    );
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(InstanceError::ForwardExhausted {
            attempts: self.attempts,
        })
    }

    async fn forward_once(&self, line: &str) -> Result<(), InstanceError> {
        let exchange = async {
            let stream = sys::connect(&self.dir, &self.identity)
                .await
                .map_err(InstanceError::Channel)?;
            send_launch(stream, line).await
        };

        match tokio::time::timeout(self.ack_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(InstanceError::Channel(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no acknowledgement within {:?}", self.ack_timeout),
            ))),
        }
    }
}

/// Delivers one forwarded launch. Resolves to `true` once the launch has
/// been taken; `false` makes the secondary retry.
type ForwardHandler = dyn Fn(ForwardedLaunch) -> BoxFuture<'static, bool> + Send + Sync;

/// Held by the primary for the life of the process. Dropping it releases
/// the lock and stops the receiver.
pub struct PrimaryInstance {
    _lock: sys::InstanceLock,
    endpoint: Option<sys::Endpoint>,
    receiver: Option<JoinHandle<()>>,
}

impl PrimaryInstance {
    /// Start accepting forwarded launches on the current tokio runtime.
    ///
    /// `on_forward` runs once per launch; the secondary is acknowledged
    /// with its answer. Calling this twice has no effect.
    pub fn spawn_receiver<F>(&mut self, on_forward: F)
    where
        F: Fn(ForwardedLaunch) -> BoxFuture<'static, bool> + Send + Sync + 'static,
    {
        let Some(endpoint) = self.endpoint.take() else {
            tracing::warn!("Forwarding receiver already running");
            return;
        };
        let handler: Arc<ForwardHandler> = Arc::new(on_forward);
        self.receiver = Some(tokio::spawn(receive_loop(endpoint, handler)));
    }
}

impl Drop for PrimaryInstance {
    fn drop(&mut self) {
        if let Some(handle) = self.receiver.take() {
            handle.abort();
        }
    }
}

async fn receive_loop(mut endpoint: sys::Endpoint, on_forward: Arc<ForwardHandler>) {
    loop {
        match endpoint.accept().await {
            Ok(stream) => {
                let on_forward = Arc::clone(&on_forward);
                tokio::spawn(async move {
                    if let Err(e) = receive_launch(stream, on_forward.as_ref()).await {
                        tracing::warn!("Forwarded launch rejected: {e}");
                    }
                });
            }
            Err(e) => {
                tracing::warn!("Forwarding channel accept failed: {e}");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

/// Primary side of one connection: read one launch, deliver it, acknowledge.
async fn receive_launch<S>(stream: S, on_forward: &ForwardHandler) -> Result<(), InstanceError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read, mut write) = tokio::io::split(stream);
    let mut reader = BufReader::new(read.take(MAX_LINE_BYTES));
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .await
        .map_err(InstanceError::Channel)?;

    let (ack, result) = match ForwardedLaunch::from_line(&line) {
        Ok(launch) => {
            tracing::debug!("Received forwarded launch with {} argument(s)", launch.args.len());
            if on_forward(launch).await {
                (ForwardAck::accepted(), Ok(()))
            } else {
                tracing::info!("Forwarded launch not delivered; asking the sender to retry");
                (ForwardAck::undelivered(), Ok(()))
            }
        }
        Err(e) => (ForwardAck::rejected(e.to_string()), Err(e)),
    };

    write
        .write_all(ack.to_line().as_bytes())
        .await
        .map_err(InstanceError::Channel)?;
    write.flush().await.map_err(InstanceError::Channel)?;
    result
}

/// Secondary side of one connection: send the launch, wait for the reply.
async fn send_launch<S>(stream: S, line: &str) -> Result<(), InstanceError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read, mut write) = tokio::io::split(stream);
    write
        .write_all(line.as_bytes())
        .await
        .map_err(InstanceError::Channel)?;
    write.flush().await.map_err(InstanceError::Channel)?;

    let mut reader = BufReader::new(read.take(MAX_LINE_BYTES));
    let mut reply = String::new();
    let n = reader
        .read_line(&mut reply)
        .await
        .map_err(InstanceError::Channel)?;
    if n == 0 {
        return Err(InstanceError::Channel(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "channel closed before acknowledgement",
        )));
    }

    let ack: ForwardAck = serde_json::from_str(reply.trim_end())
        .map_err(|e| InstanceError::Malformed(format!("acknowledgement: {e}")))?;
    if ack.ok {
        return Ok(());
    }
    let reason = ack.error.unwrap_or_else(|| "no reason given".into());
    if ack.retry {
        Err(InstanceError::Unavailable(reason))
    } else {
        Err(InstanceError::Rejected(reason))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use tokio::sync::mpsc;

    fn coordinator(dir: &std::path::Path) -> InstanceCoordinator {
        InstanceCoordinator::new("test", dir)
            .with_retry(3, Duration::from_millis(20))
            .with_ack_timeout(Duration::from_millis(500))
    }

    fn primary(acquired: Acquired) -> PrimaryInstance {
        match acquired {
            Acquired::Primary(p) => p,
            Acquired::Secondary => panic!("expected primary"),
        }
    }

    #[tokio::test]
    async fn first_launch_is_primary_and_second_forwards() {
        let dir = tempfile::tempdir().unwrap();
        let coord = coordinator(dir.path());

        let first = ForwardedLaunch::new(vec![], "/tmp");
        let mut p = primary(coord.acquire(&first).await.unwrap());

        let (tx, mut rx) = mpsc::unbounded_channel();
        p.spawn_receiver(move |launch| {
            let _ = tx.send(launch);
            async { true }.boxed()
        });

        let second = ForwardedLaunch::new(vec!["pic.png".into()], "/home/user");
        let acquired = coord.acquire(&second).await.unwrap();
        assert!(matches!(acquired, Acquired::Secondary));

        let received = rx.recv().await.unwrap();
        assert_eq!(received, second);
    }

    #[tokio::test]
    async fn empty_argument_list_is_delivered_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let coord = coordinator(dir.path());
        let mut p = primary(
            coord
                .acquire(&ForwardedLaunch::new(vec![], "/"))
                .await
                .unwrap(),
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        p.spawn_receiver(move |launch| {
            let _ = tx.send(launch);
            async { true }.boxed()
        });

        let acquired = coord
            .acquire(&ForwardedLaunch::new(vec![], "/work"))
            .await
            .unwrap();
        assert!(matches!(acquired, Acquired::Secondary));

        let received = rx.recv().await.unwrap();
        assert!(received.args.is_empty());
        assert_eq!(received.cwd, PathBuf::from("/work"));
    }

    #[tokio::test]
    async fn unresponsive_primary_exhausts_retries() {
        let dir = tempfile::tempdir().unwrap();
        let coord = InstanceCoordinator::new("test", dir.path())
            .with_retry(2, Duration::from_millis(10))
            .with_ack_timeout(Duration::from_millis(50));

        // Holds the lock and the socket but never accepts.
        let _p = primary(
            coord
                .acquire(&ForwardedLaunch::new(vec![], "/"))
                .await
                .unwrap(),
        );

        let err = coord
            .acquire(&ForwardedLaunch::new(vec!["x.png".into()], "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, InstanceError::ForwardExhausted { attempts: 2 }));
    }

    #[tokio::test]
    async fn lock_is_released_when_primary_drops() {
        let dir = tempfile::tempdir().unwrap();
        let coord = coordinator(dir.path());
        let launch = ForwardedLaunch::new(vec![], "/");

        let p = primary(coord.acquire(&launch).await.unwrap());
        drop(p);

        // The stale socket from the first primary is replaced.
        let again = coord.acquire(&launch).await.unwrap();
        assert!(matches!(again, Acquired::Primary(_)));
        assert!(unix::socket_path(dir.path(), "test").exists());
    }

    #[tokio::test]
    async fn unusable_lock_location_is_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot be used as the lock directory.
        let coord = coordinator(file.path());
        let err = coord
            .acquire(&ForwardedLaunch::new(vec![], "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, InstanceError::Lock(_)));
    }

    #[tokio::test]
    async fn malformed_forward_is_rejected_without_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let coord = coordinator(dir.path());
        let mut p = primary(
            coord
                .acquire(&ForwardedLaunch::new(vec![], "/"))
                .await
                .unwrap(),
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        p.spawn_receiver(move |launch| {
            let _ = tx.send(launch);
            async { true }.boxed()
        });

        let stream = tokio::net::UnixStream::connect(unix::socket_path(dir.path(), "test"))
            .await
            .unwrap();
        let err = send_launch(stream, "{\"version\":1,\"cwd\":\"/\"}\n")
            .await
            .unwrap_err();
        assert!(matches!(err, InstanceError::Rejected(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn undelivered_launch_is_retried_until_primary_exits() {
        let dir = tempfile::tempdir().unwrap();
        let coord = InstanceCoordinator::new("test", dir.path())
            .with_retry(20, Duration::from_millis(20))
            .with_ack_timeout(Duration::from_millis(500));
        let mut p = primary(
            coord
                .acquire(&ForwardedLaunch::new(vec![], "/"))
                .await
                .unwrap(),
        );

        // A primary whose event loop is gone cannot take the launch.
        let (tx, mut rx) = mpsc::unbounded_channel();
        p.spawn_receiver(move |launch| {
            let _ = tx.send(launch);
            async { false }.boxed()
        });

        let second = ForwardedLaunch::new(vec!["photo.png".into()], "/work");
        let contender = {
            let coord = coord.clone();
            let second = second.clone();
            tokio::spawn(async move { coord.acquire(&second).await })
        };

        // The first attempt reached the primary and was refused.
        assert_eq!(rx.recv().await.unwrap(), second);
        drop(p);

        let acquired = contender.await.unwrap().unwrap();
        assert!(matches!(acquired, Acquired::Primary(_)));
    }

    #[tokio::test]
    async fn undelivered_launch_exhausts_while_primary_lingers() {
        let dir = tempfile::tempdir().unwrap();
        let coord = coordinator(dir.path());
        let mut p = primary(
            coord
                .acquire(&ForwardedLaunch::new(vec![], "/"))
                .await
                .unwrap(),
        );
        p.spawn_receiver(|_| async { false }.boxed());

        let err = coord
            .acquire(&ForwardedLaunch::new(vec!["x.png".into()], "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, InstanceError::ForwardExhausted { attempts: 3 }));
    }

    #[test]
    fn ack_lines_are_single_json_lines() {
        let line = ForwardAck::accepted().to_line();
        assert_eq!(line, "{\"ok\":true}\n");

        let line = ForwardAck::rejected("bad").to_line();
        let ack: ForwardAck = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(ack, ForwardAck::rejected("bad"));
        assert!(!line.contains("retry"));

        let line = ForwardAck::undelivered().to_line();
        let ack: ForwardAck = serde_json::from_str(line.trim_end()).unwrap();
        assert!(!ack.ok && ack.retry);
    }
}
