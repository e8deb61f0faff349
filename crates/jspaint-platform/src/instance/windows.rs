use std::hash::{DefaultHasher, Hash, Hasher};
use std::io;
use std::path::Path;

use jspaint_common::InstanceError;
use tokio::net::windows::named_pipe::{
    ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions,
};

pub(super) type ServerStream = NamedPipeServer;
pub(super) type ClientStream = NamedPipeClient;

const ERROR_ACCESS_DENIED: i32 = 5;

/// On Windows the first pipe instance is the lock: as long as one server
/// instance exists under the name, `first_pipe_instance` fails for others.
#[derive(Debug)]
pub(super) struct InstanceLock;

pub(super) struct Endpoint {
    name: String,
    next: NamedPipeServer,
}

impl Endpoint {
    pub(super) async fn accept(&mut self) -> io::Result<ServerStream> {
        self.next.connect().await?;
        // Create the replacement before handing the connected instance off
        // so the name never goes unclaimed.
        let fresh = ServerOptions::new().create(&self.name)?;
        Ok(std::mem::replace(&mut self.next, fresh))
    }
}

fn pipe_name(dir: &Path, identity: &str) -> String {
    let mut hasher = DefaultHasher::new();
    dir.hash(&mut hasher);
    format!(r"\\.\pipe\{identity}-{:016x}", hasher.finish())
}

pub(super) fn try_claim(
    dir: &Path,
    identity: &str,
) -> Result<Option<(InstanceLock, Endpoint)>, InstanceError> {
    let name = pipe_name(dir, identity);
    match ServerOptions::new().first_pipe_instance(true).create(&name) {
        Ok(server) => Ok(Some((InstanceLock, Endpoint { name, next: server }))),
        Err(e) if e.raw_os_error() == Some(ERROR_ACCESS_DENIED) => Ok(None),
        Err(e) => Err(InstanceError::Lock(e)),
    }
}

pub(super) async fn connect(dir: &Path, identity: &str) -> io::Result<ClientStream> {
    ClientOptions::new().open(pipe_name(dir, identity))
}
