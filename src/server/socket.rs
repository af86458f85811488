//! Unix socket listener, one thread per connection.

use std::fs;
use std::io::{self, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{serve_connection, ServerError, ShutdownHandle};
use crate::mock::MockPackageService;

/// How often the accept loop checks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Socket server. The socket file is removed when the server is dropped.
pub struct SocketServer {
    listener: UnixListener,
    path: PathBuf,
    service: MockPackageService,
    shutdown: ShutdownHandle,
}

impl SocketServer {
    /// Bind `path`, replacing a stale socket file left by an earlier run.
    pub fn bind(path: impl AsRef<Path>, service: MockPackageService) -> Result<Self, ServerError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            debug!(path = %path.display(), "removing stale socket");
            fs::remove_file(&path)?;
        }
        let listener = UnixListener::bind(&path)?;
        listener.set_nonblocking(true)?;
        info!(path = %path.display(), api = %service.api(), "listening");
        Ok(Self {
            listener,
            path,
            service,
            shutdown: ShutdownHandle::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accept connections until shutdown is requested.
    pub fn run(&self) -> Result<(), ServerError> {
        let mut next_id: u64 = 0;
        while !self.shutdown.is_requested() {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    next_id += 1;
                    let service = self.service.clone();
                    let id = next_id;
                    thread::Builder::new()
                        .name(format!("conn-{}", id))
                        .spawn(move || handle_stream(id, &service, stream))?;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        info!(path = %self.path.display(), "shutting down");
        Ok(())
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove socket");
            }
        }
    }
}

fn handle_stream(id: u64, service: &MockPackageService, stream: UnixStream) {
    debug!(connection = id, "client connected");
    match serve_stream(service, stream) {
        Ok(answered) => debug!(connection = id, answered, "client disconnected"),
        Err(e) => warn!(connection = id, error = %e, "connection closed with error"),
    }
}

fn serve_stream(service: &MockPackageService, stream: UnixStream) -> Result<usize, ServerError> {
    stream.set_nonblocking(false)?;
    let reader = BufReader::new(stream.try_clone()?);
    serve_connection(service, reader, stream)
}
