//! Signal handling for the socket server (SIGINT/SIGTERM)
//!
//! On the first signal the accept loop is asked to stop; the server then
//! removes its socket file and returns. A second signal exits at once.

use std::process;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::server::ShutdownHandle;

/// Exit code after a second interrupt.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// What to do for a received signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: stop accepting connections
    StopServer,
    /// Second signal: exit without cleanup
    ImmediateExit,
}

/// Signal counter shared with the handler
#[derive(Debug, Default)]
pub struct SignalState {
    signal_count: AtomicU8,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Count a signal and decide the action.
    pub fn handle_signal(&self) -> SignalAction {
        let previous = self
            .signal_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_add(1)))
            .unwrap_or(u8::MAX);
        if previous == 0 {
            SignalAction::StopServer
        } else {
            SignalAction::ImmediateExit
        }
    }
}

/// Install the Ctrl-C handler. Must be called once at program startup.
pub fn install(shutdown: ShutdownHandle) -> Result<Arc<SignalState>, ctrlc::Error> {
    let state = Arc::new(SignalState::new());
    let handler_state = Arc::clone(&state);
    ctrlc::set_handler(move || match handler_state.handle_signal() {
        SignalAction::StopServer => {
            warn!("received interrupt, shutting down");
            shutdown.request();
        }
        SignalAction::ImmediateExit => {
            warn!("received second interrupt, exiting immediately");
            process::exit(EXIT_CODE_INTERRUPTED);
        }
    })?;
    Ok(state)
}
