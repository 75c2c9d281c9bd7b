//! Ctrl-C cancellation for network calls.
//!
//! The first interrupt marks the token cancelled, so no further request is
//! sent. If a request is in flight at that moment the process exits with
//! status 130 instead of waiting for the response.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::DeployError;

#[derive(Debug, Default)]
struct State {
    cancelled: AtomicBool,
    in_flight: AtomicUsize,
}

/// Shared cancellation flag, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<State>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with `Cancelled` once the token has been triggered.
    pub fn check(&self, operation: &str) -> Result<(), DeployError> {
        if self.is_cancelled() {
            return Err(DeployError::Cancelled(format!("{} was not sent", operation)));
        }
        Ok(())
    }

    /// Mark a request as in flight until the guard drops.
    pub fn in_flight(&self) -> InFlight {
        self.state.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight {
            state: Arc::clone(&self.state),
        }
    }

    fn has_in_flight(&self) -> bool {
        self.state.in_flight.load(Ordering::SeqCst) > 0
    }
}

pub struct InFlight {
    state: Arc<State>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Route SIGINT to `token`.
pub fn install_handler(token: &CancelToken) -> Result<()> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        debug!("interrupt received");
        token.cancel();
        if token.has_in_flight() {
            crate::output::error("request cancelled: interrupted");
            std::process::exit(130);
        }
    })
    .context("Failed to install Ctrl-C handler")
}
