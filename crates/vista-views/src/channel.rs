use std::cell::RefCell;
use tokio::sync::mpsc;

use crate::protocol::HostCommand;

/// Outbound channel to the host. Posting is fire-and-forget; delivery
/// failures are the host's problem, not the render path's.
pub trait HostChannel {
    fn post(&self, command: HostCommand);
}

/// Channel backed by a tokio unbounded sender. The host side owns the
/// receiver and forwards commands over its own transport.
pub struct MpscHostChannel {
    tx: mpsc::UnboundedSender<HostCommand>,
}

impl MpscHostChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl HostChannel for MpscHostChannel {
    fn post(&self, command: HostCommand) {
        if self.tx.send(command).is_err() {
            tracing::warn!("Dropped host command: channel closed");
        }
    }
}

/// Channel that records posted commands instead of sending them. Used in
/// tests and by embedders that want to inspect outbound traffic.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    commands: RefCell<Vec<HostCommand>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything posted so far.
    pub fn take(&self) -> Vec<HostCommand> {
        self.commands.take()
    }
}

impl HostChannel for RecordingChannel {
    fn post(&self, command: HostCommand) {
        self.commands.borrow_mut().push(command);
    }
}
