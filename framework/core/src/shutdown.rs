use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::{Receiver, Sender};

/// Broadcasts a request to stop the benchmark run, for example when the user presses Ctrl-C.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
        }
    }

    pub fn shutdown(&self) {
        if let Err(e) = self.sender.send(()) {
            // Nobody is waiting on a process right now, the run loop picks the signal up from its
            // own listener between iterations.
            log::warn!("Failed to send shutdown signal: {e:?}");
        }
    }

    /// Only signals sent after this call are seen by the new listener.
    pub fn new_listener(&self) -> DelegatedShutdownListener {
        DelegatedShutdownListener::new(self.sender.subscribe())
    }
}

#[derive(Debug)]
pub struct DelegatedShutdownListener {
    receiver: Receiver<()>,
    triggered: bool,
}

impl DelegatedShutdownListener {
    fn new(receiver: Receiver<()>) -> Self {
        Self {
            receiver,
            triggered: false,
        }
    }

    /// Point in time check for a shutdown signal. Once this returns true it keeps returning true.
    pub fn should_shutdown(&mut self) -> bool {
        if !self.triggered {
            self.triggered = match self.receiver.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) | Err(TryRecvError::Closed) => true,
                Err(TryRecvError::Empty) => false,
            };
        }
        self.triggered
    }

    /// Wait for the shutdown signal. Safe to race with other work so that the signal cancels it.
    pub async fn wait_for_shutdown(&mut self) {
        if self.triggered {
            return;
        }
        if let Err(e) = self.receiver.recv().await {
            log::debug!("Shutdown listener stopped waiting: {e}");
        }
        self.triggered = true;
    }
}

#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "Benchmark run cancelled by shutdown signal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_sees_signal_sent_after_subscribing() {
        let handle = ShutdownHandle::new();
        let mut listener = handle.new_listener();
        assert!(!listener.should_shutdown());

        handle.shutdown();

        assert!(listener.should_shutdown());
        assert!(listener.should_shutdown());
    }

    #[test]
    fn listener_ignores_signal_sent_before_subscribing() {
        let handle = ShutdownHandle::new();
        let _early = handle.new_listener();
        handle.shutdown();

        let mut late = handle.new_listener();
        assert!(!late.should_shutdown());
    }
}
