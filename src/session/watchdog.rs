use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::events::SessionEvent;

enum WatchdogCommand {
    Rearm,
    Disarm,
}

/// Timer-driven idle detector with a single owned deadline.
///
/// At most one deadline is ever pending: rearming replaces it, disarming
/// clears it, and firing consumes it. The watchdog only *reports* the
/// timeout; the controller re-checks live playback before acting, since
/// audio still in flight is not inactivity.
pub struct InactivityWatchdog {
    commands: mpsc::Sender<WatchdogCommand>,
    task: JoinHandle<()>,
}

impl InactivityWatchdog {
    pub fn spawn(timeout: Duration, events: mpsc::Sender<SessionEvent>) -> Self {
        let (commands, mut rx) = mpsc::channel(16);

        let task = tokio::spawn(async move {
            let mut deadline: Option<Instant> = None;

            loop {
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(WatchdogCommand::Rearm) => {
                            deadline = Some(Instant::now() + timeout);
                        }
                        Some(WatchdogCommand::Disarm) => {
                            deadline = None;
                        }
                        None => break,
                    },
                    _ = wait_for(deadline) => {
                        deadline = None;
                        debug!("Inactivity deadline reached");
                        if events.send(SessionEvent::WatchdogFired).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { commands, task }
    }

    /// Replace the pending deadline with a fresh one.
    pub fn rearm(&self) {
        let _ = self.commands.try_send(WatchdogCommand::Rearm);
    }

    /// Clear the pending deadline.
    pub fn disarm(&self) {
        let _ = self.commands.try_send(WatchdogCommand::Disarm);
    }
}

impl Drop for InactivityWatchdog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
