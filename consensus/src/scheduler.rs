//! Mining timer
//!
//! Holds at most one pending timer. Each new [`DPoSCommand`] replaces the
//! previous one; when the timer fires the node receives a
//! [`ScheduledMining`] trigger and builds the block for that behaviour.

use dpos_core::{Behaviour, DPoSCommand, MinerId};
use log::{debug, trace};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Trigger delivered when a scheduled slot arrives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledMining {
    pub public_key: MinerId,
    pub behaviour: Behaviour,
    /// Time the node has to produce the block
    pub timeout_milliseconds: u64,
}

pub struct MiningScheduler {
    public_key: MinerId,
    sender: mpsc::Sender<ScheduledMining>,
    pending: Option<JoinHandle<()>>,
}

impl MiningScheduler {
    pub fn new(public_key: MinerId) -> (Self, mpsc::Receiver<ScheduledMining>) {
        let (sender, receiver) = mpsc::channel(16);
        (
            Self {
                public_key,
                sender,
                pending: None,
            },
            receiver,
        )
    }

    /// Arm the timer for `command`, cancelling any pending one.
    ///
    /// Returns false when the command never fires.
    pub fn arm(&mut self, command: &DPoSCommand) -> bool {
        self.cancel();

        if command.is_infinite() {
            debug!("{} has no slot to wait for", self.public_key.short(10));
            return false;
        }

        let trigger = ScheduledMining {
            public_key: self.public_key.clone(),
            behaviour: command.behaviour,
            timeout_milliseconds: command.timeout_milliseconds,
        };
        let sender = self.sender.clone();
        let delay = Duration::from_millis(command.counting_milliseconds);

        debug!(
            "{} scheduled {} in {}ms",
            self.public_key.short(10),
            command.behaviour,
            command.counting_milliseconds
        );

        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            if sender.send(trigger).await.is_err() {
                trace!("mining trigger dropped, receiver closed");
            }
        }));
        true
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for MiningScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
