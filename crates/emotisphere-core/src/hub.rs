//! Single-writer broadcast hub.
//!
//! The [`Hub`] owns the registry of live subscribers and is the only
//! code that ever reads or mutates it. Everyone else talks to it through
//! a cloneable [`HubHandle`] that enqueues commands on one FIFO queue.
//! The control loop handles exactly one command per iteration, so
//! register, unregister, and publish requests are applied in arrival
//! order and no lock is needed.
//!
//! # Backpressure
//!
//! Fan-out never waits. Each subscriber has a bounded mailbox of
//! [`MAILBOX_CAPACITY`] envelopes; if a publish finds it full (or
//! already closed), the subscriber is dropped from the registry on the
//! spot, which closes the mailbox. A dropped subscriber is never retried.

use std::collections::HashMap;
use std::sync::Arc;

use emotisphere_types::{Envelope, SubscriberId};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of each subscriber's outbound mailbox.
pub const MAILBOX_CAPACITY: usize = 256;

/// Capacity of the hub's command queue.
///
/// Publishes that find the queue full are dropped rather than awaited.
const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Receiving end of a subscriber mailbox, drained by the connection's writer.
pub type Mailbox = mpsc::Receiver<Arc<Envelope>>;

/// The hub-side half of one subscriber: its id and the mailbox sender.
///
/// The sender is never cloned, so dropping it (which the hub does on
/// unregister or overflow) is what closes the mailbox.
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    outbox: mpsc::Sender<Arc<Envelope>>,
}

impl Subscriber {
    /// Create a subscriber with a [`MAILBOX_CAPACITY`] mailbox.
    pub fn new() -> (Self, Mailbox) {
        Self::with_capacity(MAILBOX_CAPACITY)
    }

    /// Create a subscriber with a custom mailbox capacity.
    pub fn with_capacity(capacity: usize) -> (Self, Mailbox) {
        let (outbox, mailbox) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: SubscriberId::new(),
                outbox,
            },
            mailbox,
        )
    }

    /// This subscriber's identity.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Enqueue an envelope without waiting.
    ///
    /// Returns `false` if the mailbox is full or closed.
    pub fn try_deliver(&self, envelope: Arc<Envelope>) -> bool {
        match self.outbox.try_send(envelope) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(subscriber = %self.id, "mailbox full");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscriber = %self.id, "mailbox closed");
                false
            }
        }
    }
}

/// Why a publish did not reach the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// The command queue is saturated; the envelope was dropped.
    #[error("hub command queue is full, envelope dropped")]
    Full,
    /// The hub's control loop has exited.
    #[error("hub has shut down")]
    Closed,
}

#[derive(Debug)]
enum Command {
    Register(Subscriber),
    Unregister(SubscriberId),
    Publish(Arc<Envelope>),
    Count(oneshot::Sender<usize>),
}

/// Cloneable handle for talking to the hub's control loop.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
}

impl HubHandle {
    /// Add a subscriber to the registry.
    ///
    /// Returns `false` (and drops the subscriber, closing its mailbox) if
    /// the hub has shut down.
    pub async fn register(&self, subscriber: Subscriber) -> bool {
        let id = subscriber.id;
        if self.commands.send(Command::Register(subscriber)).await.is_err() {
            debug!(subscriber = %id, "hub is gone, register ignored");
            return false;
        }
        true
    }

    /// Remove a subscriber and close its mailbox.
    ///
    /// Unknown ids are ignored, as is a hub that has already shut down.
    pub async fn unregister(&self, id: SubscriberId) {
        if self.commands.send(Command::Unregister(id)).await.is_err() {
            debug!(subscriber = %id, "hub is gone, unregister ignored");
        }
    }

    /// Queue an envelope for fan-out to every registered subscriber.
    ///
    /// Never waits: if the command queue is saturated the envelope is
    /// dropped and [`PublishError::Full`] is returned.
    pub fn publish(&self, envelope: Envelope) -> Result<(), PublishError> {
        self.commands
            .try_send(Command::Publish(Arc::new(envelope)))
            .map_err(|e| match e {
                TrySendError::Full(_) => PublishError::Full,
                TrySendError::Closed(_) => PublishError::Closed,
            })
    }

    /// Number of registered subscribers, as seen by the control loop after
    /// every command queued before this call has been handled.
    ///
    /// Returns `0` if the hub has shut down.
    pub async fn subscriber_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Count(tx)).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

/// The broadcast hub. Construct with [`Hub::new`] and drive with [`Hub::run`],
/// or use [`Hub::spawn`] to do both.
#[derive(Debug)]
pub struct Hub {
    commands: mpsc::Receiver<Command>,
    registry: HashMap<SubscriberId, Subscriber>,
}

impl Hub {
    /// Create a hub and the handle used to reach it.
    pub fn new() -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        (
            Self {
                commands: rx,
                registry: HashMap::new(),
            },
            HubHandle { commands: tx },
        )
    }

    /// Create a hub and run its control loop on a background task.
    pub fn spawn() -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new();
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Run the control loop until every [`HubHandle`] has been dropped.
    pub async fn run(mut self) {
        info!("broadcast hub running");
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        info!(subscribers = self.registry.len(), "broadcast hub stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Register(subscriber) => {
                self.registry.insert(subscriber.id, subscriber);
                info!(subscribers = self.registry.len(), "subscriber connected");
            }
            Command::Unregister(id) => {
                // Dropping the subscriber drops its only sender.
                if self.registry.remove(&id).is_some() {
                    info!(subscribers = self.registry.len(), "subscriber disconnected");
                }
            }
            Command::Publish(envelope) => self.fan_out(&envelope),
            Command::Count(reply) => {
                let _ = reply.send(self.registry.len());
            }
        }
    }

    fn fan_out(&mut self, envelope: &Arc<Envelope>) {
        let before = self.registry.len();
        self.registry
            .retain(|_, subscriber| subscriber.try_deliver(Arc::clone(envelope)));

        let dropped = before.saturating_sub(self.registry.len());
        if dropped > 0 {
            warn!(
                dropped,
                subscribers = self.registry.len(),
                kind = envelope.kind(),
                "dropped slow or closed subscribers"
            );
        } else {
            debug!(subscribers = before, kind = envelope.kind(), "envelope delivered");
        }
    }
}
