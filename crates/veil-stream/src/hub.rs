//! The event hub: a single task that owns the registry of connected clients
//! and is the only writer onto their delivery channels.
//!
//! Producers reach the hub only through a `HubHandle`. Commands are handled
//! one at a time in arrival order, so the registry needs no locks and two
//! messages submitted in order by one producer are delivered in that order.
//!
//! With a listener installed, a new client starts out syncing: messages for
//! it are held in the registry until the listener has built its initial
//! snapshot, which is delivered first and followed by the held messages.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use veil_core::model::Player;
use veil_core::viewer::Viewer;

use crate::client::{CLIENT_BUFFER, ClientInfo, ConnectedClient};
use crate::handle::HubHandle;
use crate::listener::ConnectionListener;
use crate::messages::Message;

/// Capacity of the hub's inbox.
const INBOX_CAPACITY: usize = 1024;

/// Messages held for a syncing client. One slot of the delivery channel is
/// left for the snapshot itself.
const HELD_LIMIT: usize = CLIENT_BUFFER - 1;

/// Requests submitted to the hub loop.
#[derive(Debug)]
pub(crate) enum HubCommand {
    Connect(ConnectedClient),
    Disconnect {
        viewer: Viewer,
        connection_id: Uuid,
    },
    Send {
        recipient: Viewer,
        message: Message,
    },
    Clients {
        reply: oneshot::Sender<Vec<ClientInfo>>,
    },
    /// The listener finished building a client's initial snapshot.
    /// `None` when it failed.
    Synced {
        viewer: Viewer,
        connection_id: Uuid,
        snapshot: Option<Message>,
    },
}

/// Why a client left the registry.
#[derive(Debug, Clone, Copy)]
enum Departure {
    Closed,
    Lagging,
    Gone,
    SnapshotFailed,
}

impl Departure {
    fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Lagging => "lagging",
            Self::Gone => "receiver dropped",
            Self::SnapshotFailed => "initial snapshot failed",
        }
    }
}

/// The hub actor. Build with [`EventHub::new`], then [`EventHub::spawn`].
pub struct EventHub {
    inbox: mpsc::Receiver<HubCommand>,
    /// Lets snapshot tasks report back without keeping the loop alive.
    commands: mpsc::WeakSender<HubCommand>,
    clients: HashMap<Viewer, ConnectedClient>,
    listener: Option<Arc<dyn ConnectionListener>>,
}

impl EventHub {
    /// Creates a hub and the handle producers use to reach it.
    #[must_use]
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, HubHandle) {
        let (commands, inbox) = mpsc::channel(INBOX_CAPACITY);
        let hub = Self {
            inbox,
            commands: commands.downgrade(),
            clients: HashMap::new(),
            listener: None,
        };
        (hub, HubHandle { commands })
    }

    /// Installs the callbacks run when clients are added or removed.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ConnectionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Runs the hub on a new task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Runs the loop until `shutdown` turns `true` (or its sender is dropped)
    /// or every handle is dropped. Dropping the hub closes every client
    /// channel, which ends their streams.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("event hub started");
        if *shutdown.borrow_and_update() {
            return;
        }

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                command = self.inbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }

        info!(clients = self.clients.len(), "event hub stopped");
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect(client) => self.register(client),
            HubCommand::Disconnect {
                viewer,
                connection_id,
            } => self.disconnect(viewer, connection_id),
            HubCommand::Send { recipient, message } => self.deliver(recipient, message),
            HubCommand::Clients { reply } => {
                let clients = self.clients.values().map(|c| c.info.clone()).collect();
                let _ = reply.send(clients);
            }
            HubCommand::Synced {
                viewer,
                connection_id,
                snapshot,
            } => self.synced(viewer, connection_id, snapshot),
        }
    }

    fn register(&mut self, mut client: ConnectedClient) {
        if self.listener.is_some() {
            client.held = Some(VecDeque::new());
        }
        let info = client.info.clone();
        if let Some(previous) = self.clients.insert(info.viewer, client) {
            info!(
                viewer = %info.viewer,
                previous = %previous.info.connection_id,
                current = %info.connection_id,
                "connection replaced"
            );
        }
        info!(
            viewer = %info.viewer,
            name = %info.name,
            clients = self.clients.len(),
            "client connected"
        );

        if let Viewer::Player(id) = info.viewer {
            let player = Player {
                id,
                name: info.name.clone(),
            };
            self.deliver(Viewer::Admin, Message::PlayerConnected(player));
        }

        if let Some(listener) = self.listener.clone() {
            spawn_snapshot(listener, info, self.commands.clone());
        }
    }

    fn disconnect(&mut self, viewer: Viewer, connection_id: Uuid) {
        let current = self.clients.get(&viewer).map(|c| c.info.connection_id);
        if current == Some(connection_id) {
            self.evict(viewer, Departure::Closed);
        } else {
            debug!(%viewer, %connection_id, "stale disconnect ignored");
        }
    }

    /// Ends a client's syncing phase: the snapshot goes out first, then
    /// everything held while it was being built.
    fn synced(&mut self, viewer: Viewer, connection_id: Uuid, snapshot: Option<Message>) {
        let Some(client) = self
            .clients
            .get_mut(&viewer)
            .filter(|c| c.info.connection_id == connection_id)
        else {
            debug!(%viewer, %connection_id, "snapshot for a closed connection ignored");
            return;
        };
        let held = client.held.take().unwrap_or_default();

        let Some(snapshot) = snapshot else {
            self.evict(viewer, Departure::SnapshotFailed);
            return;
        };
        debug!(%viewer, held = held.len(), "client synced");

        for message in std::iter::once(snapshot).chain(held) {
            let current = self.clients.get(&viewer).map(|c| c.info.connection_id);
            if current != Some(connection_id) {
                break;
            }
            self.deliver(viewer, message);
        }
    }

    fn deliver(&mut self, recipient: Viewer, message: Message) {
        let kind = message.kind();
        let Some(client) = self.clients.get_mut(&recipient) else {
            info!(%recipient, kind, "recipient offline; message dropped");
            return;
        };

        if let Some(held) = client.held.as_mut() {
            if held.len() < HELD_LIMIT {
                held.push_back(message);
                debug!(%recipient, kind, "message held until client syncs");
            } else {
                warn!(%recipient, kind, "too many messages held while syncing; evicting");
                self.evict(recipient, Departure::Lagging);
            }
            return;
        }

        match client.sender.try_send(message) {
            Ok(()) => debug!(%recipient, kind, "message delivered"),
            Err(TrySendError::Full(_)) => {
                warn!(%recipient, kind, "client buffer full; evicting");
                self.evict(recipient, Departure::Lagging);
            }
            Err(TrySendError::Closed(_)) => {
                debug!(%recipient, kind, "client receiver dropped");
                self.evict(recipient, Departure::Gone);
            }
        }
    }

    fn evict(&mut self, viewer: Viewer, departure: Departure) {
        let Some(client) = self.clients.remove(&viewer) else {
            return;
        };
        let info = client.info.clone();
        drop(client);
        info!(
            %viewer,
            connection_id = %info.connection_id,
            reason = departure.as_str(),
            clients = self.clients.len(),
            "client removed"
        );

        if let Viewer::Player(id) = viewer {
            self.deliver(Viewer::Admin, Message::PlayerDisconnected(id));
        }

        if let Some(listener) = self.listener.clone() {
            spawn_callback("client_removed", viewer, async move {
                listener.client_removed(info).await
            });
        }
    }
}

/// Builds a client's initial snapshot on its own task and reports it back
/// to the loop. Failures are logged and reported as `None`.
fn spawn_snapshot(
    listener: Arc<dyn ConnectionListener>,
    client: ClientInfo,
    commands: mpsc::WeakSender<HubCommand>,
) {
    let viewer = client.viewer;
    let connection_id = client.connection_id;
    let task = tokio::spawn(async move { listener.client_added(client).await });
    tokio::spawn(async move {
        let snapshot = match task.await {
            Ok(Ok(message)) => Some(message),
            Ok(Err(err)) => {
                error!(callback = "client_added", %viewer, error = %err, "connection callback failed");
                None
            }
            Err(err) => {
                error!(callback = "client_added", %viewer, error = %err, "connection callback panicked");
                None
            }
        };
        let Some(commands) = commands.upgrade() else {
            return;
        };
        let command = HubCommand::Synced {
            viewer,
            connection_id,
            snapshot,
        };
        let _ = commands.send(command).await;
    });
}

/// Runs a listener callback on its own task and logs its failure.
fn spawn_callback<F>(callback: &'static str, viewer: Viewer, future: F)
where
    F: Future<Output = Result<(), veil_core::error::DomainError>> + Send + 'static,
{
    let task = tokio::spawn(future);
    tokio::spawn(async move {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(callback, %viewer, error = %err, "connection callback failed"),
            Err(err) => error!(callback, %viewer, error = %err, "connection callback panicked"),
        }
    });
}
