use tokio::sync::{mpsc, oneshot, watch};

use super::{Action, Applied, DashboardState};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("state store is closed")]
    Closed,
    #[error("unexpected store reply: {0}")]
    UnexpectedReply(String),
}

struct Command {
    action: Action,
    reply: oneshot::Sender<Applied>,
}

/// Handle to the task that owns [`DashboardState`].
///
/// Actions go through a single bounded channel and are applied in arrival
/// order. Every applied action publishes a fresh snapshot.
#[derive(Clone)]
pub struct Store {
    tx: mpsc::Sender<Command>,
    snapshots: watch::Receiver<DashboardState>,
}

impl Store {
    pub fn spawn(initial: DashboardState, channel_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Command>(channel_capacity.max(1));
        let (snapshot_tx, snapshots) = watch::channel(initial.clone());

        tokio::spawn(async move {
            let mut state = initial;
            while let Some(cmd) = rx.recv().await {
                let applied = state.apply(cmd.action);
                snapshot_tx.send_replace(state.clone());
                // The caller may have gone away; the update still stands.
                let _ = cmd.reply.send(applied);
            }
            tracing::debug!("state store stopped");
        });

        Self { tx, snapshots }
    }

    pub async fn dispatch(&self, action: Action) -> Result<Applied, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command { action, reply })
            .await
            .map_err(|_| StoreError::Closed)?;
        rx.await.map_err(|_| StoreError::Closed)
    }

    pub fn snapshot(&self) -> DashboardState {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.snapshots.clone()
    }
}
