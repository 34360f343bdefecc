use swarm_core::session::SessionSnapshot;
use tokio::sync::{Mutex, mpsc};

/// Fan-out of session snapshots to any number of listeners.
///
/// Closed receivers are pruned on the next publish.
#[derive(Default)]
pub struct SnapshotSubscribers {
    senders: Mutex<Vec<mpsc::UnboundedSender<SessionSnapshot>>>,
}

impl SnapshotSubscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener that receives every snapshot published from now on.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().await.push(tx);
        rx
    }

    pub async fn publish(&self, snapshot: SessionSnapshot) {
        let mut senders = self.senders.lock().await;
        senders.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::session::Session;

    fn snapshot(query: &str) -> SessionSnapshot {
        SessionSnapshot {
            session: Session::new(query),
            tasks: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let subscribers = SnapshotSubscribers::new();
        let mut a = subscribers.subscribe().await;
        let mut b = subscribers.subscribe().await;

        subscribers.publish(snapshot("q")).await;

        assert_eq!(a.recv().await.unwrap().session.query, "q");
        assert_eq!(b.recv().await.unwrap().session.query, "q");
    }

    #[tokio::test]
    async fn test_closed_receivers_are_pruned() {
        let subscribers = SnapshotSubscribers::new();
        let kept = subscribers.subscribe().await;
        drop(subscribers.subscribe().await);

        subscribers.publish(snapshot("q")).await;

        assert_eq!(subscribers.senders.lock().await.len(), 1);
        drop(kept);
    }
}
