use tokio::sync::broadcast;

/// Tells every subscribed view to reload its data.
#[derive(Clone)]
pub struct ReloadNotifier {
    tx: broadcast::Sender<()>,
}

impl Default for ReloadNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal all current subscribers. No subscribers is fine.
    pub fn reload(&self) {
        let _ = self.tx.send(());
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
