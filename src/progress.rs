use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One progress message, keyed by job so concurrent documents never
/// interleave in a shared queue.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub job_id: Uuid,
    pub message: String,
}

/// Fire-and-forget progress sink handed to the pipeline. Sending never
/// fails: a dropped receiver silently discards updates.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    job_id: Uuid,
    tx: Option<mpsc::UnboundedSender<ProgressUpdate>>,
}

impl ProgressSender {
    /// A sender with no subscriber, for callers that do not care about
    /// progress.
    pub fn disabled() -> Self {
        Self {
            job_id: Uuid::new_v4(),
            tx: None,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn send(&self, message: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressUpdate {
                job_id: self.job_id,
                message: message.into(),
            });
        }
    }
}

/// Per-job progress channel with an explicit subscribe/drain lifecycle:
/// create it with the job, drop the receiver when done.
pub fn channel() -> (ProgressSender, mpsc::UnboundedReceiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressSender {
            job_id: Uuid::new_v4(),
            tx: Some(tx),
        },
        rx,
    )
}

/// Collect everything currently queued without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressUpdate>) -> Vec<ProgressUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}
