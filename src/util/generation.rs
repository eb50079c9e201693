//! Request generations: drop results that a newer request has superseded.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    current: Arc<AtomicU64>,
}

/// Ticket for one issued request.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    id: u64,
    current: Arc<AtomicU64>,
}

impl GenerationTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True until a newer ticket is issued from the same generation.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.id
    }
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn next(&self) -> GenerationTicket {
        let id = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        GenerationTicket {
            id,
            current: Arc::clone(&self.current),
        }
    }

    /// Await `fut` under a fresh ticket; `None` if it was superseded meanwhile.
    pub async fn run_latest<F, T>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.next();
        let out = fut.await;
        if ticket.is_current() {
            Some(out)
        } else {
            debug!(generation = ticket.id(), "generation: dropping superseded result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn newer_ticket_supersedes_older() {
        let generation = RequestGeneration::new();
        let first = generation.next();
        assert!(first.is_current());
        let second = generation.next();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(second.id() > first.id());
    }

    #[tokio::test]
    async fn late_result_is_discarded() {
        let generation = RequestGeneration::new();
        let (release_slow, slow_gate) = oneshot::channel::<()>();

        let slow = {
            let generation = generation.clone();
            tokio::spawn(async move {
                generation
                    .run_latest(async move {
                        let _ = slow_gate.await;
                        "slow"
                    })
                    .await
            })
        };
        // Let the slow request take its ticket first.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast = generation.run_latest(async { "fast" }).await;
        let _ = release_slow.send(());

        assert_eq!(fast, Some("fast"));
        assert_eq!(slow.await.unwrap(), None);
    }
}
