use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Hands out turns to remote calls in ticket order.
///
/// Tickets are issued by the store while it applies the optimistic change,
/// so turn order equals issue order. Every ticket must be released exactly
/// once, whether or not it got its turn.
pub(crate) struct Sequencer {
    inner: Mutex<Inner>,
    serving: watch::Sender<u64>,
}

#[derive(Default)]
struct Inner {
    serving: u64,
    /// Released before their turn came; skipped when reached.
    abandoned: BTreeSet<u64>,
}

impl Sequencer {
    pub(crate) fn new() -> Self {
        let (serving, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner::default()),
            serving,
        }
    }

    pub(crate) async fn wait_for_turn(&self, ticket: u64) {
        let mut rx = self.serving.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|serving| *serving == ticket).await;
    }

    pub(crate) fn release(&self, ticket: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket == inner.serving {
            let mut next = ticket + 1;
            while inner.abandoned.remove(&next) {
                next += 1;
            }
            inner.serving = next;
            self.serving.send_replace(next);
        } else if ticket > inner.serving {
            inner.abandoned.insert(ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn turns_follow_ticket_order() {
        let sequencer = Arc::new(Sequencer::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for ticket in (0..4).rev() {
            let sequencer = sequencer.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                sequencer.wait_for_turn(ticket).await;
                order.lock().unwrap().push(ticket);
                sequencer.release(ticket);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn abandoned_tickets_are_skipped() {
        let sequencer = Sequencer::new();
        sequencer.release(1);
        sequencer.release(2);
        sequencer.wait_for_turn(0).await;
        sequencer.release(0);
        // 1 and 2 were abandoned, so 3 is served next.
        sequencer.wait_for_turn(3).await;
    }
}
