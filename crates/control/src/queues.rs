use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, info};

use crate::work_item::WorkItem;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<WorkItem>,
    closed: bool,
}

/// FIFO of invocations for the function served by the emulator.
#[derive(Clone, Default)]
pub struct Queue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the queue has been closed.
    pub fn push(&self, work_item: WorkItem) -> bool {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.closed {
                return false;
            }
            debug!(request_id = %work_item.request_id, "Queued work item");
            state.items.push_back(work_item);
        }
        // Notify without holding the lock
        self.notify.notify_one();
        true
    }

    /// Waits for the next item. Returns `None` once the queue is closed and drained.
    pub async fn pop_or_wait(&self) -> Option<WorkItem> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking so a push in between is not missed
            notified.as_mut().enable();

            if let Some(item) = self.try_pop() {
                return item;
            }
            notified.await;
        }
    }

    /// `Some(None)` when closed and drained, `None` when merely empty.
    fn try_pop(&self) -> Option<Option<WorkItem>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(item) = state.items.pop_front() {
            debug!(request_id = %item.request_id, "Dequeued work item");
            return Some(Some(item));
        }
        if state.closed {
            return Some(None);
        }
        None
    }

    /// Drops a queued item that has not been handed out yet.
    pub fn remove(&self, request_id: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.items.len();
        state.items.retain(|item| item.request_id != request_id);
        let removed = state.items.len() != before;
        if removed {
            debug!(request_id = %request_id, "Removed queued work item");
        }
        removed
    }

    /// Stops accepting work and wakes every waiter.
    pub fn close(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed = true;
        self.notify.notify_waiters();
        info!("Invocation queue closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Duration};

    fn wi(payload: &str) -> WorkItem {
        WorkItem::new("hello", payload.as_bytes().to_vec(), 1500)
    }

    #[tokio::test]
    async fn pop_returns_items_in_fifo_order() {
        let q = Queue::new();
        let a = wi("a");
        let b = wi("b");
        assert!(q.push(a.clone()));
        assert!(q.push(b.clone()));
        assert_eq!(q.len(), 2);

        assert_eq!(q.pop_or_wait().await, Some(a));
        assert_eq!(q.pop_or_wait().await, Some(b));
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn waiter_wakes_on_push() {
        let q = Queue::new();
        let waiter = {
            let q = q.clone();
            tokio::spawn(async move { q.pop_or_wait().await })
        };

        sleep(Duration::from_millis(50)).await;
        let item = wi("late");
        q.push(item.clone());

        let got = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(got, Some(item));
    }

    #[tokio::test]
    async fn close_wakes_waiters_and_rejects_pushes() {
        let q = Queue::new();
        let waiter = {
            let q = q.clone();
            tokio::spawn(async move { q.pop_or_wait().await })
        };

        sleep(Duration::from_millis(50)).await;
        q.close();

        let got = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(got, None);
        assert!(q.is_closed());
        assert!(!q.push(wi("after-close")));
    }

    #[tokio::test]
    async fn remove_drops_only_the_named_item() {
        let q = Queue::new();
        let stale = wi("stale");
        let fresh = wi("fresh");
        q.push(stale.clone());
        q.push(fresh.clone());

        assert!(q.remove(&stale.request_id));
        assert!(!q.remove(&stale.request_id));
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_or_wait().await, Some(fresh));
    }

    #[tokio::test]
    async fn queued_items_drain_after_close() {
        let q = Queue::new();
        let item = wi("pending");
        q.push(item.clone());
        q.close();

        assert_eq!(q.pop_or_wait().await, Some(item));
        assert_eq!(q.pop_or_wait().await, None);
    }
}
