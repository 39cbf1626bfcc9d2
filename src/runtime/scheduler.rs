// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cooperative delivery of view changes to listeners.
//!
//! Every context that shares a [`Scheduler`] feeds its view events into one
//! queue. A single drain task delivers them in order, yielding between
//! events. [`Scheduler::idle`] resolves once the queue is empty and no drain
//! is running, which is the process-wide quiescence signal speculative runs
//! wait on.

use crate::runtime::store::ViewEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub type ViewListener = Arc<dyn Fn(&ViewEvent) + Send + Sync>;

#[derive(Default)]
struct Queue {
    events: VecDeque<(Vec<ViewListener>, ViewEvent)>,
    draining: bool,
}

#[derive(Default)]
pub struct Scheduler {
    queue: Mutex<Queue>,
    delivered: AtomicU64,
    settled: Notify,
}

impl Scheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue `event` for `listeners`. Must be called inside a tokio runtime.
    pub fn enqueue(self: &Arc<Self>, listeners: Vec<ViewListener>, event: ViewEvent) {
        let mut queue = self.queue.lock();
        queue.events.push_back((listeners, event));
        if !queue.draining {
            queue.draining = true;
            let scheduler = Arc::clone(self);
            tokio::spawn(async move { scheduler.drain().await });
        }
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.events.pop_front() {
                    Some(next) => next,
                    None => {
                        queue.draining = false;
                        break;
                    }
                }
            };
            let (listeners, event) = next;
            for listener in &listeners {
                listener(&event);
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
        }
        self.settled.notify_waiters();
    }

    pub fn is_idle(&self) -> bool {
        let queue = self.queue.lock();
        queue.events.is_empty() && !queue.draining
    }

    /// Events delivered since creation.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    pub async fn idle(&self) {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::store::ViewChange;
    use serde_json::json;
    use std::time::Duration;

    fn event(id: &str) -> ViewEvent {
        ViewEvent {
            view_id: id.to_string(),
            change: ViewChange::Set,
            value: json!(null),
        }
    }

    #[tokio::test]
    async fn test_idle_without_events_returns_immediately() {
        let scheduler = Scheduler::new();
        tokio::time::timeout(Duration::from_secs(1), scheduler.idle())
            .await
            .unwrap();
        assert!(scheduler.is_idle());
    }

    #[tokio::test]
    async fn test_events_are_delivered_in_order_before_idle() {
        let scheduler = Scheduler::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder: ViewListener = {
            let seen = Arc::clone(&seen);
            Arc::new(move |event: &ViewEvent| seen.lock().push(event.view_id.clone()))
        };

        for id in ["a", "b", "c"] {
            scheduler.enqueue(vec![Arc::clone(&recorder)], event(id));
        }
        tokio::time::timeout(Duration::from_secs(1), scheduler.idle())
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.delivered(), 3);
    }

    #[tokio::test]
    async fn test_events_without_listeners_still_drain() {
        let scheduler = Scheduler::new();
        scheduler.enqueue(Vec::new(), event("a"));
        scheduler.idle().await;
        assert_eq!(scheduler.delivered(), 1);
    }
}
