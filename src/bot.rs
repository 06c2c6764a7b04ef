//! Bot runtime: fans inbound events out to per-owner workers.
//!
//! Each owner gets a single-threaded queue, so that owner's events apply to
//! the session strictly in arrival order, while different owners process in
//! parallel. The coordinator's own per-owner mutex additionally protects any
//! direct callers that bypass this runtime.

use crate::channel::{InboundEvent, InboundPayload};
use crate::dialog::{DialogCoordinator, OutboundSink, OwnerId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct BotRuntime {
    coordinator: Arc<DialogCoordinator>,
    sink: Arc<dyn OutboundSink>,
    workers: DashMap<OwnerId, mpsc::UnboundedSender<InboundEvent>>,
}

impl BotRuntime {
    pub fn new(coordinator: Arc<DialogCoordinator>, sink: Arc<dyn OutboundSink>) -> Arc<Self> {
        Arc::new(Self {
            coordinator,
            sink,
            workers: DashMap::new(),
        })
    }

    /// Consume the inbound stream until the sender side closes.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = rx.recv().await {
            self.dispatch(event);
        }
        tracing::info!("inbound stream closed, bot runtime stopping");
    }

    /// Enqueue one event on its owner's worker, spawning the worker on first
    /// contact. Workers live for the process lifetime.
    pub fn dispatch(self: &Arc<Self>, event: InboundEvent) {
        let tx = self
            .workers
            .entry(event.owner.clone())
            .or_insert_with(|| self.spawn_worker())
            .clone();
        if tx.send(event).is_err() {
            tracing::error!("owner worker gone, dropping event");
        }
    }

    fn spawn_worker(self: &Arc<Self>) -> mpsc::UnboundedSender<InboundEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
        let runtime = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                runtime.process(event).await;
            }
        });
        tx
    }

    async fn process(&self, event: InboundEvent) {
        // Stop the client-side spinner before doing any real work.
        if let InboundPayload::Callback { query_id, .. } = &event.payload {
            if let Err(err) = self.sink.ack_callback(query_id).await {
                tracing::debug!(error = %err, "callback ack failed");
            }
        }

        let directives = self.coordinator.handle(&event).await;

        for directive in directives {
            // A failed delivery must not affect session state; log and move on.
            if let Err(err) = self.sink.deliver(&event.chat_id, directive).await {
                tracing::warn!(owner = %event.owner, error = %err, "outbound delivery failed");
            }
        }
    }
}
