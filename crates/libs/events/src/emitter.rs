//! Bounded event queue with a dedicated consumer task per sink (spec.md
//! §6: "the emitter is a bounded channel with a dedicated consumer per
//! configured sink; back-pressure is handled by a bounded retry queue with
//! exponential backoff per event; dropped-event counter is the overflow
//! signal").

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cloudevents::binding::reqwest::RequestBuilderExt;
use cloudevents::Event;
use engine_core::crds::EventDestination;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Channel capacity shared by every sink's queue (spec.md §6).
pub const QUEUE_CAPACITY: usize = 10;
/// Delivery attempts per event before it is dropped (spec.md §6, scenario S6).
pub const MAX_ATTEMPTS: u32 = 5;

/// Delivers one [`Event`] to one [`EventDestination`].
#[async_trait::async_trait]
pub trait Deliver: Send + Sync {
    /// Attempt one delivery of `event`. Returning `Err` triggers the next
    /// retry attempt (or the drop path once [`MAX_ATTEMPTS`] is reached).
    async fn deliver(&self, destination: &EventDestination, event: &Event) -> Result<(), crate::error::EventError>;
}

/// HTTP-POST delivery: CloudEvents structured mode body for
/// [`EventDestination::Http`], and the same body against
/// `{endpoint}/{topic}` for [`EventDestination::CloudEventBus`] (no
/// message-bus SDK is part of this workspace's stack, so the bus
/// destination is modeled as an HTTP sink with the topic folded into the
/// path — a deliberate simplification recorded in `DESIGN.md`).
pub struct HttpDeliverer {
    client: reqwest::Client,
}

impl HttpDeliverer {
    /// Build a deliverer around a shared HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Deliver for HttpDeliverer {
    async fn deliver(&self, destination: &EventDestination, event: &Event) -> Result<(), crate::error::EventError> {
        let url = match destination {
            EventDestination::Http { url } => url.clone(),
            EventDestination::CloudEventBus { endpoint, topic } => format!("{}/{topic}", endpoint.trim_end_matches('/')),
        };
        self.client.post(url).event(event.clone())?.send().await?.error_for_status()?;
        Ok(())
    }
}

/// Metrics the emitter updates as events succeed, fail, or get dropped.
/// Mirrors `cloudeventsource_events_emitted_total{state=...}` and
/// `cloudeventsource_events_queued{namespace}` from spec.md §6.
pub struct EmitterMetrics {
    /// Counter of delivery outcomes, labeled by `state` (`"delivered"`,
    /// `"failed"`, `"dropped"`).
    pub events_emitted_total: prometheus::CounterVec,
    /// Current depth of a namespace's pending-delivery queues, summed
    /// across every destination that namespace has enqueued to.
    pub events_queued: prometheus::GaugeVec,
}

impl EmitterMetrics {
    /// Register the counter and gauge vectors against `registry`.
    ///
    /// # Errors
    /// Returns a [`prometheus::Error`] if registration fails (e.g. a
    /// duplicate metric name).
    pub fn register(registry: &prometheus::Registry) -> Result<Self, prometheus::Error> {
        let opts = prometheus::Opts::new("cloudeventsource_events_emitted_total", "lifecycle events emitted, by outcome");
        let events_emitted_total = prometheus::CounterVec::new(opts, &["state"])?;
        registry.register(Box::new(events_emitted_total.clone()))?;

        let queued_opts = prometheus::Opts::new("cloudeventsource_events_queued", "events currently queued for delivery");
        let events_queued = prometheus::GaugeVec::new(queued_opts, &["namespace"])?;
        registry.register(Box::new(events_queued.clone()))?;

        Ok(Self { events_emitted_total, events_queued })
    }
}

/// A bounded, fan-out event emitter: each [`EventDestination`] gets its own
/// bounded channel and consumer task, spawned the first time that
/// destination is used, so one unreachable sink's retry backoff never
/// blocks delivery to any other sink (spec.md §6: "a dedicated consumer per
/// configured sink").
pub struct Emitter {
    deliverer: Arc<dyn Deliver>,
    metrics: Arc<EmitterMetrics>,
    consumers: Mutex<HashMap<String, mpsc::Sender<Event>>>,
}

impl Emitter {
    /// Build an emitter around `deliverer`. Per-destination consumer tasks
    /// are spawned lazily on first use, since the set of destinations is
    /// only known once `EventSink`/`ClusterEventSink` objects are listed.
    #[must_use]
    pub fn spawn(deliverer: Arc<dyn Deliver>, metrics: Arc<EmitterMetrics>) -> Self {
        Self { deliverer, metrics, consumers: Mutex::new(HashMap::new()) }
    }

    /// Enqueue `event` for delivery to `destination` on behalf of
    /// `namespace`. Returns `false` (and bumps the `dropped` counter) if
    /// that destination's queue is full, matching the bounded-queue
    /// overflow behavior in spec.md §6.
    pub async fn enqueue(&self, namespace: &str, destination: EventDestination, event: Event, metrics: &EmitterMetrics) -> bool {
        let label = destination.label();
        let sender = {
            let mut consumers = self.consumers.lock().await;
            if let Some(sender) = consumers.get(&label) {
                sender.clone()
            } else {
                let sender = self.spawn_consumer(destination);
                consumers.insert(label, sender.clone());
                sender
            }
        };

        let result = sender.try_send(event);
        let queued = QUEUE_CAPACITY - sender.capacity();
        metrics.events_queued.with_label_values(&[namespace]).set(queued as f64);

        match result {
            Ok(()) => true,
            Err(_) => {
                metrics.events_emitted_total.with_label_values(&["dropped"]).inc();
                warn!("event queue full, dropping event");
                false
            }
        }
    }

    fn spawn_consumer(&self, destination: EventDestination) -> mpsc::Sender<Event> {
        let (sender, mut receiver) = mpsc::channel::<Event>(QUEUE_CAPACITY);
        let deliverer = Arc::clone(&self.deliverer);
        let metrics = Arc::clone(&self.metrics);

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                deliver_with_retry(&deliverer, &destination, &event, &metrics).await;
            }
        });

        sender
    }
}

async fn deliver_with_retry(deliverer: &Arc<dyn Deliver>, destination: &EventDestination, event: &Event, metrics: &EmitterMetrics) {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match deliverer.deliver(destination, event).await {
            Ok(()) => {
                metrics.events_emitted_total.with_label_values(&["delivered"]).inc();
                debug!(attempt, "event delivered");
                return;
            }
            Err(error) => {
                metrics.events_emitted_total.with_label_values(&["failed"]).inc();
                if attempt >= MAX_ATTEMPTS {
                    metrics.events_emitted_total.with_label_values(&["dropped"]).inc();
                    warn!(%error, attempt, "event delivery exhausted retries, dropping");
                    return;
                }
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
