//! Broadcast Hub - fan-out of cached content to live subscribers
//!
//! Each subscriber owns a bounded frame queue drained by its connection's
//! writer task. Cache mutations and fan-out happen under the topic lock, and
//! subscribing takes the snapshot under that same lock, so a subscriber sees
//! the snapshot first and every later update exactly once, in apply order.
//!
//! Liveness: each heartbeat tick reaps subscribers that have not answered the
//! previous ping and pings the rest.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::{ChatMessageRecord, EmbedRecord};
use crate::domain::errors::RelayError;
use crate::domain::value_objects::Topic;
use crate::services::content_cache::ContentCache;

/// Hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Interval between liveness pings
    pub heartbeat_interval: Duration,
    /// Live frames a subscriber may lag behind before frames are dropped
    pub subscriber_queue: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            subscriber_queue: 256,
        }
    }
}

/// Frame queued for one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// JSON-encoded record
    Text(Arc<str>),
    Ping,
    Close,
}

struct Subscriber {
    id: Uuid,
    channel: Option<String>,
    tx: mpsc::Sender<Outbound>,
    alive: Arc<AtomicBool>,
}

impl Subscriber {
    fn wants(&self, channel_id: &str) -> bool {
        self.channel.as_deref().map_or(true, |c| c == channel_id)
    }
}

/// Receiving side of a subscription, owned by the connection task
pub struct SubscriberHandle {
    id: Uuid,
    topic: Topic,
    rx: mpsc::Receiver<Outbound>,
    alive: Arc<AtomicBool>,
}

impl SubscriberHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Next frame; `None` once the hub dropped this subscriber.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.rx.recv().await
    }

    /// Record a pong from the peer.
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Relaxed);
    }
}

/// Result of one heartbeat sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub pinged: usize,
    pub reaped: usize,
}

pub struct BroadcastHub {
    cache: Arc<ContentCache>,
    config: HubConfig,
    embeds: Mutex<Vec<Subscriber>>,
    messages: Mutex<Vec<Subscriber>>,
    closed: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl BroadcastHub {
    pub fn new(cache: Arc<ContentCache>, config: HubConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            cache,
            config,
            embeds: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            shutdown_tx,
            heartbeat: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    fn subscribers(&self, topic: Topic) -> MutexGuard<'_, Vec<Subscriber>> {
        let lock = match topic {
            Topic::Embeds => &self.embeds,
            Topic::Messages => &self.messages,
        };
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers(topic).len()
    }

    /// Register a subscriber, queueing the current snapshot ahead of any live frame.
    ///
    /// Without a channel, `embeds` snapshots the global recent feed and
    /// `messages` every tracked channel.
    pub fn subscribe(
        &self,
        topic: Topic,
        channel: Option<String>,
    ) -> Result<SubscriberHandle, RelayError> {
        let mut subscribers = self.subscribers(topic);
        // Checked under the topic lock: shutdown sets the flag before draining
        if self.closed.load(Ordering::Acquire) {
            return Err(RelayError::Unavailable("broadcast hub is shut down".into()));
        }
        let snapshot = self.snapshot_frames(topic, channel.as_deref());

        let (tx, rx) = mpsc::channel(snapshot.len() + self.config.subscriber_queue.max(1));
        for frame in snapshot {
            // Capacity covers the whole snapshot
            let _ = tx.try_send(Outbound::Text(frame));
        }

        let id = Uuid::new_v4();
        let alive = Arc::new(AtomicBool::new(true));
        subscribers.push(Subscriber {
            id,
            channel: channel.clone(),
            tx,
            alive: alive.clone(),
        });

        debug!(subscriber = %id, topic = %topic, channel = ?channel, "Subscriber registered");

        Ok(SubscriberHandle {
            id,
            topic,
            rx,
            alive,
        })
    }

    pub fn unsubscribe(&self, topic: Topic, id: Uuid) {
        let mut subscribers = self.subscribers(topic);
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        if subscribers.len() < before {
            debug!(subscriber = %id, topic = %topic, "Subscriber removed");
        }
    }

    /// Send a record to every subscriber of `topic` interested in `channel_id`.
    /// Returns the number of subscribers the frame was queued for.
    pub fn broadcast<T: Serialize>(&self, topic: Topic, channel_id: &str, record: &T) -> usize {
        let Some(frame) = encode(record) else {
            return 0;
        };
        let mut subscribers = self.subscribers(topic);
        fan_out(&mut subscribers, channel_id, frame)
    }

    /// Upsert an embed into the cache and push it to `embeds` subscribers.
    pub fn publish_embed(&self, record: EmbedRecord) -> usize {
        let Some(frame) = encode(&record) else {
            return 0;
        };
        let mut subscribers = self.subscribers(Topic::Embeds);
        let channel_id = record.channel_id.clone();
        let _ = self.cache.upsert_embed(record);
        fan_out(&mut subscribers, &channel_id, frame)
    }

    /// Append a chat message and push it to `messages` subscribers.
    /// Already-cached messages are not re-sent.
    pub fn publish_message(&self, record: ChatMessageRecord) -> usize {
        let Some(frame) = encode(&record) else {
            return 0;
        };
        let mut subscribers = self.subscribers(Topic::Messages);
        let channel_id = record.channel_id.clone();
        if !self.cache.insert_message(record) {
            return 0;
        }
        fan_out(&mut subscribers, &channel_id, frame)
    }

    /// One heartbeat tick.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        for topic in Topic::ALL {
            let mut subscribers = self.subscribers(topic);
            subscribers.retain(|s| {
                if !s.alive.swap(false, Ordering::Relaxed) {
                    debug!(subscriber = %s.id, topic = %topic, "Reaping unresponsive subscriber");
                    let _ = s.tx.try_send(Outbound::Close);
                    report.reaped += 1;
                    return false;
                }
                match s.tx.try_send(Outbound::Ping) {
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                    _ => {
                        report.pinged += 1;
                        true
                    }
                }
            });
        }
        report
    }

    /// Spawn the heartbeat task. Must be called inside a Tokio runtime.
    pub fn start_heartbeat(self: &Arc<Self>) {
        let hub = Arc::downgrade(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = self.config.heartbeat_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(hub) = Weak::upgrade(&hub) else { break };
                        let report = hub.sweep();
                        if report.reaped > 0 {
                            info!(reaped = report.reaped, pinged = report.pinged, "💓 Heartbeat reaped subscribers");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!("Heartbeat stopped");
        });

        if let Some(previous) = self
            .heartbeat
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle)
        {
            previous.abort();
        }
    }

    /// Close every subscriber and stop the heartbeat.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(true);

        let mut closed = 0;
        for topic in Topic::ALL {
            let drained: Vec<Subscriber> = self.subscribers(topic).drain(..).collect();
            for subscriber in drained {
                let _ = subscriber.tx.try_send(Outbound::Close);
                closed += 1;
            }
        }

        let heartbeat = self
            .heartbeat
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(heartbeat) = heartbeat {
            let _ = heartbeat.await;
        }

        info!(closed, "📴 Broadcast hub shut down");
    }

    fn snapshot_frames(&self, topic: Topic, channel: Option<&str>) -> Vec<Arc<str>> {
        match (topic, channel) {
            (Topic::Embeds, Some(c)) => encode_all(&self.cache.embeds(c)),
            (Topic::Embeds, None) => encode_all(&self.cache.recent_embeds()),
            (Topic::Messages, Some(c)) => encode_all(&self.cache.messages(c)),
            (Topic::Messages, None) => encode_all(&self.cache.all_messages()),
        }
    }
}

fn encode<T: Serialize>(record: &T) -> Option<Arc<str>> {
    match serde_json::to_string(record) {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            warn!(error = %e, "Failed to encode record for broadcast");
            None
        }
    }
}

fn encode_all<T: Serialize>(records: &[T]) -> Vec<Arc<str>> {
    records.iter().filter_map(encode).collect()
}

fn fan_out(subscribers: &mut Vec<Subscriber>, channel_id: &str, frame: Arc<str>) -> usize {
    let mut delivered = 0;
    subscribers.retain(|s| {
        if !s.wants(channel_id) {
            return true;
        }
        match s.tx.try_send(Outbound::Text(frame.clone())) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(subscriber = %s.id, "Subscriber queue full, frame skipped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    });
    delivered
}
