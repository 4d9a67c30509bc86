//! In-process publish/subscribe channel
//!
//! Scoped to the lifetime of the map view: the orchestrator owns the bus
//! and it is torn down with it. One broadcast channel is created lazily per
//! topic; dropping a receiver unsubscribes it. There is no ordering
//! guarantee beyond "most recent publish wins" - consumers that only care
//! about the newest value drain with [`drain_latest`].
//!
//! The only current traffic is hover-to-help signaling between sibling map
//! controls and the help-card renderer, which have no parent/child
//! relationship to communicate through.

use std::collections::HashMap;
use tokio::sync::broadcast;

/// Per-topic channel capacity. Consumers drain every frame; anything beyond
/// a handful of pending events is already stale.
const CHANNEL_CAPACITY: usize = 16;

/// Topics carried by the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Hover state of map controls, consumed by the help card.
    ControlHelp,
}

/// Map controls that publish contextual help on hover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapControl {
    SearchBox,
    LayerPicker,
    TrafficToggle,
    MeasureTool,
    DirectionsPanel,
    CenterOnUser,
}

impl MapControl {
    pub fn title(&self) -> &'static str {
        match self {
            Self::SearchBox => "Location search",
            Self::LayerPicker => "Map style",
            Self::TrafficToggle => "Traffic overlay",
            Self::MeasureTool => "Measure distance",
            Self::DirectionsPanel => "Directions",
            Self::CenterOnUser => "Center on you",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            Self::SearchBox => "Type at least three characters to search for a place.",
            Self::LayerPicker => "Switch the base map between standard, satellite, terrain and transport tiles.",
            Self::TrafficToggle => "Show simulated congestion around the visible area.",
            Self::MeasureTool => "Click the map to trace a line and read its length.",
            Self::DirectionsPanel => "Pick a destination and add stops to get a route.",
            Self::CenterOnUser => "Keep the map locked on your position until you pan away.",
        }
    }
}

/// Payload of the [`Topic::ControlHelp`] topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelpSignal {
    /// A control is hovered; show its help card.
    Show(MapControl),
    /// Nothing relevant is hovered; clear the card.
    Clear,
}

/// A topic-keyed broadcast bus with lazily created channels.
pub struct EventBus<P: Clone> {
    channels: HashMap<Topic, broadcast::Sender<P>>,
}

impl<P: Clone> EventBus<P> {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Publish to a topic. Publishing with no subscribers is fine; the
    /// payload is simply dropped.
    pub fn publish(&mut self, topic: Topic, payload: P) {
        let sender = self.sender(topic);
        let _ = sender.send(payload);
    }

    /// Subscribe to a topic. Dropping the returned receiver unsubscribes.
    pub fn subscribe(&mut self, topic: Topic) -> broadcast::Receiver<P> {
        self.sender(topic).subscribe()
    }

    /// Number of live subscribers on a topic.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels
            .get(&topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    fn sender(&mut self, topic: Topic) -> &broadcast::Sender<P> {
        self.channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
    }
}

impl<P: Clone> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain everything currently queued on a receiver and keep only the newest
/// payload. Lagged markers are skipped: missing intermediate events is by
/// contract, only the latest matters.
pub fn drain_latest<P: Clone>(receiver: &mut broadcast::Receiver<P>) -> Option<P> {
    let mut latest = None;
    loop {
        match receiver.try_recv() {
            Ok(payload) => latest = Some(payload),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    latest
}
