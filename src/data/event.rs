//! Signal events (annotations) and the id-indexed event table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier assigned by [`EventTable::add`]. Never reused.
pub type EventId = u32;

/// Channel an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventChannel {
    /// Applies to every channel.
    Undefined,
    Channel(usize),
}

/// Wildcard channel: the event applies to all channels.
pub const UNDEFINED_CHANNEL: EventChannel = EventChannel::Undefined;

impl EventChannel {
    /// Wildcard-aware match against a concrete channel.
    pub fn applies_to(self, channel: usize) -> bool {
        match self {
            EventChannel::Undefined => true,
            EventChannel::Channel(c) => c == channel,
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            EventChannel::Undefined => None,
            EventChannel::Channel(c) => Some(c),
        }
    }

    pub fn is_undefined(self) -> bool {
        self == EventChannel::Undefined
    }
}

impl From<usize> for EventChannel {
    fn from(channel: usize) -> Self {
        EventChannel::Channel(channel)
    }
}

impl std::fmt::Display for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventChannel::Undefined => write!(f, "all channels"),
            EventChannel::Channel(c) => write!(f, "channel {}", c),
        }
    }
}

/// One annotation. Position and duration are in event-rate samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEvent {
    /// Set by the event table on insertion.
    pub id: Option<EventId>,
    pub event_type: u16,
    pub channel: EventChannel,
    pub position: u32,
    pub duration: u32,
}

impl SignalEvent {
    pub fn new(position: u32, event_type: u16, channel: EventChannel, duration: u32) -> Self {
        Self {
            id: None,
            event_type,
            channel,
            position,
            duration,
        }
    }

    /// Equal in every field except `id`.
    pub fn same_content(&self, other: &SignalEvent) -> bool {
        self.event_type == other.event_type
            && self.channel == other.channel
            && self.position == other.position
            && self.duration == other.duration
    }

    pub fn end(&self) -> u32 {
        self.position.saturating_add(self.duration)
    }
}

/// Event storage with monotonic ids and insertion-order enumeration.
///
/// Ordinals (`0..len()`) walk events in insertion order; removing an event
/// shifts later ordinals down but keeps their relative order.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    next_id: EventId,
    events: IndexMap<EventId, SignalEvent>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `event` under a fresh id and return it.
    pub fn add(&mut self, mut event: SignalEvent) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        event.id = Some(id);
        self.events.insert(id, event);
        id
    }

    pub fn remove(&mut self, id: EventId) -> Option<SignalEvent> {
        self.events.shift_remove(&id)
    }

    pub fn get(&self, id: EventId) -> Option<&SignalEvent> {
        self.events.get(&id)
    }

    pub fn get_mut(&mut self, id: EventId) -> Option<&mut SignalEvent> {
        self.events.get_mut(&id)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.events.contains_key(&id)
    }

    /// Id of the `ordinal`-th event in insertion order.
    pub fn number_to_id(&self, ordinal: usize) -> Option<EventId> {
        self.events.get_index(ordinal).map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SignalEvent> {
        self.events.values()
    }

    /// Events that apply to `channel`, including all-channel events.
    pub fn for_channel(&self, channel: usize) -> impl Iterator<Item = &SignalEvent> {
        self.events.values().filter(move |e| e.channel.applies_to(channel))
    }

    /// Drop every event. Ids handed out before stay retired.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
