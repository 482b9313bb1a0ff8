//! Shown channels and their graphics items, in insertion order.

use indexmap::IndexMap;

use crate::browser::signal_item::SignalItem;

#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    items: IndexMap<usize, SignalItem>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` for `channel_nr`. Returns `false` and leaves the
    /// registry untouched if the channel is already registered.
    pub fn add(&mut self, channel_nr: usize, item: SignalItem) -> bool {
        if self.items.contains_key(&channel_nr) {
            return false;
        }
        self.items.insert(channel_nr, item);
        true
    }

    /// Unregister a channel, keeping the order of the others.
    pub fn remove(&mut self, channel_nr: usize) -> Option<SignalItem> {
        self.items.shift_remove(&channel_nr)
    }

    pub fn contains(&self, channel_nr: usize) -> bool {
        self.items.contains_key(&channel_nr)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, channel_nr: usize) -> Option<&SignalItem> {
        self.items.get(&channel_nr)
    }

    pub fn get_mut(&mut self, channel_nr: usize) -> Option<&mut SignalItem> {
        self.items.get_mut(&channel_nr)
    }

    /// Channel number at display row `shown_nr`.
    pub fn channel_at(&self, shown_nr: usize) -> Option<usize> {
        self.items.get_index(shown_nr).map(|(ch, _)| *ch)
    }

    /// Display row of a shown channel.
    pub fn row_of(&self, channel_nr: usize) -> Option<usize> {
        self.items.get_index_of(&channel_nr)
    }

    pub fn channels(&self) -> Vec<usize> {
        self.items.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &SignalItem)> {
        self.items.iter().map(|(ch, item)| (*ch, item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut SignalItem)> {
        self.items.iter_mut().map(|(ch, item)| (*ch, item))
    }
}
