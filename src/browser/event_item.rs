//! On-screen geometry of one event. Refers to its event by id only.

use crate::browser::layout::LayoutState;
use crate::browser::signal_item::EVENT_Z;
use crate::data::event::{EventId, SignalEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct EventItem {
    id: EventId,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    z: f64,
    visible: bool,
    selected: bool,
}

impl EventItem {
    pub fn new(id: EventId) -> Self {
        Self {
            id,
            x: 0,
            y: 0,
            width: 1,
            height: 0,
            z: EVENT_Z,
            visible: false,
            selected: false,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn z_value(&self) -> f64 {
        self.z
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Position the item for `event`.
    ///
    /// `row_y` is the y position of the event's channel row (0 for
    /// all-channel events), `None` when that channel is not shown.
    /// Returns whether the item ended up visible.
    pub fn place(
        &mut self,
        event: &SignalEvent,
        row_y: Option<i32>,
        type_shown: bool,
        layout: &LayoutState,
        scene_height: i32,
        event_sample_rate: f64,
    ) -> bool {
        let Some(y) = row_y.filter(|_| type_shown) else {
            self.visible = false;
            return false;
        };
        let rate = if event_sample_rate > 0.0 { event_sample_rate } else { 1.0 };
        let width = (layout.pixel_per_sec * event.duration as f64 / rate + 0.5) as i32;
        self.width = width.max(1);
        self.x = (layout.pixel_per_sec * event.position as f64 / rate + 0.5) as i32;
        self.y = y;
        self.height = if event.channel.is_undefined() {
            scene_height
        } else {
            layout.signal_height
        };
        self.z = EVENT_Z + event.event_type as f64 / 100_000.0;
        self.visible = true;
        true
    }
}
