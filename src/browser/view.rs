//! The view the browser model drives. The model never paints; it only tells
//! the view where things go.

use crate::browser::event_item::EventItem;
use crate::browser::signal_item::SignalItem;
use crate::data::event::EventId;

pub trait BrowserView {
    fn resize_scene(&mut self, width: i32, height: i32);

    /// Called on every layout pass for every shown channel.
    fn add_signal_item(&mut self, channel_nr: usize, item: &SignalItem);

    fn remove_signal_item(&mut self, _channel_nr: usize) {}

    /// Y-axis label for a newly shown channel.
    fn y_axis_add_channel(&mut self, channel_nr: usize, item: &SignalItem);

    fn y_axis_remove_channel(&mut self, channel_nr: usize);

    fn update_event_item(&mut self, _item: &EventItem) {}

    fn remove_event_item(&mut self, _id: EventId) {}

    /// Schedule a repaint.
    fn update(&mut self);

    fn set_visible(&mut self, visible: bool);

    /// Busy-cursor hint while the buffer initializes.
    fn set_busy(&mut self, _busy: bool) {}

    /// Scroll position of the scene's top-left corner.
    fn contents_pos(&self) -> (i32, i32) {
        (0, 0)
    }

    fn set_contents_pos(&mut self, _x: i32, _y: i32) {}

    /// Size of the visible part of the scene.
    fn visible_size(&self) -> (i32, i32) {
        (0, 0)
    }
}
