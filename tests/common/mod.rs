#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use sigbrowse::browser::{BrowserView, EventItem, SignalItem};
use sigbrowse::diagnostics::MemoryLog;
use sigbrowse::{shared_reader, EventId, MemorySignalReader, SharedReader, SignalBrowserModel};

/// Everything a [`RecordingView`] was told.
#[derive(Debug, Default)]
pub struct ViewLog {
    pub scene: Option<(i32, i32)>,
    /// channel -> (y position, height) of the last pushed item
    pub items: HashMap<usize, (i32, i32)>,
    pub y_axis: Vec<usize>,
    pub event_items: HashMap<EventId, EventItem>,
    pub removed_events: Vec<EventId>,
    pub updates: usize,
    pub visible: Option<bool>,
    pub busy: Vec<bool>,
    pub contents_pos: (i32, i32),
    pub visible_size: (i32, i32),
}

#[derive(Clone, Default)]
pub struct RecordingView(pub Rc<RefCell<ViewLog>>);

impl RecordingView {
    pub fn log(&self) -> std::cell::Ref<'_, ViewLog> {
        self.0.borrow()
    }

    pub fn set_visible_size(&self, width: i32, height: i32) {
        self.0.borrow_mut().visible_size = (width, height);
    }
}

impl BrowserView for RecordingView {
    fn resize_scene(&mut self, width: i32, height: i32) {
        self.0.borrow_mut().scene = Some((width, height));
    }

    fn add_signal_item(&mut self, channel_nr: usize, item: &SignalItem) {
        self.0
            .borrow_mut()
            .items
            .insert(channel_nr, (item.pos().1, item.height()));
    }

    fn remove_signal_item(&mut self, channel_nr: usize) {
        self.0.borrow_mut().items.remove(&channel_nr);
    }

    fn y_axis_add_channel(&mut self, channel_nr: usize, _item: &SignalItem) {
        self.0.borrow_mut().y_axis.push(channel_nr);
    }

    fn y_axis_remove_channel(&mut self, channel_nr: usize) {
        self.0.borrow_mut().y_axis.retain(|c| *c != channel_nr);
    }

    fn update_event_item(&mut self, item: &EventItem) {
        self.0.borrow_mut().event_items.insert(item.id(), item.clone());
    }

    fn remove_event_item(&mut self, id: EventId) {
        let mut log = self.0.borrow_mut();
        log.event_items.remove(&id);
        log.removed_events.push(id);
    }

    fn update(&mut self) {
        self.0.borrow_mut().updates += 1;
    }

    fn set_visible(&mut self, visible: bool) {
        self.0.borrow_mut().visible = Some(visible);
    }

    fn set_busy(&mut self, busy: bool) {
        self.0.borrow_mut().busy.push(busy);
    }

    fn contents_pos(&self) -> (i32, i32) {
        self.0.borrow().contents_pos
    }

    fn set_contents_pos(&mut self, x: i32, y: i32) {
        self.0.borrow_mut().contents_pos = (x, y);
    }

    fn visible_size(&self) -> (i32, i32) {
        self.0.borrow().visible_size
    }
}

/// 3 channels, 256 Hz, 1000 one-second records.
pub fn recording() -> SharedReader {
    shared_reader(MemorySignalReader::synthetic(3, 256.0, 1000, 1.0))
}

pub fn small_recording() -> SharedReader {
    shared_reader(MemorySignalReader::synthetic(3, 16.0, 20, 1.0))
}

/// A model with a recording view and an in-memory log attached.
pub fn attached_model(reader: SharedReader) -> (SignalBrowserModel, RecordingView, MemoryLog) {
    let mut model = SignalBrowserModel::new(reader).expect("reader is open");
    let view = RecordingView::default();
    let log = MemoryLog::new();
    model.set_view(Box::new(view.clone()));
    model.set_log_sink(Box::new(log.clone()));
    (model, view, log)
}
